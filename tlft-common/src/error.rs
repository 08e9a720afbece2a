//! Common error types for TLFT

use thiserror::Error;

/// Common result type for TLFT operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across TLFT services
///
/// The variants form the stable error taxonomy exposed at the API boundary:
/// each maps to exactly one machine-readable code and HTTP status in the
/// service crates.
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Requested resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Uniqueness or duplicate-state violation
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Workflow rule violation (e.g. resolving a reply comment)
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// Actor is not permitted to perform the operation
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Deletion blocked by dependent records
    ///
    /// Carries up to [`DEPENDENT_SAMPLE_LIMIT`] example labels plus the count
    /// of further dependents so callers can render an actionable message.
    #[error("Dependency exists: {message}")]
    DependencyExists {
        message: String,
        examples: Vec<String>,
        remaining: i64,
    },

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    Validation(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Maximum number of example dependents carried in a DependencyExists error
pub const DEPENDENT_SAMPLE_LIMIT: usize = 5;

impl Error {
    /// Build a DependencyExists error from the full list of blocking labels,
    /// sampling the first [`DEPENDENT_SAMPLE_LIMIT`] and counting the rest.
    pub fn dependency_exists(parent: &str, dependent_kind: &str, labels: Vec<String>) -> Self {
        let total = labels.len() as i64;
        let examples: Vec<String> = labels
            .into_iter()
            .take(DEPENDENT_SAMPLE_LIMIT)
            .collect();
        let remaining = total - examples.len() as i64;
        let message = if remaining > 0 {
            format!(
                "{} has {} dependent {} (e.g. {}, and {} more)",
                parent,
                total,
                dependent_kind,
                examples.join(", "),
                remaining
            )
        } else {
            format!(
                "{} has {} dependent {} ({})",
                parent,
                total,
                dependent_kind,
                examples.join(", ")
            )
        };
        Error::DependencyExists {
            message,
            examples,
            remaining,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dependency_exists_samples_at_most_five() {
        let labels: Vec<String> = (1..=8).map(|i| format!("ITEM-{i}")).collect();
        let err = Error::dependency_exists("effort DEMO", "items", labels);
        match err {
            Error::DependencyExists {
                examples,
                remaining,
                message,
            } => {
                assert_eq!(examples.len(), 5);
                assert_eq!(remaining, 3);
                assert!(message.contains("and 3 more"));
            }
            _ => panic!("expected DependencyExists"),
        }
    }

    #[test]
    fn test_dependency_exists_no_overflow_below_limit() {
        let err = Error::dependency_exists(
            "effort DEMO",
            "items",
            vec!["ITEM-1".to_string(), "ITEM-2".to_string()],
        );
        match err {
            Error::DependencyExists {
                examples, remaining, ..
            } => {
                assert_eq!(examples.len(), 2);
                assert_eq!(remaining, 0);
            }
            _ => panic!("expected DependencyExists"),
        }
    }
}
