//! Shared API request/response types
//!
//! Wire shapes used by every TLFT service endpoint: the error envelope and
//! the offset/limit pagination query.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Error envelope returned for every failure
///
/// `code` is the stable machine-readable error kind; `message` is the
/// human-readable detail; `details` carries structured extras (e.g. the
/// blocking-dependent sample for DEPENDENCY_EXISTS).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

impl ErrorResponse {
    pub fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            error: ErrorBody {
                code: code.to_string(),
                message: message.into(),
                details: None,
            },
        }
    }

    pub fn with_details(code: &str, message: impl Into<String>, details: Value) -> Self {
        Self {
            error: ErrorBody {
                code: code.to_string(),
                message: message.into(),
                details: Some(details),
            },
        }
    }
}

/// Default page size for list endpoints
pub const DEFAULT_LIMIT: i64 = 100;

/// Upper bound on requested page size
pub const MAX_LIMIT: i64 = 500;

/// Offset/limit pagination: skip N, take M
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PageQuery {
    #[serde(default)]
    pub offset: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    DEFAULT_LIMIT
}

impl Default for PageQuery {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl PageQuery {
    /// Clamp to sane bounds: offset never negative, limit in [1, MAX_LIMIT]
    pub fn clamped(&self) -> (i64, i64) {
        let offset = self.offset.max(0);
        let limit = self.limit.clamp(1, MAX_LIMIT);
        (offset, limit)
    }
}
