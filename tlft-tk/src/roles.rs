//! Role capabilities for comment operations
//!
//! Which roles may create which comment categories is an explicit table, not
//! inline branching. Moderation (soft-deleting another author's comment)
//! requires an elevated role.

use tlft_common::db::models::{CommentCategory, UserRole};

/// Comment categories a role may create
pub fn allowed_categories(role: UserRole) -> &'static [CommentCategory] {
    match role {
        UserRole::Programmer => &[CommentCategory::Programming],
        UserRole::Biostatistician => &[CommentCategory::Biostat],
        UserRole::Lead | UserRole::Admin => {
            &[CommentCategory::Programming, CommentCategory::Biostat]
        }
    }
}

/// Whether a role may create a comment of the given category
pub fn may_create_category(role: UserRole, category: CommentCategory) -> bool {
    allowed_categories(role).contains(&category)
}

/// Elevated roles may moderate other authors' comments
pub fn is_elevated(role: UserRole) -> bool {
    matches!(role, UserRole::Lead | UserRole::Admin)
}
