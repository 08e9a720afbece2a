//! Shared row models and domain enums
//!
//! Status values are closed enums stored as TEXT; `as_str`/`parse` are the
//! single source of truth for the stored spelling. Serde uses the same
//! snake_case spelling so wire and storage forms never diverge.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Production workflow status for a tracker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductionStatus {
    NotStarted,
    InProgress,
    Completed,
    OnHold,
}

impl ProductionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductionStatus::NotStarted => "not_started",
            ProductionStatus::InProgress => "in_progress",
            ProductionStatus::Completed => "completed",
            ProductionStatus::OnHold => "on_hold",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "not_started" => Some(ProductionStatus::NotStarted),
            "in_progress" => Some(ProductionStatus::InProgress),
            "completed" => Some(ProductionStatus::Completed),
            "on_hold" => Some(ProductionStatus::OnHold),
            _ => None,
        }
    }
}

/// QC workflow status for a tracker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QcStatus {
    NotStarted,
    InProgress,
    Completed,
    Failed,
}

impl QcStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            QcStatus::NotStarted => "not_started",
            QcStatus::InProgress => "in_progress",
            QcStatus::Completed => "completed",
            QcStatus::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "not_started" => Some(QcStatus::NotStarted),
            "in_progress" => Some(QcStatus::InProgress),
            "completed" => Some(QcStatus::Completed),
            "failed" => Some(QcStatus::Failed),
            _ => None,
        }
    }
}

/// Which programmer slot an assignment targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentRole {
    Production,
    Qc,
}

impl AssignmentRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssignmentRole::Production => "production",
            AssignmentRole::Qc => "qc",
        }
    }
}

/// Deliverable kind for an item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemType {
    Tlf,
    Dataset,
}

impl ItemType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemType::Tlf => "tlf",
            ItemType::Dataset => "dataset",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "tlf" => Some(ItemType::Tlf),
            "dataset" => Some(ItemType::Dataset),
            _ => None,
        }
    }
}

/// Comment discipline category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommentCategory {
    Programming,
    Biostat,
}

impl CommentCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommentCategory::Programming => "programming",
            CommentCategory::Biostat => "biostat",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "programming" => Some(CommentCategory::Programming),
            "biostat" => Some(CommentCategory::Biostat),
            _ => None,
        }
    }
}

/// User role, a closed set driving the comment capability table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Programmer,
    Biostatistician,
    Lead,
    Admin,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Programmer => "programmer",
            UserRole::Biostatistician => "biostatistician",
            UserRole::Lead => "lead",
            UserRole::Admin => "admin",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "programmer" => Some(UserRole::Programmer),
            "biostatistician" => Some(UserRole::Biostatistician),
            "lead" => Some(UserRole::Lead),
            "admin" => Some(UserRole::Admin),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub guid: Uuid,
    pub username: String,
    pub display_name: String,
    pub role: UserRole,
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportingEffort {
    pub guid: Uuid,
    pub study_label: String,
    pub name: String,
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    pub guid: Uuid,
    pub effort_guid: Uuid,
    pub item_type: ItemType,
    pub subtype: Option<String>,
    pub code: String,
    pub is_active: bool,
}

/// One tracker per item, holding workflow state and the unresolved counter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tracker {
    pub guid: Uuid,
    pub item_guid: Uuid,
    pub production_programmer_guid: Option<Uuid>,
    pub qc_programmer_guid: Option<Uuid>,
    pub production_status: ProductionStatus,
    pub qc_status: QcStatus,
    pub priority: i64,
    pub qc_level: i64,
    pub due_date: Option<DateTime<Utc>>,
    pub qc_completed_at: Option<DateTime<Utc>>,
    /// Denormalized count of unresolved top-level comments. Mutated only by
    /// atomic SQL inside the comment engine's transactions.
    pub unresolved_comment_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub guid: Uuid,
    pub tracker_guid: Uuid,
    pub author_guid: Uuid,
    pub body: String,
    pub category: CommentCategory,
    /// None for top-level comments; only those are resolvable
    pub parent_guid: Option<Uuid>,
    pub is_resolved: bool,
    pub resolved_by: Option<Uuid>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tag {
    pub guid: Uuid,
    pub name: String,
    pub color: String,
}
