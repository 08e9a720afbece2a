//! Tracker workflow state machine
//!
//! Owns production/QC status transitions and programmer assignment for one
//! tracker row. Assignment side effects:
//! - production assignment auto-advances production not_started → in_progress
//! - qc assignment auto-advances qc not_started → in_progress only when
//!   production is already completed; otherwise the assignment is recorded
//!   and qc status is untouched
//! - unassignment regresses in_progress → not_started (for qc, failed too)
//!
//! Statuses have no terminal state: completed/failed remain mutable.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tlft_common::db::models::{
    AssignmentRole, ProductionStatus, QcStatus, Tracker,
};
use tlft_common::events::{EventBus, TrackerEvent};
use tlft_common::{Error, Result};
use tracing::info;
use uuid::Uuid;

use crate::audit;
use crate::db::{trackers, users};

/// Partial tracker update; absent fields are left untouched
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateFields {
    pub production_status: Option<ProductionStatus>,
    pub qc_status: Option<QcStatus>,
    pub priority: Option<i64>,
    pub qc_level: Option<i64>,
    pub due_date: Option<DateTime<Utc>>,
}

impl UpdateFields {
    fn is_empty(&self) -> bool {
        self.production_status.is_none()
            && self.qc_status.is_none()
            && self.priority.is_none()
            && self.qc_level.is_none()
            && self.due_date.is_none()
    }
}

/// Assign a programmer to one role slot of a tracker
pub async fn assign_programmer(
    pool: &SqlitePool,
    bus: &EventBus,
    tracker_guid: Uuid,
    user_guid: Uuid,
    role: AssignmentRole,
    actor: Option<Uuid>,
) -> Result<Tracker> {
    let user = users::load_user(pool, user_guid)
        .await?
        .ok_or_else(|| Error::NotFound(format!("user {user_guid} not found")))?;

    let mut tx = pool.begin().await?;
    let tracker = trackers::load_tracker(&mut *tx, tracker_guid)
        .await?
        .ok_or_else(|| Error::NotFound(format!("tracker {tracker_guid} not found")))?;

    match role {
        AssignmentRole::Production => {
            let new_status = if tracker.production_status == ProductionStatus::NotStarted {
                ProductionStatus::InProgress
            } else {
                tracker.production_status
            };
            sqlx::query(
                "UPDATE trackers SET production_programmer_guid = ?, production_status = ?, \
                 updated_at = CURRENT_TIMESTAMP WHERE guid = ?",
            )
            .bind(user.guid.to_string())
            .bind(new_status.as_str())
            .bind(tracker_guid.to_string())
            .execute(&mut *tx)
            .await?;
        }
        AssignmentRole::Qc => {
            // QC work cannot begin against incomplete production output
            let new_status = if tracker.qc_status == QcStatus::NotStarted
                && tracker.production_status == ProductionStatus::Completed
            {
                QcStatus::InProgress
            } else {
                tracker.qc_status
            };
            sqlx::query(
                "UPDATE trackers SET qc_programmer_guid = ?, qc_status = ?, \
                 updated_at = CURRENT_TIMESTAMP WHERE guid = ?",
            )
            .bind(user.guid.to_string())
            .bind(new_status.as_str())
            .bind(tracker_guid.to_string())
            .execute(&mut *tx)
            .await?;
        }
    }
    tx.commit().await?;

    let updated = trackers::load_tracker(pool, tracker_guid)
        .await?
        .ok_or_else(|| Error::Internal("tracker vanished after update".to_string()))?;

    info!(
        tracker = %tracker_guid,
        user = %user.username,
        role = role.as_str(),
        "Programmer assigned"
    );

    audit::record(
        pool,
        "tracker",
        tracker_guid,
        "assign_programmer",
        actor,
        Some(serde_json::to_value(&tracker).unwrap_or_default()),
        Some(serde_json::to_value(&updated).unwrap_or_default()),
    )
    .await;

    bus.emit(TrackerEvent::TrackerAssignmentUpdated {
        tracker: updated.clone(),
        role,
        user_guid: Some(user.guid),
        timestamp: Utc::now(),
    });

    Ok(updated)
}

/// Clear one role slot of a tracker
///
/// Fails with an invalid-operation error when nothing is assigned for the
/// role; otherwise always succeeds, regressing an in-flight status.
pub async fn unassign_programmer(
    pool: &SqlitePool,
    bus: &EventBus,
    tracker_guid: Uuid,
    role: AssignmentRole,
    actor: Option<Uuid>,
) -> Result<Tracker> {
    let mut tx = pool.begin().await?;
    let tracker = trackers::load_tracker(&mut *tx, tracker_guid)
        .await?
        .ok_or_else(|| Error::NotFound(format!("tracker {tracker_guid} not found")))?;

    match role {
        AssignmentRole::Production => {
            if tracker.production_programmer_guid.is_none() {
                return Err(Error::InvalidOperation(
                    "no production programmer assigned".to_string(),
                ));
            }
            let new_status = if tracker.production_status == ProductionStatus::InProgress {
                ProductionStatus::NotStarted
            } else {
                tracker.production_status
            };
            sqlx::query(
                "UPDATE trackers SET production_programmer_guid = NULL, production_status = ?, \
                 updated_at = CURRENT_TIMESTAMP WHERE guid = ?",
            )
            .bind(new_status.as_str())
            .bind(tracker_guid.to_string())
            .execute(&mut *tx)
            .await?;
        }
        AssignmentRole::Qc => {
            if tracker.qc_programmer_guid.is_none() {
                return Err(Error::InvalidOperation(
                    "no qc programmer assigned".to_string(),
                ));
            }
            let new_status = match tracker.qc_status {
                QcStatus::InProgress | QcStatus::Failed => QcStatus::NotStarted,
                other => other,
            };
            sqlx::query(
                "UPDATE trackers SET qc_programmer_guid = NULL, qc_status = ?, \
                 updated_at = CURRENT_TIMESTAMP WHERE guid = ?",
            )
            .bind(new_status.as_str())
            .bind(tracker_guid.to_string())
            .execute(&mut *tx)
            .await?;
        }
    }
    tx.commit().await?;

    let updated = trackers::load_tracker(pool, tracker_guid)
        .await?
        .ok_or_else(|| Error::Internal("tracker vanished after update".to_string()))?;

    audit::record(
        pool,
        "tracker",
        tracker_guid,
        "unassign_programmer",
        actor,
        Some(serde_json::to_value(&tracker).unwrap_or_default()),
        Some(serde_json::to_value(&updated).unwrap_or_default()),
    )
    .await;

    bus.emit(TrackerEvent::TrackerAssignmentUpdated {
        tracker: updated.clone(),
        role,
        user_guid: None,
        timestamp: Utc::now(),
    });

    Ok(updated)
}

/// Apply a partial field update to a tracker
///
/// Unknown status spellings are rejected before this function is reached
/// (serde only deserializes the enumerated values). The qc completion date
/// follows the qc status: set on entry to completed, cleared on exit.
pub async fn update_status(
    pool: &SqlitePool,
    bus: &EventBus,
    tracker_guid: Uuid,
    fields: &UpdateFields,
    actor: Option<Uuid>,
) -> Result<Tracker> {
    if fields.is_empty() {
        return Err(Error::Validation("no fields to update".to_string()));
    }

    let mut tx = pool.begin().await?;
    let tracker = trackers::load_tracker(&mut *tx, tracker_guid)
        .await?
        .ok_or_else(|| Error::NotFound(format!("tracker {tracker_guid} not found")))?;

    let production_status = fields.production_status.unwrap_or(tracker.production_status);
    let qc_status = fields.qc_status.unwrap_or(tracker.qc_status);
    let priority = fields.priority.unwrap_or(tracker.priority);
    let qc_level = fields.qc_level.unwrap_or(tracker.qc_level);
    let due_date = fields.due_date.or(tracker.due_date);

    let qc_completed_at = if qc_status == QcStatus::Completed {
        if tracker.qc_status == QcStatus::Completed {
            tracker.qc_completed_at
        } else {
            Some(Utc::now())
        }
    } else {
        None
    };

    sqlx::query(
        "UPDATE trackers SET production_status = ?, qc_status = ?, priority = ?, qc_level = ?, \
         due_date = ?, qc_completed_at = ?, updated_at = CURRENT_TIMESTAMP WHERE guid = ?",
    )
    .bind(production_status.as_str())
    .bind(qc_status.as_str())
    .bind(priority)
    .bind(qc_level)
    .bind(due_date)
    .bind(qc_completed_at)
    .bind(tracker_guid.to_string())
    .execute(&mut *tx)
    .await?;
    tx.commit().await?;

    let updated = trackers::load_tracker(pool, tracker_guid)
        .await?
        .ok_or_else(|| Error::Internal("tracker vanished after update".to_string()))?;

    audit::record(
        pool,
        "tracker",
        tracker_guid,
        "update_status",
        actor,
        Some(serde_json::to_value(&tracker).unwrap_or_default()),
        Some(serde_json::to_value(&updated).unwrap_or_default()),
    )
    .await;

    bus.emit(TrackerEvent::TrackerUpdated {
        tracker: updated.clone(),
        timestamp: Utc::now(),
    });

    Ok(updated)
}

/// Missing-id handling for bulk updates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BulkPolicy {
    /// Missing trackers are skipped and reported per item
    BestEffort,
    /// Any missing tracker fails the whole batch before writes begin
    Strict,
}

impl BulkPolicy {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "best_effort" => Some(BulkPolicy::BestEffort),
            "strict" => Some(BulkPolicy::Strict),
            _ => None,
        }
    }
}

/// One entry in a bulk update request
#[derive(Debug, Clone, Deserialize)]
pub struct BulkEntry {
    pub tracker_guid: Uuid,
    #[serde(flatten)]
    pub fields: UpdateFields,
}

/// Per-item outcome of a bulk update
#[derive(Debug, Clone, Serialize)]
pub struct BulkItemResult {
    pub tracker_guid: Uuid,
    pub outcome: BulkOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BulkOutcome {
    Updated,
    Skipped,
    Error,
}

/// Apply field updates to many trackers
///
/// Never aborts mid-batch under BestEffort: each entry gets its own outcome.
/// Under Strict the batch is checked up front and fails before any write.
pub async fn bulk_update(
    pool: &SqlitePool,
    bus: &EventBus,
    entries: &[BulkEntry],
    policy: BulkPolicy,
    actor: Option<Uuid>,
) -> Result<Vec<BulkItemResult>> {
    if policy == BulkPolicy::Strict {
        for entry in entries {
            if trackers::load_tracker(pool, entry.tracker_guid).await?.is_none() {
                return Err(Error::NotFound(format!(
                    "tracker {} not found (strict bulk update)",
                    entry.tracker_guid
                )));
            }
        }
    }

    let mut results = Vec::with_capacity(entries.len());
    for entry in entries {
        let outcome = update_status(pool, bus, entry.tracker_guid, &entry.fields, actor).await;
        results.push(match outcome {
            Ok(_) => BulkItemResult {
                tracker_guid: entry.tracker_guid,
                outcome: BulkOutcome::Updated,
                error: None,
            },
            Err(Error::NotFound(_)) => BulkItemResult {
                tracker_guid: entry.tracker_guid,
                outcome: BulkOutcome::Skipped,
                error: None,
            },
            Err(e) => BulkItemResult {
                tracker_guid: entry.tracker_guid,
                outcome: BulkOutcome::Error,
                error: Some(e.to_string()),
            },
        });
    }
    Ok(results)
}
