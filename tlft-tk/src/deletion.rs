//! Deletion protection
//!
//! Pre-flight dependency checks that refuse a destructive operation with an
//! actionable error instead of relying on storage-layer behavior alone. Some
//! cascades are intentional (item → tracker → comments); others are manually
//! blocked so an operator must clear the children first. The check is a
//! fast-fail UX layer: a dependent created between check and delete still
//! fails at the foreign-key constraint.

use chrono::Utc;
use sqlx::SqlitePool;
use tlft_common::db::models::Item;
use tlft_common::events::{EventBus, TrackerEvent};
use tlft_common::{Error, Result};
use tracing::info;
use uuid::Uuid;

use crate::audit;
use crate::db::{efforts, items, trackers};

/// Refuse when dependents exist, sampling a few labels for the error
pub fn check_dependents(parent: &str, dependent_kind: &str, labels: Vec<String>) -> Result<()> {
    if labels.is_empty() {
        Ok(())
    } else {
        Err(Error::dependency_exists(parent, dependent_kind, labels))
    }
}

/// Delete an item and cascade its tracker and comments
///
/// Blocked while either programmer slot is assigned: unassign first. The
/// cascade itself is the foreign-key layer's job.
pub async fn delete_item(
    pool: &SqlitePool,
    bus: &EventBus,
    item_guid: Uuid,
    actor: Option<Uuid>,
) -> Result<Item> {
    let item = items::load_item(pool, item_guid)
        .await?
        .ok_or_else(|| Error::NotFound(format!("item {item_guid} not found")))?;

    let tracker = trackers::load_tracker_by_item(pool, item_guid).await?;
    if let Some(tracker) = &tracker {
        if tracker.production_programmer_guid.is_some() || tracker.qc_programmer_guid.is_some() {
            return Err(Error::Forbidden(format!(
                "item {} has assigned programmers; unassign before deleting",
                item.code
            )));
        }
    }

    let mut tx = pool.begin().await?;
    sqlx::query("DELETE FROM items WHERE guid = ?")
        .bind(item_guid.to_string())
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    info!(item = %item_guid, code = %item.code, "Item deleted");

    audit::record(
        pool,
        "item",
        item_guid,
        "delete",
        actor,
        Some(serde_json::to_value(&item).unwrap_or_default()),
        None,
    )
    .await;

    if let Some(tracker) = tracker {
        bus.emit(TrackerEvent::TrackerDeleted {
            tracker_guid: tracker.guid,
            item_guid,
            timestamp: Utc::now(),
        });
    }

    Ok(item)
}

/// Delete a reporting effort, refused while items exist
pub async fn delete_effort(pool: &SqlitePool, effort_guid: Uuid, actor: Option<Uuid>) -> Result<()> {
    let effort = efforts::load_effort(pool, effort_guid)
        .await?
        .ok_or_else(|| Error::NotFound(format!("reporting effort {effort_guid} not found")))?;

    let codes = efforts::list_item_codes(pool, effort_guid).await?;
    check_dependents(
        &format!("reporting effort {}/{}", effort.study_label, effort.name),
        "items",
        codes,
    )?;

    sqlx::query("DELETE FROM reporting_efforts WHERE guid = ?")
        .bind(effort_guid.to_string())
        .execute(pool)
        .await?;

    audit::record(
        pool,
        "reporting_effort",
        effort_guid,
        "delete",
        actor,
        Some(serde_json::to_value(&effort).unwrap_or_default()),
        None,
    )
    .await;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_dependents_empty_passes() {
        assert!(check_dependents("study ABC-001", "releases", vec![]).is_ok());
    }

    #[test]
    fn test_check_dependents_reports_sample() {
        let labels: Vec<String> = (1..=7).map(|i| format!("T-14.{i}")).collect();
        let err = check_dependents("effort CSR", "items", labels).unwrap_err();
        match err {
            Error::DependencyExists {
                examples,
                remaining,
                ..
            } => {
                assert_eq!(examples.len(), 5);
                assert_eq!(remaining, 2);
            }
            _ => panic!("expected DependencyExists"),
        }
    }
}
