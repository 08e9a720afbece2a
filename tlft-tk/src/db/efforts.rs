//! Reporting effort database operations
//!
//! Full study/release CRUD is handled by a separate service; the tracker
//! service only needs the effort rows items hang off, plus the dependent
//! listing used by deletion protection.

use sqlx::{Row, SqlitePool};
use tlft_common::db::models::ReportingEffort;
use tlft_common::Result;
use uuid::Uuid;

use super::parse_guid;

/// Load effort by guid
pub async fn load_effort(pool: &SqlitePool, guid: Uuid) -> Result<Option<ReportingEffort>> {
    let row = sqlx::query(
        "SELECT guid, study_label, name, is_active FROM reporting_efforts WHERE guid = ?",
    )
    .bind(guid.to_string())
    .fetch_optional(pool)
    .await?;

    match row {
        Some(row) => {
            let guid: String = row.get("guid");
            Ok(Some(ReportingEffort {
                guid: parse_guid(&guid)?,
                study_label: row.get("study_label"),
                name: row.get("name"),
                is_active: row.get::<i64, _>("is_active") != 0,
            }))
        }
        None => Ok(None),
    }
}

/// Save effort to database
pub async fn save_effort(pool: &SqlitePool, effort: &ReportingEffort) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO reporting_efforts (guid, study_label, name, is_active, created_at, updated_at)
        VALUES (?, ?, ?, ?, CURRENT_TIMESTAMP, CURRENT_TIMESTAMP)
        ON CONFLICT(study_label, name) DO UPDATE SET
            is_active = excluded.is_active,
            updated_at = CURRENT_TIMESTAMP
        "#,
    )
    .bind(effort.guid.to_string())
    .bind(&effort.study_label)
    .bind(&effort.name)
    .bind(effort.is_active as i64)
    .execute(pool)
    .await?;

    Ok(())
}

/// Item codes under an effort, creation order (deletion-protection sampling)
pub async fn list_item_codes(pool: &SqlitePool, effort_guid: Uuid) -> Result<Vec<String>> {
    let rows = sqlx::query(
        "SELECT code FROM items WHERE effort_guid = ? ORDER BY created_at, code",
    )
    .bind(effort_guid.to_string())
    .fetch_all(pool)
    .await?;

    Ok(rows.iter().map(|r| r.get("code")).collect())
}
