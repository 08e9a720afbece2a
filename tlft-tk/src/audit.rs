//! Audit recorder
//!
//! Receives a structured before/after diff for every mutating operation.
//! Recording is best-effort: a failed insert is logged and dropped, and must
//! never roll back or mask the primary mutation's outcome.

use sqlx::SqlitePool;
use tracing::warn;
use uuid::Uuid;

/// Record one audit entry, swallowing failures
pub async fn record(
    pool: &SqlitePool,
    entity: &str,
    entity_guid: Uuid,
    action: &str,
    actor: Option<Uuid>,
    before: Option<serde_json::Value>,
    after: Option<serde_json::Value>,
) {
    let result = sqlx::query(
        r#"
        INSERT INTO audit_log (entity, entity_guid, action, actor_guid, before_json, after_json)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(entity)
    .bind(entity_guid.to_string())
    .bind(action)
    .bind(actor.map(|a| a.to_string()))
    .bind(before.map(|v| v.to_string()))
    .bind(after.map(|v| v.to_string()))
    .execute(pool)
    .await;

    if let Err(e) = result {
        warn!(entity, action, "Audit record failed: {e}");
    }
}
