//! Tracker database operations
//!
//! Status/assignment writes live in the workflow module; this module owns
//! row loading and the read paths (by item, by programmer, by status, by
//! effort). Counter mutations are never issued from here.

use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};
use tlft_common::db::models::{AssignmentRole, ProductionStatus, QcStatus, Tracker};
use tlft_common::{Error, Result};
use uuid::Uuid;

use super::{parse_guid, parse_opt_guid};

fn row_to_tracker(row: &sqlx::sqlite::SqliteRow) -> Result<Tracker> {
    let guid: String = row.get("guid");
    let item_guid: String = row.get("item_guid");
    let production_status: String = row.get("production_status");
    let qc_status: String = row.get("qc_status");
    Ok(Tracker {
        guid: parse_guid(&guid)?,
        item_guid: parse_guid(&item_guid)?,
        production_programmer_guid: parse_opt_guid(row.get("production_programmer_guid"))?,
        qc_programmer_guid: parse_opt_guid(row.get("qc_programmer_guid"))?,
        production_status: ProductionStatus::parse(&production_status).ok_or_else(|| {
            Error::Internal(format!(
                "unknown production status in database: {production_status}"
            ))
        })?,
        qc_status: QcStatus::parse(&qc_status)
            .ok_or_else(|| Error::Internal(format!("unknown qc status in database: {qc_status}")))?,
        priority: row.get("priority"),
        qc_level: row.get("qc_level"),
        due_date: row.try_get::<Option<DateTime<Utc>>, _>("due_date")?,
        qc_completed_at: row.try_get::<Option<DateTime<Utc>>, _>("qc_completed_at")?,
        unresolved_comment_count: row.get("unresolved_comment_count"),
        created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
        updated_at: row.try_get::<DateTime<Utc>, _>("updated_at")?,
    })
}

const TRACKER_COLUMNS: &str = "guid, item_guid, production_programmer_guid, qc_programmer_guid, \
     production_status, qc_status, priority, qc_level, due_date, qc_completed_at, \
     unresolved_comment_count, created_at, updated_at";

/// Load tracker by guid
pub async fn load_tracker<'e, E>(executor: E, guid: Uuid) -> Result<Option<Tracker>>
where
    E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
{
    let sql = format!("SELECT {TRACKER_COLUMNS} FROM trackers WHERE guid = ?");
    let row = sqlx::query(&sql)
        .bind(guid.to_string())
        .fetch_optional(executor)
        .await?;

    match row {
        Some(row) => Ok(Some(row_to_tracker(&row)?)),
        None => Ok(None),
    }
}

/// Load tracker by owning item
pub async fn load_tracker_by_item(pool: &SqlitePool, item_guid: Uuid) -> Result<Option<Tracker>> {
    let sql = format!("SELECT {TRACKER_COLUMNS} FROM trackers WHERE item_guid = ?");
    let row = sqlx::query(&sql)
        .bind(item_guid.to_string())
        .fetch_optional(pool)
        .await?;

    match row {
        Some(row) => Ok(Some(row_to_tracker(&row)?)),
        None => Ok(None),
    }
}

/// Trackers assigned to a programmer in one role slot, offset/limit
pub async fn list_by_programmer(
    pool: &SqlitePool,
    user_guid: Uuid,
    role: AssignmentRole,
    offset: i64,
    limit: i64,
) -> Result<Vec<Tracker>> {
    let column = match role {
        AssignmentRole::Production => "production_programmer_guid",
        AssignmentRole::Qc => "qc_programmer_guid",
    };
    let sql = format!(
        "SELECT {TRACKER_COLUMNS} FROM trackers WHERE {column} = ? \
         ORDER BY priority, created_at LIMIT ? OFFSET ?"
    );
    let rows = sqlx::query(&sql)
        .bind(user_guid.to_string())
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;

    rows.iter().map(row_to_tracker).collect()
}

/// Optional status/assignment filters for the tracker list endpoint
#[derive(Debug, Clone, Copy, Default)]
pub struct StatusFilters {
    pub production_status: Option<ProductionStatus>,
    pub qc_status: Option<QcStatus>,
    pub production_programmer: Option<Uuid>,
    pub qc_programmer: Option<Uuid>,
}

/// Trackers matching the given filters, offset/limit
pub async fn list_by_status(
    pool: &SqlitePool,
    filters: StatusFilters,
    offset: i64,
    limit: i64,
) -> Result<Vec<Tracker>> {
    let mut sql = format!("SELECT {TRACKER_COLUMNS} FROM trackers WHERE 1=1");
    if filters.production_status.is_some() {
        sql.push_str(" AND production_status = ?");
    }
    if filters.qc_status.is_some() {
        sql.push_str(" AND qc_status = ?");
    }
    if filters.production_programmer.is_some() {
        sql.push_str(" AND production_programmer_guid = ?");
    }
    if filters.qc_programmer.is_some() {
        sql.push_str(" AND qc_programmer_guid = ?");
    }
    sql.push_str(" ORDER BY priority, created_at LIMIT ? OFFSET ?");

    let mut query = sqlx::query(&sql);
    if let Some(s) = filters.production_status {
        query = query.bind(s.as_str());
    }
    if let Some(s) = filters.qc_status {
        query = query.bind(s.as_str());
    }
    if let Some(u) = filters.production_programmer {
        query = query.bind(u.to_string());
    }
    if let Some(u) = filters.qc_programmer {
        query = query.bind(u.to_string());
    }
    let rows = query.bind(limit).bind(offset).fetch_all(pool).await?;

    rows.iter().map(row_to_tracker).collect()
}

/// All trackers under a reporting effort
pub async fn list_by_effort(pool: &SqlitePool, effort_guid: Uuid) -> Result<Vec<Tracker>> {
    let sql = format!(
        "SELECT t.guid AS guid, t.item_guid AS item_guid, \
                t.production_programmer_guid AS production_programmer_guid, \
                t.qc_programmer_guid AS qc_programmer_guid, \
                t.production_status AS production_status, t.qc_status AS qc_status, \
                t.priority AS priority, t.qc_level AS qc_level, t.due_date AS due_date, \
                t.qc_completed_at AS qc_completed_at, \
                t.unresolved_comment_count AS unresolved_comment_count, \
                t.created_at AS created_at, t.updated_at AS updated_at \
         FROM trackers t \
         JOIN items i ON i.guid = t.item_guid \
         WHERE i.effort_guid = ? \
         ORDER BY i.code"
    );
    let rows = sqlx::query(&sql)
        .bind(effort_guid.to_string())
        .fetch_all(pool)
        .await?;

    rows.iter().map(row_to_tracker).collect()
}

/// All trackers (SSE snapshot on connect)
pub async fn list_all(pool: &SqlitePool) -> Result<Vec<Tracker>> {
    let sql = format!("SELECT {TRACKER_COLUMNS} FROM trackers ORDER BY created_at");
    let rows = sqlx::query(&sql).fetch_all(pool).await?;
    rows.iter().map(row_to_tracker).collect()
}
