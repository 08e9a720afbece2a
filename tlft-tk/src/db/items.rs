//! Item database operations
//!
//! Item creation always creates the owning tracker in the same transaction:
//! there is no moment where an item exists without its tracker.

use sqlx::{Row, SqlitePool};
use tlft_common::db::models::{Item, ItemType, Tracker};
use tlft_common::{Error, Result};
use uuid::Uuid;

use super::{parse_guid, trackers};

fn row_to_item(row: &sqlx::sqlite::SqliteRow) -> Result<Item> {
    let guid: String = row.get("guid");
    let effort_guid: String = row.get("effort_guid");
    let item_type: String = row.get("item_type");
    Ok(Item {
        guid: parse_guid(&guid)?,
        effort_guid: parse_guid(&effort_guid)?,
        item_type: ItemType::parse(&item_type)
            .ok_or_else(|| Error::Internal(format!("unknown item type in database: {item_type}")))?,
        subtype: row.get("subtype"),
        code: row.get("code"),
        is_active: row.get::<i64, _>("is_active") != 0,
    })
}

/// Load item by guid
pub async fn load_item(pool: &SqlitePool, guid: Uuid) -> Result<Option<Item>> {
    let row = sqlx::query(
        "SELECT guid, effort_guid, item_type, subtype, code, is_active FROM items WHERE guid = ?",
    )
    .bind(guid.to_string())
    .fetch_optional(pool)
    .await?;

    match row {
        Some(row) => Ok(Some(row_to_item(&row)?)),
        None => Ok(None),
    }
}

/// Create item and its tracker atomically
///
/// Fails with NotFound when the effort is missing and Conflict when the
/// (effort, code) pair already exists.
pub async fn create_item_with_tracker(pool: &SqlitePool, item: &Item) -> Result<Tracker> {
    let effort_exists: Option<i64> =
        sqlx::query_scalar("SELECT 1 FROM reporting_efforts WHERE guid = ?")
            .bind(item.effort_guid.to_string())
            .fetch_optional(pool)
            .await?;
    if effort_exists.is_none() {
        return Err(Error::NotFound(format!(
            "reporting effort {} not found",
            item.effort_guid
        )));
    }

    let mut tx = pool.begin().await?;

    let insert = sqlx::query(
        r#"
        INSERT INTO items (guid, effort_guid, item_type, subtype, code, is_active)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(item.guid.to_string())
    .bind(item.effort_guid.to_string())
    .bind(item.item_type.as_str())
    .bind(&item.subtype)
    .bind(&item.code)
    .bind(item.is_active as i64)
    .execute(&mut *tx)
    .await;

    if let Err(e) = insert {
        if e.as_database_error()
            .map(|d| d.is_unique_violation())
            .unwrap_or(false)
        {
            return Err(Error::Conflict(format!(
                "item code {} already exists in effort {}",
                item.code, item.effort_guid
            )));
        }
        return Err(e.into());
    }

    let tracker_guid = Uuid::new_v4();
    sqlx::query("INSERT INTO trackers (guid, item_guid) VALUES (?, ?)")
        .bind(tracker_guid.to_string())
        .bind(item.guid.to_string())
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    trackers::load_tracker(pool, tracker_guid)
        .await?
        .ok_or_else(|| Error::Internal("tracker vanished after creation".to_string()))
}

/// Create a tracker for an existing item
///
/// NotFound when the item is missing; Conflict when the item already has one.
pub async fn create_tracker_for_item(pool: &SqlitePool, item_guid: Uuid) -> Result<Tracker> {
    let item = load_item(pool, item_guid)
        .await?
        .ok_or_else(|| Error::NotFound(format!("item {item_guid} not found")))?;

    let tracker_guid = Uuid::new_v4();
    let insert = sqlx::query("INSERT INTO trackers (guid, item_guid) VALUES (?, ?)")
        .bind(tracker_guid.to_string())
        .bind(item.guid.to_string())
        .execute(pool)
        .await;

    if let Err(e) = insert {
        if e.as_database_error()
            .map(|d| d.is_unique_violation())
            .unwrap_or(false)
        {
            return Err(Error::Conflict(format!(
                "item {item_guid} already has a tracker"
            )));
        }
        return Err(e.into());
    }

    trackers::load_tracker(pool, tracker_guid)
        .await?
        .ok_or_else(|| Error::Internal("tracker vanished after creation".to_string()))
}

/// New item value with defaults applied
pub fn new_item(effort_guid: Uuid, item_type: ItemType, subtype: Option<String>, code: String) -> Item {
    Item {
        guid: Uuid::new_v4(),
        effort_guid,
        item_type,
        subtype,
        code,
        is_active: true,
    }
}
