//! Tag database operations
//!
//! Tracker–tag association is a pure join pair with set semantics: attach is
//! idempotent, detach of an absent pair is a no-op.

use sqlx::{Row, SqlitePool};
use tlft_common::db::models::Tag;
use tlft_common::{Error, Result};
use uuid::Uuid;

use super::parse_guid;

fn row_to_tag(row: &sqlx::sqlite::SqliteRow) -> Result<Tag> {
    let guid: String = row.get("guid");
    Ok(Tag {
        guid: parse_guid(&guid)?,
        name: row.get("name"),
        color: row.get("color"),
    })
}

/// Save tag to database
pub async fn save_tag(pool: &SqlitePool, tag: &Tag) -> Result<()> {
    let insert = sqlx::query("INSERT INTO tags (guid, name, color) VALUES (?, ?, ?)")
        .bind(tag.guid.to_string())
        .bind(&tag.name)
        .bind(&tag.color)
        .execute(pool)
        .await;

    if let Err(e) = insert {
        if e.as_database_error()
            .map(|d| d.is_unique_violation())
            .unwrap_or(false)
        {
            return Err(Error::Conflict(format!("tag {} already exists", tag.name)));
        }
        return Err(e.into());
    }
    Ok(())
}

/// List all tags, name order
pub async fn list_tags(pool: &SqlitePool) -> Result<Vec<Tag>> {
    let rows = sqlx::query("SELECT guid, name, color FROM tags ORDER BY name")
        .fetch_all(pool)
        .await?;
    rows.iter().map(row_to_tag).collect()
}

/// Load tag by guid
pub async fn load_tag(pool: &SqlitePool, guid: Uuid) -> Result<Option<Tag>> {
    let row = sqlx::query("SELECT guid, name, color FROM tags WHERE guid = ?")
        .bind(guid.to_string())
        .fetch_optional(pool)
        .await?;
    match row {
        Some(row) => Ok(Some(row_to_tag(&row)?)),
        None => Ok(None),
    }
}

/// Attach tag to tracker (idempotent)
pub async fn attach_tag(pool: &SqlitePool, tracker_guid: Uuid, tag_guid: Uuid) -> Result<()> {
    sqlx::query("INSERT OR IGNORE INTO tracker_tags (tracker_guid, tag_guid) VALUES (?, ?)")
        .bind(tracker_guid.to_string())
        .bind(tag_guid.to_string())
        .execute(pool)
        .await?;
    Ok(())
}

/// Detach tag from tracker (no-op when absent)
pub async fn detach_tag(pool: &SqlitePool, tracker_guid: Uuid, tag_guid: Uuid) -> Result<()> {
    sqlx::query("DELETE FROM tracker_tags WHERE tracker_guid = ? AND tag_guid = ?")
        .bind(tracker_guid.to_string())
        .bind(tag_guid.to_string())
        .execute(pool)
        .await?;
    Ok(())
}

/// Tags attached to a tracker, name order
pub async fn list_tags_for_tracker(pool: &SqlitePool, tracker_guid: Uuid) -> Result<Vec<Tag>> {
    let rows = sqlx::query(
        "SELECT t.guid AS guid, t.name AS name, t.color AS color
         FROM tags t
         JOIN tracker_tags tt ON tt.tag_guid = t.guid
         WHERE tt.tracker_guid = ?
         ORDER BY t.name",
    )
    .bind(tracker_guid.to_string())
    .fetch_all(pool)
    .await?;
    rows.iter().map(row_to_tag).collect()
}
