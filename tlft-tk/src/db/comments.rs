//! Comment read paths and row mapping
//!
//! All writes that can touch the unresolved counter are issued by the
//! comment engine inside its transactions; this module owns row parsing,
//! thread retrieval, and the derived summary that cross-checks the counter.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{Row, SqlitePool};
use tlft_common::db::models::{Comment, CommentCategory};
use tlft_common::{Error, Result};
use uuid::Uuid;

use super::{parse_guid, parse_opt_guid};

fn row_to_comment(row: &sqlx::sqlite::SqliteRow) -> Result<Comment> {
    let guid: String = row.get("guid");
    let tracker_guid: String = row.get("tracker_guid");
    let author_guid: String = row.get("author_guid");
    let category: String = row.get("category");
    Ok(Comment {
        guid: parse_guid(&guid)?,
        tracker_guid: parse_guid(&tracker_guid)?,
        author_guid: parse_guid(&author_guid)?,
        body: row.get("body"),
        category: CommentCategory::parse(&category)
            .ok_or_else(|| Error::Internal(format!("unknown category in database: {category}")))?,
        parent_guid: parse_opt_guid(row.get("parent_guid"))?,
        is_resolved: row.get::<i64, _>("is_resolved") != 0,
        resolved_by: parse_opt_guid(row.get("resolved_by"))?,
        resolved_at: row.try_get::<Option<DateTime<Utc>>, _>("resolved_at")?,
        is_deleted: row.get::<i64, _>("is_deleted") != 0,
        created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
        updated_at: row.try_get::<DateTime<Utc>, _>("updated_at")?,
    })
}

const COMMENT_COLUMNS: &str =
    "guid, tracker_guid, author_guid, body, category, parent_guid, is_resolved, \
     resolved_by, resolved_at, is_deleted, created_at, updated_at";

/// Load comment by guid (soft-deleted rows included; callers decide)
pub async fn load_comment<'e, E>(executor: E, guid: Uuid) -> Result<Option<Comment>>
where
    E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
{
    let sql = format!("SELECT {COMMENT_COLUMNS} FROM comments WHERE guid = ?");
    let row = sqlx::query(&sql)
        .bind(guid.to_string())
        .fetch_optional(executor)
        .await?;

    match row {
        Some(row) => Ok(Some(row_to_comment(&row)?)),
        None => Ok(None),
    }
}

/// One top-level comment with its visible replies
#[derive(Debug, Clone, Serialize)]
pub struct CommentThread {
    #[serde(flatten)]
    pub comment: Comment,
    pub replies: Vec<Comment>,
}

/// Threads for a tracker: newest thread first, replies oldest-first
///
/// Soft-deleted top-level comments are filtered out, which hides their
/// replies as well; soft-deleted replies are filtered individually.
pub async fn list_threads(pool: &SqlitePool, tracker_guid: Uuid) -> Result<Vec<CommentThread>> {
    let sql = format!(
        "SELECT {COMMENT_COLUMNS} FROM comments \
         WHERE tracker_guid = ? AND parent_guid IS NULL AND is_deleted = 0 \
         ORDER BY created_at DESC"
    );
    let top_rows = sqlx::query(&sql)
        .bind(tracker_guid.to_string())
        .fetch_all(pool)
        .await?;

    let mut threads = Vec::with_capacity(top_rows.len());
    for row in &top_rows {
        let comment = row_to_comment(row)?;
        let replies = list_replies(pool, comment.guid).await?;
        threads.push(CommentThread { comment, replies });
    }
    Ok(threads)
}

/// Visible replies to one comment, oldest first
pub async fn list_replies(pool: &SqlitePool, parent_guid: Uuid) -> Result<Vec<Comment>> {
    let sql = format!(
        "SELECT {COMMENT_COLUMNS} FROM comments \
         WHERE parent_guid = ? AND is_deleted = 0 \
         ORDER BY created_at"
    );
    let rows = sqlx::query(&sql)
        .bind(parent_guid.to_string())
        .fetch_all(pool)
        .await?;

    rows.iter().map(row_to_comment).collect()
}

/// Per-category slice of the comment summary
#[derive(Debug, Clone, Serialize)]
pub struct CategorySummary {
    pub category: CommentCategory,
    pub total: i64,
    pub unresolved: i64,
    pub resolved: i64,
}

/// Comment counts derived from live rows, never from the cached counter
///
/// Serves as the reconciliation oracle for `unresolved_comment_count`.
#[derive(Debug, Clone, Serialize)]
pub struct CommentSummary {
    pub total: i64,
    pub unresolved: i64,
    pub resolved: i64,
    pub by_category: Vec<CategorySummary>,
}

/// Derived summary of top-level comments for a tracker
pub async fn summary(pool: &SqlitePool, tracker_guid: Uuid) -> Result<CommentSummary> {
    let rows = sqlx::query(
        r#"
        SELECT category,
               COUNT(*) AS total,
               SUM(CASE WHEN is_resolved = 0 THEN 1 ELSE 0 END) AS unresolved,
               SUM(CASE WHEN is_resolved = 1 THEN 1 ELSE 0 END) AS resolved
        FROM comments
        WHERE tracker_guid = ? AND parent_guid IS NULL AND is_deleted = 0
        GROUP BY category
        ORDER BY category
        "#,
    )
    .bind(tracker_guid.to_string())
    .fetch_all(pool)
    .await?;

    let mut summary = CommentSummary {
        total: 0,
        unresolved: 0,
        resolved: 0,
        by_category: Vec::with_capacity(rows.len()),
    };
    for row in &rows {
        let category: String = row.get("category");
        let category = CommentCategory::parse(&category)
            .ok_or_else(|| Error::Internal(format!("unknown category in database: {category}")))?;
        let slice = CategorySummary {
            category,
            total: row.get("total"),
            unresolved: row.get("unresolved"),
            resolved: row.get("resolved"),
        };
        summary.total += slice.total;
        summary.unresolved += slice.unresolved;
        summary.resolved += slice.resolved;
        summary.by_category.push(slice);
    }
    Ok(summary)
}
