//! Comment consistency engine
//!
//! Owns every write that can touch a tracker's unresolved_comment_count and
//! guarantees the invariant: the counter equals the live count of unresolved
//! top-level comments. Each operation runs in a single transaction, and the
//! state flip is a guarded UPDATE whose affected-row count decides whether
//! the counter moves, so two racing resolves can only decrement once.

use chrono::Utc;
use sqlx::SqlitePool;
use tlft_common::db::models::{Comment, CommentCategory, Tracker, User};
use tlft_common::events::{EventBus, TrackerEvent};
use tlft_common::{Error, Result};
use tracing::info;
use uuid::Uuid;

use crate::audit;
use crate::db::comments as comment_rows;
use crate::db::comments::CommentThread;
use crate::db::trackers;
use crate::roles;

/// Input for comment creation
#[derive(Debug, Clone)]
pub struct NewComment {
    pub tracker_guid: Uuid,
    pub body: String,
    pub category: CommentCategory,
    pub parent_guid: Option<Uuid>,
}

async fn load_live_comment(pool: &SqlitePool, guid: Uuid) -> Result<Comment> {
    let comment = comment_rows::load_comment(pool, guid)
        .await?
        .ok_or_else(|| Error::NotFound(format!("comment {guid} not found")))?;
    if comment.is_deleted {
        return Err(Error::NotFound(format!("comment {guid} not found")));
    }
    Ok(comment)
}

async fn current_count(pool: &SqlitePool, tracker_guid: Uuid) -> Result<i64> {
    let tracker = trackers::load_tracker(pool, tracker_guid)
        .await?
        .ok_or_else(|| Error::Internal("tracker vanished".to_string()))?;
    Ok(tracker.unresolved_comment_count)
}

/// Create a comment, incrementing the counter atomically for top-level posts
pub async fn create_comment(
    pool: &SqlitePool,
    bus: &EventBus,
    author: &User,
    new: &NewComment,
) -> Result<Comment> {
    if new.body.trim().is_empty() {
        return Err(Error::Validation("comment body must not be empty".to_string()));
    }
    if !roles::may_create_category(author.role, new.category) {
        return Err(Error::Forbidden(format!(
            "role {} may not create {} comments",
            author.role.as_str(),
            new.category.as_str()
        )));
    }

    let tracker = trackers::load_tracker(pool, new.tracker_guid)
        .await?
        .ok_or_else(|| Error::NotFound(format!("tracker {} not found", new.tracker_guid)))?;

    if let Some(parent_guid) = new.parent_guid {
        let parent = load_live_comment(pool, parent_guid).await?;
        if parent.tracker_guid != tracker.guid {
            return Err(Error::Validation(format!(
                "parent comment {parent_guid} belongs to a different tracker"
            )));
        }
    }

    let guid = Uuid::new_v4();
    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        INSERT INTO comments (guid, tracker_guid, author_guid, body, category, parent_guid)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(guid.to_string())
    .bind(tracker.guid.to_string())
    .bind(author.guid.to_string())
    .bind(&new.body)
    .bind(new.category.as_str())
    .bind(new.parent_guid.map(|p| p.to_string()))
    .execute(&mut *tx)
    .await?;

    // The comment and the counter move together or not at all
    if new.parent_guid.is_none() {
        sqlx::query(
            "UPDATE trackers SET unresolved_comment_count = unresolved_comment_count + 1, \
             updated_at = CURRENT_TIMESTAMP WHERE guid = ?",
        )
        .bind(tracker.guid.to_string())
        .execute(&mut *tx)
        .await?;
    }
    tx.commit().await?;

    let comment = load_live_comment(pool, guid).await?;
    let count = current_count(pool, tracker.guid).await?;

    info!(
        comment = %guid,
        tracker = %tracker.guid,
        author = %author.username,
        reply = new.parent_guid.is_some(),
        "Comment created"
    );

    audit::record(
        pool,
        "comment",
        guid,
        "create",
        Some(author.guid),
        None,
        Some(serde_json::to_value(&comment).unwrap_or_default()),
    )
    .await;

    bus.emit(TrackerEvent::TrackerCommentCreated {
        comment: comment.clone(),
        unresolved_comment_count: count,
        timestamp: Utc::now(),
    });

    Ok(comment)
}

fn check_moderation(comment: &Comment, actor: &User, verb: &str) -> Result<()> {
    if comment.author_guid == actor.guid || roles::is_elevated(actor.role) {
        Ok(())
    } else {
        Err(Error::Forbidden(format!(
            "only the author or an elevated role may {verb} this comment"
        )))
    }
}

/// Resolve a top-level comment
///
/// Idempotent: resolving an already-resolved comment returns the current
/// state without touching the counter.
pub async fn resolve_comment(
    pool: &SqlitePool,
    bus: &EventBus,
    comment_guid: Uuid,
    resolver: &User,
) -> Result<Comment> {
    let comment = load_live_comment(pool, comment_guid).await?;
    if comment.parent_guid.is_some() {
        return Err(Error::InvalidOperation(
            "only top-level comments can be resolved".to_string(),
        ));
    }
    check_moderation(&comment, resolver, "resolve")?;
    if comment.is_resolved {
        return Ok(comment);
    }

    let mut tx = pool.begin().await?;
    let flipped = sqlx::query(
        "UPDATE comments SET is_resolved = 1, resolved_by = ?, resolved_at = CURRENT_TIMESTAMP, \
         updated_at = CURRENT_TIMESTAMP \
         WHERE guid = ? AND is_resolved = 0 AND is_deleted = 0",
    )
    .bind(resolver.guid.to_string())
    .bind(comment_guid.to_string())
    .execute(&mut *tx)
    .await?
    .rows_affected();

    if flipped == 1 {
        sqlx::query(
            "UPDATE trackers SET unresolved_comment_count = MAX(0, unresolved_comment_count - 1), \
             updated_at = CURRENT_TIMESTAMP WHERE guid = ?",
        )
        .bind(comment.tracker_guid.to_string())
        .execute(&mut *tx)
        .await?;
    }
    tx.commit().await?;

    // A racing resolve may have won; either way this is the committed state
    let resolved = load_live_comment(pool, comment_guid).await?;
    if flipped == 0 {
        return Ok(resolved);
    }

    let count = current_count(pool, comment.tracker_guid).await?;

    audit::record(
        pool,
        "comment",
        comment_guid,
        "resolve",
        Some(resolver.guid),
        Some(serde_json::to_value(&comment).unwrap_or_default()),
        Some(serde_json::to_value(&resolved).unwrap_or_default()),
    )
    .await;

    bus.emit(TrackerEvent::TrackerCommentUpdated {
        comment: resolved.clone(),
        unresolved_comment_count: count,
        timestamp: Utc::now(),
    });

    Ok(resolved)
}

/// Reopen a resolved top-level comment
pub async fn unresolve_comment(
    pool: &SqlitePool,
    bus: &EventBus,
    comment_guid: Uuid,
    actor: &User,
) -> Result<Comment> {
    let comment = load_live_comment(pool, comment_guid).await?;
    if comment.parent_guid.is_some() {
        return Err(Error::InvalidOperation(
            "only top-level comments can be unresolved".to_string(),
        ));
    }
    check_moderation(&comment, actor, "unresolve")?;
    if !comment.is_resolved {
        return Ok(comment);
    }

    let mut tx = pool.begin().await?;
    let flipped = sqlx::query(
        "UPDATE comments SET is_resolved = 0, resolved_by = NULL, resolved_at = NULL, \
         updated_at = CURRENT_TIMESTAMP \
         WHERE guid = ? AND is_resolved = 1 AND is_deleted = 0",
    )
    .bind(comment_guid.to_string())
    .execute(&mut *tx)
    .await?
    .rows_affected();

    if flipped == 1 {
        sqlx::query(
            "UPDATE trackers SET unresolved_comment_count = unresolved_comment_count + 1, \
             updated_at = CURRENT_TIMESTAMP WHERE guid = ?",
        )
        .bind(comment.tracker_guid.to_string())
        .execute(&mut *tx)
        .await?;
    }
    tx.commit().await?;

    let reopened = load_live_comment(pool, comment_guid).await?;
    if flipped == 0 {
        return Ok(reopened);
    }

    let count = current_count(pool, comment.tracker_guid).await?;

    audit::record(
        pool,
        "comment",
        comment_guid,
        "unresolve",
        Some(actor.guid),
        Some(serde_json::to_value(&comment).unwrap_or_default()),
        Some(serde_json::to_value(&reopened).unwrap_or_default()),
    )
    .await;

    bus.emit(TrackerEvent::TrackerCommentUpdated {
        comment: reopened.clone(),
        unresolved_comment_count: count,
        timestamp: Utc::now(),
    });

    Ok(reopened)
}

/// Edit a comment's body (author only)
pub async fn update_comment(
    pool: &SqlitePool,
    bus: &EventBus,
    comment_guid: Uuid,
    actor: &User,
    body: &str,
) -> Result<Comment> {
    if body.trim().is_empty() {
        return Err(Error::Validation("comment body must not be empty".to_string()));
    }
    let comment = load_live_comment(pool, comment_guid).await?;
    if comment.author_guid != actor.guid {
        return Err(Error::Forbidden(
            "only the author may edit a comment".to_string(),
        ));
    }

    sqlx::query(
        "UPDATE comments SET body = ?, updated_at = CURRENT_TIMESTAMP WHERE guid = ?",
    )
    .bind(body)
    .bind(comment_guid.to_string())
    .execute(pool)
    .await?;

    let updated = load_live_comment(pool, comment_guid).await?;
    let count = current_count(pool, comment.tracker_guid).await?;

    audit::record(
        pool,
        "comment",
        comment_guid,
        "update",
        Some(actor.guid),
        Some(serde_json::to_value(&comment).unwrap_or_default()),
        Some(serde_json::to_value(&updated).unwrap_or_default()),
    )
    .await;

    bus.emit(TrackerEvent::TrackerCommentUpdated {
        comment: updated.clone(),
        unresolved_comment_count: count,
        timestamp: Utc::now(),
    });

    Ok(updated)
}

/// Soft-delete a comment (author or elevated role)
///
/// Deleting an unresolved top-level comment decrements the counter in the
/// same transaction; replies and resolved comments leave it untouched.
/// Replies stay in place and are hidden by thread-query filtering.
pub async fn soft_delete_comment(
    pool: &SqlitePool,
    bus: &EventBus,
    comment_guid: Uuid,
    actor: &User,
) -> Result<()> {
    let comment = match comment_rows::load_comment(pool, comment_guid).await? {
        Some(c) => c,
        None => return Err(Error::NotFound(format!("comment {comment_guid} not found"))),
    };
    if comment.is_deleted {
        return Ok(());
    }
    check_moderation(&comment, actor, "delete")?;

    let mut tx = pool.begin().await?;

    // First try the counted case: unresolved top-level. The WHERE clause is
    // re-evaluated under the write lock, so a racing resolve cannot cause a
    // double decrement.
    let counted = sqlx::query(
        "UPDATE comments SET is_deleted = 1, updated_at = CURRENT_TIMESTAMP \
         WHERE guid = ? AND is_deleted = 0 AND parent_guid IS NULL AND is_resolved = 0",
    )
    .bind(comment_guid.to_string())
    .execute(&mut *tx)
    .await?
    .rows_affected();

    if counted == 1 {
        sqlx::query(
            "UPDATE trackers SET unresolved_comment_count = MAX(0, unresolved_comment_count - 1), \
             updated_at = CURRENT_TIMESTAMP WHERE guid = ?",
        )
        .bind(comment.tracker_guid.to_string())
        .execute(&mut *tx)
        .await?;
    } else {
        sqlx::query(
            "UPDATE comments SET is_deleted = 1, updated_at = CURRENT_TIMESTAMP \
             WHERE guid = ? AND is_deleted = 0",
        )
        .bind(comment_guid.to_string())
        .execute(&mut *tx)
        .await?;
    }
    tx.commit().await?;

    let count = current_count(pool, comment.tracker_guid).await?;

    info!(comment = %comment_guid, tracker = %comment.tracker_guid, "Comment soft-deleted");

    audit::record(
        pool,
        "comment",
        comment_guid,
        "soft_delete",
        Some(actor.guid),
        Some(serde_json::to_value(&comment).unwrap_or_default()),
        None,
    )
    .await;

    bus.emit(TrackerEvent::TrackerCommentDeleted {
        comment_guid,
        tracker_guid: comment.tracker_guid,
        unresolved_comment_count: count,
        timestamp: Utc::now(),
    });

    Ok(())
}

/// Threads for a tracker (newest thread first, replies oldest-first)
pub async fn get_by_tracker(pool: &SqlitePool, tracker_guid: Uuid) -> Result<Vec<CommentThread>> {
    trackers::load_tracker(pool, tracker_guid)
        .await?
        .ok_or_else(|| Error::NotFound(format!("tracker {tracker_guid} not found")))?;
    comment_rows::list_threads(pool, tracker_guid).await
}

/// One thread, addressed by any comment in it
///
/// Replies are walked up to their top-level root before the thread is built.
pub async fn get_thread(pool: &SqlitePool, comment_guid: Uuid) -> Result<CommentThread> {
    let mut comment = load_live_comment(pool, comment_guid).await?;
    while let Some(parent_guid) = comment.parent_guid {
        comment = load_live_comment(pool, parent_guid).await?;
    }
    let replies = comment_rows::list_replies(pool, comment.guid).await?;
    Ok(CommentThread { comment, replies })
}

/// Derived summary; the reconciliation oracle for the counter
pub async fn get_summary(
    pool: &SqlitePool,
    tracker_guid: Uuid,
) -> Result<comment_rows::CommentSummary> {
    trackers::load_tracker(pool, tracker_guid)
        .await?
        .ok_or_else(|| Error::NotFound(format!("tracker {tracker_guid} not found")))?;
    comment_rows::summary(pool, tracker_guid).await
}

/// Recompute the counter from live rows (repair tool)
///
/// Returns the corrected tracker. Exposed for operators; normal operation
/// never needs it while every write goes through this module.
pub async fn reconcile_counter(pool: &SqlitePool, tracker_guid: Uuid) -> Result<Tracker> {
    let mut tx = pool.begin().await?;
    sqlx::query(
        "UPDATE trackers SET unresolved_comment_count = (\
             SELECT COUNT(*) FROM comments \
             WHERE tracker_guid = trackers.guid AND parent_guid IS NULL \
               AND is_deleted = 0 AND is_resolved = 0\
         ), updated_at = CURRENT_TIMESTAMP WHERE guid = ?",
    )
    .bind(tracker_guid.to_string())
    .execute(&mut *tx)
    .await?;
    tx.commit().await?;

    trackers::load_tracker(pool, tracker_guid)
        .await?
        .ok_or_else(|| Error::NotFound(format!("tracker {tracker_guid} not found")))
}
