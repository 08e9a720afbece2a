//! Database initialization
//!
//! Creates the database on first run and brings the schema up idempotently.
//! Foreign keys are enforced at the connection level; the item → tracker →
//! comment chain cascades on delete, while user references nullify so
//! removing a user never destroys tracker history.

use crate::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// Initialize database connection and create tables if needed
///
/// Connection options apply to every pooled connection: referential
/// integrity is load-bearing (the deletion validator is only a fast-fail
/// check, the FK layer is the real guarantee), WAL allows concurrent
/// readers with one writer, and the busy timeout lets racing writers wait
/// instead of erroring.
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_millis(5000));

    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .connect_with(options)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    create_schema(&pool).await?;

    Ok(pool)
}

/// Create an in-memory database with the full schema (tests, tooling)
///
/// Capped at one connection: each SQLite :memory: connection is its own
/// database, so a wider pool would hand out empty databases.
pub async fn init_memory_database() -> Result<SqlitePool> {
    let options = SqliteConnectOptions::new()
        .in_memory(true)
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await?;
    create_schema(&pool).await?;
    Ok(pool)
}

/// Run all idempotent CREATE TABLE statements
pub async fn create_schema(pool: &SqlitePool) -> Result<()> {
    create_users_table(pool).await?;
    create_reporting_efforts_table(pool).await?;
    create_items_table(pool).await?;
    create_trackers_table(pool).await?;
    create_comments_table(pool).await?;
    create_tags_table(pool).await?;
    create_tracker_tags_table(pool).await?;
    create_audit_log_table(pool).await?;
    Ok(())
}

async fn create_users_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            guid TEXT PRIMARY KEY,
            username TEXT NOT NULL UNIQUE,
            display_name TEXT NOT NULL DEFAULT '',
            role TEXT NOT NULL DEFAULT 'programmer',
            is_active INTEGER NOT NULL DEFAULT 1,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_reporting_efforts_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS reporting_efforts (
            guid TEXT PRIMARY KEY,
            study_label TEXT NOT NULL,
            name TEXT NOT NULL,
            is_active INTEGER NOT NULL DEFAULT 1,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            UNIQUE(study_label, name)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_items_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS items (
            guid TEXT PRIMARY KEY,
            effort_guid TEXT NOT NULL REFERENCES reporting_efforts(guid) ON DELETE RESTRICT,
            item_type TEXT NOT NULL,
            subtype TEXT,
            code TEXT NOT NULL,
            is_active INTEGER NOT NULL DEFAULT 1,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            UNIQUE(effort_guid, code)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_trackers_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS trackers (
            guid TEXT PRIMARY KEY,
            item_guid TEXT NOT NULL UNIQUE REFERENCES items(guid) ON DELETE CASCADE,
            production_programmer_guid TEXT REFERENCES users(guid) ON DELETE SET NULL,
            qc_programmer_guid TEXT REFERENCES users(guid) ON DELETE SET NULL,
            production_status TEXT NOT NULL DEFAULT 'not_started',
            qc_status TEXT NOT NULL DEFAULT 'not_started',
            priority INTEGER NOT NULL DEFAULT 3,
            qc_level INTEGER NOT NULL DEFAULT 1,
            due_date TIMESTAMP,
            qc_completed_at TIMESTAMP,
            unresolved_comment_count INTEGER NOT NULL DEFAULT 0
                CHECK (unresolved_comment_count >= 0),
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_trackers_production_programmer
         ON trackers(production_programmer_guid)",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_trackers_qc_programmer
         ON trackers(qc_programmer_guid)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_comments_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS comments (
            guid TEXT PRIMARY KEY,
            tracker_guid TEXT NOT NULL REFERENCES trackers(guid) ON DELETE CASCADE,
            author_guid TEXT NOT NULL REFERENCES users(guid),
            body TEXT NOT NULL,
            category TEXT NOT NULL DEFAULT 'programming',
            parent_guid TEXT REFERENCES comments(guid) ON DELETE CASCADE,
            is_resolved INTEGER NOT NULL DEFAULT 0,
            resolved_by TEXT REFERENCES users(guid) ON DELETE SET NULL,
            resolved_at TIMESTAMP,
            is_deleted INTEGER NOT NULL DEFAULT 0,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_comments_tracker ON comments(tracker_guid)",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_comments_parent ON comments(parent_guid)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_tags_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS tags (
            guid TEXT PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            color TEXT NOT NULL DEFAULT '#808080',
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_tracker_tags_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS tracker_tags (
            tracker_guid TEXT NOT NULL REFERENCES trackers(guid) ON DELETE CASCADE,
            tag_guid TEXT NOT NULL REFERENCES tags(guid) ON DELETE CASCADE,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            PRIMARY KEY (tracker_guid, tag_guid)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_audit_log_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS audit_log (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            entity TEXT NOT NULL,
            entity_guid TEXT NOT NULL,
            action TEXT NOT NULL,
            actor_guid TEXT,
            before_json TEXT,
            after_json TEXT,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
