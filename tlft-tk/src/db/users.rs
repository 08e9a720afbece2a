//! User database operations
//!
//! Session issuance lives elsewhere; this module only resolves and lists the
//! user rows that assignments and comment authorship reference.

use sqlx::{Row, SqlitePool};
use tlft_common::db::models::{User, UserRole};
use tlft_common::{Error, Result};
use uuid::Uuid;

use super::parse_guid;

fn row_to_user(row: &sqlx::sqlite::SqliteRow) -> Result<User> {
    let guid: String = row.get("guid");
    let role: String = row.get("role");
    Ok(User {
        guid: parse_guid(&guid)?,
        username: row.get("username"),
        display_name: row.get("display_name"),
        role: UserRole::parse(&role)
            .ok_or_else(|| Error::Internal(format!("unknown role in database: {role}")))?,
        is_active: row.get::<i64, _>("is_active") != 0,
    })
}

/// Load user by guid
pub async fn load_user<'e, E>(executor: E, guid: Uuid) -> Result<Option<User>>
where
    E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
{
    let row = sqlx::query(
        "SELECT guid, username, display_name, role, is_active FROM users WHERE guid = ?",
    )
    .bind(guid.to_string())
    .fetch_optional(executor)
    .await?;

    match row {
        Some(row) => Ok(Some(row_to_user(&row)?)),
        None => Ok(None),
    }
}

/// List all active users, username order
pub async fn list_users(pool: &SqlitePool) -> Result<Vec<User>> {
    let rows = sqlx::query(
        "SELECT guid, username, display_name, role, is_active
         FROM users
         WHERE is_active = 1
         ORDER BY username",
    )
    .fetch_all(pool)
    .await?;

    rows.iter().map(row_to_user).collect()
}

/// Save user to database
pub async fn save_user(pool: &SqlitePool, user: &User) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO users (guid, username, display_name, role, is_active, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, CURRENT_TIMESTAMP, CURRENT_TIMESTAMP)
        ON CONFLICT(username) DO UPDATE SET
            display_name = excluded.display_name,
            role = excluded.role,
            is_active = excluded.is_active,
            updated_at = CURRENT_TIMESTAMP
        "#,
    )
    .bind(user.guid.to_string())
    .bind(&user.username)
    .bind(&user.display_name)
    .bind(user.role.as_str())
    .bind(user.is_active as i64)
    .execute(pool)
    .await?;

    Ok(())
}
