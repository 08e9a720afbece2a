//! Shared helpers for tlft-tk integration tests

use axum::body::Body;
use axum::http::Request;
use serde_json::Value;
use sqlx::SqlitePool;
use uuid::Uuid;

use tlft_common::db::init::init_memory_database;
use tlft_common::db::models::{Item, ItemType, ReportingEffort, Tracker, User, UserRole};
use tlft_tk::db::{efforts, items, users};
use tlft_tk::workflow::BulkPolicy;
use tlft_tk::AppState;

/// In-memory state with best-effort bulk policy
pub async fn test_state() -> AppState {
    let pool = init_memory_database().await.expect("init database");
    AppState::new(pool, BulkPolicy::BestEffort)
}

/// Insert a user with the given role
pub async fn seed_user(pool: &SqlitePool, username: &str, role: UserRole) -> User {
    let user = User {
        guid: Uuid::new_v4(),
        username: username.to_string(),
        display_name: username.to_string(),
        role,
        is_active: true,
    };
    users::save_user(pool, &user).await.expect("save user");
    user
}

/// Insert a reporting effort
pub async fn seed_effort(pool: &SqlitePool) -> ReportingEffort {
    let effort = ReportingEffort {
        guid: Uuid::new_v4(),
        study_label: "ABC-001".to_string(),
        name: "Primary CSR".to_string(),
        is_active: true,
    };
    efforts::save_effort(pool, &effort).await.expect("save effort");
    effort
}

/// Insert an item (and its tracker) under the effort
pub async fn seed_item(pool: &SqlitePool, effort_guid: Uuid, code: &str) -> (Item, Tracker) {
    let item = items::new_item(effort_guid, ItemType::Tlf, None, code.to_string());
    let tracker = items::create_item_with_tracker(pool, &item)
        .await
        .expect("create item with tracker");
    (item, tracker)
}

/// Build a request with optional actor header and JSON body
pub fn request(method: &str, uri: &str, actor: Option<Uuid>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(actor) = actor {
        builder = builder.header("x-user-guid", actor.to_string());
    }
    match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

/// Extract JSON body from a response
pub async fn extract_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("parse JSON")
}
