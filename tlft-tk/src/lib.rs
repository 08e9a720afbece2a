//! tlft-tk library - Tracker service
//!
//! Workflow state machine, comment consistency engine, deletion protection,
//! and SSE fanout for clinical reporting deliverable trackers.

use axum::Router;
use sqlx::SqlitePool;
use tlft_common::events::EventBus;

pub mod api;
pub mod audit;
pub mod comments;
pub mod db;
pub mod deletion;
pub mod error;
pub mod roles;
pub mod workflow;

/// Default EventBus capacity
pub const EVENT_BUS_CAPACITY: usize = 1000;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Broadcast bus for tracker change notifications
    pub bus: EventBus,
    /// Missing-id handling for bulk updates
    pub bulk_policy: workflow::BulkPolicy,
}

impl AppState {
    /// Create new application state
    pub fn new(db: SqlitePool, bulk_policy: workflow::BulkPolicy) -> Self {
        Self {
            db,
            bus: EventBus::new(EVENT_BUS_CAPACITY),
            bulk_policy,
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::{delete, get, post, put};
    use tower_http::cors::CorsLayer;
    use tower_http::trace::TraceLayer;

    let api = Router::new()
        // Items
        .route("/api/items", post(api::items::create_item))
        .route(
            "/api/items/:guid",
            get(api::items::get_item).delete(api::items::delete_item),
        )
        .route(
            "/api/items/:guid/tracker",
            get(api::trackers::get_tracker_by_item).post(api::items::create_tracker),
        )
        // Trackers
        .route("/api/trackers", get(api::trackers::list_trackers))
        .route("/api/trackers/bulk-update", post(api::trackers::bulk_update))
        .route(
            "/api/trackers/:guid",
            get(api::trackers::get_tracker).put(api::trackers::update_tracker),
        )
        .route(
            "/api/trackers/:guid/assign",
            post(api::trackers::assign_programmer),
        )
        .route(
            "/api/trackers/:guid/unassign",
            post(api::trackers::unassign_programmer),
        )
        // Comments
        .route(
            "/api/trackers/:guid/comments",
            get(api::comments::list_comments).post(api::comments::create_comment),
        )
        .route(
            "/api/trackers/:guid/comments/summary",
            get(api::comments::get_summary),
        )
        .route(
            "/api/comments/:guid",
            put(api::comments::update_comment).delete(api::comments::delete_comment),
        )
        .route("/api/comments/:guid/thread", get(api::comments::get_thread))
        .route(
            "/api/comments/:guid/resolve",
            post(api::comments::resolve_comment),
        )
        .route(
            "/api/comments/:guid/unresolve",
            post(api::comments::unresolve_comment),
        )
        // Tags
        .route(
            "/api/tags",
            get(api::tags::list_tags).post(api::tags::create_tag),
        )
        .route(
            "/api/trackers/:guid/tags",
            get(api::tags::list_tracker_tags).post(api::tags::attach_tag),
        )
        .route(
            "/api/trackers/:guid/tags/:tag_guid",
            delete(api::tags::detach_tag),
        )
        // Reads by parent/assignee
        .route("/api/efforts/:guid", delete(api::items::delete_effort))
        .route("/api/efforts/:guid/trackers", get(api::trackers::list_by_effort))
        .route("/api/users", get(api::users::list_users))
        .route(
            "/api/users/:guid/trackers",
            get(api::trackers::list_by_programmer),
        )
        // Event stream
        .route("/api/events", get(api::sse::event_stream));

    Router::new()
        .merge(api)
        .merge(api::health::health_routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
