//! Comment API handlers
//!
//! Thin wrappers over the comment consistency engine; all counter logic
//! lives there.

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use tlft_common::db::models::{Comment, CommentCategory};

use crate::comments as engine;
use crate::db::comments::{CommentSummary, CommentThread};
use crate::error::ApiResult;
use crate::AppState;

/// POST /api/trackers/:guid/comments request
#[derive(Debug, Deserialize)]
pub struct CreateCommentRequest {
    pub body: String,
    pub category: CommentCategory,
    pub parent_guid: Option<Uuid>,
}

/// POST /api/trackers/:guid/comments
pub async fn create_comment(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(tracker_guid): Path<Uuid>,
    Json(request): Json<CreateCommentRequest>,
) -> ApiResult<(StatusCode, Json<Comment>)> {
    let actor = super::require_actor(&state, &headers).await?;
    let comment = engine::create_comment(
        &state.db,
        &state.bus,
        &actor,
        &engine::NewComment {
            tracker_guid,
            body: request.body,
            category: request.category,
            parent_guid: request.parent_guid,
        },
    )
    .await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

/// GET /api/trackers/:guid/comments
pub async fn list_comments(
    State(state): State<AppState>,
    Path(tracker_guid): Path<Uuid>,
) -> ApiResult<Json<Vec<CommentThread>>> {
    let threads = engine::get_by_tracker(&state.db, tracker_guid).await?;
    Ok(Json(threads))
}

/// GET /api/comments/:guid/thread
pub async fn get_thread(
    State(state): State<AppState>,
    Path(guid): Path<Uuid>,
) -> ApiResult<Json<CommentThread>> {
    let thread = engine::get_thread(&state.db, guid).await?;
    Ok(Json(thread))
}

/// GET /api/trackers/:guid/comments/summary
pub async fn get_summary(
    State(state): State<AppState>,
    Path(tracker_guid): Path<Uuid>,
) -> ApiResult<Json<CommentSummary>> {
    let summary = engine::get_summary(&state.db, tracker_guid).await?;
    Ok(Json(summary))
}

/// PUT /api/comments/:guid request
#[derive(Debug, Deserialize)]
pub struct UpdateCommentRequest {
    pub body: String,
}

/// PUT /api/comments/:guid
pub async fn update_comment(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(guid): Path<Uuid>,
    Json(request): Json<UpdateCommentRequest>,
) -> ApiResult<Json<Comment>> {
    let actor = super::require_actor(&state, &headers).await?;
    let comment =
        engine::update_comment(&state.db, &state.bus, guid, &actor, &request.body).await?;
    Ok(Json(comment))
}

/// POST /api/comments/:guid/resolve
pub async fn resolve_comment(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(guid): Path<Uuid>,
) -> ApiResult<Json<Comment>> {
    let actor = super::require_actor(&state, &headers).await?;
    let comment = engine::resolve_comment(&state.db, &state.bus, guid, &actor).await?;
    Ok(Json(comment))
}

/// POST /api/comments/:guid/unresolve
pub async fn unresolve_comment(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(guid): Path<Uuid>,
) -> ApiResult<Json<Comment>> {
    let actor = super::require_actor(&state, &headers).await?;
    let comment = engine::unresolve_comment(&state.db, &state.bus, guid, &actor).await?;
    Ok(Json(comment))
}

/// DELETE /api/comments/:guid (soft delete)
pub async fn delete_comment(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(guid): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let actor = super::require_actor(&state, &headers).await?;
    engine::soft_delete_comment(&state.db, &state.bus, guid, &actor).await?;
    Ok(StatusCode::NO_CONTENT)
}
