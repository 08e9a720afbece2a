//! Tag API handlers

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use tlft_common::db::models::Tag;

use crate::db::{tags as tag_rows, trackers as tracker_rows};
use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// GET /api/tags
pub async fn list_tags(State(state): State<AppState>) -> ApiResult<Json<Vec<Tag>>> {
    let tags = tag_rows::list_tags(&state.db).await?;
    Ok(Json(tags))
}

/// POST /api/tags request
#[derive(Debug, Deserialize)]
pub struct CreateTagRequest {
    pub name: String,
    #[serde(default = "default_color")]
    pub color: String,
}

fn default_color() -> String {
    "#808080".to_string()
}

/// POST /api/tags
pub async fn create_tag(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<CreateTagRequest>,
) -> ApiResult<(StatusCode, Json<Tag>)> {
    super::require_actor(&state, &headers).await?;

    if request.name.trim().is_empty() {
        return Err(ApiError::BadRequest("tag name must not be empty".to_string()));
    }

    let tag = Tag {
        guid: Uuid::new_v4(),
        name: request.name,
        color: request.color,
    };
    tag_rows::save_tag(&state.db, &tag).await?;
    Ok((StatusCode::CREATED, Json(tag)))
}

/// POST /api/trackers/:guid/tags request
#[derive(Debug, Deserialize)]
pub struct AttachTagRequest {
    pub tag_guid: Uuid,
}

/// POST /api/trackers/:guid/tags
pub async fn attach_tag(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(tracker_guid): Path<Uuid>,
    Json(request): Json<AttachTagRequest>,
) -> ApiResult<Json<Vec<Tag>>> {
    super::require_actor(&state, &headers).await?;

    tracker_rows::load_tracker(&state.db, tracker_guid)
        .await
        .map_err(ApiError::from)?
        .ok_or_else(|| ApiError::NotFound(format!("tracker {tracker_guid} not found")))?;
    tag_rows::load_tag(&state.db, request.tag_guid)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("tag {} not found", request.tag_guid)))?;

    tag_rows::attach_tag(&state.db, tracker_guid, request.tag_guid).await?;
    let tags = tag_rows::list_tags_for_tracker(&state.db, tracker_guid).await?;
    Ok(Json(tags))
}

/// DELETE /api/trackers/:guid/tags/:tag_guid
pub async fn detach_tag(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((tracker_guid, tag_guid)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<Vec<Tag>>> {
    super::require_actor(&state, &headers).await?;

    tag_rows::detach_tag(&state.db, tracker_guid, tag_guid).await?;
    let tags = tag_rows::list_tags_for_tracker(&state.db, tracker_guid).await?;
    Ok(Json(tags))
}

/// GET /api/trackers/:guid/tags
pub async fn list_tracker_tags(
    State(state): State<AppState>,
    Path(tracker_guid): Path<Uuid>,
) -> ApiResult<Json<Vec<Tag>>> {
    let tags = tag_rows::list_tags_for_tracker(&state.db, tracker_guid).await?;
    Ok(Json(tags))
}
