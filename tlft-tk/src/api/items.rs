//! Item API handlers
//!
//! Item creation is the only way a tracker comes into existence in normal
//! flow; the pair is created atomically. Deletion goes through the deletion
//! protection module.

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use tlft_common::db::models::{Item, ItemType, Tracker};

use crate::db::items as item_rows;
use crate::deletion;
use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// POST /api/items request
#[derive(Debug, Deserialize)]
pub struct CreateItemRequest {
    pub effort_guid: Uuid,
    pub item_type: ItemType,
    pub subtype: Option<String>,
    pub code: String,
}

/// POST /api/items response
#[derive(Debug, Serialize)]
pub struct CreateItemResponse {
    pub item: Item,
    pub tracker: Tracker,
}

/// POST /api/items
///
/// Creates the item and its tracker atomically. 404 when the effort is
/// missing, 409 when the code already exists in the effort.
pub async fn create_item(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<CreateItemRequest>,
) -> ApiResult<(StatusCode, Json<CreateItemResponse>)> {
    let actor = super::require_actor(&state, &headers).await?;

    if request.code.trim().is_empty() {
        return Err(ApiError::BadRequest("item code must not be empty".to_string()));
    }

    let item = item_rows::new_item(
        request.effort_guid,
        request.item_type,
        request.subtype,
        request.code,
    );
    let tracker = item_rows::create_item_with_tracker(&state.db, &item).await?;

    crate::audit::record(
        &state.db,
        "item",
        item.guid,
        "create",
        Some(actor.guid),
        None,
        Some(serde_json::to_value(&item).unwrap_or_default()),
    )
    .await;

    state.bus.emit(tlft_common::events::TrackerEvent::TrackerCreated {
        tracker: tracker.clone(),
        timestamp: chrono::Utc::now(),
    });

    Ok((StatusCode::CREATED, Json(CreateItemResponse { item, tracker })))
}

/// GET /api/items/:guid
pub async fn get_item(
    State(state): State<AppState>,
    Path(guid): Path<Uuid>,
) -> ApiResult<Json<Item>> {
    let item = item_rows::load_item(&state.db, guid)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("item {guid} not found")))?;
    Ok(Json(item))
}

/// POST /api/items/:guid/tracker
///
/// Creates a tracker for an item that lost its own (repair path). 409 when
/// the item already has one.
pub async fn create_tracker(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(guid): Path<Uuid>,
) -> ApiResult<(StatusCode, Json<Tracker>)> {
    super::require_actor(&state, &headers).await?;

    let tracker = item_rows::create_tracker_for_item(&state.db, guid).await?;

    state.bus.emit(tlft_common::events::TrackerEvent::TrackerCreated {
        tracker: tracker.clone(),
        timestamp: chrono::Utc::now(),
    });

    Ok((StatusCode::CREATED, Json(tracker)))
}

/// DELETE /api/efforts/:guid
///
/// Effort CRUD itself lives upstream; the deletion boundary is protected
/// here because it must see the same item rows the trackers hang off.
/// 409 with a dependent sample while items exist.
pub async fn delete_effort(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(guid): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let actor = super::require_actor(&state, &headers).await?;
    deletion::delete_effort(&state.db, guid, Some(actor.guid)).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/items/:guid response
#[derive(Debug, Serialize)]
pub struct DeleteItemResponse {
    pub deleted: Item,
}

/// DELETE /api/items/:guid
///
/// 403 while programmers are assigned; cascades tracker and comments.
pub async fn delete_item(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(guid): Path<Uuid>,
) -> ApiResult<Json<DeleteItemResponse>> {
    let actor = super::require_actor(&state, &headers).await?;
    let deleted = deletion::delete_item(&state.db, &state.bus, guid, Some(actor.guid)).await?;
    Ok(Json(DeleteItemResponse { deleted }))
}
