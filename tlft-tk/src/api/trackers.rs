//! Tracker API handlers

use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use tlft_common::api::types::PageQuery;
use tlft_common::db::models::{AssignmentRole, ProductionStatus, QcStatus, Tracker};

use crate::db::trackers as tracker_rows;
use crate::error::{ApiError, ApiResult};
use crate::workflow;
use crate::AppState;

/// POST /api/trackers/:guid/assign request
#[derive(Debug, Deserialize)]
pub struct AssignRequest {
    pub role: AssignmentRole,
    pub user_guid: Uuid,
}

/// POST /api/trackers/:guid/assign
pub async fn assign_programmer(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(guid): Path<Uuid>,
    Json(request): Json<AssignRequest>,
) -> ApiResult<Json<Tracker>> {
    let actor = super::require_actor(&state, &headers).await?;
    let tracker = workflow::assign_programmer(
        &state.db,
        &state.bus,
        guid,
        request.user_guid,
        request.role,
        Some(actor.guid),
    )
    .await?;
    Ok(Json(tracker))
}

/// POST /api/trackers/:guid/unassign request
#[derive(Debug, Deserialize)]
pub struct UnassignRequest {
    pub role: AssignmentRole,
}

/// POST /api/trackers/:guid/unassign
pub async fn unassign_programmer(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(guid): Path<Uuid>,
    Json(request): Json<UnassignRequest>,
) -> ApiResult<Json<Tracker>> {
    let actor = super::require_actor(&state, &headers).await?;
    let tracker = workflow::unassign_programmer(
        &state.db,
        &state.bus,
        guid,
        request.role,
        Some(actor.guid),
    )
    .await?;
    Ok(Json(tracker))
}

/// PUT /api/trackers/:guid
///
/// Partial update; unknown status spellings are rejected at deserialization.
pub async fn update_tracker(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(guid): Path<Uuid>,
    Json(fields): Json<workflow::UpdateFields>,
) -> ApiResult<Json<Tracker>> {
    let actor = super::require_actor(&state, &headers).await?;
    let tracker =
        workflow::update_status(&state.db, &state.bus, guid, &fields, Some(actor.guid)).await?;
    Ok(Json(tracker))
}

/// POST /api/trackers/bulk-update request
#[derive(Debug, Deserialize)]
pub struct BulkUpdateRequest {
    pub updates: Vec<workflow::BulkEntry>,
}

/// POST /api/trackers/bulk-update response
#[derive(Debug, Serialize)]
pub struct BulkUpdateResponse {
    pub results: Vec<workflow::BulkItemResult>,
}

/// POST /api/trackers/bulk-update
///
/// Per-item results; the batch only aborts under the strict policy.
pub async fn bulk_update(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<BulkUpdateRequest>,
) -> ApiResult<Json<BulkUpdateResponse>> {
    let actor = super::require_actor(&state, &headers).await?;
    let results = workflow::bulk_update(
        &state.db,
        &state.bus,
        &request.updates,
        state.bulk_policy,
        Some(actor.guid),
    )
    .await?;
    Ok(Json(BulkUpdateResponse { results }))
}

/// GET /api/trackers/:guid
pub async fn get_tracker(
    State(state): State<AppState>,
    Path(guid): Path<Uuid>,
) -> ApiResult<Json<Tracker>> {
    let tracker = tracker_rows::load_tracker(&state.db, guid)
        .await
        .map_err(ApiError::from)?
        .ok_or_else(|| ApiError::NotFound(format!("tracker {guid} not found")))?;
    Ok(Json(tracker))
}

/// GET /api/items/:guid/tracker
pub async fn get_tracker_by_item(
    State(state): State<AppState>,
    Path(guid): Path<Uuid>,
) -> ApiResult<Json<Tracker>> {
    let tracker = tracker_rows::load_tracker_by_item(&state.db, guid)
        .await
        .map_err(ApiError::from)?
        .ok_or_else(|| ApiError::NotFound(format!("no tracker for item {guid}")))?;
    Ok(Json(tracker))
}

// offset/limit are declared inline rather than flattened: serde_urlencoded
// cannot deserialize numeric fields through #[serde(flatten)]

/// Query parameters for GET /api/trackers
#[derive(Debug, Deserialize)]
pub struct TrackerListQuery {
    pub production_status: Option<ProductionStatus>,
    pub qc_status: Option<QcStatus>,
    pub production_programmer: Option<Uuid>,
    pub qc_programmer: Option<Uuid>,
    #[serde(default)]
    pub offset: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    tlft_common::api::types::DEFAULT_LIMIT
}

/// GET /api/trackers
///
/// Filterable list, offset/limit (skip N, take M).
pub async fn list_trackers(
    State(state): State<AppState>,
    Query(query): Query<TrackerListQuery>,
) -> ApiResult<Json<Vec<Tracker>>> {
    let (offset, limit) = PageQuery {
        offset: query.offset,
        limit: query.limit,
    }
    .clamped();
    let filters = tracker_rows::StatusFilters {
        production_status: query.production_status,
        qc_status: query.qc_status,
        production_programmer: query.production_programmer,
        qc_programmer: query.qc_programmer,
    };
    let trackers = tracker_rows::list_by_status(&state.db, filters, offset, limit).await?;
    Ok(Json(trackers))
}

/// Query parameters for GET /api/users/:guid/trackers
#[derive(Debug, Deserialize)]
pub struct ByProgrammerQuery {
    pub role: AssignmentRole,
    #[serde(default)]
    pub offset: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

/// GET /api/users/:guid/trackers
pub async fn list_by_programmer(
    State(state): State<AppState>,
    Path(guid): Path<Uuid>,
    Query(query): Query<ByProgrammerQuery>,
) -> ApiResult<Json<Vec<Tracker>>> {
    let (offset, limit) = PageQuery {
        offset: query.offset,
        limit: query.limit,
    }
    .clamped();
    let trackers =
        tracker_rows::list_by_programmer(&state.db, guid, query.role, offset, limit).await?;
    Ok(Json(trackers))
}

/// GET /api/efforts/:guid/trackers
pub async fn list_by_effort(
    State(state): State<AppState>,
    Path(guid): Path<Uuid>,
) -> ApiResult<Json<Vec<Tracker>>> {
    let trackers = tracker_rows::list_by_effort(&state.db, guid).await?;
    Ok(Json(trackers))
}
