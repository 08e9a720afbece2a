//! HTTP API handlers for tlft-tk

pub mod comments;
pub mod health;
pub mod items;
pub mod sse;
pub mod tags;
pub mod trackers;
pub mod users;

use axum::http::HeaderMap;
use tlft_common::db::models::User;
use uuid::Uuid;

use crate::db::users as user_rows;
use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// Header carrying the acting user's guid
///
/// Session issuance is handled upstream; this header stands in for the
/// authenticated principal at this service's boundary.
pub const ACTOR_HEADER: &str = "x-user-guid";

/// Resolve the acting user from the request headers
pub async fn require_actor(state: &AppState, headers: &HeaderMap) -> ApiResult<User> {
    let raw = headers
        .get(ACTOR_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::BadRequest(format!("missing {ACTOR_HEADER} header")))?;

    let guid = Uuid::parse_str(raw)
        .map_err(|_| ApiError::BadRequest(format!("malformed {ACTOR_HEADER} header")))?;

    let user = user_rows::load_user(&state.db, guid)
        .await
        .map_err(ApiError::from)?
        .ok_or_else(|| ApiError::NotFound(format!("user {guid} not found")))?;

    if !user.is_active {
        return Err(ApiError::Forbidden(format!(
            "user {} is deactivated",
            user.username
        )));
    }
    Ok(user)
}
