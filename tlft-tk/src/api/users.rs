//! User listing for assignment pickers

use axum::{extract::State, Json};

use tlft_common::db::models::User;

use crate::db::users as user_rows;
use crate::error::ApiResult;
use crate::AppState;

/// GET /api/users
pub async fn list_users(State(state): State<AppState>) -> ApiResult<Json<Vec<User>>> {
    let users = user_rows::list_users(&state.db).await?;
    Ok(Json(users))
}
