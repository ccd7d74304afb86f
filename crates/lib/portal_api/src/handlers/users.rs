//! User listing handlers.

use axum::Json;
use axum::extract::State;

use crate::AppState;
use crate::error::AppResult;
use crate::middleware::auth::CurrentUser;
use crate::models::UserListResponse;
use crate::services::{authz, invites};

/// `GET /api/users` — list portal users (admin only).
pub async fn list_users_handler(
    State(state): State<AppState>,
    axum::Extension(user): axum::Extension<CurrentUser>,
) -> AppResult<Json<UserListResponse>> {
    authz::ensure_admin(&state.pool, &user.0).await?;
    let resp = invites::list_users(&state.pool).await?;
    Ok(Json(resp))
}
