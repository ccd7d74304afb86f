//! Invite request handlers.

use axum::Json;
use axum::extract::{Path, Query, State};
use uuid::Uuid;

use crate::AppState;
use crate::error::AppResult;
use crate::middleware::auth::CurrentUser;
use crate::models::{
    CancelInviteResponse, CreateInviteRequest, CreateInviteResponse, InviteListResponse,
    ListInvitesQuery, MarkUsedResponse,
};
use crate::services::{authz, invites};

/// `POST /api/invites` — issue an invite (admin only).
pub async fn create_invite_handler(
    State(state): State<AppState>,
    axum::Extension(user): axum::Extension<CurrentUser>,
    Json(body): Json<CreateInviteRequest>,
) -> AppResult<Json<CreateInviteResponse>> {
    authz::ensure_admin(&state.pool, &user.0).await?;
    let resp = invites::issue(
        &state.pool,
        state.identity.as_ref(),
        &state.config.recovery_redirect(),
        user.0.id,
        &body.email,
        body.role.as_deref(),
    )
    .await?;
    Ok(Json(resp))
}

/// `GET /api/invites` — list invite records (admin only).
pub async fn list_invites_handler(
    State(state): State<AppState>,
    axum::Extension(user): axum::Extension<CurrentUser>,
    Query(query): Query<ListInvitesQuery>,
) -> AppResult<Json<InviteListResponse>> {
    authz::ensure_admin(&state.pool, &user.0).await?;
    let resp = invites::list(&state.pool, query.include_used).await?;
    Ok(Json(resp))
}

/// `DELETE /api/invites/{id}` — cancel an invite (admin only).
pub async fn cancel_invite_handler(
    State(state): State<AppState>,
    axum::Extension(user): axum::Extension<CurrentUser>,
    Path(invite_id): Path<Uuid>,
) -> AppResult<Json<CancelInviteResponse>> {
    authz::ensure_admin(&state.pool, &user.0).await?;
    let resp = invites::cancel(&state.pool, state.identity.as_ref(), invite_id).await?;
    Ok(Json(resp))
}

/// `POST /api/invites/mark-used` — the caller marks their own pending
/// invites used after completing sign-in.
pub async fn mark_used_handler(
    State(state): State<AppState>,
    axum::Extension(user): axum::Extension<CurrentUser>,
) -> AppResult<Json<MarkUsedResponse>> {
    let resp = invites::mark_used(&state.pool, &user.0).await?;
    Ok(Json(resp))
}
