//! Authentication middleware — Bearer token extraction and session lookup.
//!
//! Sessions belong to the identity provider, so a token is valid exactly
//! when the provider resolves it to a user. Role checks happen later,
//! against the profile table, so 401 and 403 stay distinct.

use axum::http::header::AUTHORIZATION;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::AppState;
use crate::error::AppError;
use portal_core::identity::IdentityUser;

/// The authenticated caller, stored in request extensions.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub IdentityUser);

/// Axum middleware: extracts `Authorization: Bearer <token>`, resolves the
/// session with the identity provider, and injects [`CurrentUser`] into
/// request extensions.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("Missing authorization header".into()))?;

    let token = header
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::Unauthorized("Invalid authorization scheme".into()))?;

    let user = state
        .identity
        .get_user(token)
        .await
        .map_err(|_| AppError::Unauthorized("Invalid or expired session".into()))?;

    request.extensions_mut().insert(CurrentUser(user));

    Ok(next.run(request).await)
}
