//! Role checks against the profile table.

use sqlx::PgPool;

use crate::error::{AppError, AppResult};
use portal_core::identity::IdentityUser;
use portal_core::models::Role;
use portal_core::store::profiles;

/// Require the caller's profile to carry the admin role.
///
/// The session was already validated by the auth middleware; a valid session
/// without an admin profile is a 403, never a 401.
pub async fn ensure_admin(pool: &PgPool, user: &IdentityUser) -> AppResult<()> {
    match profiles::get_role(pool, user.id).await? {
        Some(Role::Admin) => Ok(()),
        _ => Err(AppError::Forbidden("Admin access required".into())),
    }
}
