//! Invite issuance, cancellation, and bookkeeping.
//!
//! The identity-provider account is the primary artifact of issuance: once
//! the account is confirmed created or updated, failures writing the profile
//! row or the invite record are logged and swallowed rather than failing the
//! request. The invite table is an audit trail, not the source of access.

use chrono::{Duration, Utc};
use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{
    CancelInviteResponse, CreateInviteResponse, InviteListResponse, MarkUsedResponse,
    UserListResponse,
};
use portal_core::identity::{IdentityError, IdentityProvider, IdentityUser};
use portal_core::models::Role;
use portal_core::store::invites::{self, CreateInviteParams, INVITE_TTL_DAYS};
use portal_core::store::profiles;

/// Issue an invite for `email` with `role`, creating the identity-provider
/// account when none exists yet.
pub async fn issue(
    pool: &PgPool,
    identity: &dyn IdentityProvider,
    redirect_to: &str,
    created_by: Uuid,
    email: &str,
    role: Option<&str>,
) -> AppResult<CreateInviteResponse> {
    let email = email.trim();
    if email.is_empty() {
        return Err(AppError::Validation("Email is required".into()));
    }
    let role = role
        .map(str::parse::<Role>)
        .transpose()
        .map_err(|e| AppError::Validation(e.to_string()))?
        .unwrap_or_default();
    let email = email.to_lowercase();

    let existing = identity.find_user_by_email(&email).await?;
    let existing_account = existing.is_some();

    let user_id = match existing {
        Some(account) => {
            // Account untouched; refresh the profile and send a recovery
            // email instead of re-inviting.
            if let Err(e) = refresh_profile(pool, account.id, &email, role).await {
                warn!(%email, error = %e, "failed to update profile for existing account");
            }
            if let Err(e) = identity.generate_recovery_link(&email, redirect_to).await {
                warn!(%email, error = %e, "failed to generate recovery link");
            }
            account.id
        }
        None => {
            // Primary action: the provider creates the account and sends the
            // invite email. Failure here fails the request.
            let account = identity.invite_user_by_email(&email, redirect_to).await?;
            if let Err(e) = ensure_profile(pool, account.id, &email, role).await {
                warn!(%email, error = %e, "failed to create profile for invited account");
            }
            account.id
        }
    };

    let now = Utc::now();
    let invite_id = match invites::create(
        pool,
        &CreateInviteParams {
            email: email.clone(),
            token: invites::generate_token(now),
            // A re-invite of an existing account is bookkeeping, not a real
            // pending invite.
            used: existing_account,
            created_by: Some(created_by),
            expires_at: now + Duration::days(INVITE_TTL_DAYS),
        },
    )
    .await
    {
        Ok(invite) => Some(invite.id),
        Err(e) => {
            warn!(%email, error = %e, "failed to record invite");
            None
        }
    };

    info!(%email, %user_id, existing_account, "invite issued");

    Ok(CreateInviteResponse {
        success: true,
        user_id,
        invite_id,
        message: "User created and email sent successfully".into(),
    })
}

/// Update the profile for an already-known account, creating the row when
/// it is missing. The refreshed profile owes a password change: the account
/// is about to receive a recovery email.
async fn refresh_profile(
    pool: &PgPool,
    id: Uuid,
    email: &str,
    role: Role,
) -> Result<(), portal_core::store::StoreError> {
    if profiles::update_role(pool, id, role).await? == 0 {
        profiles::insert(pool, id, email, role, true).await?;
    } else {
        profiles::set_must_change_password(pool, id, true).await?;
    }
    Ok(())
}

/// Create the profile for a freshly invited account.
///
/// A provider-side trigger may insert the row concurrently, so this runs
/// update → insert → retry-update: the unique violation on insert means the
/// trigger won, and the retry applies our role on top of its row.
async fn ensure_profile(
    pool: &PgPool,
    id: Uuid,
    email: &str,
    role: Role,
) -> Result<(), portal_core::store::StoreError> {
    if profiles::update_role(pool, id, role).await? > 0 {
        profiles::set_must_change_password(pool, id, true).await?;
        return Ok(());
    }
    match profiles::insert(pool, id, email, role, true).await {
        Ok(()) => Ok(()),
        Err(e) if e.is_unique_violation() => {
            profiles::update_role(pool, id, role).await?;
            profiles::set_must_change_password(pool, id, true).await?;
            Ok(())
        }
        Err(e) => Err(e),
    }
}

/// Cancel an invite. When it was never used, the pending account and its
/// profile are removed best-effort as well.
pub async fn cancel(
    pool: &PgPool,
    identity: &dyn IdentityProvider,
    invite_id: Uuid,
) -> AppResult<CancelInviteResponse> {
    let invite = invites::get(pool, invite_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Invite not found".into()))?;

    invites::delete(pool, invite_id).await?;

    let mut removed_user_id = None;
    let mut auth_user_deleted = false;

    if !invite.used {
        match profiles::find_by_email(pool, &invite.email).await {
            Ok(Some(profile)) => {
                removed_user_id = Some(profile.id);
                if let Err(e) = profiles::delete(pool, profile.id).await {
                    warn!(invite = %invite_id, error = %e, "failed to delete profile");
                }
                match identity.delete_user(profile.id).await {
                    Ok(()) => auth_user_deleted = true,
                    // Already gone upstream; nothing left to remove.
                    Err(IdentityError::NotFound) => {}
                    Err(e) => {
                        warn!(invite = %invite_id, error = %e, "failed to delete identity account")
                    }
                }
            }
            Ok(None) => {}
            Err(e) => {
                warn!(invite = %invite_id, error = %e, "failed to look up profile for invite")
            }
        }
    }

    info!(invite = %invite_id, ?removed_user_id, auth_user_deleted, "invite canceled");

    Ok(CancelInviteResponse {
        success: true,
        removed_user_id,
        auth_user_deleted,
    })
}

/// Mark the caller's own pending invites used and clear their password
/// obligation. Idempotent: a second call touches zero rows.
pub async fn mark_used(pool: &PgPool, user: &IdentityUser) -> AppResult<MarkUsedResponse> {
    let normalized = user.email.to_lowercase();
    let updated = invites::mark_used_for_email(pool, &user.email, &normalized).await?;
    profiles::clear_must_change_password_by_email(pool, &user.email, &normalized).await?;

    Ok(MarkUsedResponse {
        success: true,
        updated_count: updated.len(),
    })
}

/// Admin listing of invite records, newest first.
pub async fn list(pool: &PgPool, include_used: bool) -> AppResult<InviteListResponse> {
    let invites = invites::list(pool, include_used).await?;
    Ok(InviteListResponse {
        invites: invites.into_iter().map(Into::into).collect(),
    })
}

/// Admin listing of portal users, newest first.
pub async fn list_users(pool: &PgPool) -> AppResult<UserListResponse> {
    let users = profiles::list(pool).await?;
    Ok(UserListResponse {
        users: users.into_iter().map(Into::into).collect(),
    })
}
