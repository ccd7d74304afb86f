//! Identity-provider client.
//!
//! The portal delegates authentication entirely to an external identity
//! service: account creation, session issuance, password storage, and the
//! recovery emails themselves. This module is the thin wrapper the rest of
//! the system talks through. The trait seam exists so the API layer can run
//! against a mock provider in tests.

pub mod http;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

pub use http::HttpIdentityClient;

/// Identity-provider account as seen by the portal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityUser {
    pub id: Uuid,
    pub email: String,
}

/// An authenticated session returned by the password grant.
#[derive(Debug, Clone)]
pub struct IdentitySession {
    pub access_token: String,
    pub user: IdentityUser,
}

/// Errors from the identity provider.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// The session token was missing, malformed, or rejected.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// The provider has no such account.
    #[error("user not found")]
    NotFound,

    /// The provider answered with a non-success status. The message is the
    /// provider's own and is surfaced verbatim to admin callers.
    #[error("{message}")]
    Service { status: u16, message: String },

    /// Transport-level failure reaching the provider.
    #[error("identity request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The provider's response body did not match the expected shape.
    #[error("unexpected identity response: {0}")]
    Decode(String),
}

/// Async client for the external identity service.
///
/// Admin operations authenticate with the service key; session operations
/// carry the end user's access token.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Resolve a session access token to its user.
    async fn get_user(&self, access_token: &str) -> Result<IdentityUser, IdentityError>;

    /// Password-grant sign-in.
    async fn sign_in(&self, email: &str, password: &str)
    -> Result<IdentitySession, IdentityError>;

    /// Revoke the session behind an access token.
    async fn sign_out(&self, access_token: &str) -> Result<(), IdentityError>;

    /// Look up an account by email via the provider's admin listing.
    async fn find_user_by_email(
        &self,
        email: &str,
    ) -> Result<Option<IdentityUser>, IdentityError>;

    /// Create an account and have the provider send the invite email.
    async fn invite_user_by_email(
        &self,
        email: &str,
        redirect_to: &str,
    ) -> Result<IdentityUser, IdentityError>;

    /// Trigger a recovery email for an existing account. Does not create one.
    async fn generate_recovery_link(
        &self,
        email: &str,
        redirect_to: &str,
    ) -> Result<(), IdentityError>;

    /// Self-service password reset email.
    async fn reset_password_for_email(
        &self,
        email: &str,
        redirect_to: &str,
    ) -> Result<(), IdentityError>;

    /// Update the password for the session behind `access_token`.
    async fn update_password(
        &self,
        access_token: &str,
        new_password: &str,
    ) -> Result<(), IdentityError>;

    /// Delete an account. Returns `IdentityError::NotFound` when the account
    /// is already gone, which callers may treat as non-fatal.
    async fn delete_user(&self, user_id: Uuid) -> Result<(), IdentityError>;
}
