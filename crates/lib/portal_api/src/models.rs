//! API request/response bodies.
//!
//! Action responses use camelCase on the wire; record listings keep the
//! persisted snake_case field names.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use portal_core::models::{Invite, Profile, Role};

/// Standard error body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

/// `POST /api/invites` request.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateInviteRequest {
    pub email: String,
    /// Defaults to `client` when omitted.
    pub role: Option<String>,
}

/// `POST /api/invites` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateInviteResponse {
    pub success: bool,
    pub user_id: Uuid,
    pub invite_id: Option<Uuid>,
    pub message: String,
}

/// `DELETE /api/invites/{id}` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelInviteResponse {
    pub success: bool,
    pub removed_user_id: Option<Uuid>,
    pub auth_user_deleted: bool,
}

/// `POST /api/invites/mark-used` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkUsedResponse {
    pub success: bool,
    pub updated_count: usize,
}

/// Invite record as listed to admins.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InviteInfo {
    pub id: Uuid,
    pub email: String,
    pub token: String,
    pub used: bool,
    pub created_by: Option<Uuid>,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl From<Invite> for InviteInfo {
    fn from(invite: Invite) -> Self {
        Self {
            id: invite.id,
            email: invite.email,
            token: invite.token,
            used: invite.used,
            created_by: invite.created_by,
            expires_at: invite.expires_at,
            created_at: invite.created_at,
        }
    }
}

/// `GET /api/invites` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InviteListResponse {
    pub invites: Vec<InviteInfo>,
}

/// Profile record as listed to admins.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserInfo {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
    pub must_change_password: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Profile> for UserInfo {
    fn from(profile: Profile) -> Self {
        Self {
            id: profile.id,
            email: profile.email,
            role: profile.role,
            must_change_password: profile.must_change_password,
            created_at: profile.created_at,
            updated_at: profile.updated_at,
        }
    }
}

/// `GET /api/users` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserListResponse {
    pub users: Vec<UserInfo>,
}

/// `GET /api/invites` query string.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListInvitesQuery {
    #[serde(default)]
    pub include_used: bool,
}
