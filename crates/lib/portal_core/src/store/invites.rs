//! Invite-table queries and token generation.

use chrono::{DateTime, Utc};
use rand::distr::Alphanumeric;
use rand::{Rng, rng};
use sqlx::PgPool;
use uuid::Uuid;

use super::StoreError;
use crate::models::Invite;
use crate::uuid::uuidv7;

/// Random suffix length of a generated invite token.
const TOKEN_SUFFIX_LEN: usize = 24;

/// Invite lifetime.
pub const INVITE_TTL_DAYS: i64 = 7;

/// Generate an opaque invite token: millisecond timestamp prefix plus a
/// random alphanumeric suffix. The prefix keeps tokens unique across
/// concurrent issuance without coordination.
pub fn generate_token(now: DateTime<Utc>) -> String {
    let suffix: String = rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_SUFFIX_LEN)
        .map(char::from)
        .collect();
    format!("{}_{}", now.timestamp_millis(), suffix)
}

/// Parameters for recording an invite.
#[derive(Debug, Clone)]
pub struct CreateInviteParams {
    pub email: String,
    pub token: String,
    pub used: bool,
    pub created_by: Option<Uuid>,
    pub expires_at: DateTime<Utc>,
}

type InviteRow = (
    Uuid,
    String,
    String,
    bool,
    Option<Uuid>,
    DateTime<Utc>,
    DateTime<Utc>,
);

fn from_row(row: InviteRow) -> Invite {
    let (id, email, token, used, created_by, expires_at, created_at) = row;
    Invite {
        id,
        email,
        token,
        used,
        created_by,
        expires_at,
        created_at,
    }
}

/// Insert an invite record, returning it. Ids are UUIDv7 so listing order
/// and id order agree.
pub async fn create(pool: &PgPool, params: &CreateInviteParams) -> Result<Invite, StoreError> {
    let row = sqlx::query_as::<_, InviteRow>(
        "INSERT INTO invites (id, email, token, used, created_by, expires_at) \
         VALUES ($1, $2, $3, $4, $5, $6) \
         RETURNING id, email, token, used, created_by, expires_at, created_at",
    )
    .bind(uuidv7())
    .bind(&params.email)
    .bind(&params.token)
    .bind(params.used)
    .bind(params.created_by)
    .bind(params.expires_at)
    .fetch_one(pool)
    .await?;
    Ok(from_row(row))
}

/// Fetch an invite by id.
pub async fn get(pool: &PgPool, id: Uuid) -> Result<Option<Invite>, StoreError> {
    let row = sqlx::query_as::<_, InviteRow>(
        "SELECT id, email, token, used, created_by, expires_at, created_at \
         FROM invites WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row.map(from_row))
}

/// All invites, newest first. Unused-only unless `include_used` is set.
pub async fn list(pool: &PgPool, include_used: bool) -> Result<Vec<Invite>, StoreError> {
    let rows = if include_used {
        sqlx::query_as::<_, InviteRow>(
            "SELECT id, email, token, used, created_by, expires_at, created_at \
             FROM invites ORDER BY created_at DESC",
        )
        .fetch_all(pool)
        .await?
    } else {
        sqlx::query_as::<_, InviteRow>(
            "SELECT id, email, token, used, created_by, expires_at, created_at \
             FROM invites WHERE NOT used ORDER BY created_at DESC",
        )
        .fetch_all(pool)
        .await?
    };
    Ok(rows.into_iter().map(from_row).collect())
}

/// Remove an invite record.
pub async fn delete(pool: &PgPool, id: Uuid) -> Result<(), StoreError> {
    sqlx::query("DELETE FROM invites WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Mark every unused invite for either spelling of the caller's email as
/// used, returning the ids that were updated. Idempotent: a second call
/// matches zero rows.
pub async fn mark_used_for_email(
    pool: &PgPool,
    raw_email: &str,
    normalized_email: &str,
) -> Result<Vec<Uuid>, StoreError> {
    let ids = sqlx::query_scalar::<_, Uuid>(
        "UPDATE invites SET used = true \
         WHERE email IN ($1, $2) AND NOT used \
         RETURNING id",
    )
    .bind(raw_email)
    .bind(normalized_email)
    .fetch_all(pool)
    .await?;
    Ok(ids)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_has_timestamp_prefix_and_random_suffix() {
        let now = Utc::now();
        let token = generate_token(now);
        let (prefix, suffix) = token.split_once('_').expect("separator");
        assert_eq!(prefix, now.timestamp_millis().to_string());
        assert_eq!(suffix.len(), TOKEN_SUFFIX_LEN);
        assert!(suffix.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn tokens_are_unique() {
        let now = Utc::now();
        let a = generate_token(now);
        let b = generate_token(now);
        assert_ne!(a, b);
    }
}
