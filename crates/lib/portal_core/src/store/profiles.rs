//! Profile-table queries.

use sqlx::PgPool;
use uuid::Uuid;

use super::StoreError;
use crate::models::{Profile, Role};

type ProfileRow = (
    Uuid,
    String,
    String,
    bool,
    chrono::DateTime<chrono::Utc>,
    chrono::DateTime<chrono::Utc>,
);

fn from_row(row: ProfileRow) -> Result<Profile, StoreError> {
    let (id, email, role, must_change_password, created_at, updated_at) = row;
    let role = role
        .parse::<Role>()
        .map_err(|_| StoreError::Db(sqlx::Error::Decode("unexpected role value".into())))?;
    Ok(Profile {
        id,
        email,
        role,
        must_change_password,
        created_at,
        updated_at,
    })
}

/// Fetch the role for a profile, if the profile exists.
pub async fn get_role(pool: &PgPool, id: Uuid) -> Result<Option<Role>, StoreError> {
    let row = sqlx::query_scalar::<_, String>("SELECT role FROM profiles WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    match row {
        None => Ok(None),
        Some(s) => Ok(Some(s.parse::<Role>().map_err(|_| {
            StoreError::Db(sqlx::Error::Decode("unexpected role value".into()))
        })?)),
    }
}

/// Fetch a profile by email.
pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Profile>, StoreError> {
    let row = sqlx::query_as::<_, ProfileRow>(
        "SELECT id, email, role, must_change_password, created_at, updated_at \
         FROM profiles WHERE email = $1",
    )
    .bind(email)
    .fetch_optional(pool)
    .await?;
    row.map(from_row).transpose()
}

/// Update the role on an existing profile. Returns the number of rows touched
/// so callers can detect a missing row.
pub async fn update_role(pool: &PgPool, id: Uuid, role: Role) -> Result<u64, StoreError> {
    let result = sqlx::query("UPDATE profiles SET role = $2, updated_at = now() WHERE id = $1")
        .bind(id)
        .bind(role.as_str())
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

/// Insert a profile row keyed by the identity-provider account id.
pub async fn insert(
    pool: &PgPool,
    id: Uuid,
    email: &str,
    role: Role,
    must_change_password: bool,
) -> Result<(), StoreError> {
    sqlx::query(
        "INSERT INTO profiles (id, email, role, must_change_password) \
         VALUES ($1, $2, $3, $4)",
    )
    .bind(id)
    .bind(email)
    .bind(role.as_str())
    .bind(must_change_password)
    .execute(pool)
    .await?;
    Ok(())
}

/// Flag a profile as needing a password change (set at invite/recovery time).
pub async fn set_must_change_password(
    pool: &PgPool,
    id: Uuid,
    flag: bool,
) -> Result<(), StoreError> {
    sqlx::query(
        "UPDATE profiles SET must_change_password = $2, updated_at = now() WHERE id = $1",
    )
    .bind(id)
    .bind(flag)
    .execute(pool)
    .await?;
    Ok(())
}

/// Clear the password-change flag for whichever profile owns the email,
/// matching either spelling the caller's session may carry.
pub async fn clear_must_change_password_by_email(
    pool: &PgPool,
    raw_email: &str,
    normalized_email: &str,
) -> Result<(), StoreError> {
    sqlx::query(
        "UPDATE profiles SET must_change_password = false, updated_at = now() \
         WHERE email IN ($1, $2) AND must_change_password",
    )
    .bind(raw_email)
    .bind(normalized_email)
    .execute(pool)
    .await?;
    Ok(())
}

/// Delete a profile row.
pub async fn delete(pool: &PgPool, id: Uuid) -> Result<(), StoreError> {
    sqlx::query("DELETE FROM profiles WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

/// All profiles, newest first.
pub async fn list(pool: &PgPool) -> Result<Vec<Profile>, StoreError> {
    let rows = sqlx::query_as::<_, ProfileRow>(
        "SELECT id, email, role, must_change_password, created_at, updated_at \
         FROM profiles ORDER BY created_at DESC",
    )
    .fetch_all(pool)
    .await?;
    rows.into_iter().map(from_row).collect()
}
