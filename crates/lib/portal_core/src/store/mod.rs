//! Invite and profile persistence.
//!
//! Hand-written sqlx queries over the two portal tables. No locking: the
//! invite table tolerates duplicate rows per email by design, and only the
//! most recent pending invite matters to callers.

pub mod invites;
pub mod profiles;

use thiserror::Error;

/// Store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("not found")]
    NotFound,

    #[error("database error: {0}")]
    Db(#[from] sqlx::Error),
}

impl StoreError {
    /// Whether the underlying failure is a unique-constraint violation.
    ///
    /// The invite issuer uses this to detect the race where a provider-side
    /// trigger created the profile row between our update and insert.
    pub fn is_unique_violation(&self) -> bool {
        match self {
            StoreError::Db(sqlx::Error::Database(db)) => db.is_unique_violation(),
            _ => false,
        }
    }
}
