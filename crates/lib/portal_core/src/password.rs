//! Password-set flow.
//!
//! Validates a new password locally, then submits it through the identity
//! provider using the session implied by the recovery token. Hashing and
//! storage of the password are the provider's concern.

use std::time::Duration;

use thiserror::Error;

use crate::identity::{IdentityError, IdentityProvider};
use crate::session::SessionState;

/// Minimum accepted password length.
pub const MIN_PASSWORD_LEN: usize = 6;

/// How long the UI shows the success confirmation before navigating to the
/// portal landing page.
pub const POST_SUCCESS_REDIRECT: Duration = Duration::from_secs(2);

/// Password-set failures.
#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("Passwords do not match.")]
    Mismatch,

    #[error("Password must be at least {MIN_PASSWORD_LEN} characters long.")]
    TooShort,

    /// Provider-side failure; the message is surfaced verbatim.
    #[error("{0}")]
    Provider(#[from] IdentityError),
}

/// Validate a new password against its confirmation. Runs before any
/// provider call; a failure here never leaves the process.
pub fn validate_new_password(password: &str, confirm: &str) -> Result<(), PasswordError> {
    if password != confirm {
        return Err(PasswordError::Mismatch);
    }
    if password.len() < MIN_PASSWORD_LEN {
        return Err(PasswordError::TooShort);
    }
    Ok(())
}

/// Validate and submit a new password for the session behind `access_token`.
/// On success the session's password-change obligation is cleared.
pub async fn set_password(
    provider: &dyn IdentityProvider,
    access_token: &str,
    password: &str,
    confirm: &str,
    session: &mut SessionState,
) -> Result<(), PasswordError> {
    validate_new_password(password, confirm)?;
    provider.update_password(access_token, password).await?;
    session.must_change_password = false;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use async_trait::async_trait;
    use uuid::Uuid;

    use super::*;
    use crate::identity::{IdentitySession, IdentityUser};

    /// Provider double that counts password updates and optionally fails.
    #[derive(Default)]
    struct CountingProvider {
        updates: AtomicU32,
        fail_with: Option<String>,
    }

    #[async_trait]
    impl IdentityProvider for CountingProvider {
        async fn get_user(&self, _token: &str) -> Result<IdentityUser, IdentityError> {
            unimplemented!("not used by the password flow")
        }

        async fn sign_in(
            &self,
            _email: &str,
            _password: &str,
        ) -> Result<IdentitySession, IdentityError> {
            unimplemented!("not used by the password flow")
        }

        async fn sign_out(&self, _token: &str) -> Result<(), IdentityError> {
            unimplemented!("not used by the password flow")
        }

        async fn find_user_by_email(
            &self,
            _email: &str,
        ) -> Result<Option<IdentityUser>, IdentityError> {
            unimplemented!("not used by the password flow")
        }

        async fn invite_user_by_email(
            &self,
            _email: &str,
            _redirect_to: &str,
        ) -> Result<IdentityUser, IdentityError> {
            unimplemented!("not used by the password flow")
        }

        async fn generate_recovery_link(
            &self,
            _email: &str,
            _redirect_to: &str,
        ) -> Result<(), IdentityError> {
            unimplemented!("not used by the password flow")
        }

        async fn reset_password_for_email(
            &self,
            _email: &str,
            _redirect_to: &str,
        ) -> Result<(), IdentityError> {
            unimplemented!("not used by the password flow")
        }

        async fn update_password(
            &self,
            _token: &str,
            _new_password: &str,
        ) -> Result<(), IdentityError> {
            self.updates.fetch_add(1, Ordering::SeqCst);
            match &self.fail_with {
                Some(message) => Err(IdentityError::Service {
                    status: 422,
                    message: message.clone(),
                }),
                None => Ok(()),
            }
        }

        async fn delete_user(&self, _user_id: Uuid) -> Result<(), IdentityError> {
            unimplemented!("not used by the password flow")
        }
    }

    #[tokio::test]
    async fn validation_failures_never_reach_the_provider() {
        let provider = CountingProvider::default();
        let mut session = SessionState::default();

        let result = set_password(&provider, "tok", "secret1", "secret2", &mut session).await;
        assert!(matches!(result, Err(PasswordError::Mismatch)));

        let result = set_password(&provider, "tok", "abc", "abc", &mut session).await;
        assert!(matches!(result, Err(PasswordError::TooShort)));

        assert_eq!(provider.updates.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn success_clears_the_password_obligation() {
        let provider = CountingProvider::default();
        let mut session = SessionState {
            must_change_password: true,
            ..SessionState::default()
        };

        set_password(&provider, "tok", "secret1", "secret1", &mut session)
            .await
            .expect("set password");

        assert_eq!(provider.updates.load(Ordering::SeqCst), 1);
        assert!(!session.must_change_password);
    }

    #[tokio::test]
    async fn provider_failure_surfaces_verbatim_and_keeps_obligation() {
        let provider = CountingProvider {
            fail_with: Some("Password should be different from the old password.".into()),
            ..CountingProvider::default()
        };
        let mut session = SessionState {
            must_change_password: true,
            ..SessionState::default()
        };

        let err = set_password(&provider, "tok", "secret1", "secret1", &mut session)
            .await
            .expect_err("provider rejects");
        assert_eq!(
            err.to_string(),
            "Password should be different from the old password."
        );
        assert!(session.must_change_password);
    }

    #[test]
    fn mismatched_passwords_are_rejected() {
        assert!(matches!(
            validate_new_password("secret1", "secret2"),
            Err(PasswordError::Mismatch)
        ));
    }

    #[test]
    fn short_passwords_are_rejected() {
        assert!(matches!(
            validate_new_password("abc12", "abc12"),
            Err(PasswordError::TooShort)
        ));
    }

    #[test]
    fn six_characters_is_enough() {
        assert!(validate_new_password("abc123", "abc123").is_ok());
    }

    #[test]
    fn mismatch_wins_over_length() {
        // Both checks fail; the mismatch is reported first.
        assert!(matches!(
            validate_new_password("abc", "xyz"),
            Err(PasswordError::Mismatch)
        ));
    }
}
