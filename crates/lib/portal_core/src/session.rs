//! Persisted session context.
//!
//! The signed-in user's profile is the only client-side state the portal
//! keeps between runs. Rather than an ambient global, the session is an
//! explicit value: hydrate it once at startup with [`SessionStore::load`],
//! pass it to whatever needs it, and tear it down with
//! [`SessionStore::clear`] on sign-out.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::Profile;

/// Session persistence errors.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("corrupt session file: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// In-memory session state.
///
/// Only the user record survives restarts; the password-change obligation is
/// re-derived per sign-in from the profile and deliberately not persisted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionState {
    pub user: Option<Profile>,

    #[serde(skip)]
    pub must_change_password: bool,
}

impl SessionState {
    pub fn signed_in(&self) -> bool {
        self.user.is_some()
    }

    /// Establish the session for a freshly authenticated user.
    pub fn sign_in(&mut self, profile: Profile) {
        self.must_change_password = profile.must_change_password;
        self.user = Some(profile);
    }

    /// Drop all session state.
    pub fn sign_out(&mut self) {
        self.user = None;
        self.must_change_password = false;
    }
}

/// File-backed store for [`SessionState`].
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Store under the platform data directory
    /// (e.g. `~/.local/share/portal/session.json`).
    pub fn default_location() -> Option<Self> {
        dirs::data_dir().map(|d| Self::new(d.join("portal").join("session.json")))
    }

    /// Hydrate the session. A missing or unreadable file yields the
    /// signed-out default rather than an error.
    pub fn load(&self) -> SessionState {
        match std::fs::read_to_string(&self.path) {
            Ok(contents) => serde_json::from_str(&contents).unwrap_or_default(),
            Err(_) => SessionState::default(),
        }
    }

    /// Persist the session (user record only).
    pub fn save(&self, state: &SessionState) -> Result<(), SessionError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(state)?;
        std::fs::write(&self.path, contents)?;
        Ok(())
    }

    /// Sign-out teardown: remove the persisted record.
    pub fn clear(&self) -> Result<(), SessionError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;
    use chrono::Utc;
    use uuid::Uuid;

    fn store() -> (tempfile::TempDir, SessionStore) {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = SessionStore::new(dir.path().join("session.json"));
        (dir, store)
    }

    fn profile(must_change_password: bool) -> Profile {
        let now = Utc::now();
        Profile {
            id: Uuid::new_v4(),
            email: "user@example.com".into(),
            role: Role::Client,
            must_change_password,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn missing_file_hydrates_signed_out() {
        let (_dir, store) = store();
        let state = store.load();
        assert!(!state.signed_in());
        assert!(!state.must_change_password);
    }

    #[test]
    fn save_then_load_round_trips_the_user() {
        let (_dir, store) = store();
        let mut state = SessionState::default();
        state.sign_in(profile(false));
        store.save(&state).expect("save");

        let loaded = store.load();
        assert!(loaded.signed_in());
        assert_eq!(loaded.user.unwrap().email, "user@example.com");
    }

    #[test]
    fn password_obligation_is_not_persisted() {
        let (_dir, store) = store();
        let mut state = SessionState::default();
        state.sign_in(profile(true));
        assert!(state.must_change_password);
        store.save(&state).expect("save");

        // The flag is re-derived at sign-in, not read back from disk.
        let loaded = store.load();
        assert!(loaded.signed_in());
        assert!(!loaded.must_change_password);
    }

    #[test]
    fn clear_is_idempotent() {
        let (_dir, store) = store();
        let mut state = SessionState::default();
        state.sign_in(profile(false));
        store.save(&state).expect("save");

        store.clear().expect("clear");
        store.clear().expect("clear twice");
        assert!(!store.load().signed_in());
    }

    #[test]
    fn corrupt_file_hydrates_signed_out() {
        let (_dir, store) = store();
        std::fs::create_dir_all(store.path.parent().unwrap()).unwrap();
        std::fs::write(&store.path, "{not json").unwrap();
        assert!(!store.load().signed_in());
    }

    #[test]
    fn sign_out_drops_everything() {
        let mut state = SessionState::default();
        state.sign_in(profile(true));
        state.sign_out();
        assert!(!state.signed_in());
        assert!(!state.must_change_password);
    }
}
