use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::{Authority, Credential};
use crate::api::ApiError;
use crate::validation::validate_login;

/// Session file name in the data directory
const SESSION_FILE: &str = "auth-storage.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub email: String,
}

/// Persisted session layout. Written verbatim on every state change.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionData {
    pub token: Option<String>,
    pub user: Option<User>,
    pub is_authenticated: bool,
}

impl SessionData {
    fn signed_in(credential: Credential) -> Self {
        Self {
            token: Some(credential.token),
            user: Some(credential.user),
            is_authenticated: true,
        }
    }

    /// A token is present exactly when the session claims to be authenticated.
    pub fn is_consistent(&self) -> bool {
        match (&self.token, self.is_authenticated) {
            (Some(token), true) => !token.is_empty() && self.user.is_some(),
            (None, false) => self.user.is_none(),
            _ => false,
        }
    }
}

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Failed to write session file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to encode session: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Holds the current credential and notifies watchers when it changes.
///
/// Every login and logout bumps a generation counter; anything holding data
/// derived from the old credential watches it and discards that data.
pub struct SessionStore {
    path: Option<PathBuf>,
    data: RwLock<SessionData>,
    authority: Arc<dyn Authority>,
    generation: watch::Sender<u64>,
}

impl SessionStore {
    /// Open the session persisted under `dir`, or start signed out if there is
    /// none or it cannot be read.
    pub fn open(dir: &Path, authority: Arc<dyn Authority>) -> Self {
        let path = dir.join(SESSION_FILE);
        let data = Self::load(&path);
        debug!(path = %path.display(), authenticated = data.is_authenticated, "Session loaded");
        Self::build(Some(path), data, authority)
    }

    /// A session that is never written to disk.
    pub fn in_memory(authority: Arc<dyn Authority>) -> Self {
        Self::build(None, SessionData::default(), authority)
    }

    fn build(path: Option<PathBuf>, data: SessionData, authority: Arc<dyn Authority>) -> Self {
        let (generation, _) = watch::channel(0);
        Self {
            path,
            data: RwLock::new(data),
            authority,
            generation,
        }
    }

    /// Read the persisted session. Missing, unreadable, corrupt or
    /// self-contradicting data all mean "no session".
    fn load(path: &Path) -> SessionData {
        if !path.exists() {
            return SessionData::default();
        }

        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) => {
                warn!(error = %e, "Failed to read session file, starting signed out");
                return SessionData::default();
            }
        };

        match serde_json::from_str::<SessionData>(&contents) {
            Ok(data) if data.is_consistent() => data,
            Ok(_) => {
                warn!("Session file is inconsistent, starting signed out");
                SessionData::default()
            }
            Err(e) => {
                warn!(error = %e, "Failed to parse session file, starting signed out");
                SessionData::default()
            }
        }
    }

    /// Write the session to disk
    fn save(&self, data: &SessionData) -> Result<(), SessionError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(data)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Replace the session state, persist it, and notify watchers.
    fn transition(&self, next: SessionData) {
        let mut data = self.write();
        *data = next;
        if let Err(e) = self.save(&data) {
            warn!(error = %e, "Failed to save session");
        }
        drop(data);
        self.generation.send_modify(|g| *g += 1);
    }

    /// Attempt to sign in.
    ///
    /// Empty input is a validation error. A rejected pair is `Ok(false)` and
    /// leaves the current session untouched.
    pub async fn login(&self, email: &str, password: &str) -> Result<bool, ApiError> {
        validate_login(email, password)?;

        match self.authority.authenticate(email, password).await? {
            Some(credential) => {
                self.transition(SessionData::signed_in(credential));
                info!(email, "Login successful");
                Ok(true)
            }
            None => {
                info!(email, "Login rejected");
                Ok(false)
            }
        }
    }

    /// Clear the credential. Safe to call when already signed out.
    pub fn logout(&self) {
        let was_authenticated = self.read().is_authenticated;
        self.transition(SessionData::default());
        if was_authenticated {
            info!("Logged out");
        } else {
            debug!("Logout while signed out");
        }
    }

    /// Get the bearer token if signed in
    pub fn current_token(&self) -> Option<String> {
        self.read().token.clone()
    }

    pub fn current_user(&self) -> Option<User> {
        self.read().user.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.read().is_authenticated
    }

    pub fn snapshot(&self) -> SessionData {
        self.read().clone()
    }

    /// Watch the credential generation; it changes on every login and logout.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.generation.subscribe()
    }

    pub fn generation(&self) -> u64 {
        *self.generation.borrow()
    }

    fn read(&self) -> RwLockReadGuard<'_, SessionData> {
        self.data.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, SessionData> {
        self.data.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ErrorKind;
    use crate::auth::{MockAuthority, MOCK_EMAIL, MOCK_PASSWORD};

    fn authority() -> Arc<dyn Authority> {
        Arc::new(MockAuthority::new())
    }

    #[tokio::test]
    async fn test_login_persists_credential() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = SessionStore::open(dir.path(), authority());
        assert!(!store.is_authenticated());

        assert!(store.login(MOCK_EMAIL, MOCK_PASSWORD).await.expect("login"));
        assert!(store.is_authenticated());
        assert_eq!(store.current_token().as_deref(), Some("mock-jwt-token"));

        let raw = std::fs::read_to_string(dir.path().join(SESSION_FILE)).expect("session file");
        let value: serde_json::Value = serde_json::from_str(&raw).expect("session json");
        assert_eq!(value["token"], "mock-jwt-token");
        assert_eq!(value["user"]["email"], MOCK_EMAIL);
        assert_eq!(value["isAuthenticated"], true);

        // A fresh process sees the same session
        let reopened = SessionStore::open(dir.path(), authority());
        assert_eq!(reopened.snapshot(), store.snapshot());
    }

    #[tokio::test]
    async fn test_rejected_login_returns_false() {
        let store = SessionStore::in_memory(authority());
        assert!(!store.login(MOCK_EMAIL, "nope").await.expect("login call"));
        assert!(!store.login("other@example.com", MOCK_PASSWORD).await.expect("login call"));
        assert!(!store.is_authenticated());
        assert_eq!(store.generation(), 0);
    }

    #[tokio::test]
    async fn test_empty_login_is_validation_error() {
        let store = SessionStore::in_memory(authority());
        let err = store.login("", MOCK_PASSWORD).await.expect_err("empty email");
        assert_eq!(err.kind(), ErrorKind::Validation);
        let err = store.login(MOCK_EMAIL, "").await.expect_err("empty password");
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_logout_is_idempotent_and_persisted() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = SessionStore::open(dir.path(), authority());
        store.login(MOCK_EMAIL, MOCK_PASSWORD).await.expect("login");

        store.logout();
        store.logout();
        assert!(!store.is_authenticated());
        assert!(store.current_token().is_none());
        assert!(store.current_user().is_none());

        let raw = std::fs::read_to_string(dir.path().join(SESSION_FILE)).expect("session file");
        let data: SessionData = serde_json::from_str(&raw).expect("session json");
        assert_eq!(data, SessionData::default());
    }

    #[tokio::test]
    async fn test_generation_bumps_on_transitions() {
        let store = SessionStore::in_memory(authority());
        let rx = store.subscribe();
        assert_eq!(*rx.borrow(), 0);

        store.login(MOCK_EMAIL, MOCK_PASSWORD).await.expect("login");
        assert_eq!(*rx.borrow(), 1);
        store.logout();
        assert_eq!(*rx.borrow(), 2);
    }

    #[test]
    fn test_corrupt_session_file_means_signed_out() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join(SESSION_FILE), "{not json").expect("write");
        let store = SessionStore::open(dir.path(), authority());
        assert!(!store.is_authenticated());
        assert!(store.current_token().is_none());
    }

    #[test]
    fn test_inconsistent_session_file_means_signed_out() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(
            dir.path().join(SESSION_FILE),
            r#"{"token":null,"user":{"email":"x@y.z"},"isAuthenticated":true}"#,
        )
        .expect("write");
        let store = SessionStore::open(dir.path(), authority());
        assert!(!store.is_authenticated());
    }

    #[test]
    fn test_missing_session_file_means_signed_out() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = SessionStore::open(&dir.path().join("nested"), authority());
        assert_eq!(store.snapshot(), SessionData::default());
    }
}
