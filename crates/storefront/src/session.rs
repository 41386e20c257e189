//! Signed-in member session.
//!
//! A session is a bearer token plus the member's profile. Both are persisted
//! together through a [`SessionStore`] so the member stays signed in across
//! runs, and both are cleared together on logout or when the backend rejects
//! the token.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::api::AuthResponse;
use crate::error::{clear_sentry_user, set_sentry_user};

/// File name of the persisted session inside the data directory.
pub const SESSION_FILE: &str = "session.json";

/// Errors from persisting the session.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("session serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Profile of the signed-in member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub email: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
}

impl Profile {
    /// Build a profile from an auth response, falling back to the email
    /// the member typed when the backend does not echo it.
    #[must_use]
    pub fn from_auth(auth: &AuthResponse, typed_email: &str) -> Self {
        Self {
            email: auth
                .email
                .clone()
                .unwrap_or_else(|| typed_email.trim().to_string()),
            first_name: auth.first_name.clone(),
            last_name: auth.last_name.clone(),
        }
    }

    /// Name to greet the member with.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.first_name
            .as_deref()
            .filter(|n| !n.is_empty())
            .unwrap_or(&self.email)
    }
}

/// Stored form of a session.
#[derive(Clone, Serialize, Deserialize)]
pub struct StoredSession {
    pub token: String,
    pub profile: Profile,
}

impl std::fmt::Debug for StoredSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoredSession")
            .field("token", &"[REDACTED]")
            .field("profile", &self.profile)
            .finish()
    }
}

/// Durable storage for the session.
pub trait SessionStore: Send + Sync {
    /// Load the stored session, or `None` when signed out.
    ///
    /// # Errors
    ///
    /// Returns error if the storage cannot be read.
    fn load(&self) -> Result<Option<StoredSession>, SessionError>;

    /// Replace the stored session.
    ///
    /// # Errors
    ///
    /// Returns error if the storage cannot be written.
    fn save(&self, session: &StoredSession) -> Result<(), SessionError>;

    /// Remove the stored session.
    ///
    /// # Errors
    ///
    /// Returns error if the storage cannot be written.
    fn clear(&self) -> Result<(), SessionError>;
}

/// Session store kept in memory.
#[derive(Default)]
pub struct MemorySessionStore {
    stored: Mutex<Option<StoredSession>>,
}

impl MemorySessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> Result<Option<StoredSession>, SessionError> {
        Ok(self
            .stored
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    fn save(&self, session: &StoredSession) -> Result<(), SessionError> {
        *self.stored.lock().unwrap_or_else(PoisonError::into_inner) = Some(session.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), SessionError> {
        *self.stored.lock().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}

/// Session store backed by `session.json` in the data directory.
pub struct JsonFileSessionStore {
    path: PathBuf,
}

impl JsonFileSessionStore {
    #[must_use]
    pub fn new(data_dir: &Path) -> Self {
        Self {
            path: data_dir.join(SESSION_FILE),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionStore for JsonFileSessionStore {
    fn load(&self) -> Result<Option<StoredSession>, SessionError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        match serde_json::from_str::<StoredSession>(&raw) {
            Ok(session) if !session.token.is_empty() => Ok(Some(session)),
            Ok(_) => Ok(None),
            Err(e) => {
                tracing::warn!(error = %e, "Discarding unreadable session");
                Ok(None)
            }
        }
    }

    fn save(&self, session: &StoredSession) -> Result<(), SessionError> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(session)?)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn clear(&self) -> Result<(), SessionError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// An active member session.
pub struct Session {
    token: SecretString,
    profile: Profile,
}

impl Session {
    #[must_use]
    pub const fn token(&self) -> &SecretString {
        &self.token
    }

    #[must_use]
    pub const fn profile(&self) -> &Profile {
        &self.profile
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("token", &"[REDACTED]")
            .field("profile", &self.profile)
            .finish()
    }
}

/// Who is signed in, if anyone.
pub struct SessionContext {
    store: Arc<dyn SessionStore>,
    current: Option<Session>,
}

impl std::fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionContext")
            .field("current", &self.current)
            .finish_non_exhaustive()
    }
}

impl SessionContext {
    /// Restore the session held by `store`.
    ///
    /// # Errors
    ///
    /// Returns error if the store cannot be read.
    pub fn open(store: Arc<dyn SessionStore>) -> Result<Self, SessionError> {
        let current = store.load()?.map(|stored| Session {
            token: SecretString::from(stored.token),
            profile: stored.profile,
        });

        if let Some(session) = &current {
            set_sentry_user(&session.profile.email, Some(&session.profile.email));
            tracing::debug!(email = %session.profile.email, "Session restored");
        }

        Ok(Self { store, current })
    }

    /// A signed-out context that is only kept in memory.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            store: Arc::new(MemorySessionStore::new()),
            current: None,
        }
    }

    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.current.is_some()
    }

    /// Bearer token of the signed-in member.
    #[must_use]
    pub fn token(&self) -> Option<&SecretString> {
        self.current.as_ref().map(Session::token)
    }

    #[must_use]
    pub fn profile(&self) -> Option<&Profile> {
        self.current.as_ref().map(Session::profile)
    }

    /// Sign in. The token and profile are stored before they become visible.
    ///
    /// # Errors
    ///
    /// Returns error if the session could not be stored; the context is left
    /// unchanged.
    pub fn login(&mut self, token: SecretString, profile: Profile) -> Result<(), SessionError> {
        self.store.save(&StoredSession {
            token: token.expose_secret().to_string(),
            profile: profile.clone(),
        })?;

        set_sentry_user(&profile.email, Some(&profile.email));
        tracing::info!(email = %profile.email, "Member signed in");

        self.current = Some(Session { token, profile });
        Ok(())
    }

    /// Sign out.
    ///
    /// # Errors
    ///
    /// Returns error if the stored session could not be removed. The
    /// in-memory session is cleared either way.
    pub fn logout(&mut self) -> Result<(), SessionError> {
        self.current = None;
        clear_sentry_user();
        self.store.clear()
    }

    /// Drop a session the backend no longer accepts.
    pub fn invalidate(&mut self) {
        if let Some(session) = &self.current {
            tracing::warn!(email = %session.profile.email, "Session token rejected, signing out");
        }
        if let Err(e) = self.logout() {
            tracing::error!(error = %e, "Failed to clear stored session");
        }
    }
}
