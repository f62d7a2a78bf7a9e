//! Durable session storage.
//!
//! The token pair and cached user identity persist as `session.json` in
//! the application config directory, so a session survives restarts.
//! All operations are synchronous; the store never touches the network.

use std::path::PathBuf;
use std::sync::RwLock;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::User;

use super::StoreError;

/// Session file name inside the store directory
const SESSION_FILE: &str = "session.json";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct SessionState {
    access_token: Option<String>,
    refresh_token: Option<String>,
    user: Option<User>,
}

/// Holds the access/refresh token pair and the cached user identity.
///
/// The store is the single owner of persisted session data: the refresh
/// coordinator writes new pairs through it and the session terminator
/// clears it; nothing else mutates the session file.
#[derive(Debug)]
pub struct TokenStore {
    path: PathBuf,
    state: RwLock<SessionState>,
}

impl TokenStore {
    /// Open a store rooted at `dir`, loading any persisted session.
    ///
    /// A missing or unreadable session file is treated as "no session"
    /// rather than an error; a later `set_tokens` recreates it.
    pub fn open(dir: impl Into<PathBuf>) -> Self {
        let path = dir.into().join(SESSION_FILE);
        let state = match std::fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(state) => state,
                Err(err) => {
                    debug!(error = %err, "Ignoring unparseable session file");
                    SessionState::default()
                }
            },
            Err(_) => SessionState::default(),
        };
        Self {
            path,
            state: RwLock::new(state),
        }
    }

    pub fn access_token(&self) -> Option<String> {
        self.state
            .read()
            .expect("session state lock poisoned")
            .access_token
            .clone()
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.state
            .read()
            .expect("session state lock poisoned")
            .refresh_token
            .clone()
    }

    pub fn user(&self) -> Option<User> {
        self.state
            .read()
            .expect("session state lock poisoned")
            .user
            .clone()
    }

    /// Whether a refresh token is stored (the minimum for a usable session).
    pub fn has_session(&self) -> bool {
        self.state
            .read()
            .expect("session state lock poisoned")
            .refresh_token
            .is_some()
    }

    /// Replace both tokens at once and persist.
    ///
    /// The pair is never split: a renewal either rotates both or neither.
    pub fn set_tokens(&self, access: &str, refresh: &str) -> Result<(), StoreError> {
        let snapshot = {
            let mut state = self.state.write().expect("session state lock poisoned");
            state.access_token = Some(access.to_string());
            state.refresh_token = Some(refresh.to_string());
            state.clone()
        };
        self.persist(&snapshot)
    }

    /// Cache the account identity alongside the tokens.
    pub fn set_user(&self, user: User) -> Result<(), StoreError> {
        let snapshot = {
            let mut state = self.state.write().expect("session state lock poisoned");
            state.user = Some(user);
            state.clone()
        };
        self.persist(&snapshot)
    }

    /// Remove all session data, including the cached identity.
    pub fn clear(&self) -> Result<(), StoreError> {
        {
            let mut state = self.state.write().expect("session state lock poisoned");
            *state = SessionState::default();
        }
        if self.path.exists() {
            std::fs::remove_file(&self.path)?;
        }
        debug!("Session store cleared");
        Ok(())
    }

    fn persist(&self, state: &SessionState) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(state)?;
        std::fs::write(&self.path, contents)?;
        Ok(())
    }
}
