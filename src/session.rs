//! Session token storage and in-memory auth state.
//!
//! The bearer token lives behind the [`SessionStore`] trait so the HTTP
//! client never touches ambient global state. [`Session`] pairs the store
//! with the signed-in user kept in memory. Only a successful login writes
//! the token; only logout and the 401 handler clear it.

use crate::logging::{log_debug, log_warn};
use crate::types::User;

use serde_json::{Map, Value};
use std::fmt::Debug;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

/// Key the token is stored under.
pub const SESSION_TOKEN_KEY: &str = "token";

/// Persistent key-value storage holding the session token.
pub trait SessionStore: Send + Sync + Debug {
    fn get(&self) -> Option<String>;
    fn set(&self, token: &str);
    fn clear(&self);
}

/// Process-local token storage.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    token: RwLock<Option<String>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: RwLock::new(Some(token.into())),
        }
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self) -> Option<String> {
        self.token
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn set(&self, token: &str) {
        *self
            .token
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(token.to_string());
    }

    fn clear(&self) {
        *self
            .token
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = None;
    }
}

/// Token storage backed by a JSON object file, surviving restarts.
///
/// Other keys in the file are preserved. I/O failures are logged and
/// treated as "no token"; a broken store signs the user out rather than
/// failing requests.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
    key: String,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            key: SESSION_TOKEN_KEY.to_string(),
        }
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Map<String, Value> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Map::new(),
            Err(e) => {
                log_warn!(path = %self.path.display(), error = %e, "Failed to read session store");
                return Map::new();
            }
        };

        match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Object(entries)) => entries,
            Ok(_) | Err(_) => {
                log_warn!(path = %self.path.display(), "Session store is not a JSON object, ignoring it");
                Map::new()
            }
        }
    }

    fn save(&self, entries: &Map<String, Value>) {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            if let Err(e) = std::fs::create_dir_all(parent) {
                log_warn!(path = %parent.display(), error = %e, "Failed to create session store directory");
                return;
            }
        }

        let serialized = Value::Object(entries.clone()).to_string();
        if let Err(e) = std::fs::write(&self.path, serialized) {
            log_warn!(path = %self.path.display(), error = %e, "Failed to write session store");
        }
    }
}

impl SessionStore for FileSessionStore {
    fn get(&self) -> Option<String> {
        self.load()
            .get(&self.key)
            .and_then(Value::as_str)
            .filter(|token| !token.is_empty())
            .map(str::to_string)
    }

    fn set(&self, token: &str) {
        let mut entries = self.load();
        entries.insert(self.key.clone(), Value::String(token.to_string()));
        self.save(&entries);
    }

    fn clear(&self) {
        let mut entries = self.load();
        if entries.remove(&self.key).is_some() {
            self.save(&entries);
        }
    }
}

/// The token store plus the in-memory auth state derived from it.
#[derive(Debug)]
pub struct Session {
    store: Arc<dyn SessionStore>,
    current_user: RwLock<Option<User>>,
}

impl Session {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self {
            store,
            current_user: RwLock::new(None),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemorySessionStore::new()))
    }

    pub fn token(&self) -> Option<String> {
        self.store.get()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token().is_some()
    }

    pub fn current_user(&self) -> Option<User> {
        self.current_user
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub(crate) fn set_current_user(&self, user: Option<User>) {
        *self
            .current_user
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = user;
    }

    /// Record a successful login.
    pub fn sign_in(&self, token: &str, user: Option<User>) {
        self.store.set(token);
        log_debug!(
            has_user = user.is_some(),
            "Session token stored after login"
        );
        self.set_current_user(user);
    }

    /// Drop the token and reset in-memory auth state.
    pub fn sign_out(&self) {
        self.store.clear();
        self.set_current_user(None);
        log_debug!("Session cleared");
    }
}
