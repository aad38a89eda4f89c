//! Navigation hook used when a session expires.

use crate::logging::log_debug;

use std::sync::Mutex;

/// Where an expired session is sent.
pub const LOGIN_PATH: &str = "/login";

/// Screens that are themselves part of authentication. A 401 seen while on
/// one of these never redirects.
pub const AUTH_PATHS: [&str; 5] = [
    "/login",
    "/register",
    "/forgot-password",
    "/reset-password",
    "/verify-account",
];

/// The host's navigation surface.
#[cfg_attr(test, mockall::automock)]
pub trait Navigator: Send + Sync {
    /// Path of the screen currently shown, e.g. `/dashboard/recipes`.
    fn current_path(&self) -> String;

    /// Full navigation to `path`.
    fn navigate(&self, path: &str);
}

/// Whether `path` is one of `auth_paths` or nested below one.
///
/// Query strings and fragments are ignored.
pub fn is_auth_path<S: AsRef<str>>(path: &str, auth_paths: &[S]) -> bool {
    let path = path
        .split(['?', '#'])
        .next()
        .unwrap_or_default()
        .trim_end_matches('/');

    auth_paths.iter().any(|auth| {
        let auth = auth.as_ref().trim_end_matches('/');
        path == auth
            || path
                .strip_prefix(auth)
                .is_some_and(|rest| rest.starts_with('/'))
    })
}

/// Navigator that only tracks state, for headless hosts and tests.
#[derive(Debug)]
pub struct MemoryNavigator {
    current: Mutex<String>,
    history: Mutex<Vec<String>>,
}

impl MemoryNavigator {
    pub fn new(start: impl Into<String>) -> Self {
        Self {
            current: Mutex::new(start.into()),
            history: Mutex::new(Vec::new()),
        }
    }

    /// Every path navigated to, oldest first.
    pub fn history(&self) -> Vec<String> {
        self.history
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl Default for MemoryNavigator {
    fn default() -> Self {
        Self::new("/")
    }
}

impl Navigator for MemoryNavigator {
    fn current_path(&self) -> String {
        self.current
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn navigate(&self, path: &str) {
        log_debug!(path = %path, "Navigating");
        *self
            .current
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = path.to_string();
        self.history
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(path.to_string());
    }
}
