use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{debug, warn};

use crate::api::AuthError;
use crate::models::TokenPair;

use super::store::SecureStorage;

/// Secure storage key for the access token
pub const ACCESS_TOKEN_KEY: &str = "accessToken";

/// Secure storage key for the refresh token
pub const REFRESH_TOKEN_KEY: &str = "refreshToken";

/// Secure storage key for the remember flag
pub const REMEMBER_ME_KEY: &str = "rememberMe";

/// Sentinel stored under `REMEMBER_ME_KEY` when the session is remembered
const REMEMBERED: &str = "1";

const PERSISTED_KEYS: [&str; 3] = [ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, REMEMBER_ME_KEY];

#[derive(Debug, Default)]
struct MemoryTokens {
    access: Option<String>,
    refresh: Option<String>,
}

/// What secure storage says about the remember flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RememberPreference {
    /// `rememberMe` holds the `"1"` sentinel.
    Remembered,
    /// No flag stored, which is the case for session-only logins.
    NotRecorded,
    /// Storage could not be read.
    Unreadable,
}

impl RememberPreference {
    pub fn is_remembered(self) -> bool {
        matches!(self, RememberPreference::Remembered)
    }
}

/// Keys whose best-effort deletion failed.
///
/// A non-empty report means secure storage may still hold values that the
/// in-memory state no longer reflects.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanupReport {
    failed_keys: Vec<&'static str>,
}

impl CleanupReport {
    pub fn is_clean(&self) -> bool {
        self.failed_keys.is_empty()
    }

    pub fn failed_keys(&self) -> &[&'static str] {
        &self.failed_keys
    }
}

/// The process-wide session: one token pair, held either in secure storage
/// (remembered) or in memory (session-only), never both.
///
/// Construct one at startup and share it as `Arc<Session>`.
pub struct Session {
    storage: Arc<dyn SecureStorage>,
    memory: RwLock<MemoryTokens>,
}

impl Session {
    pub fn new(storage: Arc<dyn SecureStorage>) -> Self {
        Self {
            storage,
            memory: RwLock::new(MemoryTokens::default()),
        }
    }

    /// Store a token pair, replacing whatever was there before.
    ///
    /// Remembered pairs go to secure storage and in-memory copies are cleared.
    /// Session-only pairs go to memory and persisted copies are deleted on a
    /// best-effort basis; failed deletions are reported rather than returned
    /// as errors.
    pub fn save_tokens(&self, tokens: &TokenPair, remember: bool) -> Result<CleanupReport, AuthError> {
        if remember {
            if let Err(e) = self.persist(tokens) {
                // Don't leave half a pair behind
                let report = self.delete_persisted();
                if !report.is_clean() {
                    warn!(keys = ?report.failed_keys(), "Failed to roll back partial token write");
                }
                return Err(e.into());
            }
            self.clear_session_tokens();
            debug!("Saved remembered token pair to secure storage");
            Ok(CleanupReport::default())
        } else {
            {
                let mut memory = self.write_memory();
                memory.access = Some(tokens.access_token.clone());
                memory.refresh = Some(tokens.refresh_token.clone());
            }
            let report = self.delete_persisted();
            debug!(clean = report.is_clean(), "Saved session-only token pair in memory");
            Ok(report)
        }
    }

    /// Forget the in-memory pair. Persisted tokens are left alone.
    pub fn clear_session_tokens(&self) {
        let mut memory = self.write_memory();
        memory.access = None;
        memory.refresh = None;
    }

    pub fn access_token(&self) -> Option<String> {
        if let Some(token) = self.read_memory().access.clone() {
            return Some(token);
        }
        self.read_persisted(ACCESS_TOKEN_KEY)
    }

    pub fn refresh_token(&self) -> Option<String> {
        if let Some(token) = self.read_memory().refresh.clone() {
            return Some(token);
        }
        self.read_persisted(REFRESH_TOKEN_KEY)
    }

    pub fn has_session(&self) -> bool {
        self.access_token().is_some()
    }

    pub fn is_remembered(&self) -> bool {
        self.remember_preference().is_remembered()
    }

    pub fn remember_preference(&self) -> RememberPreference {
        match self.storage.get(REMEMBER_ME_KEY) {
            Ok(Some(value)) if value == REMEMBERED => RememberPreference::Remembered,
            Ok(_) => RememberPreference::NotRecorded,
            Err(e) => {
                warn!(error = %e, "Failed to read remember flag");
                RememberPreference::Unreadable
            }
        }
    }

    /// Drop every token, in memory and in storage. Never fails; storage
    /// errors end up in the returned report.
    pub fn logout(&self) -> CleanupReport {
        self.clear_session_tokens();
        let report = self.delete_persisted();
        if report.is_clean() {
            debug!("Logged out");
        }
        report
    }

    fn persist(&self, tokens: &TokenPair) -> Result<(), crate::auth::StoreError> {
        self.storage.set(ACCESS_TOKEN_KEY, &tokens.access_token)?;
        self.storage.set(REFRESH_TOKEN_KEY, &tokens.refresh_token)?;
        self.storage.set(REMEMBER_ME_KEY, REMEMBERED)?;
        Ok(())
    }

    fn delete_persisted(&self) -> CleanupReport {
        let mut report = CleanupReport::default();
        for key in PERSISTED_KEYS {
            if let Err(e) = self.storage.delete(key) {
                warn!(key, error = %e, "Failed to delete persisted token");
                report.failed_keys.push(key);
            }
        }
        report
    }

    fn read_persisted(&self, key: &str) -> Option<String> {
        match self.storage.get(key) {
            Ok(value) => value,
            Err(e) => {
                warn!(key, error = %e, "Failed to read persisted token");
                None
            }
        }
    }

    // Lock guards are never held across an await, so a poisoned lock only
    // means a panic elsewhere; the token fields themselves stay consistent.
    fn read_memory(&self) -> RwLockReadGuard<'_, MemoryTokens> {
        self.memory.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write_memory(&self) -> RwLockWriteGuard<'_, MemoryTokens> {
        self.memory.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
