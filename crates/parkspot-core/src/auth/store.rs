//! Key-value secure storage backends.
//!
//! `KeyringStore` keeps values in the OS keychain (encrypted at rest).
//! `MemoryStore` keeps them in process memory and is used in tests and on
//! platforms without a keychain.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use keyring::Entry;
use thiserror::Error;

/// Default keychain service name
pub const DEFAULT_SERVICE_NAME: &str = "parkspot";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Keyring error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// Plain string key/value storage with encrypted-at-rest semantics.
pub trait SecureStorage: Send + Sync {
    /// Read a value; `Ok(None)` when the key is absent.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Remove a value. Returns `Ok(false)` when there was nothing to remove.
    fn delete(&self, key: &str) -> Result<bool, StoreError>;
}

pub struct KeyringStore {
    service: String,
}

impl KeyringStore {
    pub fn new() -> Self {
        Self::with_service(DEFAULT_SERVICE_NAME)
    }

    pub fn with_service(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    fn entry(&self, key: &str) -> Result<Entry, StoreError> {
        Ok(Entry::new(&self.service, key)?)
    }
}

impl Default for KeyringStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SecureStorage for KeyringStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        match self.entry(key)?.get_password() {
            Ok(value) => Ok(Some(value)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(StoreError::Keyring(e)),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entry(key)?.set_password(value)?;
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<bool, StoreError> {
        match self.entry(key)?.delete_credential() {
            Ok(()) => Ok(true),
            Err(keyring::Error::NoEntry) => Ok(false),
            Err(e) => Err(StoreError::Keyring(e)),
        }
    }
}

/// In-process storage with switchable failures.
#[derive(Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    fail_deletes: AtomicBool,
    writes_before_failure: Mutex<Option<usize>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Let `successful` more writes through, then reject every write after.
    pub fn fail_writes_after(&self, successful: usize) {
        *self
            .writes_before_failure
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(successful);
    }

    pub fn fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    /// Whether any value is stored, bypassing failure injection.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Raw read, bypassing failure injection.
    pub fn peek(&self, key: &str) -> Option<String> {
        self.lock().get(key).cloned()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        // A panic while holding the lock cannot leave the map half-written
        self.values.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl SecureStorage for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(format!("read of {key} rejected")));
        }
        Ok(self.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(format!("write of {key} rejected")));
        }
        {
            let mut remaining = self
                .writes_before_failure
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            match *remaining {
                Some(0) => {
                    return Err(StoreError::Unavailable(format!("write of {key} rejected")));
                }
                Some(n) => *remaining = Some(n - 1),
                None => {}
            }
        }
        self.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<bool, StoreError> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(format!("delete of {key} rejected")));
        }
        Ok(self.lock().remove(key).is_some())
    }
}
