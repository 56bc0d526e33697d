//! Session token management.
//!
//! This module provides:
//! - `Session`: the single active token pair and its storage tier
//! - `SecureStorage`: keychain-backed (`KeyringStore`) or in-memory (`MemoryStore`)
//! - `LifecycleGuard`: drops session-only tokens when the app leaves the foreground

pub mod lifecycle;
pub mod session;
pub mod store;

pub use lifecycle::{AppState, LifecycleAction, LifecycleGuard};
pub use session::{
    CleanupReport, RememberPreference, Session, ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY,
    REMEMBER_ME_KEY,
};
pub use store::{KeyringStore, MemoryStore, SecureStorage, StoreError, DEFAULT_SERVICE_NAME};
