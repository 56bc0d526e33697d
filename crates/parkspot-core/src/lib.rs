//! Session and API client core for parkspot, a parking and EV-charging
//! booking service.
//!
//! The centre of the crate is [`auth::Session`]: one access/refresh token
//! pair per process, kept either in the OS keychain ("remember me") or only
//! in memory, never both. [`api::AuthClient`] drives the login, refresh and
//! logout flows against the backend and retries a rejected request once
//! after refreshing.

pub mod api;
pub mod auth;
pub mod config;
pub mod models;

pub use api::{ApiClient, ApiError, AuthClient, AuthError, FetchRequest, RegisterOutcome};
pub use auth::{AppState, LifecycleAction, LifecycleGuard, Session};
pub use config::{Config, RefreshPolicy};
pub use models::TokenPair;
