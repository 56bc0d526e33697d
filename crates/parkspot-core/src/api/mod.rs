//! REST clients for the parkspot backend.
//!
//! `AuthClient` handles login, registration and token refresh, and wraps
//! requests with a bearer token that is refreshed once on a 401.
//! `ApiClient` layers typed JSON calls on top of it.

pub mod auth;
pub mod client;
pub mod error;

pub use auth::{AuthClient, FetchRequest, RegisterOutcome};
pub use client::ApiClient;
pub use error::{ApiError, AuthError, NETWORK_FAILURE_MESSAGE};
