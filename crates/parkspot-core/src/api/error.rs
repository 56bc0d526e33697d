use reqwest::StatusCode;
use thiserror::Error;

use crate::auth::StoreError;

/// Message reqwest-based callers match on to show a "check your connection" prompt.
pub const NETWORK_FAILURE_MESSAGE: &str = "Network request failed";

/// Errors from non-auth API calls (status + message).
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Unauthorized - token may be expired")]
    Unauthorized,

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Rate limited - please wait before retrying")]
    RateLimited,

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Network request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Request failed with status {status}: {message}")]
    Status { status: u16, message: String },
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            let mut end = MAX_ERROR_BODY_LENGTH;
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
        }
    }

    pub fn from_status(status: StatusCode, body: &str) -> Self {
        let truncated = Self::truncate_body(body);
        match status.as_u16() {
            401 => ApiError::Unauthorized,
            403 => ApiError::AccessDenied(truncated),
            404 => ApiError::NotFound(truncated),
            429 => ApiError::RateLimited,
            500..=599 => ApiError::ServerError(truncated),
            code => ApiError::Status {
                status: code,
                message: truncated,
            },
        }
    }

    /// HTTP status this error was built from, when there was one.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Unauthorized => Some(401),
            ApiError::AccessDenied(_) => Some(403),
            ApiError::NotFound(_) => Some(404),
            ApiError::RateLimited => Some(429),
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Network(e) => e.status().map(|s| s.as_u16()),
            ApiError::ServerError(_) | ApiError::InvalidResponse(_) => None,
        }
    }
}

/// Errors from the session token lifecycle.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("No access token")]
    NoAccessToken,

    #[error("No refresh token")]
    NoRefreshToken,

    #[error("Token refresh failed")]
    RefreshFailed,

    #[error("Session expired")]
    SessionExpired,

    #[error("{0}")]
    LoginFailed(String),

    #[error("Network request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Secure storage error: {0}")]
    Storage(#[from] StoreError),

    #[error(transparent)]
    Api(#[from] ApiError),
}

impl AuthError {
    /// Whether the caller should force re-authentication.
    pub fn is_session_expired(&self) -> bool {
        match self {
            AuthError::SessionExpired => true,
            AuthError::Api(api) => api.status() == Some(401),
            AuthError::Network(e) => e.status() == Some(StatusCode::UNAUTHORIZED),
            other => other.to_string().contains("Session expired"),
        }
    }

    /// Whether this is a connectivity failure rather than a rejection.
    pub fn is_network_error(&self) -> bool {
        match self {
            AuthError::Network(e) => e.is_connect() || e.is_timeout() || e.is_request(),
            AuthError::Api(ApiError::Network(e)) => e.is_connect() || e.is_timeout() || e.is_request(),
            other => other.to_string().contains(NETWORK_FAILURE_MESSAGE),
        }
    }
}
