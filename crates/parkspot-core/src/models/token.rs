use std::fmt;

use serde::{Deserialize, Serialize};

/// Access/refresh credentials issued by the authentication endpoint.
///
/// The numeric metadata is stored as the server sent it and is not checked
/// against a local clock.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct TokenPair {
    #[serde(rename = "accessToken")]
    pub access_token: String,
    #[serde(rename = "refreshToken")]
    pub refresh_token: String,
    #[serde(rename = "tokenType", default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
    #[serde(rename = "accessTokenExpiresIn", default)]
    pub access_token_expires_in: i64,
    #[serde(rename = "refreshTokenExpiresIn", default)]
    pub refresh_token_expires_in: i64,
    #[serde(rename = "issuedAt", default)]
    pub issued_at: i64,
}

impl TokenPair {
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
            token_type: None,
            access_token_expires_in: 0,
            refresh_token_expires_in: 0,
            issued_at: 0,
        }
    }
}

// Token values never reach logs
impl fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenPair")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .field("token_type", &self.token_type)
            .field("access_token_expires_in", &self.access_token_expires_in)
            .field("refresh_token_expires_in", &self.refresh_token_expires_in)
            .field("issued_at", &self.issued_at)
            .finish()
    }
}

/// Standard `{success, message, data}` response wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
    #[serde(default)]
    pub success: bool,
    pub message: Option<String>,
    pub data: Option<T>,
}

impl<T> Envelope<T> {
    /// The payload when the server reported success and sent one.
    pub fn into_data(self) -> Result<T, String> {
        match (self.success, self.data) {
            (true, Some(data)) => Ok(data),
            (true, None) => Err(self
                .message
                .unwrap_or_else(|| "Response contained no data".to_string())),
            (false, _) => Err(self
                .message
                .unwrap_or_else(|| "Request was not successful".to_string())),
        }
    }
}

/// Body of a non-success response; only the message is of interest.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub message: Option<String>,
    pub error: Option<String>,
}

impl ErrorBody {
    pub fn into_message(self) -> Option<String> {
        self.message.or(self.error).filter(|m| !m.trim().is_empty())
    }
}
