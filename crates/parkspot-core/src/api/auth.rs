//! Client for the authentication endpoints and for bearer-authenticated
//! requests that refresh the access token on a 401.

use std::sync::Arc;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method, Response, StatusCode};
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::auth::{RememberPreference, Session};
use crate::config::{Config, RefreshPolicy};
use crate::models::token::ErrorBody;
use crate::models::{Envelope, RegisterRequest, TokenPair, User};

use super::AuthError;

// ============================================================================
// Constants
// ============================================================================

pub const LOGIN_PATH: &str = "/api/v1/auth/login";
pub const REGISTER_PATH: &str = "/api/v1/auth/register";
pub const REFRESH_PATH: &str = "/api/v1/auth/refresh";

/// Shown when a rejected login carries no readable message
const LOGIN_FAILED: &str = "Login failed";

/// Shown when a rejected registration carries no readable message
const REGISTRATION_FAILED: &str = "Registration failed";

#[derive(Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct RefreshRequest<'a> {
    #[serde(rename = "refreshToken")]
    refresh_token: &'a str,
}

/// Result of a registration attempt. Registration never raises; callers
/// branch on the outcome instead.
#[derive(Debug, Clone, PartialEq)]
pub enum RegisterOutcome {
    Registered(User),
    Rejected { message: String },
}

/// A request that can be replayed after a token refresh.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub method: Method,
    /// Absolute URL, or a path joined onto the configured base URL.
    pub url: String,
    pub headers: HeaderMap,
    pub body: Option<serde_json::Value>,
}

impl FetchRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: HeaderMap::new(),
            body: None,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn post(url: impl Into<String>, body: serde_json::Value) -> Self {
        Self::new(Method::POST, url).json(body)
    }

    pub fn delete(url: impl Into<String>) -> Self {
        Self::new(Method::DELETE, url)
    }

    pub fn json(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }
}

/// Talks to the authentication endpoints and owns the refresh policy.
pub struct AuthClient {
    client: Client,
    base_url: String,
    session: Arc<Session>,
    policy: RefreshPolicy,
    refresh_lock: Mutex<()>,
}

impl AuthClient {
    pub fn new(config: &Config, session: Arc<Session>) -> Result<Self, AuthError> {
        let client = Client::builder().timeout(config.request_timeout()).build()?;
        Ok(Self::with_client(
            client,
            &config.api_base_url,
            session,
            config.refresh_policy,
        ))
    }

    /// Build around an existing reqwest client, sharing its connection pool.
    pub fn with_client(
        client: Client,
        base_url: &str,
        session: Arc<Session>,
        policy: RefreshPolicy,
    ) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            session,
            policy,
            refresh_lock: Mutex::new(()),
        }
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn resolve(&self, url: &str) -> String {
        if url.starts_with("http://") || url.starts_with("https://") {
            url.to_string()
        } else if url.starts_with('/') {
            format!("{}{}", self.base_url, url)
        } else {
            format!("{}/{}", self.base_url, url)
        }
    }

    /// Exchange credentials for a token pair and store it according to
    /// `remember`, replacing any previous pair.
    pub async fn login(
        &self,
        username: &str,
        password: &str,
        remember: bool,
    ) -> Result<TokenPair, AuthError> {
        let response = self
            .client
            .post(self.resolve(LOGIN_PATH))
            .json(&LoginRequest { username, password })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = Self::error_message(response)
                .await
                .unwrap_or_else(|| LOGIN_FAILED.to_string());
            warn!(%status, "Login rejected");
            return Err(AuthError::LoginFailed(message));
        }

        let tokens = Self::read_envelope::<TokenPair>(response)
            .await?
            .into_data()
            .map_err(AuthError::LoginFailed)?;

        let report = self.session.save_tokens(&tokens, remember)?;
        if !report.is_clean() {
            warn!(keys = ?report.failed_keys(), "Stale persisted tokens left behind after login");
        }
        info!(remember, "Logged in");
        Ok(tokens)
    }

    /// Create an account. Does not log in.
    pub async fn register(&self, request: &RegisterRequest) -> RegisterOutcome {
        let rejected = |message: String| RegisterOutcome::Rejected { message };

        let response = match self
            .client
            .post(self.resolve(REGISTER_PATH))
            .json(request)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => return rejected(AuthError::Network(e).to_string()),
        };

        let status = response.status();
        if !status.is_success() {
            warn!(%status, "Registration rejected");
            return rejected(
                Self::error_message(response)
                    .await
                    .unwrap_or_else(|| REGISTRATION_FAILED.to_string()),
            );
        }

        match Self::read_envelope::<User>(response).await {
            Ok(envelope) => match envelope.into_data() {
                Ok(user) => {
                    info!(user_id = user.id, "Registered");
                    RegisterOutcome::Registered(user)
                }
                Err(message) => rejected(message),
            },
            Err(e) => rejected(e.to_string()),
        }
    }

    /// Mint a new token pair from the stored refresh token.
    ///
    /// The new pair is stored in the same tier as before: remembered only if
    /// the remember flag is present in secure storage.
    pub async fn refresh_token(&self) -> Result<TokenPair, AuthError> {
        let refresh_token = self.session.refresh_token().ok_or(AuthError::NoRefreshToken)?;

        let response = self
            .client
            .post(self.resolve(REFRESH_PATH))
            .json(&RefreshRequest {
                refresh_token: &refresh_token,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            warn!(%status, "Refresh endpoint rejected the refresh token");
            return Err(AuthError::RefreshFailed);
        }

        let tokens = Self::read_envelope::<TokenPair>(response)
            .await?
            .into_data()
            .map_err(|message| {
                warn!(%message, "Refresh response carried no token pair");
                AuthError::RefreshFailed
            })?;

        let remember = match self.session.remember_preference() {
            RememberPreference::Remembered => true,
            RememberPreference::NotRecorded => {
                debug!("No remember flag stored, keeping refreshed pair in memory");
                false
            }
            RememberPreference::Unreadable => {
                warn!("Remember flag unreadable, keeping refreshed pair in memory");
                false
            }
        };

        self.session.save_tokens(&tokens, remember)?;
        debug!(remember, "Access token refreshed");
        Ok(tokens)
    }

    /// Drop every stored token.
    pub fn logout(&self) {
        let report = self.session.logout();
        if report.is_clean() {
            info!("Logged out");
        } else {
            warn!(keys = ?report.failed_keys(), "Logged out, but secure storage cleanup failed");
        }
    }

    /// Send `request` with the current access token as a bearer credential.
    ///
    /// A 401 triggers one refresh and one retry. If the refresh fails the
    /// session is logged out and `AuthError::SessionExpired` is returned.
    pub async fn authenticated_fetch(&self, request: FetchRequest) -> Result<Response, AuthError> {
        let token = self.session.access_token().ok_or(AuthError::NoAccessToken)?;

        let response = self.send(&request, &token).await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        debug!(method = %request.method, url = %request.url, "Access token rejected, refreshing");
        let token = match self.refresh_after_rejection(&token).await {
            Ok(token) => token,
            Err(e) => {
                warn!(error = %e, "Token refresh failed, ending session");
                self.logout();
                return Err(AuthError::SessionExpired);
            }
        };

        Ok(self.send(&request, &token).await?)
    }

    async fn refresh_after_rejection(&self, rejected: &str) -> Result<String, AuthError> {
        match self.policy {
            RefreshPolicy::Independent => Ok(self.refresh_token().await?.access_token),
            RefreshPolicy::SingleFlight => {
                let _guard = self.refresh_lock.lock().await;
                if let Some(current) = self.session.access_token() {
                    if current != rejected {
                        debug!("Access token already refreshed by a concurrent request");
                        return Ok(current);
                    }
                }
                Ok(self.refresh_token().await?.access_token)
            }
        }
    }

    async fn send(&self, request: &FetchRequest, token: &str) -> Result<Response, reqwest::Error> {
        let mut builder = self
            .client
            .request(request.method.clone(), self.resolve(&request.url))
            .headers(request.headers.clone())
            .bearer_auth(token);
        if let Some(ref body) = request.body {
            builder = builder.json(body);
        }
        builder.send().await
    }

    async fn read_envelope<T: serde::de::DeserializeOwned>(
        response: Response,
    ) -> Result<Envelope<T>, AuthError> {
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| AuthError::InvalidResponse(e.to_string()))
    }

    /// Human-readable message from an error body, if it is JSON and has one.
    async fn error_message(response: Response) -> Option<String> {
        let body = response.text().await.ok()?;
        serde_json::from_str::<ErrorBody>(&body)
            .ok()
            .and_then(ErrorBody::into_message)
    }
}
