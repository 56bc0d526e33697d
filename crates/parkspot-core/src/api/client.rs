//! Typed JSON access to the parkspot REST API.
//!
//! Every call goes through `AuthClient::authenticated_fetch`, so an expired
//! access token is refreshed once before the caller sees an error.

use std::sync::Arc;

use reqwest::Response;
use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;

use crate::models::{Booking, Envelope, Spot, SpotKind};

use super::auth::{AuthClient, FetchRequest};
use super::{ApiError, AuthError};

const SPOTS_PATH: &str = "/api/v1/spots";
const MY_BOOKINGS_PATH: &str = "/api/v1/bookings/me";

/// Clone is cheap - the auth client and its connection pool are shared.
#[derive(Clone)]
pub struct ApiClient {
    auth: Arc<AuthClient>,
}

impl ApiClient {
    pub fn new(auth: Arc<AuthClient>) -> Self {
        Self { auth }
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, AuthError> {
        let response = self.auth.authenticated_fetch(FetchRequest::get(path)).await?;
        Self::read_data(response).await
    }

    pub async fn post_json<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, AuthError> {
        let body = serde_json::to_value(body)
            .map_err(|e| AuthError::InvalidResponse(format!("Failed to encode request: {}", e)))?;
        let response = self
            .auth
            .authenticated_fetch(FetchRequest::post(path, body))
            .await?;
        Self::read_data(response).await
    }

    pub async fn delete(&self, path: &str) -> Result<(), AuthError> {
        let response = self
            .auth
            .authenticated_fetch(FetchRequest::delete(path))
            .await?;
        Self::check_response(response).await?;
        Ok(())
    }

    // ===== Domain calls =====

    /// List spots, optionally filtered to parking or EV charging.
    pub async fn list_spots(&self, kind: Option<SpotKind>) -> Result<Vec<Spot>, AuthError> {
        let path = match kind {
            Some(kind) => format!("{}?type={}", SPOTS_PATH, kind.as_query()),
            None => SPOTS_PATH.to_string(),
        };
        let spots: Vec<Spot> = self.get_json(&path).await?;
        debug!(count = spots.len(), "Fetched spots");
        Ok(spots)
    }

    pub async fn my_bookings(&self) -> Result<Vec<Booking>, AuthError> {
        self.get_json(MY_BOOKINGS_PATH).await
    }

    /// Non-success statuses become `ApiError`s carrying the (truncated) body.
    async fn check_response(response: Response) -> Result<Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body))
        }
    }

    async fn read_data<T: DeserializeOwned>(response: Response) -> Result<T, AuthError> {
        let response = Self::check_response(response).await?;
        let url = response.url().to_string();
        let text = response.text().await.map_err(ApiError::from)?;
        let envelope: Envelope<T> = serde_json::from_str(&text).map_err(|e| {
            ApiError::InvalidResponse(format!("Failed to parse JSON response from {}: {}", url, e))
        })?;
        envelope
            .into_data()
            .map_err(|message| ApiError::InvalidResponse(message).into())
    }
}
