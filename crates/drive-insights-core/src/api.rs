//! HTTP client for the fleet backend.
//!
//! Thin wrapper around `reqwest` exposing the REST surface the pages
//! consume. Record payloads come back as raw `serde_json::Value` and are
//! normalized by the caller; vehicles are normalized here since their shape
//! is stable.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::model::{RecordKind, Vehicle, VehicleDraft};
use crate::normalize;

/// Errors from backend communication.
#[derive(Error, Debug)]
pub enum ApiError {
    /// The request never produced a response (connect failure, DNS, etc.).
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("server returned {status}: {message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Message extracted from the response body, possibly empty.
        message: String,
    },

    /// The response body could not be parsed.
    #[error("invalid response body: {0}")]
    InvalidBody(String),
}

impl ApiError {
    /// True for a 404 response; detail/edit pages render their
    /// vehicle-not-found state on this.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::Status { status: 404, .. })
    }
}

/// Client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Backend base URL, without trailing slash.
    pub base_url: String,
    /// User-Agent header value.
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            user_agent: "DriveInsights/0.1".to_string(),
        }
    }
}

/// Fleet backend client.
///
/// No request timeout is applied; a hung request leaves that data source
/// empty until it resolves, and the feed's demo fallback keeps the page
/// usable meanwhile.
#[derive(Debug, Clone)]
pub struct ApiClient {
    config: ClientConfig,
    client: reqwest::Client,
}

impl ApiClient {
    /// Create a client for the given backend base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_config(ClientConfig {
            base_url: base_url.into(),
            ..ClientConfig::default()
        })
    }

    /// Create a client from a full configuration.
    pub fn with_config(config: ClientConfig) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self { config, client }
    }

    /// The configured base URL.
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    async fn status_error(response: reqwest::Response) -> ApiError {
        let status = response.status().as_u16();
        let message = match response.text().await {
            Ok(body) => extract_message(&body),
            Err(_) => String::new(),
        };
        ApiError::Status { status, message }
    }

    async fn get_json(&self, path: &str) -> Result<Value, ApiError> {
        let response = self.client.get(self.url(path)).send().await?;
        if !response.status().is_success() {
            return Err(Self::status_error(response).await);
        }
        response
            .json()
            .await
            .map_err(|e| ApiError::InvalidBody(e.to_string()))
    }

    /// `GET /api/vehicles`, normalized.
    pub async fn vehicles(&self) -> Result<Vec<Vehicle>, ApiError> {
        let raw = self.get_json("/api/vehicles").await?;
        Ok(normalize::normalize_vehicles(&raw))
    }

    /// `GET /api/vehicles/{id}`. A 404 maps to an error for which
    /// [`ApiError::is_not_found`] is true.
    pub async fn vehicle(&self, id: &str) -> Result<Vehicle, ApiError> {
        let raw = self.get_json(&format!("/api/vehicles/{id}")).await?;
        normalize::normalize_vehicles(&raw)
            .into_iter()
            .next()
            .ok_or_else(|| ApiError::InvalidBody("expected a vehicle object".to_string()))
    }

    /// `POST /api/vehicles`.
    pub async fn create_vehicle(&self, draft: &VehicleDraft) -> Result<Vehicle, ApiError> {
        let response = self
            .client
            .post(self.url("/api/vehicles"))
            .json(draft)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(Self::status_error(response).await);
        }
        let raw: Value = response
            .json()
            .await
            .map_err(|e| ApiError::InvalidBody(e.to_string()))?;
        normalize::normalize_vehicles(&raw)
            .into_iter()
            .next()
            .ok_or_else(|| ApiError::InvalidBody("expected a vehicle object".to_string()))
    }

    /// `PUT /api/vehicles/{id}`.
    pub async fn update_vehicle(&self, id: &str, draft: &VehicleDraft) -> Result<(), ApiError> {
        let response = self
            .client
            .put(self.url(&format!("/api/vehicles/{id}")))
            .json(draft)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(Self::status_error(response).await);
        }
        Ok(())
    }

    /// `DELETE /api/vehicles/{id}`.
    pub async fn delete_vehicle(&self, id: &str) -> Result<(), ApiError> {
        let response = self
            .client
            .delete(self.url(&format!("/api/vehicles/{id}")))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(Self::status_error(response).await);
        }
        Ok(())
    }

    /// `GET` the raw record list for a kind. The shape is unspecified;
    /// normalization happens in the feed.
    pub async fn records(&self, kind: RecordKind) -> Result<Value, ApiError> {
        self.get_json(kind.endpoint()).await
    }

    /// `POST` one record payload to the kind's create endpoint.
    pub async fn create_record(&self, kind: RecordKind, payload: &Value) -> Result<(), ApiError> {
        let response = self
            .client
            .post(self.url(kind.endpoint()))
            .json(payload)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(Self::status_error(response).await);
        }
        Ok(())
    }

    /// `GET /api/fuel-consumption/vehicle/{id}` raw per-vehicle history.
    pub async fn vehicle_fuel_history(&self, vehicle_id: &str) -> Result<Value, ApiError> {
        self.get_json(&format!("/api/fuel-consumption/vehicle/{vehicle_id}"))
            .await
    }
}

impl Default for ApiClient {
    fn default() -> Self {
        Self::with_config(ClientConfig::default())
    }
}

/// Pull a human-readable message out of an error response body. Spring
/// bodies carry `message` or `error`; anything else is used verbatim.
fn extract_message(body: &str) -> String {
    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(body) {
        for key in ["message", "error"] {
            if let Some(Value::String(s)) = map.get(key) {
                return s.clone();
            }
        }
    }
    body.trim().to_string()
}
