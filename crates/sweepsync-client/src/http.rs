//! Control API over HTTP.

use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sweepsync_core::types::{ResourceId, StartRunReply, StatusRecord};
use sweepsync_session::{ControlApi, ControlApiError};

use crate::endpoints::ClientConfig;
use crate::error::ClientError;

/// Body of the backend's health endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthReply {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct HttpControlApi {
    http: Client,
    config: ClientConfig,
}

impl HttpControlApi {
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let http = Client::builder().timeout(config.timeout()).build()?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub async fn health(&self) -> Result<HealthReply, ControlApiError> {
        self.request_json(self.http.get(self.config.health_url()))
            .await
    }

    async fn request_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, ControlApiError> {
        let response = request
            .send()
            .await
            .map_err(|e| ControlApiError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .map_err(|e| ControlApiError::Network(e.to_string()))?;
            let message = error_message(status, &body);
            tracing::debug!(%status, "control API request failed: {message}");
            return Err(ControlApiError::Http {
                status: status.as_u16(),
                message,
            });
        }

        response.json::<T>().await.map_err(|e| {
            if e.is_decode() {
                ControlApiError::Decode(e.to_string())
            } else {
                ControlApiError::Network(e.to_string())
            }
        })
    }
}

impl ControlApi for HttpControlApi {
    async fn start_run(&self, resource_id: &ResourceId) -> Result<StartRunReply, ControlApiError> {
        let url = self.config.run_url(resource_id);
        tracing::debug!(%url, "requesting run start");
        self.request_json(self.http.post(url)).await
    }

    async fn list_run_history(
        &self,
        resource_id: &ResourceId,
    ) -> Result<Vec<StatusRecord>, ControlApiError> {
        let url = self.config.run_url(resource_id);
        tracing::debug!(%url, "fetching run history");
        self.request_json(self.http.get(url)).await
    }
}

/// User-facing message for a failed response.
///
/// Uses the body's `detail` field when present: a string as-is, or a list of
/// validation entries whose `msg` fields are joined with `", "`. Falls back
/// to `HTTP <code>: <reason>`.
pub fn error_message(status: StatusCode, body: &str) -> String {
    let detail = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|mut v| v.get_mut("detail").map(Value::take));

    match detail {
        Some(Value::String(detail)) if !detail.is_empty() => detail,
        Some(Value::Array(items)) if !items.is_empty() => items
            .iter()
            .map(|item| item.get("msg").and_then(Value::as_str).unwrap_or("invalid request"))
            .collect::<Vec<_>>()
            .join(", "),
        _ => format!(
            "HTTP {}: {}",
            status.as_u16(),
            status.canonical_reason().unwrap_or("Unknown Status")
        ),
    }
}
