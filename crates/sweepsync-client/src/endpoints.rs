//! Endpoint configuration and URL construction.
//!
//! | purpose | method | URL |
//! |---|---|---|
//! | start run | POST | `{api}/configs/run/{id}` |
//! | run history | GET | `{api}/configs/run/{id}` |
//! | health | GET | `{api}/` |
//! | live channel | WS | `{ws}/ws/configs/{id}` |
//!
//! Base URLs may carry a path prefix (`http://host/backend`); endpoint
//! segments are appended to it. Resource ids are percent-encoded as a single
//! path segment.

use std::time::Duration;

use reqwest::Url;
use sweepsync_core::types::ResourceId;

use crate::error::ClientError;

pub const DEFAULT_API_URL: &str = "http://localhost:8000";
pub const DEFAULT_WS_URL: &str = "ws://localhost:8000";
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    api_url: Url,
    ws_url: Url,
    timeout: Duration,
}

impl ClientConfig {
    /// Validate both base URLs. The API URL must be `http`/`https` and the
    /// channel URL `ws`/`wss`.
    pub fn new(api_url: &str, ws_url: &str, timeout: Duration) -> Result<Self, ClientError> {
        Ok(Self {
            api_url: parse_base("API", api_url, &["http", "https"])?,
            ws_url: parse_base("WebSocket", ws_url, &["ws", "wss"])?,
            timeout,
        })
    }

    pub fn api_url(&self) -> &Url {
        &self.api_url
    }

    pub fn ws_url(&self) -> &Url {
        &self.ws_url
    }

    /// Per-request HTTP timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Start (POST) and history (GET) endpoint for a resource.
    pub fn run_url(&self, resource_id: &ResourceId) -> Url {
        with_segments(&self.api_url, &["configs", "run", resource_id.as_str()])
    }

    pub fn health_url(&self) -> Url {
        with_segments(&self.api_url, &[""])
    }

    /// Live status channel for a resource.
    pub fn channel_url(&self, resource_id: &ResourceId) -> Url {
        with_segments(&self.ws_url, &["ws", "configs", resource_id.as_str()])
    }
}

fn parse_base(kind: &'static str, raw: &str, schemes: &[&str]) -> Result<Url, ClientError> {
    let invalid = |reason: String| ClientError::InvalidUrl {
        kind,
        url: raw.to_string(),
        reason,
    };

    let url = Url::parse(raw.trim()).map_err(|e| invalid(e.to_string()))?;
    if !schemes.contains(&url.scheme()) {
        return Err(invalid(format!(
            "scheme must be one of {}, got {}",
            schemes.join("/"),
            url.scheme()
        )));
    }
    if url.cannot_be_a_base() || url.host_str().is_none() {
        return Err(invalid("missing host".to_string()));
    }
    if url.query().is_some() || url.fragment().is_some() {
        return Err(invalid("query and fragment are not supported".to_string()));
    }
    Ok(url)
}

fn with_segments(base: &Url, segments: &[&str]) -> Url {
    let mut url = base.clone();
    // Bases are validated to have a host, so they always accept path segments.
    if let Ok(mut path) = url.path_segments_mut() {
        path.pop_if_empty().extend(segments);
    }
    url
}

// ─── Tests ────────────────────────────────────────────────────────
