//! sweepsync-client: network implementations of the session boundaries.
//!
//! - [`HttpControlApi`]: the control API over HTTP (`reqwest`).
//! - [`WsTransport`]: live status channels over WebSocket (`tokio-tungstenite`).

pub mod endpoints;
pub mod error;
pub mod http;
pub mod ws;

pub use endpoints::{ClientConfig, DEFAULT_API_URL, DEFAULT_TIMEOUT_MS, DEFAULT_WS_URL};
pub use error::ClientError;
pub use http::{HealthReply, HttpControlApi, error_message};
pub use ws::{WsHandle, WsTransport};
