//! Control API boundary: start a run and list a resource's run history.

use std::future::Future;

use sweepsync_core::types::{ResourceId, StartRunReply, StatusRecord};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ControlApiError {
    /// Non-success HTTP status; `message` is the backend's detail when it
    /// sent one.
    #[error("{message}")]
    Http { status: u16, message: String },

    #[error("Unable to connect to server: {0}")]
    Network(String),

    #[error("unexpected response from server: {0}")]
    Decode(String),

    /// The backend answered but refused the request.
    #[error("{0}")]
    Rejected(String),
}

/// The external control API the session drives.
pub trait ControlApi {
    fn start_run(
        &self,
        resource_id: &ResourceId,
    ) -> impl Future<Output = Result<StartRunReply, ControlApiError>> + Send;

    /// Run history snapshot used to seed the store before any live channel.
    fn list_run_history(
        &self,
        resource_id: &ResourceId,
    ) -> impl Future<Output = Result<Vec<StatusRecord>, ControlApiError>> + Send;
}
