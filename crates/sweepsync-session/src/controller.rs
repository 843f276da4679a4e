//! Run controller: starts runs through the control API and decides whether a
//! live channel is needed.
//!
//! A channel is opened only when the backend actually started a run. When a
//! run is already in progress the reply is surfaced as an informational
//! notice and no subscription is made.

use sweepsync_core::types::{ResourceId, StartRunStatus};

use crate::channel::OpenOutcome;
use crate::control::{ControlApi, ControlApiError};
use crate::session::SyncSession;
use crate::store::NoticeLevel;
use crate::transport::Transport;

/// Result of a successful start request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// A new run was accepted and a live channel was opened for it.
    Started(OpenOutcome),
    /// A run was already active server-side; carries the backend's message.
    AlreadyRunning(String),
}

#[derive(Debug)]
pub struct RunController<A> {
    api: A,
}

impl<A: ControlApi> RunController<A> {
    pub fn new(api: A) -> Self {
        Self { api }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// Start a run for `resource_id`.
    ///
    /// Failures are reported once as an error notice and returned; existing
    /// channels and records are left as they were.
    pub async fn start_run<T: Transport>(
        &self,
        session: &mut SyncSession<T>,
        resource_id: &ResourceId,
    ) -> Result<RunOutcome, ControlApiError> {
        let reply = match self.api.start_run(resource_id).await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::warn!(resource = %resource_id, "start run failed: {e}");
                session.notify(NoticeLevel::Error, e.to_string());
                return Err(e);
            }
        };

        match reply.outcome() {
            StartRunStatus::Started => {
                tracing::info!(resource = %resource_id, "run started");
                session.notify(NoticeLevel::Success, "Run started successfully");
                let channel = session.open(resource_id);
                Ok(RunOutcome::Started(channel))
            }
            StartRunStatus::AlreadyRunning => {
                let message = reply.display_message();
                tracing::info!(resource = %resource_id, "run already in progress: {message}");
                session.notify(NoticeLevel::Info, message.clone());
                Ok(RunOutcome::AlreadyRunning(message))
            }
            StartRunStatus::Rejected => {
                let err = ControlApiError::Rejected(reply.display_message());
                tracing::warn!(resource = %resource_id, "start run rejected: {err}");
                session.notify(NoticeLevel::Error, err.to_string());
                Err(err)
            }
        }
    }

    /// Seed the store with the resource's run history.
    ///
    /// Returns the number of records installed. On failure the existing
    /// records are kept and an error notice is raised.
    pub async fn load_history<T: Transport>(
        &self,
        session: &mut SyncSession<T>,
        resource_id: &ResourceId,
    ) -> Result<usize, ControlApiError> {
        match self.api.list_run_history(resource_id).await {
            Ok(records) => {
                session.seed_history(resource_id, records);
                Ok(session.store().records(resource_id).len())
            }
            Err(e) => {
                tracing::warn!(resource = %resource_id, "loading run history failed: {e}");
                session.notify(NoticeLevel::Error, e.to_string());
                Err(e)
            }
        }
    }
}
