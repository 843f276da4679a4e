use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

// ─── Identifiers ──────────────────────────────────────────────────

/// Identifier of a resource (a sweep configuration) whose runs are tracked.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceId(String);

impl ResourceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ResourceId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Opaque identifier of one run instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(String);

impl RunId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RunId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Identifies one `open` of a live channel.
///
/// Every open allocates a fresh id, so events from a superseded handle for
/// the same resource can be told apart from the current one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChannelId(u64);

impl ChannelId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ch-{}", self.0)
    }
}

// ─── Run State ────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunState {
    Queued,
    Running,
    Completed,
    Failed,
}

impl RunState {
    pub const ALL: [Self; 4] = [Self::Queued, Self::Running, Self::Completed, Self::Failed];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Queued => "QUEUED",
            Self::Running => "RUNNING",
            Self::Completed => "COMPLETED",
            Self::Failed => "FAILED",
        }
    }

    /// `Completed` and `Failed` runs never change again.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RunState {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "QUEUED" => Ok(Self::Queued),
            "RUNNING" => Ok(Self::Running),
            "COMPLETED" => Ok(Self::Completed),
            "FAILED" => Ok(Self::Failed),
            _ => Err(CoreError::InvalidRunState(s.to_string())),
        }
    }
}

// ─── Status Record ────────────────────────────────────────────────

/// One status snapshot of a run, as delivered by the history endpoint or the
/// live channel.
///
/// `progress` carries the raw transport value until it passes through
/// [`crate::merge::normalize`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusRecord {
    pub id: RunId,
    #[serde(rename = "config_id")]
    pub resource_id: ResourceId,
    #[serde(deserialize_with = "deserialize_progress")]
    pub progress: i64,
    pub state: RunState,
    pub created_at: DateTime<Utc>,
}

impl StatusRecord {
    /// Parse a JSON-encoded record from a live channel payload.
    pub fn from_json(payload: &str) -> Result<Self, CoreError> {
        serde_json::from_str(payload).map_err(|e| CoreError::MalformedStatus(e.to_string()))
    }
}

/// Accept any JSON number for `progress`; fractional values are rounded.
fn deserialize_progress<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let number = serde_json::Number::deserialize(deserializer)?;
    if let Some(n) = number.as_i64() {
        return Ok(n);
    }
    if let Some(n) = number.as_u64() {
        return Ok(i64::try_from(n).unwrap_or(i64::MAX));
    }
    number
        .as_f64()
        .map(|f| f.round() as i64)
        .ok_or_else(|| serde::de::Error::custom("progress is not a number"))
}

// ─── Channel State ────────────────────────────────────────────────

/// Lifecycle state of a resource's live channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelState {
    Connecting,
    Connected,
    Disconnected,
    Error,
}

impl ChannelState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Disconnected => "disconnected",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for ChannelState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── Control API Reply ────────────────────────────────────────────

/// Body returned by the control API's "start run" operation.
///
/// The backend answers `{"status", "message"}` on success and may answer
/// `{"error": ...}` for rejected ids, so every field is optional on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartRunReply {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StartRunStatus {
    Started,
    AlreadyRunning,
    Rejected,
}

impl StartRunReply {
    pub fn outcome(&self) -> StartRunStatus {
        match self.status.as_str() {
            "started" => StartRunStatus::Started,
            "already_running" => StartRunStatus::AlreadyRunning,
            _ => StartRunStatus::Rejected,
        }
    }

    /// Human-readable message for a notice; prefers `error` over `message`.
    pub fn display_message(&self) -> String {
        if let Some(error) = self.error.as_deref().filter(|e| !e.is_empty()) {
            return error.to_string();
        }
        if !self.message.is_empty() {
            return self.message.clone();
        }
        if self.status.is_empty() {
            "unexpected reply from server".to_string()
        } else {
            format!("unexpected run status: {}", self.status)
        }
    }
}

// ─── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_record_parses_backend_payload() {
        let json = r#"{
            "id": "r1",
            "config_id": "cfg1",
            "progress": 40,
            "state": "RUNNING",
            "created_at": "2026-02-25T12:00:00.123456+00:00"
        }"#;
        let record = StatusRecord::from_json(json).expect("valid record");
        assert_eq!(record.id, RunId::new("r1"));
        assert_eq!(record.resource_id, ResourceId::new("cfg1"));
        assert_eq!(record.progress, 40);
        assert_eq!(record.state, RunState::Running);
    }

    #[test]
    fn fractional_progress_is_rounded() {
        let json = r#"{"id":"r1","config_id":"c","progress":62.6,"state":"RUNNING","created_at":"2026-02-25T12:00:00Z"}"#;
        let record = StatusRecord::from_json(json).expect("valid record");
        assert_eq!(record.progress, 63);
    }

    #[test]
    fn unknown_state_is_malformed() {
        let json = r#"{"id":"r1","config_id":"c","progress":1,"state":"PAUSED","created_at":"2026-02-25T12:00:00Z"}"#;
        let err = StatusRecord::from_json(json).unwrap_err();
        assert!(matches!(err, CoreError::MalformedStatus(_)));
    }

    #[test]
    fn missing_fields_are_malformed() {
        let err = StatusRecord::from_json(r#"{"status":"running","progress":0.1}"#).unwrap_err();
        assert!(matches!(err, CoreError::MalformedStatus(_)));
        assert!(StatusRecord::from_json("not json").is_err());
    }

    #[test]
    fn record_serializes_with_wire_names() {
        let record = StatusRecord {
            id: RunId::new("r1"),
            resource_id: ResourceId::new("cfg1"),
            progress: 100,
            state: RunState::Completed,
            created_at: DateTime::parse_from_rfc3339("2026-02-25T12:00:00Z")
                .expect("valid")
                .with_timezone(&Utc),
        };
        let value = serde_json::to_value(&record).expect("serialize");
        assert_eq!(value["config_id"], "cfg1");
        assert_eq!(value["state"], "COMPLETED");
        assert!(value.get("resource_id").is_none());
    }

    #[test]
    fn run_state_from_str_is_case_insensitive() {
        assert_eq!("completed".parse::<RunState>(), Ok(RunState::Completed));
        assert_eq!("QUEUED".parse::<RunState>(), Ok(RunState::Queued));
        assert!("paused".parse::<RunState>().is_err());
        for state in RunState::ALL {
            assert_eq!(state.as_str().parse::<RunState>(), Ok(state));
        }
    }

    #[test]
    fn terminal_states() {
        assert!(RunState::Completed.is_terminal());
        assert!(RunState::Failed.is_terminal());
        assert!(!RunState::Running.is_terminal());
        assert!(!RunState::Queued.is_terminal());
    }

    #[test]
    fn start_run_reply_outcomes() {
        let started: StartRunReply =
            serde_json::from_str(r#"{"status":"started","message":"ok"}"#).expect("parse");
        assert_eq!(started.outcome(), StartRunStatus::Started);

        let running: StartRunReply = serde_json::from_str(
            r#"{"status":"already_running","message":"Simulation is already running"}"#,
        )
        .expect("parse");
        assert_eq!(running.outcome(), StartRunStatus::AlreadyRunning);
        assert_eq!(running.display_message(), "Simulation is already running");

        let rejected: StartRunReply =
            serde_json::from_str(r#"{"error":"Invalid UUID"}"#).expect("parse");
        assert_eq!(rejected.outcome(), StartRunStatus::Rejected);
        assert_eq!(rejected.display_message(), "Invalid UUID");
    }

    #[test]
    fn channel_state_serializes_lowercase() {
        let json = serde_json::to_string(&ChannelState::Disconnected).expect("serialize");
        assert_eq!(json, "\"disconnected\"");
        assert_eq!(ChannelState::Error.to_string(), "error");
    }
}
