//! Resource store: the read model observers consume.
//!
//! Owns each resource's ordered record collection and its live channel
//! lifecycle state. Only the channel manager writes lifecycle state and only
//! the session writes records; observers get read access plus version-based
//! change tracking (`changes_since(version)`).
//!
//! The store also keeps a short log of user-facing notices (run started,
//! already running, control API failures) and the last error message.

use std::collections::{HashMap, VecDeque};

use chrono::{DateTime, Utc};
use serde::Serialize;

use sweepsync_core::merge;
use sweepsync_core::types::{ChannelState, ResourceId, StatusRecord};

/// Monotonic version counter for change tracking.
pub type StoreVersion = u64;

/// Notices older than this many entries are dropped.
const MAX_NOTICES: usize = 64;

/// Change entries older than this many are dropped. Observers that fall
/// further behind see only the retained tail.
pub const MAX_CHANGES: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Records,
    ChannelState,
    /// Every lifecycle entry was removed (full teardown).
    ChannelStatesCleared,
}

/// Change notification for one store mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoreChange {
    pub version: StoreVersion,
    /// `None` for store-wide changes.
    pub resource_id: Option<ResourceId>,
    pub kind: ChangeKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Info,
    Success,
    Error,
}

/// A user-facing message raised by the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
    pub raised_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
pub struct ResourceStore {
    records: HashMap<ResourceId, Vec<StatusRecord>>,
    channel_states: HashMap<ResourceId, ChannelState>,
    version: StoreVersion,
    changes: VecDeque<StoreChange>,
    notices: VecDeque<Notice>,
    last_error: Option<String>,
}

impl ResourceStore {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Reads ────────────────────────────────────────────────────

    /// Records for a resource, newest first. Empty if nothing is known.
    pub fn records(&self, resource_id: &ResourceId) -> &[StatusRecord] {
        self.records
            .get(resource_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// The newest record for a resource.
    pub fn latest(&self, resource_id: &ResourceId) -> Option<&StatusRecord> {
        self.records(resource_id).first()
    }

    /// Lifecycle state of a resource's channel; `None` if never opened.
    pub fn channel_state(&self, resource_id: &ResourceId) -> Option<ChannelState> {
        self.channel_states.get(resource_id).copied()
    }

    /// All lifecycle entries, sorted by resource id.
    pub fn channel_states(&self) -> Vec<(&ResourceId, ChannelState)> {
        let mut states: Vec<_> = self
            .channel_states
            .iter()
            .map(|(id, state)| (id, *state))
            .collect();
        states.sort_by(|a, b| a.0.cmp(b.0));
        states
    }

    /// Current store version (for change tracking).
    pub fn version(&self) -> StoreVersion {
        self.version
    }

    /// Get changes since a given version.
    pub fn changes_since(&self, since_version: StoreVersion) -> Vec<&StoreChange> {
        let start = self.changes.partition_point(|c| c.version <= since_version);
        self.changes.range(start..).collect()
    }

    /// Remove change entries with version <= `before_version`.
    ///
    /// Observers call this once they have consumed up to `before_version`.
    pub fn trim_changes_before(&mut self, before_version: StoreVersion) {
        self.changes.retain(|c| c.version > before_version);
    }

    pub fn notices(&self) -> impl Iterator<Item = &Notice> {
        self.notices.iter()
    }

    /// Take every pending notice, oldest first.
    pub fn drain_notices(&mut self) -> Vec<Notice> {
        self.notices.drain(..).collect()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn clear_error(&mut self) {
        self.last_error = None;
    }

    // ── Writes (session-internal) ────────────────────────────────

    /// Merge one incoming record into a resource's collection.
    pub(crate) fn merge_record(&mut self, resource_id: &ResourceId, record: StatusRecord) {
        let merged = merge::merge(self.records(resource_id), record);
        self.records.insert(resource_id.clone(), merged);
        self.record_change(Some(resource_id.clone()), ChangeKind::Records);
    }

    /// Replace a resource's collection with a history snapshot.
    pub(crate) fn replace_records(&mut self, resource_id: &ResourceId, records: Vec<StatusRecord>) {
        self.records
            .insert(resource_id.clone(), merge::normalize_snapshot(records));
        self.record_change(Some(resource_id.clone()), ChangeKind::Records);
    }

    pub(crate) fn set_channel_state(&mut self, resource_id: &ResourceId, state: ChannelState) {
        if self.channel_states.get(resource_id) == Some(&state) {
            return;
        }
        self.channel_states.insert(resource_id.clone(), state);
        self.record_change(Some(resource_id.clone()), ChangeKind::ChannelState);
    }

    pub(crate) fn clear_channel_states(&mut self) {
        if self.channel_states.is_empty() {
            return;
        }
        self.channel_states.clear();
        self.record_change(None, ChangeKind::ChannelStatesCleared);
    }

    pub(crate) fn push_notice(&mut self, level: NoticeLevel, message: impl Into<String>) {
        let message = message.into();
        if level == NoticeLevel::Error {
            self.last_error = Some(message.clone());
        }
        if self.notices.len() == MAX_NOTICES {
            self.notices.pop_front();
        }
        self.notices.push_back(Notice {
            level,
            message,
            raised_at: Utc::now(),
        });
    }

    fn record_change(&mut self, resource_id: Option<ResourceId>, kind: ChangeKind) {
        self.version += 1;
        if self.changes.len() == MAX_CHANGES {
            self.changes.pop_front();
        }
        self.changes.push_back(StoreChange {
            version: self.version,
            resource_id,
            kind,
        });
    }
}

// ─── Tests ────────────────────────────────────────────────────────
