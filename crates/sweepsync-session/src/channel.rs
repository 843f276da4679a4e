//! Channel manager: owns the live transport handles and enforces that at most
//! one resource has an open channel at any time.
//!
//! Lifecycle state is written through to the [`ResourceStore`]; parsed
//! messages are merged into the store's record collections.
//!
//! # Channel ids
//!
//! Each `open` allocates a fresh [`ChannelId`] and remembers it as the
//! resource's current channel. Events are only applied when they carry the
//! current id, so a late `closed` from an evicted handle can never tear down
//! a newer channel for the same resource. `close_all` forgets every current
//! id, which also fences events from handles still shutting down.

use std::collections::HashMap;

use sweepsync_core::lifecycle::{self, LifecycleSignal};
use sweepsync_core::types::{ChannelId, ChannelState, ResourceId, RunId, StatusRecord};
use tokio::sync::mpsc;

use crate::store::ResourceStore;
use crate::transport::{ChannelEvent, ChannelHandle, EventSink, Transport, TransportEvent};

/// Longest payload excerpt included in malformed-message logs.
const MAX_LOGGED_PAYLOAD: usize = 256;

/// Result of [`ChannelManager::open`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenOutcome {
    /// A new channel was created.
    Opened(ChannelId),
    /// The resource already has an active channel; nothing changed.
    AlreadyOpen,
    /// The transport refused to subscribe; lifecycle state is `Error`.
    Failed,
}

/// What processing one channel event did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventOutcome {
    /// Lifecycle state is now the given value.
    StateChanged(ChannelState),
    /// A record was merged into the store.
    RecordMerged(RunId),
    /// Payload did not parse as a status record and was dropped.
    Malformed,
    /// Event came from a channel that is no longer current.
    Stale,
    /// Lifecycle signal had no edge from the current state.
    Rejected,
}

struct ActiveChannel<H> {
    channel_id: ChannelId,
    handle: H,
}

pub struct ChannelManager<T: Transport> {
    transport: T,
    events_tx: mpsc::UnboundedSender<ChannelEvent>,
    /// Active channel set. Never holds more than one entry.
    active: HashMap<ResourceId, ActiveChannel<T::Handle>>,
    /// Latest channel id issued per resource.
    current: HashMap<ResourceId, ChannelId>,
    next_channel_id: u64,
}

impl<T: Transport> ChannelManager<T> {
    pub fn new(transport: T, events_tx: mpsc::UnboundedSender<ChannelEvent>) -> Self {
        Self {
            transport,
            events_tx,
            active: HashMap::new(),
            current: HashMap::new(),
            next_channel_id: 1,
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Resources holding an active channel (zero or one).
    pub fn active_resources(&self) -> Vec<&ResourceId> {
        self.active.keys().collect()
    }

    pub fn is_active(&self, resource_id: &ResourceId) -> bool {
        self.active.contains_key(resource_id)
    }

    /// Channel id of the resource's active channel.
    pub fn active_channel(&self, resource_id: &ResourceId) -> Option<ChannelId> {
        self.active.get(resource_id).map(|c| c.channel_id)
    }

    /// Open a live channel for `resource_id`.
    ///
    /// Idempotent while the resource holds an active channel. Any other
    /// resource's channel is closed first.
    pub fn open(&mut self, store: &mut ResourceStore, resource_id: &ResourceId) -> OpenOutcome {
        if self.active.contains_key(resource_id) {
            tracing::debug!(resource = %resource_id, "channel already open");
            return OpenOutcome::AlreadyOpen;
        }

        let others: Vec<ResourceId> = self
            .active
            .keys()
            .filter(|id| *id != resource_id)
            .cloned()
            .collect();
        for other in others {
            tracing::info!(evicted = %other, opening = %resource_id, "closing channel for exclusivity");
            self.close(&other);
        }

        let channel_id = self.allocate_channel_id();
        self.current.insert(resource_id.clone(), channel_id);
        apply_signal(store, resource_id, LifecycleSignal::Open);

        let sink = EventSink::new(resource_id.clone(), channel_id, self.events_tx.clone());
        match self.transport.subscribe(sink) {
            Ok(handle) => {
                self.active.insert(
                    resource_id.clone(),
                    ActiveChannel { channel_id, handle },
                );
                tracing::info!(resource = %resource_id, channel = %channel_id, "channel opened");
                OpenOutcome::Opened(channel_id)
            }
            Err(e) => {
                tracing::warn!(resource = %resource_id, "channel subscribe failed: {e}");
                apply_signal(store, resource_id, LifecycleSignal::TransportError);
                OpenOutcome::Failed
            }
        }
    }

    /// Request shutdown of the resource's channel. No-op without one.
    ///
    /// The handle leaves the active set immediately; `Disconnected` is set
    /// when the transport reports `closed`.
    pub fn close(&mut self, resource_id: &ResourceId) {
        match self.active.remove(resource_id) {
            Some(mut channel) => {
                tracing::info!(resource = %resource_id, channel = %channel.channel_id, "closing channel");
                channel.handle.request_close();
            }
            None => tracing::debug!(resource = %resource_id, "close: no active channel"),
        }
    }

    /// Request shutdown of every channel and clear all lifecycle state.
    pub fn close_all(&mut self, store: &mut ResourceStore) {
        for (resource_id, mut channel) in self.active.drain() {
            tracing::info!(resource = %resource_id, channel = %channel.channel_id, "closing channel");
            channel.handle.request_close();
        }
        self.current.clear();
        store.clear_channel_states();
    }

    /// Apply one transport event.
    pub fn handle_event(&mut self, store: &mut ResourceStore, event: ChannelEvent) -> EventOutcome {
        let ChannelEvent {
            resource_id,
            channel_id,
            event,
        } = event;

        if self.current.get(&resource_id) != Some(&channel_id) {
            tracing::debug!(resource = %resource_id, channel = %channel_id, ?event, "ignoring event from stale channel");
            return EventOutcome::Stale;
        }

        match event {
            TransportEvent::Opened => {
                apply_signal(store, &resource_id, LifecycleSignal::TransportOpened)
            }
            TransportEvent::Message(payload) => match StatusRecord::from_json(&payload) {
                Ok(record) => {
                    let run_id = record.id.clone();
                    tracing::debug!(
                        resource = %resource_id,
                        run = %run_id,
                        state = %record.state,
                        progress = record.progress,
                        "merging status record"
                    );
                    store.merge_record(&resource_id, record);
                    EventOutcome::RecordMerged(run_id)
                }
                Err(e) => {
                    tracing::warn!(
                        resource = %resource_id,
                        payload = %excerpt(&payload),
                        "dropping malformed status message: {e}"
                    );
                    EventOutcome::Malformed
                }
            },
            TransportEvent::Error(reason) => {
                tracing::warn!(resource = %resource_id, channel = %channel_id, "channel error: {reason}");
                apply_signal(store, &resource_id, LifecycleSignal::TransportError)
            }
            TransportEvent::Closed => {
                if self.active_channel(&resource_id) == Some(channel_id) {
                    self.active.remove(&resource_id);
                }
                apply_signal(store, &resource_id, LifecycleSignal::TransportClosed)
            }
        }
    }

    fn allocate_channel_id(&mut self) -> ChannelId {
        let id = ChannelId::new(self.next_channel_id);
        self.next_channel_id += 1;
        id
    }
}

/// Run one lifecycle signal through the state machine and write the result.
fn apply_signal(
    store: &mut ResourceStore,
    resource_id: &ResourceId,
    signal: LifecycleSignal,
) -> EventOutcome {
    let current = store.channel_state(resource_id);
    match lifecycle::transition(current, signal) {
        Ok(next) => {
            tracing::debug!(resource = %resource_id, from = ?current, to = %next, ?signal, "lifecycle transition");
            store.set_channel_state(resource_id, next);
            EventOutcome::StateChanged(next)
        }
        Err(rejected) => {
            tracing::warn!(resource = %resource_id, "{rejected}");
            EventOutcome::Rejected
        }
    }
}

fn excerpt(payload: &str) -> &str {
    match payload.char_indices().nth(MAX_LOGGED_PAYLOAD) {
        Some((idx, _)) => &payload[..idx],
        None => payload,
    }
}

// ─── Tests ────────────────────────────────────────────────────────
