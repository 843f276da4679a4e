//! Sync session: owns the resource store, the channel manager, and the
//! consuming end of the transport event queue.
//!
//! Everything runs on the caller's task. Caller operations (`open`, `close`,
//! `close_all`) and queued transport events are applied one at a time, so
//! each store mutation is a plain synchronous replace.

use sweepsync_core::types::{ResourceId, StatusRecord};

use crate::channel::{ChannelManager, EventOutcome, OpenOutcome};
use crate::store::{NoticeLevel, ResourceStore};
use crate::transport::{ChannelEvent, EventReceiver, Transport, event_queue};

/// Outcome of processing one queued event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Processed {
    pub resource_id: ResourceId,
    pub outcome: EventOutcome,
}

pub struct SyncSession<T: Transport> {
    store: ResourceStore,
    channels: ChannelManager<T>,
    events: EventReceiver,
}

impl<T: Transport> SyncSession<T> {
    pub fn new(transport: T) -> Self {
        let (tx, events) = event_queue();
        Self {
            store: ResourceStore::new(),
            channels: ChannelManager::new(transport, tx),
            events,
        }
    }

    pub fn store(&self) -> &ResourceStore {
        &self.store
    }

    /// Mutable access for consumer acknowledgements (notices, errors,
    /// change-log trimming). Records and lifecycle state stay read-only.
    pub fn store_mut(&mut self) -> &mut ResourceStore {
        &mut self.store
    }

    pub fn channels(&self) -> &ChannelManager<T> {
        &self.channels
    }

    pub fn channels_mut(&mut self) -> &mut ChannelManager<T> {
        &mut self.channels
    }

    pub fn open(&mut self, resource_id: &ResourceId) -> OpenOutcome {
        self.channels.open(&mut self.store, resource_id)
    }

    pub fn close(&mut self, resource_id: &ResourceId) {
        self.channels.close(resource_id);
    }

    pub fn close_all(&mut self) {
        self.channels.close_all(&mut self.store);
    }

    /// Replace a resource's records with a history snapshot.
    pub fn seed_history(&mut self, resource_id: &ResourceId, records: Vec<StatusRecord>) {
        tracing::debug!(resource = %resource_id, count = records.len(), "seeding run history");
        self.store.replace_records(resource_id, records);
    }

    /// Apply one transport event.
    pub fn apply(&mut self, event: ChannelEvent) -> Processed {
        let resource_id = event.resource_id.clone();
        let outcome = self.channels.handle_event(&mut self.store, event);
        Processed {
            resource_id,
            outcome,
        }
    }

    /// Apply every event already queued, without waiting. Returns what each
    /// one did, in arrival order.
    pub fn pump(&mut self) -> Vec<Processed> {
        let mut processed = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            processed.push(self.apply(event));
        }
        processed
    }

    /// Wait for the next transport event and apply it.
    ///
    /// Returns `None` only if the queue is closed, which cannot happen while
    /// the session's channel manager is alive.
    pub async fn process_next(&mut self) -> Option<Processed> {
        let event = self.events.recv().await?;
        Some(self.apply(event))
    }

    pub(crate) fn notify(&mut self, level: NoticeLevel, message: impl Into<String>) {
        self.store.push_notice(level, message);
    }
}
