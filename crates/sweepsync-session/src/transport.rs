//! Streaming transport boundary.
//!
//! A transport turns `subscribe` into a live channel and reports what happens
//! to it as [`TransportEvent`]s. Events from every channel land on one
//! single-consumer queue and are processed strictly in arrival order, so the
//! merge and store logic never runs inside a transport callback.

use sweepsync_core::types::{ChannelId, ResourceId};
use thiserror::Error;
use tokio::sync::mpsc;

/// What a transport observed on one channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    Opened,
    /// Raw payload, expected to be a JSON-encoded status record.
    Message(String),
    Error(String),
    Closed,
}

/// A transport event tagged with the channel that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelEvent {
    pub resource_id: ResourceId,
    pub channel_id: ChannelId,
    pub event: TransportEvent,
}

pub type EventReceiver = mpsc::UnboundedReceiver<ChannelEvent>;

/// Create the single-consumer event queue.
pub fn event_queue() -> (mpsc::UnboundedSender<ChannelEvent>, EventReceiver) {
    mpsc::unbounded_channel()
}

/// Sending half handed to a transport for one channel.
///
/// Every event pushed through a sink is tagged with the sink's resource and
/// channel id. Send methods return `false` once the queue's consumer is gone.
#[derive(Debug, Clone)]
pub struct EventSink {
    resource_id: ResourceId,
    channel_id: ChannelId,
    tx: mpsc::UnboundedSender<ChannelEvent>,
}

impl EventSink {
    pub fn new(
        resource_id: ResourceId,
        channel_id: ChannelId,
        tx: mpsc::UnboundedSender<ChannelEvent>,
    ) -> Self {
        Self {
            resource_id,
            channel_id,
            tx,
        }
    }

    pub fn resource_id(&self) -> &ResourceId {
        &self.resource_id
    }

    pub fn channel_id(&self) -> ChannelId {
        self.channel_id
    }

    pub fn opened(&self) -> bool {
        self.send(TransportEvent::Opened)
    }

    pub fn message(&self, payload: impl Into<String>) -> bool {
        self.send(TransportEvent::Message(payload.into()))
    }

    pub fn error(&self, reason: impl Into<String>) -> bool {
        self.send(TransportEvent::Error(reason.into()))
    }

    pub fn closed(&self) -> bool {
        self.send(TransportEvent::Closed)
    }

    fn send(&self, event: TransportEvent) -> bool {
        self.tx
            .send(ChannelEvent {
                resource_id: self.resource_id.clone(),
                channel_id: self.channel_id,
                event,
            })
            .is_ok()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("failed to subscribe to {resource_id}: {reason}")]
    Subscribe {
        resource_id: ResourceId,
        reason: String,
    },
}

/// Handle to one live channel.
pub trait ChannelHandle {
    /// Ask the transport to shut the channel down.
    ///
    /// Fire-and-forget: completion is reported later as
    /// [`TransportEvent::Closed`] on the channel's sink.
    fn request_close(&mut self);
}

/// Factory for live channels.
pub trait Transport {
    type Handle: ChannelHandle;

    /// Start a live channel for `sink.resource_id()`.
    ///
    /// Must not block: connection progress is reported through `sink`.
    fn subscribe(&mut self, sink: EventSink) -> Result<Self::Handle, TransportError>;
}

// ─── Tests ────────────────────────────────────────────────────────
