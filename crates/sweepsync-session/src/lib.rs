//! sweepsync-session: in-memory status synchronization for one client session.
//!
//! Seeds a resource store from the run history, keeps it current from a
//! single live channel, and starts runs through the control API.
//! Transport and control API are traits; concrete implementations live in
//! `sweepsync-client`.

pub mod channel;
pub mod control;
pub mod controller;
pub mod session;
pub mod store;
pub mod transport;

pub use sweepsync_core::types;

pub use channel::{ChannelManager, EventOutcome, OpenOutcome};
pub use control::{ControlApi, ControlApiError};
pub use controller::{RunController, RunOutcome};
pub use session::{Processed, SyncSession};
pub use store::{ChangeKind, Notice, NoticeLevel, ResourceStore, StoreChange, StoreVersion};
pub use transport::{
    ChannelEvent, ChannelHandle, EventReceiver, EventSink, Transport, TransportError,
    TransportEvent, event_queue,
};
