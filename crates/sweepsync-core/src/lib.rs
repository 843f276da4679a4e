//! sweepsync-core: pure status-synchronization logic.
//! Run status records, the status merger, and the live channel lifecycle
//! state machine. No IO, no async.

pub mod error;
pub mod lifecycle;
pub mod merge;
pub mod types;

pub use error::CoreError;
pub use lifecycle::{LifecycleSignal, RejectedTransition, transition};
pub use merge::{merge, normalize, normalize_snapshot, normalized_progress};
pub use types::{
    ChannelId, ChannelState, ResourceId, RunId, RunState, StartRunReply, StartRunStatus,
    StatusRecord,
};
