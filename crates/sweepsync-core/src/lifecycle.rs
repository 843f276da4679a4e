//! Live channel lifecycle finite state machine.
//!
//! A pure, side-effect-free module: [`transition`] is the single entry point
//! for all lifecycle changes. A resource without an entry has never been
//! opened; `None` stands for that absent state.
//!
//! ```text
//! (absent) ──open──▶ Connecting ──opened──▶ Connected
//!                        │                     │
//!                        └──────error──────────┴──▶ Error
//! Connecting | Connected | Error ──closed──▶ Disconnected
//! Disconnected | Error ──open──▶ Connecting
//! ```
//!
//! Nothing recovers on its own: leaving `Error` or `Disconnected` always
//! takes an explicit `open`.

use thiserror::Error;

use crate::types::ChannelState;

/// Input to the lifecycle state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleSignal {
    /// Caller-initiated `open` that created a new transport handle.
    Open,
    /// Transport reports the channel is established.
    TransportOpened,
    /// Transport reports a channel-level failure.
    TransportError,
    /// Transport reports the channel is gone, locally or remotely initiated.
    TransportClosed,
}

/// A signal that has no edge from the current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("lifecycle signal {signal:?} rejected in state {from:?}")]
pub struct RejectedTransition {
    pub from: Option<ChannelState>,
    pub signal: LifecycleSignal,
}

/// Pure state machine: compute the next lifecycle state.
///
/// `Open` is accepted from every state because it always accompanies a fresh
/// transport handle. A repeated `TransportError` or `TransportClosed` is a
/// self-loop rather than a rejection.
pub fn transition(
    current: Option<ChannelState>,
    signal: LifecycleSignal,
) -> Result<ChannelState, RejectedTransition> {
    use ChannelState::{Connected, Connecting, Disconnected, Error};

    let next = match (current, signal) {
        (_, LifecycleSignal::Open) => Some(Connecting),
        (Some(Connecting), LifecycleSignal::TransportOpened) => Some(Connected),
        (Some(Connecting | Connected | Error), LifecycleSignal::TransportError) => Some(Error),
        (Some(_), LifecycleSignal::TransportClosed) => Some(Disconnected),
        _ => None,
    };

    next.ok_or(RejectedTransition {
        from: current,
        signal,
    })
}

// ─── Tests ────────────────────────────────────────────────────────
