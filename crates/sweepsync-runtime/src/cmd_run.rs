//! `sweepsync run` / `sweepsync watch`: follow a configuration's runs live.
//!
//! Both commands seed the store from the run history, then stream channel
//! events until a stop condition. `run` first asks the backend to start a
//! run and stops once the followed run reaches a terminal state; `watch`
//! just opens the channel and follows it until it closes.
//!
//! Exit codes:
//! - 0: run completed, or the watched channel closed
//! - 1: run failed
//! - 2: backend or channel unavailable
//! - 3: interrupted (Ctrl-C)

use std::time::Duration;

use sweepsync_client::{ClientConfig, HttpControlApi, WsTransport};
use sweepsync_core::types::{ChannelState, ResourceId, RunId, RunState};
use sweepsync_session::{EventOutcome, RunController, RunOutcome, SyncSession};

use crate::render::{format_channel_state, format_notice, format_record_line};

pub const EXIT_OK: i32 = 0;
pub const EXIT_RUN_FAILED: i32 = 1;
pub const EXIT_UNAVAILABLE: i32 = 2;
pub const EXIT_INTERRUPTED: i32 = 3;

/// How long teardown waits for channel tasks to send their close frames.
const CLOSE_GRACE: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Start a run; optionally follow one already in progress.
    Start { follow_existing: bool },
    /// Follow the channel without starting anything.
    Watch,
}

#[derive(Debug, Clone, Copy)]
pub struct Output {
    pub json: bool,
    pub use_color: bool,
}

/// Entry point for `sweepsync run` and `sweepsync watch`. Returns an exit code.
pub async fn cmd_run(
    config: &ClientConfig,
    resource: &str,
    mode: Mode,
    output: Output,
) -> anyhow::Result<i32> {
    let resource_id = ResourceId::new(resource);
    let controller = RunController::new(HttpControlApi::new(config.clone())?);
    let mut session = SyncSession::new(WsTransport::new(config.clone()));

    // A missing history is reported but does not stop live updates.
    if let Ok(count) = controller.load_history(&mut session, &resource_id).await {
        tracing::debug!(resource = %resource_id, count, "history loaded");
    }

    let code = match open_channel(&controller, &mut session, &resource_id, mode).await {
        Some(code) => code,
        None => {
            flush_notices(&mut session, output.use_color);
            stream(&mut session, &resource_id, mode, output).await
        }
    };

    teardown(&mut session, output.use_color).await;
    Ok(code)
}

/// Start the run or open the channel. `Some(code)` means there is nothing
/// to stream.
async fn open_channel(
    controller: &RunController<HttpControlApi>,
    session: &mut SyncSession<WsTransport>,
    resource_id: &ResourceId,
    mode: Mode,
) -> Option<i32> {
    match mode {
        Mode::Watch => {
            session.open(resource_id);
            None
        }
        Mode::Start { follow_existing } => {
            match controller.start_run(session, resource_id).await {
                Ok(RunOutcome::Started(_)) => None,
                Ok(RunOutcome::AlreadyRunning(_)) if follow_existing => {
                    session.open(resource_id);
                    None
                }
                Ok(RunOutcome::AlreadyRunning(_)) => Some(EXIT_OK),
                Err(_) => Some(EXIT_UNAVAILABLE),
            }
        }
    }
}

async fn stream(
    session: &mut SyncSession<WsTransport>,
    resource_id: &ResourceId,
    mode: Mode,
    output: Output,
) -> i32 {
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        let processed = tokio::select! {
            next = session.process_next() => match next {
                Some(processed) => processed,
                None => return EXIT_UNAVAILABLE,
            },
            _ = &mut ctrl_c => {
                tracing::info!(resource = %resource_id, "interrupted");
                return EXIT_INTERRUPTED;
            }
        };

        if processed.resource_id != *resource_id {
            continue;
        }

        let verdict = match processed.outcome {
            EventOutcome::RecordMerged(run_id) => {
                print_record(session, resource_id, &run_id, output);
                session
                    .store()
                    .records(resource_id)
                    .iter()
                    .find(|r| r.id == run_id)
                    .and_then(|r| exit_for_run(mode, r.state))
            }
            EventOutcome::StateChanged(state) => {
                eprintln!("{}", format_channel_state(resource_id, state, output.use_color));
                exit_for_channel(mode, state)
            }
            EventOutcome::Malformed | EventOutcome::Stale | EventOutcome::Rejected => None,
        };

        flush_notices(session, output.use_color);
        if let Some(code) = verdict {
            return code;
        }
    }
}

/// Exit code once a followed run reaches `state`, if that ends the command.
pub(crate) fn exit_for_run(mode: Mode, state: RunState) -> Option<i32> {
    match (mode, state) {
        (Mode::Watch, _) => None,
        (Mode::Start { .. }, RunState::Completed) => Some(EXIT_OK),
        (Mode::Start { .. }, RunState::Failed) => Some(EXIT_RUN_FAILED),
        (Mode::Start { .. }, RunState::Queued | RunState::Running) => None,
    }
}

/// Exit code once the channel reaches `state`, if that ends the command.
pub(crate) fn exit_for_channel(mode: Mode, state: ChannelState) -> Option<i32> {
    match state {
        ChannelState::Connecting | ChannelState::Connected => None,
        ChannelState::Error => Some(EXIT_UNAVAILABLE),
        // Closing before the run finished means we lost track of it.
        ChannelState::Disconnected => match mode {
            Mode::Watch => Some(EXIT_OK),
            Mode::Start { .. } => Some(EXIT_UNAVAILABLE),
        },
    }
}

fn print_record(
    session: &SyncSession<WsTransport>,
    resource_id: &ResourceId,
    run_id: &RunId,
    output: Output,
) {
    let Some(record) = session
        .store()
        .records(resource_id)
        .iter()
        .find(|r| &r.id == run_id)
    else {
        return;
    };

    if output.json {
        match serde_json::to_string(record) {
            Ok(line) => println!("{line}"),
            Err(e) => tracing::warn!("failed to encode record: {e}"),
        }
    } else {
        let id_width = record.id.as_str().len();
        println!("{}", format_record_line(record, id_width, output.use_color));
    }
}

/// Print and discard pending notices on stderr.
pub(crate) fn flush_notices(session: &mut SyncSession<WsTransport>, use_color: bool) {
    for notice in session.store_mut().drain_notices() {
        eprintln!("{}", format_notice(&notice, use_color));
    }
}

async fn teardown(session: &mut SyncSession<WsTransport>, use_color: bool) {
    session.close_all();
    if tokio::time::timeout(CLOSE_GRACE, session.channels().transport().drain())
        .await
        .is_err()
    {
        tracing::debug!("channel tasks still running after close grace period");
    }
    flush_notices(session, use_color);
}

#[cfg(test)]
mod tests {
    use super::*;

    const START: Mode = Mode::Start {
        follow_existing: false,
    };

    #[test]
    fn run_stops_on_terminal_states() {
        assert_eq!(exit_for_run(START, RunState::Completed), Some(EXIT_OK));
        assert_eq!(exit_for_run(START, RunState::Failed), Some(EXIT_RUN_FAILED));
        assert_eq!(exit_for_run(START, RunState::Running), None);
        assert_eq!(exit_for_run(START, RunState::Queued), None);
    }

    #[test]
    fn watch_ignores_run_states() {
        for state in RunState::ALL {
            assert_eq!(exit_for_run(Mode::Watch, state), None);
        }
    }

    #[test]
    fn channel_error_is_unavailable() {
        assert_eq!(exit_for_channel(START, ChannelState::Error), Some(EXIT_UNAVAILABLE));
        assert_eq!(
            exit_for_channel(Mode::Watch, ChannelState::Error),
            Some(EXIT_UNAVAILABLE)
        );
    }

    #[test]
    fn disconnect_ends_watch_cleanly_but_not_run() {
        assert_eq!(
            exit_for_channel(Mode::Watch, ChannelState::Disconnected),
            Some(EXIT_OK)
        );
        assert_eq!(
            exit_for_channel(START, ChannelState::Disconnected),
            Some(EXIT_UNAVAILABLE)
        );
    }

    #[test]
    fn live_channel_states_keep_streaming() {
        assert_eq!(exit_for_channel(START, ChannelState::Connecting), None);
        assert_eq!(exit_for_channel(Mode::Watch, ChannelState::Connected), None);
    }
}
