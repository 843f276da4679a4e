//! Terminal rendering for records, channel state and notices.
//!
//! Pure string builders; callers decide between stdout and stderr.

use sweepsync_core::types::{ChannelState, ResourceId, RunState, StatusRecord};
use sweepsync_session::{Notice, NoticeLevel};

const BAR_WIDTH: usize = 20;
const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const RED: &str = "\x1b[31m";
const DIM: &str = "\x1b[2m";
const RESET: &str = "\x1b[0m";

pub(crate) fn resolve_color(color: &str) -> bool {
    use std::io::IsTerminal;
    match color {
        "always" => true,
        "never" => false,
        _ => std::io::stdout().is_terminal(),
    }
}

fn paint(text: &str, code: Option<&str>, use_color: bool) -> String {
    match code {
        Some(code) if use_color => format!("{code}{text}{RESET}"),
        _ => text.to_string(),
    }
}

fn run_state_color(state: RunState) -> Option<&'static str> {
    match state {
        RunState::Queued => Some(DIM),
        RunState::Running => Some(YELLOW),
        RunState::Completed => Some(GREEN),
        RunState::Failed => Some(RED),
    }
}

/// `[#########-----------]` for a 0..=100 progress value.
pub(crate) fn progress_bar(progress: i64, width: usize) -> String {
    let clamped = progress.clamp(0, 100) as usize;
    let filled = clamped * width / 100;
    format!("[{}{}]", "#".repeat(filled), "-".repeat(width - filled))
}

/// One record as a table row. `id_width` aligns ids across rows.
pub(crate) fn format_record_line(record: &StatusRecord, id_width: usize, use_color: bool) -> String {
    let state = format!("{:<9}", record.state.as_str());
    format!(
        "{:<id_width$}  {}  {} {:>3}%  {}",
        record.id.as_str(),
        paint(&state, run_state_color(record.state), use_color),
        progress_bar(record.progress, BAR_WIDTH),
        record.progress,
        record.created_at.format(TIME_FORMAT),
    )
}

/// Run history as a table, newest first (the store's order).
pub(crate) fn format_history(records: &[StatusRecord], use_color: bool) -> String {
    if records.is_empty() {
        return "(no runs)".to_string();
    }

    let id_width = records
        .iter()
        .map(|r| r.id.as_str().len())
        .max()
        .unwrap_or(0)
        .max("RUN".len());

    let mut lines = Vec::with_capacity(records.len() + 1);
    lines.push(format!(
        "{:<id_width$}  {:<9}  {:<w$} {:>4}  CREATED (UTC)",
        "RUN",
        "STATE",
        "PROGRESS",
        "",
        w = BAR_WIDTH + 2,
    ));
    lines.extend(
        records
            .iter()
            .map(|r| format_record_line(r, id_width, use_color)),
    );
    lines.join("\n")
}

pub(crate) fn format_channel_state(
    resource_id: &ResourceId,
    state: ChannelState,
    use_color: bool,
) -> String {
    let code = match state {
        ChannelState::Connecting => YELLOW,
        ChannelState::Connected => GREEN,
        ChannelState::Disconnected => DIM,
        ChannelState::Error => RED,
    };
    format!(
        "channel {}: {}",
        resource_id,
        paint(state.as_str(), Some(code), use_color)
    )
}

pub(crate) fn format_notice(notice: &Notice, use_color: bool) -> String {
    let (label, code) = match notice.level {
        NoticeLevel::Info => ("info", None),
        NoticeLevel::Success => ("ok", Some(GREEN)),
        NoticeLevel::Error => ("error", Some(RED)),
    };
    format!("{}: {}", paint(label, code, use_color), notice.message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};
    use sweepsync_core::types::RunId;

    fn ts(value: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(value)
            .unwrap()
            .with_timezone(&Utc)
    }

    fn make_record(id: &str, state: RunState, progress: i64) -> StatusRecord {
        StatusRecord {
            id: RunId::new(id),
            resource_id: ResourceId::new("cfg1"),
            progress,
            state,
            created_at: ts("2026-02-25T12:00:00Z"),
        }
    }

    fn make_notice(level: NoticeLevel, message: &str) -> Notice {
        Notice {
            level,
            message: message.to_string(),
            raised_at: ts("2026-02-25T12:00:00Z"),
        }
    }

    #[test]
    fn progress_bar_fills_proportionally() {
        assert_eq!(progress_bar(0, 10), "[----------]");
        assert_eq!(progress_bar(40, 10), "[####------]");
        assert_eq!(progress_bar(100, 10), "[##########]");
    }

    #[test]
    fn progress_bar_clamps_out_of_range() {
        assert_eq!(progress_bar(-5, 4), "[----]");
        assert_eq!(progress_bar(250, 4), "[####]");
    }

    #[test]
    fn record_line_plain() {
        let line = format_record_line(&make_record("r1", RunState::Running, 40), 4, false);
        assert_eq!(
            line,
            "r1    RUNNING    [########------------]  40%  2026-02-25 12:00:00"
        );
    }

    #[test]
    fn record_line_colors_state() {
        let line = format_record_line(&make_record("r1", RunState::Failed, 10), 2, true);
        assert!(line.contains("\x1b[31mFAILED   \x1b[0m"));
    }

    #[test]
    fn history_empty() {
        assert_eq!(format_history(&[], false), "(no runs)");
    }

    #[test]
    fn history_aligns_ids() {
        let out = format_history(
            &[
                make_record("run-long-id", RunState::Running, 5),
                make_record("r0", RunState::Completed, 100),
            ],
            false,
        );
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("RUN          STATE"));
        assert!(lines[1].starts_with("run-long-id  RUNNING"));
        assert!(lines[2].starts_with("r0           COMPLETED"));
        assert!(lines[2].contains("100%"));
    }

    #[test]
    fn channel_state_line() {
        let id = ResourceId::new("cfg1");
        assert_eq!(
            format_channel_state(&id, ChannelState::Connected, false),
            "channel cfg1: connected"
        );
        assert_eq!(
            format_channel_state(&id, ChannelState::Error, true),
            "channel cfg1: \x1b[31merror\x1b[0m"
        );
    }

    #[test]
    fn notice_labels() {
        assert_eq!(
            format_notice(&make_notice(NoticeLevel::Info, "already running"), true),
            "info: already running"
        );
        assert_eq!(
            format_notice(&make_notice(NoticeLevel::Error, "boom"), false),
            "error: boom"
        );
    }
}
