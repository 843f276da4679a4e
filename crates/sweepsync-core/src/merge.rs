//! Status merger: folds one incoming status record into a resource's record
//! collection.
//!
//! Collections are kept unique by run id and ordered newest-first by
//! `created_at`. The last record applied for an id always wins, whatever its
//! timestamp; ordering is a display concern only. Records with equal
//! timestamps keep their relative order, so the most recently applied one
//! leads its tie group.

use std::collections::HashSet;

use crate::types::{RunState, StatusRecord};

/// Upper bound of the progress percentage.
pub const MAX_PROGRESS: i64 = 100;

/// Progress as stored: 100 for completed runs, otherwise clamped to `[0, 100]`.
#[must_use]
pub fn normalized_progress(state: RunState, raw: i64) -> i64 {
    if state == RunState::Completed {
        MAX_PROGRESS
    } else {
        raw.clamp(0, MAX_PROGRESS)
    }
}

/// Normalize a record's progress. The raw value is discarded, not rejected.
#[must_use]
pub fn normalize(mut record: StatusRecord) -> StatusRecord {
    record.progress = normalized_progress(record.state, record.progress);
    record
}

/// Merge `incoming` into `existing` and return the new collection.
///
/// 1. Normalize the incoming progress.
/// 2. Drop any existing record with the same id.
/// 3. Prepend the incoming record.
/// 4. Stable-sort by `created_at` descending.
#[must_use]
pub fn merge(existing: &[StatusRecord], incoming: StatusRecord) -> Vec<StatusRecord> {
    let incoming = normalize(incoming);
    let mut merged = Vec::with_capacity(existing.len() + 1);
    merged.extend(existing.iter().filter(|r| r.id != incoming.id).cloned());
    merged.insert(0, incoming);
    sort_newest_first(&mut merged);
    merged
}

/// Normalize a history snapshot into a valid collection.
///
/// The first occurrence of a duplicated id wins; the result is ordered
/// newest-first.
#[must_use]
pub fn normalize_snapshot(records: Vec<StatusRecord>) -> Vec<StatusRecord> {
    let mut seen = HashSet::new();
    let mut snapshot: Vec<StatusRecord> = records
        .into_iter()
        .filter(|r| seen.insert(r.id.clone()))
        .map(normalize)
        .collect();
    sort_newest_first(&mut snapshot);
    snapshot
}

fn sort_newest_first(records: &mut [StatusRecord]) {
    // `sort_by` is stable.
    records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}

// ─── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ResourceId, RunId};
    use chrono::{DateTime, Utc};

    fn ts(value: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(value)
            .expect("valid RFC3339 timestamp")
            .with_timezone(&Utc)
    }

    fn make_record(id: &str, state: RunState, progress: i64, created_at: &str) -> StatusRecord {
        StatusRecord {
            id: RunId::new(id),
            resource_id: ResourceId::new("cfg1"),
            progress,
            state,
            created_at: ts(created_at),
        }
    }

    fn ids(records: &[StatusRecord]) -> Vec<&str> {
        records.iter().map(|r| r.id.as_str()).collect()
    }

    #[test]
    fn completed_progress_is_forced_to_100() {
        let merged = merge(
            &[],
            make_record("r1", RunState::Completed, 63, "2026-02-25T12:00:00Z"),
        );
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].progress, 100);
    }

    #[test]
    fn progress_is_clamped_for_non_completed_states() {
        let over = merge(
            &[],
            make_record("r1", RunState::Running, 140, "2026-02-25T12:00:00Z"),
        );
        assert_eq!(over[0].progress, 100);

        let under = merge(
            &[],
            make_record("r1", RunState::Failed, -5, "2026-02-25T12:00:00Z"),
        );
        assert_eq!(under[0].progress, 0);

        let inside = merge(
            &[],
            make_record("r1", RunState::Queued, 37, "2026-02-25T12:00:00Z"),
        );
        assert_eq!(inside[0].progress, 37);
    }

    #[test]
    fn same_id_replaces_previous_record() {
        let first = merge(
            &[],
            make_record("r1", RunState::Running, 40, "2026-02-25T12:00:00Z"),
        );
        let second = merge(
            &first,
            make_record("r1", RunState::Completed, 97, "2026-02-25T12:00:05Z"),
        );
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].state, RunState::Completed);
        assert_eq!(second[0].progress, 100);
    }

    #[test]
    fn last_write_wins_even_with_older_timestamp() {
        let first = merge(
            &[],
            make_record("r1", RunState::Running, 80, "2026-02-25T12:00:10Z"),
        );
        let second = merge(
            &first,
            make_record("r1", RunState::Running, 20, "2026-02-25T12:00:00Z"),
        );
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].progress, 20);
    }

    #[test]
    fn collection_is_ordered_newest_first() {
        let mut records = Vec::new();
        for (id, at) in [
            ("r2", "2026-02-25T12:02:00Z"),
            ("r1", "2026-02-25T12:01:00Z"),
            ("r3", "2026-02-25T12:03:00Z"),
        ] {
            records = merge(&records, make_record(id, RunState::Queued, 0, at));
        }
        assert_eq!(ids(&records), vec!["r3", "r2", "r1"]);
    }

    #[test]
    fn equal_timestamps_put_latest_applied_first() {
        let at = "2026-02-25T12:00:00Z";
        let records = merge(&[], make_record("a", RunState::Running, 1, at));
        let records = merge(&records, make_record("b", RunState::Running, 1, at));
        assert_eq!(ids(&records), vec!["b", "a"]);

        let records = merge(&records, make_record("a", RunState::Running, 2, at));
        assert_eq!(ids(&records), vec!["a", "b"]);
    }

    #[test]
    fn merge_leaves_other_records_untouched() {
        let base = vec![
            make_record("r2", RunState::Running, 55, "2026-02-25T12:02:00Z"),
            make_record("r1", RunState::Completed, 100, "2026-02-25T12:01:00Z"),
        ];
        let merged = merge(
            &base,
            make_record("r3", RunState::Queued, 0, "2026-02-25T12:03:00Z"),
        );
        assert_eq!(ids(&merged), vec!["r3", "r2", "r1"]);
        assert_eq!(merged[1], base[0]);
        assert_eq!(merged[2], base[1]);
    }

    #[test]
    fn snapshot_is_normalized_sorted_and_deduplicated() {
        let snapshot = normalize_snapshot(vec![
            make_record("r1", RunState::Completed, 90, "2026-02-25T12:01:00Z"),
            make_record("r2", RunState::Running, 250, "2026-02-25T12:02:00Z"),
            make_record("r1", RunState::Running, 10, "2026-02-25T12:03:00Z"),
        ]);
        assert_eq!(ids(&snapshot), vec!["r2", "r1"]);
        assert_eq!(snapshot[0].progress, 100);
        assert_eq!(snapshot[1].state, RunState::Completed);
        assert_eq!(snapshot[1].progress, 100);
    }
}
