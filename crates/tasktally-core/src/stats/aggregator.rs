//! Period-bounded statistics over task records.
//!
//! The aggregator is a pure single pass: each record is tested for period
//! membership once and contributes to every tally it qualifies for. It
//! never fails on well-typed input; malformed postpone history on one
//! record is ignored without affecting that record's other counts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::stats::DateRange;
use crate::task::{parse_postpone_history, TaskKind, TaskRecord, TaskStatus};

/// Bucket key for records without a category.
pub const UNCATEGORIZED: &str = "uncategorized";

/// Immutable statistics snapshot for one period.
///
/// Recomputed from scratch on every period or task-list change; carries no
/// identity beyond the call that produced it.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StatsSnapshot {
    /// Records that fell inside the period
    pub total_created: u32,
    /// Completed records
    pub completed: u32,
    /// Records explicitly closed without being done
    pub not_done: u32,
    /// Open records that are not overdue (postponed ones fold in here)
    pub pending: u32,
    /// Open records past their due date-time
    pub overdue: u32,
    /// Records postponed at least once
    pub postponed_at_least_once: u32,
    /// Sum of postpone counters across in-period records
    pub total_postpone_actions: u32,
    /// Postpone-history entries whose action timestamp fell in the period
    pub postpones_in_range: u32,
    /// Records that are routines by kind or flag
    pub routine_tasks: u32,
    /// Records that recur by kind or flag
    pub recurring_tasks: u32,
    /// Records flagged special
    pub special_tasks: u32,
    /// completed / total_created x 100; exactly 0 when the period is empty
    pub completion_rate: f64,
    /// Frequency count per category id (or [`UNCATEGORIZED`])
    pub category_breakdown: HashMap<String, u32>,
    /// Frequency count per priority label
    pub priority_breakdown: HashMap<String, u32>,
    /// The in-period records, for downstream detail views
    pub tasks_in_period: Vec<TaskRecord>,
}

/// Aggregates task records into a [`StatsSnapshot`].
///
/// Carries the clock used by the overdue test so results are reproducible.
#[derive(Debug, Clone)]
pub struct StatsAggregator {
    now: DateTime<Utc>,
}

impl Default for StatsAggregator {
    fn default() -> Self {
        Self::new()
    }
}

impl StatsAggregator {
    /// Create an aggregator pinned to the current clock.
    pub fn new() -> Self {
        Self { now: Utc::now() }
    }

    /// Create an aggregator pinned to an explicit clock.
    pub fn at(now: DateTime<Utc>) -> Self {
        Self { now }
    }

    /// Compute a snapshot for `records` over `range`.
    ///
    /// A record is in the period when its due date, creation timestamp, or
    /// completion timestamp falls inside the day-padded range; any one of
    /// the three is enough. Each record is evaluated once.
    pub fn aggregate(&self, records: &[TaskRecord], range: &DateRange) -> StatsSnapshot {
        let mut snapshot = StatsSnapshot::default();

        for record in records {
            if !self.in_period(record, range) {
                continue;
            }

            snapshot.total_created += 1;

            match record.status {
                TaskStatus::Completed => snapshot.completed += 1,
                TaskStatus::NotDone => snapshot.not_done += 1,
                TaskStatus::Pending => {
                    if record.is_overdue(self.now) {
                        snapshot.overdue += 1;
                    } else {
                        snapshot.pending += 1;
                    }
                }
                // Postponed tasks fold into the pending bucket.
                TaskStatus::Postponed => snapshot.pending += 1,
            }

            if record.postpone_count > 0 {
                snapshot.postponed_at_least_once += 1;
                snapshot.total_postpone_actions += record.postpone_count;
            }
            if let Some(raw) = record.postpone_history.as_deref() {
                for entry in parse_postpone_history(raw) {
                    if range.contains_padded(entry.at) {
                        snapshot.postpones_in_range += 1;
                    }
                }
            }

            if matches!(record.kind, TaskKind::Routine) || record.is_routine_task {
                snapshot.routine_tasks += 1;
            }
            if matches!(record.kind, TaskKind::Recurring) || record.has_recurrence {
                snapshot.recurring_tasks += 1;
            }
            if record.is_special {
                snapshot.special_tasks += 1;
            }

            let category = record
                .category
                .clone()
                .unwrap_or_else(|| UNCATEGORIZED.to_string());
            *snapshot.category_breakdown.entry(category).or_insert(0) += 1;
            *snapshot
                .priority_breakdown
                .entry(record.priority.as_str().to_string())
                .or_insert(0) += 1;

            snapshot.tasks_in_period.push(record.clone());
        }

        snapshot.completion_rate = if snapshot.total_created > 0 {
            f64::from(snapshot.completed) / f64::from(snapshot.total_created) * 100.0
        } else {
            0.0
        };

        snapshot
    }

    fn in_period(&self, record: &TaskRecord, range: &DateRange) -> bool {
        range.contains_padded(record.due_at)
            || range.contains_padded(record.created_at)
            || record
                .completed_at
                .is_some_and(|ts| range.contains_padded(ts))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::TaskPriority;
    use chrono::TimeZone;

    fn utc_datetime(year: i32, month: u32, day: u32, hour: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(year, month, day, hour, min, 0).unwrap()
    }

    fn range_march_10_to_12() -> DateRange {
        DateRange::new(
            utc_datetime(2026, 3, 10, 0, 0),
            utc_datetime(2026, 3, 12, 23, 59),
        )
        .unwrap()
    }

    fn make_task(title: &str, status: TaskStatus, due: DateTime<Utc>) -> TaskRecord {
        let mut task = TaskRecord::new(title, due);
        task.created_at = due - chrono::Duration::days(1);
        task.status = status;
        if status == TaskStatus::Completed {
            task.completed_at = Some(due);
        }
        task
    }

    #[test]
    fn status_buckets_partition_the_period() {
        let now = utc_datetime(2026, 3, 12, 12, 0);
        let range = range_march_10_to_12();
        let records = vec![
            make_task("done", TaskStatus::Completed, utc_datetime(2026, 3, 10, 9, 0)),
            make_task("dropped", TaskStatus::NotDone, utc_datetime(2026, 3, 10, 9, 0)),
            make_task("open", TaskStatus::Pending, utc_datetime(2026, 3, 12, 18, 0)),
            make_task("late", TaskStatus::Pending, utc_datetime(2026, 3, 11, 9, 0)),
            make_task("deferred", TaskStatus::Postponed, utc_datetime(2026, 3, 12, 18, 0)),
        ];

        let snapshot = StatsAggregator::at(now).aggregate(&records, &range);

        assert_eq!(snapshot.total_created, 5);
        assert_eq!(snapshot.completed, 1);
        assert_eq!(snapshot.not_done, 1);
        // "open" is due later today, "deferred" folds into pending.
        assert_eq!(snapshot.pending, 2);
        assert_eq!(snapshot.overdue, 1);
        assert_eq!(
            snapshot.completed + snapshot.not_done + snapshot.pending + snapshot.overdue,
            snapshot.total_created
        );
    }

    #[test]
    fn membership_is_an_or_across_three_timestamps() {
        let now = utc_datetime(2026, 3, 12, 12, 0);
        let range = range_march_10_to_12();

        // Due and created far outside the window; completion inside.
        let mut task = make_task("old", TaskStatus::Completed, utc_datetime(2026, 1, 5, 9, 0));
        task.created_at = utc_datetime(2026, 1, 1, 9, 0);
        task.completed_at = Some(utc_datetime(2026, 3, 11, 16, 0));

        let snapshot = StatsAggregator::at(now).aggregate(&[task.clone()], &range);
        assert_eq!(snapshot.total_created, 1);

        // Pull the completion out as well and the record drops out.
        task.completed_at = Some(utc_datetime(2026, 1, 6, 9, 0));
        let snapshot = StatsAggregator::at(now).aggregate(&[task], &range);
        assert_eq!(snapshot.total_created, 0);
    }

    #[test]
    fn empty_period_has_zero_rate_not_nan() {
        let snapshot = StatsAggregator::new().aggregate(&[], &range_march_10_to_12());
        assert_eq!(snapshot.total_created, 0);
        assert_eq!(snapshot.completion_rate, 0.0);
        assert!(!snapshot.completion_rate.is_nan());
    }

    #[test]
    fn completion_rate_is_a_percentage() {
        let now = utc_datetime(2026, 3, 12, 12, 0);
        let range = range_march_10_to_12();
        let records = vec![
            make_task("a", TaskStatus::Completed, utc_datetime(2026, 3, 10, 9, 0)),
            make_task("b", TaskStatus::Completed, utc_datetime(2026, 3, 10, 9, 0)),
            make_task("c", TaskStatus::Pending, utc_datetime(2026, 3, 12, 18, 0)),
            make_task("d", TaskStatus::NotDone, utc_datetime(2026, 3, 10, 9, 0)),
        ];

        let snapshot = StatsAggregator::at(now).aggregate(&records, &range);
        assert_eq!(snapshot.completion_rate, 50.0);
    }

    #[test]
    fn postpone_accounting_is_independent_of_status() {
        let now = utc_datetime(2026, 3, 12, 12, 0);
        let range = range_march_10_to_12();

        let mut never = make_task("never", TaskStatus::Completed, utc_datetime(2026, 3, 10, 9, 0));
        never.postpone_count = 0;
        let mut thrice = make_task("thrice", TaskStatus::Completed, utc_datetime(2026, 3, 11, 9, 0));
        thrice.postpone_count = 3;

        let snapshot = StatsAggregator::at(now).aggregate(&[never, thrice], &range);
        assert_eq!(snapshot.postponed_at_least_once, 1);
        assert_eq!(snapshot.total_postpone_actions, 3);
    }

    #[test]
    fn malformed_history_never_aborts_the_record() {
        let now = utc_datetime(2026, 3, 12, 12, 0);
        let range = range_march_10_to_12();

        let mut task = make_task("messy", TaskStatus::Completed, utc_datetime(2026, 3, 10, 9, 0));
        task.postpone_count = 2;
        task.postpone_history = Some("{{{definitely not json".to_string());

        let snapshot = StatsAggregator::at(now).aggregate(&[task], &range);
        assert_eq!(snapshot.total_created, 1);
        assert_eq!(snapshot.completed, 1);
        assert_eq!(snapshot.total_postpone_actions, 2);
        assert_eq!(snapshot.postpones_in_range, 0);
    }

    #[test]
    fn history_entries_count_only_inside_the_range() {
        let now = utc_datetime(2026, 3, 12, 12, 0);
        let range = range_march_10_to_12();

        let mut task = make_task("moved", TaskStatus::Pending, utc_datetime(2026, 3, 12, 18, 0));
        task.postpone_count = 2;
        task.postpone_history = Some(
            r#"[{"at": "2026-03-11T08:00:00Z"}, {"at": "2026-01-02T08:00:00Z"}]"#.to_string(),
        );

        let snapshot = StatsAggregator::at(now).aggregate(&[task], &range);
        assert_eq!(snapshot.postpones_in_range, 1);
    }

    #[test]
    fn kind_and_flag_signals_are_ored() {
        let now = utc_datetime(2026, 3, 12, 12, 0);
        let range = range_march_10_to_12();

        let mut by_kind = make_task("a", TaskStatus::Pending, utc_datetime(2026, 3, 12, 18, 0));
        by_kind.kind = TaskKind::Routine;
        let mut by_flag = make_task("b", TaskStatus::Pending, utc_datetime(2026, 3, 12, 18, 0));
        by_flag.is_routine_task = true;
        let mut both_signals = make_task("c", TaskStatus::Pending, utc_datetime(2026, 3, 12, 18, 0));
        both_signals.kind = TaskKind::Recurring;
        both_signals.has_recurrence = true;
        both_signals.is_special = true;

        let snapshot = StatsAggregator::at(now).aggregate(&[by_kind, by_flag, both_signals], &range);
        assert_eq!(snapshot.routine_tasks, 2);
        assert_eq!(snapshot.recurring_tasks, 1);
        assert_eq!(snapshot.special_tasks, 1);
    }

    #[test]
    fn breakdowns_sum_to_total_with_sentinel_for_missing_category() {
        let now = utc_datetime(2026, 3, 12, 12, 0);
        let range = range_march_10_to_12();

        let mut work = make_task("a", TaskStatus::Completed, utc_datetime(2026, 3, 10, 9, 0));
        work.category = Some("work".to_string());
        work.priority = TaskPriority::High;
        let mut also_work = make_task("b", TaskStatus::Pending, utc_datetime(2026, 3, 12, 18, 0));
        also_work.category = Some("work".to_string());
        let uncategorized = make_task("c", TaskStatus::Pending, utc_datetime(2026, 3, 12, 18, 0));

        let snapshot =
            StatsAggregator::at(now).aggregate(&[work, also_work, uncategorized], &range);

        assert_eq!(snapshot.category_breakdown.get("work"), Some(&2));
        assert_eq!(snapshot.category_breakdown.get(UNCATEGORIZED), Some(&1));
        assert_eq!(
            snapshot.category_breakdown.values().sum::<u32>(),
            snapshot.total_created
        );
        assert_eq!(snapshot.priority_breakdown.get("high"), Some(&1));
        assert_eq!(snapshot.priority_breakdown.get("medium"), Some(&2));
        assert_eq!(
            snapshot.priority_breakdown.values().sum::<u32>(),
            snapshot.total_created
        );
    }

    #[test]
    fn tasks_in_period_carries_the_filtered_records() {
        let now = utc_datetime(2026, 3, 12, 12, 0);
        let range = range_march_10_to_12();
        let inside = make_task("in", TaskStatus::Pending, utc_datetime(2026, 3, 11, 9, 0));
        let outside = make_task("out", TaskStatus::Pending, utc_datetime(2026, 6, 1, 9, 0));

        let snapshot = StatsAggregator::at(now).aggregate(&[inside, outside], &range);
        assert_eq!(snapshot.tasks_in_period.len(), 1);
        assert_eq!(snapshot.tasks_in_period[0].title, "in");
    }
}
