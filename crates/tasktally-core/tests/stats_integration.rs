//! Integration tests for period-bounded statistics.

use chrono::{DateTime, Duration, TimeZone, Utc};
use tasktally_core::{
    Category, Database, ResourceState, SettingsStore, StatsAggregator, StatsController,
    StatsPeriod, TaskPriority, TaskRecord, TaskStatus,
};

fn utc_datetime(year: i32, month: u32, day: u32, hour: u32, min: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, hour, min, 0).unwrap()
}

#[test]
fn trailing_week_scenario() {
    // Fixed clock: noon on 2026-03-10.
    let now = utc_datetime(2026, 3, 10, 12, 0);
    let range = StatsPeriod::LastWeek.resolve_at(now).unwrap();

    // (a) due today, completed, never postponed
    let mut a = TaskRecord::new("a", utc_datetime(2026, 3, 10, 9, 0));
    a.created_at = utc_datetime(2026, 3, 8, 9, 0);
    a.status = TaskStatus::Completed;
    a.completed_at = Some(utc_datetime(2026, 3, 10, 9, 30));

    // (b) due yesterday, still pending, postponed twice
    let mut b = TaskRecord::new("b", utc_datetime(2026, 3, 9, 17, 0));
    b.created_at = utc_datetime(2026, 3, 7, 9, 0);
    b.postpone_count = 2;

    // (c) created 40 days ago but due inside the window, closed as not done
    let mut c = TaskRecord::new("c", utc_datetime(2026, 3, 6, 9, 0));
    c.created_at = now - Duration::days(40);
    c.status = TaskStatus::NotDone;

    let snapshot = StatsAggregator::at(now).aggregate(&[a, b, c], &range);

    assert_eq!(snapshot.total_created, 3);
    assert_eq!(snapshot.completed, 1);
    assert_eq!(snapshot.overdue, 1);
    assert_eq!(snapshot.not_done, 1);
    assert_eq!(snapshot.pending, 0);
    assert_eq!(snapshot.postponed_at_least_once, 1);
    assert_eq!(snapshot.total_postpone_actions, 2);
    assert!((snapshot.completion_rate - 100.0 / 3.0).abs() < 1e-9);
    assert_eq!(snapshot.tasks_in_period.len(), 3);
}

#[test]
fn completion_timestamp_alone_pulls_a_record_in() {
    let now = utc_datetime(2026, 3, 10, 12, 0);
    let range = StatsPeriod::LastWeek.resolve_at(now).unwrap();

    let mut task = TaskRecord::new("finished late", utc_datetime(2025, 12, 1, 9, 0));
    task.created_at = utc_datetime(2025, 11, 20, 9, 0);
    task.status = TaskStatus::Completed;
    task.completed_at = Some(utc_datetime(2026, 3, 8, 20, 0));

    let snapshot = StatsAggregator::at(now).aggregate(&[task.clone()], &range);
    assert_eq!(snapshot.total_created, 1);

    task.completed_at = Some(utc_datetime(2025, 12, 2, 9, 0));
    let snapshot = StatsAggregator::at(now).aggregate(&[task], &range);
    assert_eq!(snapshot.total_created, 0);
}

#[test]
fn store_to_snapshot_flow() {
    let now = utc_datetime(2026, 3, 10, 12, 0);
    let db = Database::open_memory().unwrap();

    db.upsert_category(&Category {
        id: "work".to_string(),
        name: "Work".to_string(),
    })
    .unwrap();

    let mut report = TaskRecord::new("write report", utc_datetime(2026, 3, 9, 17, 0));
    report.created_at = utc_datetime(2026, 3, 8, 9, 0);
    report.category = Some("work".to_string());
    report.priority = TaskPriority::High;
    report.complete(utc_datetime(2026, 3, 9, 15, 0));
    db.upsert_task(&report).unwrap();

    let mut chores = TaskRecord::new("laundry", utc_datetime(2026, 3, 10, 20, 0));
    chores.created_at = utc_datetime(2026, 3, 10, 8, 0);
    db.upsert_task(&chores).unwrap();

    let range = StatsPeriod::LastWeek.resolve_at(now).unwrap();
    let snapshot = StatsAggregator::at(now).aggregate(&db.list_tasks().unwrap(), &range);

    assert_eq!(snapshot.total_created, 2);
    assert_eq!(snapshot.completed, 1);
    assert_eq!(snapshot.pending, 1);
    assert_eq!(snapshot.completion_rate, 50.0);
    assert_eq!(snapshot.category_breakdown.get("work"), Some(&1));
    assert_eq!(snapshot.category_breakdown.get("uncategorized"), Some(&1));
}

struct MemorySettings {
    period: StatsPeriod,
}

impl SettingsStore for MemorySettings {
    fn default_period(&self) -> StatsPeriod {
        self.period
    }

    fn set_default_period(&mut self, period: StatsPeriod) -> tasktally_core::error::Result<()> {
        self.period = period;
        Ok(())
    }

    fn reminder_offsets_min(&self) -> Vec<i64> {
        vec![60, 10]
    }
}

#[test]
fn controller_recomputes_per_period_change() {
    let now = utc_datetime(2026, 3, 10, 12, 0);
    let mut controller = StatsController::new(MemorySettings {
        period: StatsPeriod::LastWeek,
    });

    // Completed two months ago: outside the trailing week, inside the
    // trailing three months.
    let mut old = TaskRecord::new("old win", utc_datetime(2026, 1, 12, 9, 0));
    old.created_at = utc_datetime(2026, 1, 10, 9, 0);
    old.complete(utc_datetime(2026, 1, 12, 9, 0));

    controller.update_tasks(ResourceState::Ready(vec![old]));
    controller.update_categories(ResourceState::Ready(Vec::new()));

    let weekly = match controller.snapshot_at(now) {
        ResourceState::Ready(snapshot) => snapshot,
        other => panic!("expected snapshot, got {other:?}"),
    };
    assert_eq!(weekly.total_created, 0);

    controller.select_period(StatsPeriod::LastThreeMonths).unwrap();
    let quarterly = match controller.snapshot_at(now) {
        ResourceState::Ready(snapshot) => snapshot,
        other => panic!("expected snapshot, got {other:?}"),
    };
    assert_eq!(quarterly.total_created, 1);
    assert_eq!(quarterly.completed, 1);
}
