//! Resource states and the stats controller.
//!
//! Upstream collections (tasks, categories) load asynchronously and
//! independently. Their loading/error/data lifecycle is modeled as
//! [`ResourceState`], and [`StatsController`] only runs the aggregator
//! once every input it depends on has resolved. Collections and the
//! settings handle are passed in explicitly; there is no ambient
//! container to read through.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::stats::{StatsAggregator, StatsPeriod, StatsSnapshot};
use crate::task::{Category, TaskRecord};

/// Lifecycle of an asynchronously loaded collection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case", tag = "state", content = "value")]
pub enum ResourceState<T> {
    /// Not resolved yet
    Loading,
    /// Resolution failed
    Failed(String),
    /// Resolved value
    Ready(T),
}

impl<T> ResourceState<T> {
    pub fn is_ready(&self) -> bool {
        matches!(self, ResourceState::Ready(_))
    }

    /// The resolved value, if any.
    pub fn ready(&self) -> Option<&T> {
        match self {
            ResourceState::Ready(value) => Some(value),
            _ => None,
        }
    }

    /// Map the resolved value, passing loading/failure through.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ResourceState<U> {
        match self {
            ResourceState::Loading => ResourceState::Loading,
            ResourceState::Failed(message) => ResourceState::Failed(message),
            ResourceState::Ready(value) => ResourceState::Ready(f(value)),
        }
    }
}

/// Settings seam injected into the controller.
///
/// Implemented by the TOML-backed [`crate::storage::Settings`]; tests use
/// an in-memory stand-in.
pub trait SettingsStore {
    /// Period selected when the stats view opens.
    fn default_period(&self) -> StatsPeriod;

    /// Persist a new default period.
    fn set_default_period(&mut self, period: StatsPeriod) -> Result<()>;

    /// Reminder offsets in minutes before a due date-time.
    fn reminder_offsets_min(&self) -> Vec<i64>;
}

/// Drives snapshot recomputation for a stats view.
///
/// Owns the selected period and the latest upstream states. Every period
/// or input change produces a fresh [`StatsSnapshot`]; snapshots are never
/// mutated in place.
pub struct StatsController<S: SettingsStore> {
    settings: S,
    period: StatsPeriod,
    tasks: ResourceState<Vec<TaskRecord>>,
    categories: ResourceState<Vec<Category>>,
}

impl<S: SettingsStore> StatsController<S> {
    /// Create a controller starting on the settings' default period.
    pub fn new(settings: S) -> Self {
        let period = settings.default_period();
        StatsController {
            settings,
            period,
            tasks: ResourceState::Loading,
            categories: ResourceState::Loading,
        }
    }

    pub fn period(&self) -> StatsPeriod {
        self.period
    }

    /// Select a period and persist it as the new default.
    pub fn select_period(&mut self, period: StatsPeriod) -> Result<()> {
        self.settings.set_default_period(period)?;
        self.period = period;
        Ok(())
    }

    /// Feed the latest task collection state.
    pub fn update_tasks(&mut self, tasks: ResourceState<Vec<TaskRecord>>) {
        self.tasks = tasks;
    }

    /// Feed the latest category collection state.
    pub fn update_categories(&mut self, categories: ResourceState<Vec<Category>>) {
        self.categories = categories;
    }

    /// Resolved categories, if available.
    pub fn categories(&self) -> Option<&[Category]> {
        self.categories.ready().map(Vec::as_slice)
    }

    /// Compute a fresh snapshot at `now`.
    ///
    /// While either upstream collection is loading or failed, that state
    /// is surfaced instead of invoking the aggregator. A period that
    /// fails to resolve surfaces as a failure, never a panic.
    pub fn snapshot_at(&self, now: DateTime<Utc>) -> ResourceState<StatsSnapshot> {
        let tasks = match &self.tasks {
            ResourceState::Loading => return ResourceState::Loading,
            ResourceState::Failed(message) => return ResourceState::Failed(message.clone()),
            ResourceState::Ready(tasks) => tasks,
        };
        match &self.categories {
            ResourceState::Loading => return ResourceState::Loading,
            ResourceState::Failed(message) => return ResourceState::Failed(message.clone()),
            ResourceState::Ready(_) => {}
        }

        let range = match self.period.resolve_at(now) {
            Ok(range) => range,
            Err(err) => return ResourceState::Failed(err.to_string()),
        };

        ResourceState::Ready(StatsAggregator::at(now).aggregate(tasks, &range))
    }

    /// Compute a fresh snapshot against the current clock.
    pub fn snapshot(&self) -> ResourceState<StatsSnapshot> {
        self.snapshot_at(Utc::now())
    }
}
