//! Routines: recurring real-world obligations tracked by manual status
//! transitions rather than calendar-driven recurrence.
//!
//! Each routine keeps one entry per day. A day with no entry is implicitly
//! planned; marking a day validates the transition first.
//!
//! Valid transitions:
//! - PLANNED → DONE (checked off)
//! - PLANNED → SKIPPED (explicitly let go)
//! - DONE → PLANNED (unchecked)
//! - SKIPPED → PLANNED (reopened)

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::ValidationError;
use crate::task::TaskPriority;

/// Per-day status of a routine.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum RoutineStatus {
    /// Expected today, not yet acted on (initial state)
    Planned,
    /// Checked off for the day
    Done,
    /// Explicitly skipped for the day
    Skipped,
}

impl RoutineStatus {
    /// Check if a transition is valid.
    pub fn can_transition_to(&self, to: &RoutineStatus) -> bool {
        match self {
            RoutineStatus::Planned => {
                matches!(to, RoutineStatus::Done | RoutineStatus::Skipped)
            }
            RoutineStatus::Done => matches!(to, RoutineStatus::Planned),
            RoutineStatus::Skipped => matches!(to, RoutineStatus::Planned),
        }
    }

    /// Get valid next states for this state.
    pub fn valid_transitions(&self) -> &[RoutineStatus] {
        match self {
            RoutineStatus::Planned => &[RoutineStatus::Done, RoutineStatus::Skipped],
            RoutineStatus::Done => &[RoutineStatus::Planned],
            RoutineStatus::Skipped => &[RoutineStatus::Planned],
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RoutineStatus::Planned => "planned",
            RoutineStatus::Done => "done",
            RoutineStatus::Skipped => "skipped",
        }
    }
}

impl Default for RoutineStatus {
    fn default() -> Self {
        RoutineStatus::Planned
    }
}

/// A recurring obligation tracked day by day.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Routine {
    /// Unique identifier
    pub id: String,
    /// Routine title
    pub title: String,
    /// Optional category id
    #[serde(default)]
    pub category: Option<String>,
    /// Priority
    pub priority: TaskPriority,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Per-day log, keyed by date
    #[serde(default)]
    pub entries: BTreeMap<NaiveDate, RoutineStatus>,
}

impl Routine {
    /// Create a new routine with default values.
    pub fn new(title: impl Into<String>) -> Self {
        Routine {
            id: uuid::Uuid::new_v4().to_string(),
            title: title.into(),
            category: None,
            priority: TaskPriority::Medium,
            created_at: Utc::now(),
            entries: BTreeMap::new(),
        }
    }

    /// Effective status for a day. Days with no entry are planned.
    pub fn status_on(&self, date: NaiveDate) -> RoutineStatus {
        self.entries.get(&date).copied().unwrap_or_default()
    }

    /// Mark a day, enforcing valid transitions.
    pub fn mark(&mut self, date: NaiveDate, status: RoutineStatus) -> Result<(), ValidationError> {
        let current = self.status_on(date);
        if !current.can_transition_to(&status) {
            return Err(ValidationError::InvalidTransition {
                from: current.as_str().to_string(),
                to: status.as_str().to_string(),
            });
        }
        self.entries.insert(date, status);
        Ok(())
    }

    /// Number of days marked done.
    pub fn done_count(&self) -> usize {
        self.entries
            .values()
            .filter(|status| matches!(status, RoutineStatus::Done))
            .count()
    }
}
