//! Reusable task templates.
//!
//! A template captures the shape of a task the user creates repeatedly and
//! stamps out fresh [`TaskRecord`]s on demand.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::recurrence::RecurrenceRule;
use crate::task::{TaskKind, TaskPriority, TaskRecord, TaskStatus};

/// A reusable task template.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskTemplate {
    /// Unique identifier
    pub id: String,
    /// Template name shown in pickers
    pub name: String,
    /// Title given to spawned tasks
    pub title: String,
    /// Kind given to spawned tasks
    pub kind: TaskKind,
    /// Priority given to spawned tasks
    pub priority: TaskPriority,
    /// Category id given to spawned tasks
    #[serde(default)]
    pub category: Option<String>,
    /// Days from creation to due date when no recurrence rule applies
    pub default_due_in_days: i64,
    /// Optional recurrence driving the due date instead
    #[serde(default)]
    pub recurrence: Option<RecurrenceRule>,
    /// Marks spawned tasks as special
    #[serde(default)]
    pub is_special: bool,
}

impl TaskTemplate {
    /// Create a template spawning normal tasks due `due_in_days` from now.
    pub fn new(name: impl Into<String>, title: impl Into<String>, due_in_days: i64) -> Self {
        TaskTemplate {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            title: title.into(),
            kind: TaskKind::Normal,
            priority: TaskPriority::Medium,
            category: None,
            default_due_in_days: due_in_days,
            recurrence: None,
            is_special: false,
        }
    }

    /// Stamp out a fresh pending task at `now`.
    ///
    /// With a recurrence rule the due date is the rule's next occurrence
    /// after `now` (falling back to the day offset if the rule is
    /// malformed); otherwise `now + default_due_in_days`.
    pub fn instantiate(&self, now: DateTime<Utc>) -> TaskRecord {
        let fallback_due = now + Duration::days(self.default_due_in_days);
        let due_at = match &self.recurrence {
            Some(rule) => rule.next_occurrence(now).unwrap_or(fallback_due),
            None => fallback_due,
        };

        TaskRecord {
            id: uuid::Uuid::new_v4().to_string(),
            title: self.title.clone(),
            status: TaskStatus::Pending,
            created_at: now,
            due_at,
            completed_at: None,
            postpone_count: 0,
            postpone_history: None,
            kind: self.kind,
            is_routine_task: matches!(self.kind, TaskKind::Routine),
            has_recurrence: self.recurrence.is_some(),
            is_special: self.is_special,
            category: self.category.clone(),
            priority: self.priority,
        }
    }
}
