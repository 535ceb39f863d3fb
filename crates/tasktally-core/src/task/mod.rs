//! Task record types.
//!
//! The task model is deliberately snapshot-shaped: a [`TaskRecord`] is an
//! immutable-per-read view of a task as the statistics engine and the CLI
//! consume it. Status, kind, and priority are closed enums so that every
//! record is classifiable; loosely-typed input fails at deserialization
//! instead of silently falling through a string match.

pub mod routine;
pub mod template;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;

/// Lifecycle status of a task.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Task is open and waiting to be done
    Pending,
    /// Task was finished
    Completed,
    /// Task was explicitly closed without being done
    NotDone,
    /// Task was deferred at least once and is still open
    Postponed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Completed => "completed",
            TaskStatus::NotDone => "not_done",
            TaskStatus::Postponed => "postponed",
        }
    }
}

impl FromStr for TaskStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(TaskStatus::Pending),
            "completed" => Ok(TaskStatus::Completed),
            "not_done" => Ok(TaskStatus::NotDone),
            "postponed" => Ok(TaskStatus::Postponed),
            other => Err(ValidationError::InvalidValue {
                field: "status".to_string(),
                message: format!("unknown status '{other}'"),
            }),
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Default for TaskStatus {
    fn default() -> Self {
        TaskStatus::Pending
    }
}

/// Kind of task.
///
/// Routines and recurring tasks also carry boolean flags on the record
/// ([`TaskRecord::is_routine_task`], [`TaskRecord::has_recurrence`]); the
/// statistics engine ORs kind and flag so either signal counts.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TaskKind {
    /// One-off task
    Normal,
    /// Manually tracked recurring obligation
    Routine,
    /// Task generated from a calendar-based repetition rule
    Recurring,
}

impl TaskKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskKind::Normal => "normal",
            TaskKind::Routine => "routine",
            TaskKind::Recurring => "recurring",
        }
    }
}

impl FromStr for TaskKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "normal" => Ok(TaskKind::Normal),
            "routine" => Ok(TaskKind::Routine),
            "recurring" => Ok(TaskKind::Recurring),
            other => Err(ValidationError::InvalidValue {
                field: "kind".to_string(),
                message: format!("unknown kind '{other}'"),
            }),
        }
    }
}

impl Default for TaskKind {
    fn default() -> Self {
        TaskKind::Normal
    }
}

/// Task priority. Mandatory on every record.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    Low,
    Medium,
    High,
}

impl TaskPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskPriority::Low => "low",
            TaskPriority::Medium => "medium",
            TaskPriority::High => "high",
        }
    }
}

impl FromStr for TaskPriority {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(TaskPriority::Low),
            "medium" => Ok(TaskPriority::Medium),
            "high" => Ok(TaskPriority::High),
            other => Err(ValidationError::InvalidValue {
                field: "priority".to_string(),
                message: format!("unknown priority '{other}'"),
            }),
        }
    }
}

impl Default for TaskPriority {
    fn default() -> Self {
        TaskPriority::Medium
    }
}

/// A user-defined category that tasks may reference by id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Category {
    pub id: String,
    pub name: String,
}

/// One entry of a task's postpone history.
///
/// The history is persisted as a serialized JSON list on the record and may
/// contain garbage written by older clients; see [`parse_postpone_history`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PostponeEntry {
    /// When the postpone action happened
    pub at: DateTime<Utc>,
    /// Due date before the postpone
    #[serde(default)]
    pub from: Option<DateTime<Utc>>,
    /// Due date after the postpone
    #[serde(default)]
    pub to: Option<DateTime<Utc>>,
}

/// Parse a serialized postpone history, dropping anything malformed.
///
/// The scan never fails: a top-level parse error yields an empty list, and
/// a malformed element is skipped while well-formed siblings are kept.
pub fn parse_postpone_history(raw: &str) -> Vec<PostponeEntry> {
    let values: Vec<serde_json::Value> = match serde_json::from_str(raw) {
        Ok(values) => values,
        Err(_) => return Vec::new(),
    };

    values
        .into_iter()
        .filter_map(|value| serde_json::from_value(value).ok())
        .collect()
}

/// Immutable-per-read snapshot of a task.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskRecord {
    /// Unique identifier
    pub id: String,
    /// Task title
    pub title: String,
    /// Lifecycle status
    pub status: TaskStatus,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Due date-time
    pub due_at: DateTime<Utc>,
    /// Completion timestamp (null if not completed)
    pub completed_at: Option<DateTime<Utc>>,
    /// Number of times the task was postponed
    pub postpone_count: u32,
    /// Serialized postpone history; may be malformed
    #[serde(default)]
    pub postpone_history: Option<String>,
    /// Task kind
    pub kind: TaskKind,
    /// Flag duplicating `kind == Routine`
    pub is_routine_task: bool,
    /// Flag duplicating `kind == Recurring`
    pub has_recurrence: bool,
    /// Marks tasks the user pinned as special
    pub is_special: bool,
    /// Optional category id
    #[serde(default)]
    pub category: Option<String>,
    /// Priority
    pub priority: TaskPriority,
}

impl TaskRecord {
    /// Create a new pending task due at `due_at`.
    pub fn new(title: impl Into<String>, due_at: DateTime<Utc>) -> Self {
        let now = Utc::now();
        TaskRecord {
            id: uuid::Uuid::new_v4().to_string(),
            title: title.into(),
            status: TaskStatus::Pending,
            created_at: now,
            due_at,
            completed_at: None,
            postpone_count: 0,
            postpone_history: None,
            kind: TaskKind::Normal,
            is_routine_task: false,
            has_recurrence: false,
            is_special: false,
            category: None,
            priority: TaskPriority::Medium,
        }
    }

    /// Whether the task is overdue at `now`: still open and past its due
    /// date-time.
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        matches!(self.status, TaskStatus::Pending | TaskStatus::Postponed) && self.due_at < now
    }

    /// Mark the task completed at `now`.
    pub fn complete(&mut self, now: DateTime<Utc>) {
        self.status = TaskStatus::Completed;
        self.completed_at = Some(now);
    }

    /// Postpone the task by `days`, updating counter, history, and status.
    ///
    /// The history is re-serialized through the tolerant parser, so garbage
    /// left by older clients is shed rather than accumulated.
    pub fn postpone_by_days(&mut self, days: i64, now: DateTime<Utc>) {
        let old_due = self.due_at;
        self.due_at += Duration::days(days);
        self.postpone_count += 1;
        self.status = TaskStatus::Postponed;

        let mut history = self
            .postpone_history
            .as_deref()
            .map(parse_postpone_history)
            .unwrap_or_default();
        history.push(PostponeEntry {
            at: now,
            from: Some(old_due),
            to: Some(self.due_at),
        });
        self.postpone_history = serde_json::to_string(&history).ok();
    }
}
