//! Task management commands for CLI.

use chrono::{DateTime, Duration, Utc};
use clap::Subcommand;
use tasktally_core::storage::{Database, Settings};
use tasktally_core::{reminder_times, TaskKind, TaskPriority, TaskRecord, TaskStatus};

#[derive(Subcommand)]
pub enum TaskAction {
    /// Create a new task
    Add {
        /// Task title
        title: String,
        /// Due date-time (RFC 3339); defaults to tomorrow
        #[arg(long)]
        due: Option<String>,
        /// Days until due, used when --due is absent
        #[arg(long, default_value = "1")]
        due_in_days: i64,
        /// Category id
        #[arg(long)]
        category: Option<String>,
        /// Priority: low, medium, or high (default: medium)
        #[arg(long, default_value = "medium")]
        priority: String,
        /// Kind: normal, routine, or recurring (default: normal)
        #[arg(long, default_value = "normal")]
        kind: String,
        /// Mark as special
        #[arg(long)]
        special: bool,
    },
    /// List tasks
    List {
        /// Filter by status (pending, completed, not_done, postponed)
        #[arg(long)]
        status: Option<String>,
        /// Filter by category id
        #[arg(long)]
        category: Option<String>,
    },
    /// Get task details
    Get {
        /// Task ID
        id: String,
    },
    /// Mark a task completed
    Complete {
        /// Task ID
        id: String,
    },
    /// Push a task's due date out
    Postpone {
        /// Task ID
        id: String,
        /// Days to shift; defaults to the configured shift
        #[arg(long)]
        days: Option<i64>,
    },
    /// Mark a task as not done
    Drop {
        /// Task ID
        id: String,
    },
    /// Show upcoming reminder times for a task
    Reminders {
        /// Task ID
        id: String,
    },
    /// Delete a task
    Delete {
        /// Task ID
        id: String,
    },
}

pub fn run(action: TaskAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;

    match action {
        TaskAction::Add {
            title,
            due,
            due_in_days,
            category,
            priority,
            kind,
            special,
        } => {
            let due_at = match due {
                Some(raw) => DateTime::parse_from_rfc3339(&raw)?.with_timezone(&Utc),
                None => Utc::now() + Duration::days(due_in_days),
            };
            let mut task = TaskRecord::new(title, due_at);
            task.priority = priority.parse::<TaskPriority>()?;
            task.kind = kind.parse::<TaskKind>()?;
            task.is_routine_task = matches!(task.kind, TaskKind::Routine);
            task.has_recurrence = matches!(task.kind, TaskKind::Recurring);
            task.is_special = special;
            task.category = category;

            db.upsert_task(&task)?;
            println!("Task created: {}", task.id);
            println!("{}", serde_json::to_string_pretty(&task)?);
        }
        TaskAction::List { status, category } => {
            let status = status
                .map(|raw| raw.parse::<TaskStatus>())
                .transpose()?;
            let filtered: Vec<_> = db
                .list_tasks()?
                .into_iter()
                .filter(|task| {
                    if let Some(wanted) = status {
                        if task.status != wanted {
                            return false;
                        }
                    }
                    if let Some(ref cat) = category {
                        if task.category.as_ref() != Some(cat) {
                            return false;
                        }
                    }
                    true
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&filtered)?);
        }
        TaskAction::Get { id } => match db.get_task(&id)? {
            Some(task) => println!("{}", serde_json::to_string_pretty(&task)?),
            None => println!("Task not found: {id}"),
        },
        TaskAction::Complete { id } => {
            let mut task = db.get_task(&id)?.ok_or(format!("Task not found: {id}"))?;
            task.complete(Utc::now());
            db.upsert_task(&task)?;
            println!("Task completed: {id}");
        }
        TaskAction::Postpone { id, days } => {
            let mut task = db.get_task(&id)?.ok_or(format!("Task not found: {id}"))?;
            let settings = Settings::load_or_default();
            let shift = days.unwrap_or(settings.postpone.default_shift_days);
            task.postpone_by_days(shift, Utc::now());
            if !settings.postpone.track_history {
                task.postpone_history = None;
            }
            db.upsert_task(&task)?;
            println!("Task postponed by {shift} day(s): {id}");
            println!("{}", serde_json::to_string_pretty(&task)?);
        }
        TaskAction::Reminders { id } => {
            let task = db.get_task(&id)?.ok_or(format!("Task not found: {id}"))?;
            let settings = Settings::load_or_default();
            let times = if settings.reminders.enabled {
                reminder_times(task.due_at, &settings.reminders.offsets_min, Utc::now())
            } else {
                Vec::new()
            };
            println!("{}", serde_json::to_string_pretty(&times)?);
        }
        TaskAction::Drop { id } => {
            let mut task = db.get_task(&id)?.ok_or(format!("Task not found: {id}"))?;
            task.status = TaskStatus::NotDone;
            db.upsert_task(&task)?;
            println!("Task marked not done: {id}");
        }
        TaskAction::Delete { id } => {
            if db.delete_task(&id)? {
                println!("Task deleted: {id}");
            } else {
                println!("Task not found: {id}");
            }
        }
    }
    Ok(())
}
