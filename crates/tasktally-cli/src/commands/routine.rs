//! Routine management commands for CLI.

use chrono::{NaiveDate, Utc};
use clap::Subcommand;
use tasktally_core::storage::Database;
use tasktally_core::{Routine, RoutineStatus, TaskPriority};

#[derive(Subcommand)]
pub enum RoutineAction {
    /// Create a new routine
    Add {
        /// Routine title
        title: String,
        /// Category id
        #[arg(long)]
        category: Option<String>,
        /// Priority: low, medium, or high (default: medium)
        #[arg(long, default_value = "medium")]
        priority: String,
    },
    /// List routines
    List,
    /// Mark a routine for a day
    Mark {
        /// Routine ID
        id: String,
        /// Status: planned, done, or skipped
        status: String,
        /// Day to mark (YYYY-MM-DD); defaults to today
        #[arg(long)]
        date: Option<String>,
    },
    /// Get routine details
    Get {
        /// Routine ID
        id: String,
    },
}

pub fn run(action: RoutineAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;

    match action {
        RoutineAction::Add {
            title,
            category,
            priority,
        } => {
            let mut routine = Routine::new(title);
            routine.category = category;
            routine.priority = priority.parse::<TaskPriority>()?;
            db.upsert_routine(&routine)?;
            println!("Routine created: {}", routine.id);
            println!("{}", serde_json::to_string_pretty(&routine)?);
        }
        RoutineAction::List => {
            let routines = db.list_routines()?;
            println!("{}", serde_json::to_string_pretty(&routines)?);
        }
        RoutineAction::Mark { id, status, date } => {
            let mut routine = db
                .get_routine(&id)?
                .ok_or(format!("Routine not found: {id}"))?;
            let day = match date {
                Some(raw) => NaiveDate::parse_from_str(&raw, "%Y-%m-%d")?,
                None => Utc::now().date_naive(),
            };
            let status = parse_status(&status)?;
            routine.mark(day, status)?;
            db.upsert_routine(&routine)?;
            println!("Routine {id} marked {} on {day}", status.as_str());
        }
        RoutineAction::Get { id } => match db.get_routine(&id)? {
            Some(routine) => println!("{}", serde_json::to_string_pretty(&routine)?),
            None => println!("Routine not found: {id}"),
        },
    }
    Ok(())
}

fn parse_status(raw: &str) -> Result<RoutineStatus, String> {
    match raw {
        "planned" => Ok(RoutineStatus::Planned),
        "done" => Ok(RoutineStatus::Done),
        "skipped" => Ok(RoutineStatus::Skipped),
        other => Err(format!("unknown routine status '{other}'")),
    }
}
