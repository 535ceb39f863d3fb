//! Task template commands for CLI.

use chrono::Utc;
use clap::Subcommand;
use tasktally_core::storage::Database;
use tasktally_core::{RecurrenceRule, TaskKind, TaskPriority, TaskTemplate};

#[derive(Subcommand)]
pub enum TemplateAction {
    /// Create a new template
    Add {
        /// Template name
        name: String,
        /// Title for spawned tasks
        title: String,
        /// Days until due for spawned tasks
        #[arg(long, default_value = "1")]
        due_in_days: i64,
        /// Kind: normal, routine, or recurring (default: normal)
        #[arg(long, default_value = "normal")]
        kind: String,
        /// Priority: low, medium, or high (default: medium)
        #[arg(long, default_value = "medium")]
        priority: String,
        /// Category id
        #[arg(long)]
        category: Option<String>,
        /// Daily recurrence at HH:mm
        #[arg(long)]
        daily_at: Option<String>,
    },
    /// List templates
    List,
    /// Spawn a task from a template
    Spawn {
        /// Template ID
        id: String,
    },
    /// Delete a template
    Delete {
        /// Template ID
        id: String,
    },
}

pub fn run(action: TemplateAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;

    match action {
        TemplateAction::Add {
            name,
            title,
            due_in_days,
            kind,
            priority,
            category,
            daily_at,
        } => {
            let mut template = TaskTemplate::new(name, title, due_in_days);
            template.kind = kind.parse::<TaskKind>()?;
            template.priority = priority.parse::<TaskPriority>()?;
            template.category = category;
            if let Some(at) = daily_at {
                template.recurrence = Some(RecurrenceRule::Daily { at });
                template.kind = TaskKind::Recurring;
            }
            db.upsert_template(&template)?;
            println!("Template created: {}", template.id);
            println!("{}", serde_json::to_string_pretty(&template)?);
        }
        TemplateAction::List => {
            let templates = db.list_templates()?;
            println!("{}", serde_json::to_string_pretty(&templates)?);
        }
        TemplateAction::Spawn { id } => {
            let template = db
                .get_template(&id)?
                .ok_or(format!("Template not found: {id}"))?;
            let task = template.instantiate(Utc::now());
            db.upsert_task(&task)?;
            println!("Task created: {}", task.id);
            println!("{}", serde_json::to_string_pretty(&task)?);
        }
        TemplateAction::Delete { id } => {
            if db.delete_template(&id)? {
                println!("Template deleted: {id}");
            } else {
                println!("Template not found: {id}");
            }
        }
    }
    Ok(())
}
