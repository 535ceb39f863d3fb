//! Statistics commands for CLI.

use chrono::NaiveDate;
use clap::Subcommand;
use tasktally_core::storage::{Database, Settings};
use tasktally_core::{StatsAggregator, StatsPeriod};

#[derive(Subcommand)]
pub enum StatsAction {
    /// Compute statistics for a period
    Show {
        /// Trailing period: last_week, last_month, last_three_months,
        /// last_six_months, or last_year; defaults to the configured one
        #[arg(long)]
        period: Option<String>,
        /// Custom period start (YYYY-MM-DD); requires --to
        #[arg(long, requires = "to")]
        from: Option<String>,
        /// Custom period end (YYYY-MM-DD); requires --from
        #[arg(long, requires = "from")]
        to: Option<String>,
    },
}

pub fn run(action: StatsAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        StatsAction::Show { period, from, to } => {
            let period = resolve_period(period, from, to)?;
            let range = period.resolve()?;

            let db = Database::open()?;
            let tasks = db.list_tasks()?;
            let snapshot = StatsAggregator::new().aggregate(&tasks, &range);

            println!("{}", serde_json::to_string_pretty(&snapshot)?);
        }
    }
    Ok(())
}

fn resolve_period(
    period: Option<String>,
    from: Option<String>,
    to: Option<String>,
) -> Result<StatsPeriod, Box<dyn std::error::Error>> {
    if let (Some(from), Some(to)) = (from, to) {
        let start = NaiveDate::parse_from_str(&from, "%Y-%m-%d")?;
        let end = NaiveDate::parse_from_str(&to, "%Y-%m-%d")?;
        return Ok(StatsPeriod::Custom {
            start: start
                .and_hms_opt(0, 0, 0)
                .ok_or("invalid start date")?
                .and_utc(),
            end: end.and_hms_opt(0, 0, 0).ok_or("invalid end date")?.and_utc(),
        });
    }

    match period {
        Some(raw) => Ok(raw.parse::<StatsPeriod>()?),
        None => Ok(Settings::load_or_default().stats.default_period),
    }
}
