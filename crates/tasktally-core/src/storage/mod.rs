mod config;
pub mod database;

pub use config::{PostponeConfig, RemindersConfig, Settings, StatsConfig};
pub use database::Database;

use std::path::PathBuf;

use crate::error::Result;

/// Returns `~/.config/tasktally[-dev]/` based on TASKTALLY_ENV.
///
/// Set TASKTALLY_ENV=dev to use the development data directory.
///
/// # Errors
/// Returns an error if creating the config directory fails.
pub fn data_dir() -> Result<PathBuf> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("TASKTALLY_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("tasktally-dev")
    } else {
        base_dir.join("tasktally")
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
