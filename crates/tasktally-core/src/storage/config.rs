//! TOML-based application settings.
//!
//! Stores user preferences including:
//! - Default statistics period
//! - Reminder offsets
//! - Postpone behavior
//!
//! Settings are stored at `~/.config/tasktally/config.toml` and implement
//! the [`SettingsStore`] seam the stats controller is built against.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::data_dir;
use crate::error::{ConfigError, Result};
use crate::provider::SettingsStore;
use crate::stats::StatsPeriod;

/// Statistics view settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsConfig {
    /// Period selected when the stats view opens.
    #[serde(default)]
    pub default_period: StatsPeriod,
}

/// Reminder settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemindersConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Minutes before the due date-time at which reminders fire.
    #[serde(default = "default_offsets")]
    pub offsets_min: Vec<i64>,
}

/// Postpone settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostponeConfig {
    /// Days a task moves per postpone action.
    #[serde(default = "default_shift_days")]
    pub default_shift_days: i64,
    /// Whether to append entries to the postpone history log.
    #[serde(default = "default_true")]
    pub track_history: bool,
}

/// Application settings.
///
/// Serialized to/from TOML at `~/.config/tasktally/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub stats: StatsConfig,
    #[serde(default)]
    pub reminders: RemindersConfig,
    #[serde(default)]
    pub postpone: PostponeConfig,
}

fn default_true() -> bool {
    true
}
fn default_offsets() -> Vec<i64> {
    vec![60, 10]
}
fn default_shift_days() -> i64 {
    1
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            default_period: StatsPeriod::LastWeek,
        }
    }
}

impl Default for RemindersConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            offsets_min: default_offsets(),
        }
    }
}

impl Default for PostponeConfig {
    fn default() -> Self {
        Self {
            default_shift_days: 1,
            track_history: true,
        }
    }
}

impl Settings {
    fn path() -> Result<PathBuf> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from disk or write and return the default.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::path()?)
    }

    /// Load from an explicit path or write and return the default.
    pub fn load_from(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let settings =
                    toml::from_str(&content).map_err(|err| ConfigError::LoadFailed {
                        path: path.to_path_buf(),
                        message: err.to_string(),
                    })?;
                Ok(settings)
            }
            Err(_) => {
                let settings = Self::default();
                settings.save_to(path)?;
                Ok(settings)
            }
        }
    }

    /// Persist to disk.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::path()?)
    }

    /// Persist to an explicit path.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).map_err(|err| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Load from disk, returning default on error.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }

    /// Get a settings value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let value = json.pointer(&json_pointer(key))?;
        match value {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a settings value by dot-separated key and persist it.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.apply(key, value)?;
        self.save()?;
        Ok(())
    }

    /// Set a value without persisting. The replacement must match the
    /// existing value's JSON type.
    pub fn apply(&mut self, key: &str, value: &str) -> Result<()> {
        let mut json = serde_json::to_value(&*self)?;
        let slot = json
            .pointer_mut(&json_pointer(key))
            .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;

        let parsed = match &*slot {
            serde_json::Value::Bool(_) => {
                let flag = value.parse::<bool>().map_err(|_| ConfigError::InvalidValue {
                    key: key.to_string(),
                    message: format!("expected a boolean, got '{value}'"),
                })?;
                serde_json::Value::Bool(flag)
            }
            serde_json::Value::Number(_) => {
                if let Ok(n) = value.parse::<i64>() {
                    serde_json::Value::Number(n.into())
                } else {
                    let n = value.parse::<f64>().map_err(|_| ConfigError::InvalidValue {
                        key: key.to_string(),
                        message: format!("expected a number, got '{value}'"),
                    })?;
                    serde_json::Number::from_f64(n)
                        .map(serde_json::Value::Number)
                        .ok_or_else(|| ConfigError::InvalidValue {
                            key: key.to_string(),
                            message: format!("'{value}' is not a finite number"),
                        })?
                }
            }
            serde_json::Value::Array(_) | serde_json::Value::Object(_) => {
                serde_json::from_str(value).map_err(|err| ConfigError::InvalidValue {
                    key: key.to_string(),
                    message: err.to_string(),
                })?
            }
            _ => serde_json::Value::String(value.to_string()),
        };

        *slot = parsed;
        *self = serde_json::from_value(json).map_err(|err| ConfigError::InvalidValue {
            key: key.to_string(),
            message: err.to_string(),
        })?;
        Ok(())
    }
}

fn json_pointer(key: &str) -> String {
    format!("/{}", key.replace('.', "/"))
}

impl SettingsStore for Settings {
    fn default_period(&self) -> StatsPeriod {
        self.stats.default_period
    }

    fn set_default_period(&mut self, period: StatsPeriod) -> Result<()> {
        self.stats.default_period = period;
        self.save()
    }

    fn reminder_offsets_min(&self) -> Vec<i64> {
        self.reminders.offsets_min.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_roundtrip() {
        let settings = Settings::default();
        let toml_str = toml::to_string_pretty(&settings).unwrap();
        let parsed: Settings = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.stats.default_period, StatsPeriod::LastWeek);
        assert_eq!(parsed.reminders.offsets_min, vec![60, 10]);
        assert_eq!(parsed.postpone.default_shift_days, 1);
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let settings = Settings::default();
        assert_eq!(settings.get("reminders.enabled").as_deref(), Some("true"));
        assert_eq!(settings.get("postpone.default_shift_days").as_deref(), Some("1"));
        assert_eq!(settings.get("stats.default_period").as_deref(), Some("last_week"));
        assert!(settings.get("reminders.missing_key").is_none());
    }

    #[test]
    fn apply_updates_nested_values() {
        let mut settings = Settings::default();
        settings.apply("reminders.enabled", "false").unwrap();
        assert!(!settings.reminders.enabled);

        settings.apply("postpone.default_shift_days", "3").unwrap();
        assert_eq!(settings.postpone.default_shift_days, 3);

        settings.apply("reminders.offsets_min", "[120, 15]").unwrap();
        assert_eq!(settings.reminders.offsets_min, vec![120, 15]);

        settings.apply("stats.default_period", "last_month").unwrap();
        assert_eq!(settings.stats.default_period, StatsPeriod::LastMonth);
    }

    #[test]
    fn apply_rejects_unknown_key_and_bad_types() {
        let mut settings = Settings::default();
        assert!(settings.apply("reminders.nonexistent", "1").is_err());
        assert!(settings.apply("reminders.enabled", "not_a_bool").is_err());
        assert!(settings.apply("postpone.default_shift_days", "soon").is_err());
    }

    #[test]
    fn load_from_writes_default_when_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let settings = Settings::load_from(&path).unwrap();
        assert!(path.exists());
        assert!(settings.reminders.enabled);

        // Second load reads the file written by the first.
        let reloaded = Settings::load_from(&path).unwrap();
        assert_eq!(reloaded.reminders.offsets_min, settings.reminders.offsets_min);
    }

    #[test]
    fn save_to_then_load_from_preserves_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut settings = Settings::default();
        settings.apply("reminders.offsets_min", "[45]").unwrap();
        settings.stats.default_period = StatsPeriod::LastSixMonths;
        settings.save_to(&path).unwrap();

        let loaded = Settings::load_from(&path).unwrap();
        assert_eq!(loaded.reminders.offsets_min, vec![45]);
        assert_eq!(loaded.stats.default_period, StatsPeriod::LastSixMonths);
    }

    #[test]
    fn malformed_file_is_a_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "this is [not toml").unwrap();

        assert!(Settings::load_from(&path).is_err());
    }
}
