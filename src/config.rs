//! Server configuration, loaded once at startup from
//! `~/.workdesk/config.json`. A missing file means defaults; a malformed
//! file is an error rather than a silent fallback.

use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Override for the database location. Defaults to
    /// `~/.workdesk/workdesk.db`.
    #[serde(default)]
    pub db_path: Option<PathBuf>,

    /// Minutes between reminder due-checks.
    #[serde(default = "default_reminder_check_minutes")]
    pub reminder_check_minutes: u64,
}

fn default_reminder_check_minutes() -> u64 {
    5
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: None,
            reminder_check_minutes: default_reminder_check_minutes(),
        }
    }
}

/// Path to the config file: `~/.workdesk/config.json`.
pub fn config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".workdesk").join("config.json"))
}

/// Load configuration, falling back to defaults when no file exists.
pub fn load_config() -> Result<Config, String> {
    let Some(path) = config_path() else {
        return Ok(Config::default());
    };
    if !path.exists() {
        return Ok(Config::default());
    }
    let raw = fs::read_to_string(&path)
        .map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
    serde_json::from_str(&raw).map_err(|e| format!("Failed to parse {}: {e}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_apply_to_missing_fields() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config.reminder_check_minutes, 5);
        assert!(config.db_path.is_none());
    }

    #[test]
    fn test_overrides_deserialize() {
        let config: Config =
            serde_json::from_str(r#"{"dbPath": "/tmp/w.db", "reminderCheckMinutes": 15}"#)
                .unwrap();
        assert_eq!(config.reminder_check_minutes, 15);
        assert_eq!(config.db_path, Some(PathBuf::from("/tmp/w.db")));
    }
}
