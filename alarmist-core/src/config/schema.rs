//! Configuration schema definitions

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Root configuration for alarmist
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Dialogue engine configuration
    #[serde(default)]
    pub dialogue: DialogueConfig,
    /// Alarm store configuration
    #[serde(default)]
    pub store: StoreConfig,
    /// Session persistence configuration
    #[serde(default)]
    pub sessions: SessionsConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Dialogue engine settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DialogueConfig {
    /// Consecutive invalid answers tolerated before the session resets
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Budget for a single primary-classifier call before falling back
    #[serde(default = "default_classifier_timeout_ms")]
    pub classifier_timeout_ms: u64,
}

fn default_max_retries() -> u32 {
    3
}

fn default_classifier_timeout_ms() -> u64 {
    1500
}

impl Default for DialogueConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            classifier_timeout_ms: default_classifier_timeout_ms(),
        }
    }
}

/// Alarm store settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Alarm file, relative paths resolve against the config directory
    #[serde(default = "default_store_file")]
    pub file: String,
}

fn default_store_file() -> String {
    "alarms.json".to_string()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            file: default_store_file(),
        }
    }
}

/// Session persistence settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionsConfig {
    /// Session directory, relative paths resolve against the config directory
    #[serde(default = "default_sessions_dir")]
    pub dir: String,
}

fn default_sessions_dir() -> String {
    "sessions".to_string()
}

impl Default for SessionsConfig {
    fn default() -> Self {
        Self {
            dir: default_sessions_dir(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (text, json)
    #[serde(default = "default_log_format")]
    pub format: String,
    /// Directory for log files
    #[serde(default = "default_log_dir")]
    pub dir: String,
    /// Module-specific overrides
    #[serde(default)]
    pub overrides: HashMap<String, String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

fn default_log_dir() -> String {
    "logs".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            dir: default_log_dir(),
            overrides: HashMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.dialogue.max_retries, 3);
        assert_eq!(config.dialogue.classifier_timeout_ms, 1500);
        assert_eq!(config.store.file, "alarms.json");
        assert_eq!(config.sessions.dir, "sessions");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config: Config = serde_json::from_str(r#"{"dialogue":{"max_retries":5}}"#).unwrap();
        assert_eq!(config.dialogue.max_retries, 5);
        assert_eq!(config.dialogue.classifier_timeout_ms, 1500);
        assert_eq!(config.logging.format, "text");
    }
}
