//! Configuration loading and management
//!
//! `config.json` is read over the built-in defaults, then environment
//! overrides are applied: the short aliases (`ALARMIST_STORE_FILE`,
//! `ALARMIST_SESSIONS_DIR`, `ALARMIST_LOG_LEVEL`) first, then the
//! `ALARMIST__SECTION__KEY` form, which wins over both.

use super::schema::Config;
use super::validate::validate_config;
use std::path::{Path, PathBuf};
use tracing::warn;

const PATH_PREFIX: &str = "ALARMIST__";

const ALIASES: [(&str, &str); 3] = [
    ("ALARMIST_STORE_FILE", "store.file"),
    ("ALARMIST_SESSIONS_DIR", "sessions.dir"),
    ("ALARMIST_LOG_LEVEL", "logging.level"),
];

/// Configuration loader
pub struct ConfigLoader {
    config_dir: PathBuf,
}

impl ConfigLoader {
    /// Create a new config loader with the default config directory
    pub fn new() -> Self {
        let config_dir = dirs::home_dir()
            .map(|h| h.join(".alarmist"))
            .unwrap_or_else(|| PathBuf::from(".alarmist"));

        Self { config_dir }
    }

    /// Create a new config loader with a custom config directory
    pub fn with_dir<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            config_dir: dir.as_ref().to_path_buf(),
        }
    }

    /// Load configuration from file and the process environment
    pub fn load(&self) -> crate::Result<Config> {
        self.load_with_env(std::env::vars())
    }

    /// Load configuration from file and the given environment variables
    pub fn load_with_env<I>(&self, env: I) -> crate::Result<Config>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let config_path = self.config_dir.join("config.json");
        let mut config = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            serde_json::from_str(&content)?
        } else {
            Config::default()
        };

        let mut aliased = Vec::new();
        let mut pathed = Vec::new();
        for (key, value) in env {
            if let Some(suffix) = key.strip_prefix(PATH_PREFIX) {
                let path = suffix
                    .split("__")
                    .filter(|s| !s.is_empty())
                    .map(str::to_ascii_lowercase)
                    .collect::<Vec<_>>()
                    .join(".");
                pathed.push((path, value));
            } else if let Some((_, path)) = ALIASES.iter().find(|(alias, _)| *alias == key) {
                aliased.push((path.to_string(), value));
            }
        }
        for (path, value) in aliased.into_iter().chain(pathed) {
            apply_override(&mut config, &path, &value)?;
        }

        validate_config(&config)?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, config: &Config) -> crate::Result<()> {
        std::fs::create_dir_all(&self.config_dir)?;
        let config_path = self.config_dir.join("config.json");
        let content = serde_json::to_string_pretty(config)?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    /// Get the config directory path
    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// Resolve a configured path: `~/` expands to home, relative paths hang
    /// off the config directory
    pub fn resolve(&self, path: &str) -> PathBuf {
        if let Some(rest) = path.strip_prefix("~/") {
            if let Some(home) = dirs::home_dir() {
                return home.join(rest);
            }
        }
        let candidate = PathBuf::from(path);
        if candidate.is_absolute() {
            candidate
        } else {
            self.config_dir.join(candidate)
        }
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Set one dotted config key from its environment string
fn apply_override(config: &mut Config, path: &str, value: &str) -> crate::Result<()> {
    let number = |value: &str| {
        value.trim().parse::<u64>().map_err(|_| {
            crate::Error::Config(format!("{} expects a number, got '{}'", path, value))
        })
    };

    match path {
        "dialogue.max_retries" => {
            config.dialogue.max_retries = u32::try_from(number(value)?).map_err(|_| {
                crate::Error::Config(format!("{} is out of range: {}", path, value))
            })?;
        }
        "dialogue.classifier_timeout_ms" => config.dialogue.classifier_timeout_ms = number(value)?,
        "store.file" => config.store.file = value.to_string(),
        "sessions.dir" => config.sessions.dir = value.to_string(),
        "logging.level" => config.logging.level = value.to_string(),
        "logging.format" => config.logging.format = value.to_string(),
        "logging.dir" => config.logging.dir = value.to_string(),
        other => match other.strip_prefix("logging.overrides.") {
            Some(module) if !module.is_empty() => {
                config
                    .logging
                    .overrides
                    .insert(module.to_string(), value.to_string());
            }
            _ => warn!("Ignoring unknown config override '{}'", other),
        },
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn env(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let loader = ConfigLoader::with_dir(temp_dir.path());
        let config = loader.load_with_env(Vec::new()).unwrap();

        assert_eq!(config.dialogue.max_retries, 3);
        assert_eq!(config.store.file, "alarms.json");
    }

    #[test]
    fn test_saved_retry_limit_survives_reload() {
        let temp_dir = TempDir::new().unwrap();
        let loader = ConfigLoader::with_dir(temp_dir.path());

        let mut config = Config::default();
        config.dialogue.max_retries = 5;
        config.store.file = "bedroom.json".to_string();
        loader.save(&config).unwrap();

        let loaded = loader.load_with_env(Vec::new()).unwrap();
        assert_eq!(loaded.dialogue.max_retries, 5);
        assert_eq!(loaded.store.file, "bedroom.json");
        assert_eq!(loaded.sessions.dir, "sessions");
    }

    #[test]
    fn test_alias_moves_alarm_file() {
        let temp_dir = TempDir::new().unwrap();
        let loader = ConfigLoader::with_dir(temp_dir.path());
        let config = loader
            .load_with_env(env(&[
                ("ALARMIST_STORE_FILE", "/tmp/other-alarms.json"),
                ("ALARMIST_SESSIONS_DIR", "chats"),
                ("HOME", "/root"),
            ]))
            .unwrap();

        assert_eq!(config.store.file, "/tmp/other-alarms.json");
        assert_eq!(
            loader.resolve(&config.sessions.dir),
            temp_dir.path().join("chats")
        );
    }

    #[test]
    fn test_section_keys_set_dialogue_and_logging() {
        let temp_dir = TempDir::new().unwrap();
        let loader = ConfigLoader::with_dir(temp_dir.path());
        let config = loader
            .load_with_env(env(&[
                ("ALARMIST__DIALOGUE__MAX_RETRIES", "4"),
                ("ALARMIST__LOGGING__FORMAT", "json"),
                ("ALARMIST__LOGGING__OVERRIDES__ALARMIST_NLU", "debug"),
            ]))
            .unwrap();

        assert_eq!(config.dialogue.max_retries, 4);
        assert_eq!(config.logging.format, "json");
        assert_eq!(
            config.logging.overrides.get("alarmist_nlu").map(String::as_str),
            Some("debug")
        );
    }

    #[test]
    fn test_section_key_beats_alias_and_file() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(
            temp_dir.path().join("config.json"),
            r#"{"logging":{"level":"error"}}"#,
        )
        .unwrap();
        let loader = ConfigLoader::with_dir(temp_dir.path());

        let config = loader
            .load_with_env(env(&[
                ("ALARMIST__LOGGING__LEVEL", "debug"),
                ("ALARMIST_LOG_LEVEL", "warn"),
            ]))
            .unwrap();
        assert_eq!(config.logging.level, "debug");

        let config = loader
            .load_with_env(env(&[("ALARMIST_LOG_LEVEL", "warn")]))
            .unwrap();
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn test_bad_numbers_are_config_errors() {
        let temp_dir = TempDir::new().unwrap();
        let loader = ConfigLoader::with_dir(temp_dir.path());

        let err = loader
            .load_with_env(env(&[("ALARMIST__DIALOGUE__MAX_RETRIES", "lots")]))
            .unwrap_err();
        assert!(err.to_string().contains("dialogue.max_retries expects a number"));

        let err = loader
            .load_with_env(env(&[("ALARMIST__DIALOGUE__CLASSIFIER_TIMEOUT_MS", "0")]))
            .unwrap_err();
        assert!(err.to_string().contains("classifier_timeout_ms must be > 0"));
    }

    #[test]
    fn test_unknown_keys_are_ignored() {
        let temp_dir = TempDir::new().unwrap();
        let loader = ConfigLoader::with_dir(temp_dir.path());
        let config = loader
            .load_with_env(env(&[("ALARMIST__STORE__BACKEND", "sqlite")]))
            .unwrap();
        assert_eq!(config.store.file, "alarms.json");
    }

    #[test]
    fn test_resolve_relative_to_config_dir() {
        let loader = ConfigLoader::with_dir("/etc/alarmist");
        assert_eq!(
            loader.resolve("alarms.json"),
            PathBuf::from("/etc/alarmist/alarms.json")
        );
        assert_eq!(loader.resolve("/var/a.json"), PathBuf::from("/var/a.json"));
    }
}
