//! Configuration validation rules.

use super::schema::Config;

/// Validate configuration and return aggregated validation errors.
pub fn validate_config(config: &Config) -> crate::Result<()> {
    let mut errors = Vec::new();

    if config.dialogue.max_retries == 0 {
        errors.push("dialogue.max_retries must be > 0".to_string());
    }
    if config.dialogue.classifier_timeout_ms == 0 {
        errors.push("dialogue.classifier_timeout_ms must be > 0".to_string());
    }
    if config.store.file.trim().is_empty() {
        errors.push("store.file must not be empty".to_string());
    }
    if config.sessions.dir.trim().is_empty() {
        errors.push("sessions.dir must not be empty".to_string());
    }

    let format = config.logging.format.to_ascii_lowercase();
    if format != "text" && format != "json" {
        errors.push(format!(
            "logging.format must be 'text' or 'json' (got '{}')",
            config.logging.format
        ));
    }
    if config.logging.dir.trim().is_empty() {
        errors.push("logging.dir must not be empty".to_string());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(crate::Error::Validation(errors.join("; ")))
    }
}
