//! Intent classification with a pattern fallback

use crate::base::{with_timeout, ClassifierError, IntentModel};
use crate::patterns::{has_word, CONFIRM_WORDS, DENY_WORDS, INTENT_PATTERNS};
use alarmist_core::{DialogueState, Intent};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Default budget for one primary model call
pub const DEFAULT_TIMEOUT_MS: u64 = 1500;

/// Outcome of classifying one utterance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentTag {
    Intent(Intent),
    ConfirmAction,
    DenyAction,
    Unknown,
}

impl IntentTag {
    pub fn intent(&self) -> Option<Intent> {
        match self {
            IntentTag::Intent(intent) => Some(*intent),
            _ => None,
        }
    }
}

impl fmt::Display for IntentTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntentTag::Intent(intent) => write!(f, "{}", intent),
            IntentTag::ConfirmAction => f.write_str("confirm_action"),
            IntentTag::DenyAction => f.write_str("deny_action"),
            IntentTag::Unknown => f.write_str("unknown"),
        }
    }
}

/// Map a primary model label onto an intent
pub fn map_model_label(label: &str) -> Option<Intent> {
    match label.trim() {
        "SetAlarm" => Some(Intent::SetAlarm),
        "CancelAlarm" => Some(Intent::CancelAlarm),
        "UpdateAlarm" => Some(Intent::UpdateAlarm),
        "ShowAlarms" => Some(Intent::ShowAlarms),
        "ExtendAlarm" => Some(Intent::ExtendAlarm),
        "RepeatAlarm" => Some(Intent::RepeatAlarm),
        "StartAlarm" => Some(Intent::StartAlarm),
        "StopAlarm" => Some(Intent::StopAlarm),
        _ => None,
    }
}

/// Confirmation or denial words in `text`; confirmation is checked first
pub fn confirmation(text: &str) -> Option<IntentTag> {
    if has_word(text, CONFIRM_WORDS) {
        Some(IntentTag::ConfirmAction)
    } else if has_word(text, DENY_WORDS) {
        Some(IntentTag::DenyAction)
    } else {
        None
    }
}

/// Deterministic pattern-based intent detection
pub fn pattern_intent(text: &str) -> IntentTag {
    let lower = text.to_lowercase();
    INTENT_PATTERNS
        .iter()
        .find(|(_, pattern)| pattern.is_match(&lower))
        .map_or(IntentTag::Unknown, |(intent, _)| IntentTag::Intent(*intent))
}

/// Intent classifier backed by an optional primary model
#[derive(Clone)]
pub struct IntentClassifier {
    model: Option<Arc<dyn IntentModel>>,
    timeout_ms: u64,
}

impl Default for IntentClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl IntentClassifier {
    /// Pattern-only classifier
    pub fn new() -> Self {
        Self {
            model: None,
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }

    /// Classifier that consults `model` first
    pub fn with_model(model: Arc<dyn IntentModel>, timeout_ms: u64) -> Self {
        Self {
            model: Some(model),
            timeout_ms,
        }
    }

    /// Classify `text` given the session's current state
    pub async fn classify(&self, text: &str, state: DialogueState) -> IntentTag {
        if state == DialogueState::Confirming {
            if let Some(tag) = confirmation(text) {
                return tag;
            }
        }

        match self.predict(text).await {
            Ok(intent) => IntentTag::Intent(intent),
            Err(e) => {
                debug!("Using intent patterns: {}", e);
                pattern_intent(text)
            }
        }
    }

    async fn predict(&self, text: &str) -> Result<Intent, ClassifierError> {
        let model = self.model.as_ref().ok_or(ClassifierError::Unavailable)?;
        let label = with_timeout(self.timeout_ms, model.predict(text))
            .await
            .map_err(|e| {
                warn!("Intent model '{}' failed: {}", model.name(), e);
                e
            })?;
        map_model_label(&label)
            .ok_or_else(|| ClassifierError::Failed(format!("unmapped label '{}'", label)))
    }
}
