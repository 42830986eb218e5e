//! Entity extraction: BIO tagging with a pattern fallback

use crate::base::{with_timeout, ClassifierError, EntityModel};
use crate::classifier::DEFAULT_TIMEOUT_MS;
use crate::patterns::{
    clean_token, has_word, BARE_AMOUNT, BARE_NUMBER, DATE_TOKEN, DATE_WORDS, DURATION_UNIT,
    LABEL_CONTEXT, LABEL_SHAPE, MERIDIEM, MODEL_TIME_TOKEN, REPEAT_CONTEXT, REPEAT_PERIOD,
    REPEAT_TOKEN, STOP_WORDS, TIME_TOKEN,
};
use crate::tags::{Tag, TaggedToken};
use alarmist_core::SlotKind;
use regex::Regex;
use std::sync::Arc;
use tracing::{debug, warn};

/// Entity extractor backed by an optional primary token classifier
#[derive(Clone)]
pub struct EntityExtractor {
    model: Option<Arc<dyn EntityModel>>,
    timeout_ms: u64,
}

impl Default for EntityExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl EntityExtractor {
    /// Pattern-only extractor
    pub fn new() -> Self {
        Self {
            model: None,
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }

    /// Extractor that consults `model` first
    pub fn with_model(model: Arc<dyn EntityModel>, timeout_ms: u64) -> Self {
        Self {
            model: Some(model),
            timeout_ms,
        }
    }

    /// Tag every token of `text`
    pub async fn extract(&self, text: &str) -> Vec<TaggedToken> {
        match self.predict(text).await {
            Ok(raw) => post_process(raw, text),
            Err(e) => {
                debug!("Using entity patterns: {}", e);
                pattern_entities(text)
            }
        }
    }

    async fn predict(&self, text: &str) -> Result<Vec<(String, String)>, ClassifierError> {
        let model = self.model.as_ref().ok_or(ClassifierError::Unavailable)?;
        let raw = with_timeout(self.timeout_ms, model.predict(text))
            .await
            .map_err(|e| {
                warn!("Entity model '{}' failed: {}", model.name(), e);
                e
            })?;
        if raw.is_empty() {
            return Err(ClassifierError::EmptyOutput);
        }
        Ok(raw)
    }
}

/// Correct well-known mistakes of the primary token classifier
///
/// A literal "repeat" only keeps `B-repeat` when the sentence talks about
/// repetition; clock times and day words are forced to time and date.
pub fn post_process(raw: Vec<(String, String)>, text: &str) -> Vec<TaggedToken> {
    raw.into_iter()
        .map(|(token, tag)| {
            let mut tag = tag.parse::<Tag>().unwrap_or_else(|e| {
                debug!("Ignoring model tag: {}", e);
                Tag::Outside
            });
            let lower = token.to_lowercase();

            if tag == Tag::Begin(SlotKind::Repeat) && lower == "repeat" {
                if !has_word(text, REPEAT_CONTEXT) {
                    tag = Tag::Outside;
                }
            } else if MODEL_TIME_TOKEN.is_match(&lower) && tag.slot() != Some(SlotKind::Time) {
                tag = Tag::Begin(SlotKind::Time);
            } else if DATE_WORDS.contains(&lower.as_str()) && tag.slot() != Some(SlotKind::Date) {
                tag = Tag::Begin(SlotKind::Date);
            }

            TaggedToken::new(token, tag)
        })
        .collect()
}

fn any_match(patterns: &[Regex], word: &str) -> bool {
    patterns.iter().any(|p| p.is_match(word))
}

/// Deterministic whitespace tagger
///
/// Two-token times ("7 am", "10 minutes") and "every <period>" repeats are
/// tagged as B/I pairs. Other words become label candidates when a context
/// word sits within two tokens of them.
pub fn pattern_entities(text: &str) -> Vec<TaggedToken> {
    let words: Vec<&str> = text.split_whitespace().map(clean_token).collect();
    let lower: Vec<String> = words.iter().map(|w| w.to_lowercase()).collect();
    let mut tags = vec![Tag::Outside; words.len()];

    let mut i = 0;
    while i < words.len() {
        let word = lower[i].as_str();
        let next = lower.get(i + 1).map(String::as_str).unwrap_or_default();

        let pair = if BARE_NUMBER.is_match(word) && MERIDIEM.is_match(next) {
            Some(SlotKind::Time)
        } else if BARE_AMOUNT.is_match(word) && DURATION_UNIT.is_match(next) {
            Some(SlotKind::Time)
        } else if word == "every" && REPEAT_PERIOD.is_match(next) {
            Some(SlotKind::Repeat)
        } else {
            None
        };
        if let Some(kind) = pair {
            tags[i] = Tag::Begin(kind);
            tags[i + 1] = Tag::Inside(kind);
            i += 2;
            continue;
        }

        tags[i] = if any_match(&TIME_TOKEN, word) {
            Tag::Begin(SlotKind::Time)
        } else if any_match(&DATE_TOKEN, word) {
            Tag::Begin(SlotKind::Date)
        } else if any_match(&REPEAT_TOKEN, word) {
            Tag::Begin(SlotKind::Repeat)
        } else if is_label_candidate(&lower, words[i], i) {
            if i > 0 && tags[i - 1].slot() == Some(SlotKind::Label) {
                Tag::Inside(SlotKind::Label)
            } else {
                Tag::Begin(SlotKind::Label)
            }
        } else {
            Tag::Outside
        };
        i += 1;
    }

    words
        .into_iter()
        .zip(tags)
        .map(|(word, tag)| TaggedToken::new(word, tag))
        .collect()
}

fn is_label_candidate(lower: &[String], word: &str, index: usize) -> bool {
    if word.chars().count() < 2
        || STOP_WORDS.contains(lower[index].as_str())
        || !LABEL_SHAPE.is_match(word)
    {
        return false;
    }
    let start = index.saturating_sub(2);
    let end = (index + 3).min(lower.len());
    lower[start..end]
        .iter()
        .any(|w| LABEL_CONTEXT.contains(&w.as_str()))
}
