//! Language understanding for alarmist
//!
//! Intent classification and BIO entity extraction sit behind optional
//! primary models ([`IntentModel`], [`EntityModel`]). Any model failure routes
//! to the deterministic pattern fallback, so the dialogue always gets an
//! answer. Validators normalize the extracted slot values.

pub mod base;
pub mod classifier;
pub mod extractor;
pub mod patterns;
pub mod tags;
pub mod validators;

pub use base::{ClassifierError, ClassifierResult, EntityModel, IntentModel};
pub use classifier::{confirmation, map_model_label, pattern_intent, IntentClassifier, IntentTag};
pub use extractor::{pattern_entities, post_process, EntityExtractor};
pub use tags::{merge_tags, Tag, TaggedToken};
pub use validators::{
    validate, validate_date, validate_date_on, validate_label, validate_repeat, validate_time,
    SlotError, SlotResult,
};
