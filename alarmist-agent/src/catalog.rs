//! Intent catalog - required slots and prompts for every intent

use alarmist_core::{Intent, SlotKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Slot requirements and prompts of one intent
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntentSpec {
    pub intent: Intent,
    /// Slots collected before confirming, in prompt order
    #[serde(default)]
    pub required: Vec<SlotKind>,
    #[serde(default)]
    pub optional: Vec<SlotKind>,
    /// Alternative phrasings of the question for each slot
    #[serde(default)]
    pub prompts: BTreeMap<SlotKind, Vec<String>>,
}

/// Read-only table of [`IntentSpec`]s
#[derive(Debug, Clone)]
pub struct IntentCatalog {
    specs: Vec<IntentSpec>,
}

impl IntentCatalog {
    /// Catalog shipped with the crate
    pub fn new() -> Self {
        let yaml = include_str!("intents.yaml");
        Self::from_yaml(yaml).expect("Failed to parse built-in intent catalog")
    }

    /// Parse a catalog from YAML
    pub fn from_yaml(yaml: &str) -> alarmist_core::Result<Self> {
        let specs: Vec<IntentSpec> = serde_yaml::from_str(yaml)?;
        Ok(Self { specs })
    }

    pub fn get(&self, intent: Intent) -> Option<&IntentSpec> {
        self.specs.iter().find(|spec| spec.intent == intent)
    }

    /// Required slots of `intent`; unknown intents require nothing
    pub fn required(&self, intent: Intent) -> &[SlotKind] {
        self.get(intent)
            .map(|spec| spec.required.as_slice())
            .unwrap_or(&[])
    }

    /// Prompt alternatives for `slot` under `intent`
    pub fn prompts(&self, intent: Intent, slot: SlotKind) -> &[String] {
        self.get(intent)
            .and_then(|spec| spec.prompts.get(&slot))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

impl Default for IntentCatalog {
    fn default() -> Self {
        Self::new()
    }
}
