//! Response composer - user-facing text built from templates

use crate::catalog::IntentCatalog;
use alarmist_core::alarm::Alarm;
use alarmist_core::session::Entities;
use alarmist_core::utils::{choose, Chooser};
use alarmist_core::{Intent, SlotKind};
use alarmist_nlu::SlotError;
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

pub const RETRY_EXHAUSTED: &str =
    "I'm having trouble understanding. Let's start fresh. What would you like to do?";
pub const DECLINED: &str = "No problem! What else can I help you with?";
pub const CONFIRM_OR_DENY: &str =
    "I didn't catch that. Please say 'yes' to confirm or 'no' to cancel.";

const FALLBACK_LINE: &str = "Let's continue!";

/// Template lists loaded from `responses.yaml`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseTemplates {
    pub greetings: Vec<String>,
    pub acknowledgments: Vec<String>,
    pub confirmations: Vec<String>,
    pub errors: Vec<String>,
    pub farewells: Vec<String>,
    /// Success narratives per intent
    pub success: BTreeMap<Intent, Vec<String>>,
    pub help: String,
}

impl ResponseTemplates {
    /// Templates shipped with the crate
    pub fn builtin() -> Self {
        let yaml = include_str!("responses.yaml");
        serde_yaml::from_str(yaml).expect("Failed to parse built-in response templates")
    }
}

/// Builds replies, choosing among alternatives through a [`Chooser`]
#[derive(Clone)]
pub struct ResponseComposer {
    templates: Arc<ResponseTemplates>,
    chooser: Arc<dyn Chooser>,
}

impl ResponseComposer {
    pub fn new(chooser: Arc<dyn Chooser>) -> Self {
        Self::with_templates(ResponseTemplates::builtin(), chooser)
    }

    pub fn with_templates(templates: ResponseTemplates, chooser: Arc<dyn Chooser>) -> Self {
        Self {
            templates: Arc::new(templates),
            chooser,
        }
    }

    fn pick<'a>(&self, options: &'a [String]) -> &'a str {
        choose(self.chooser.as_ref(), options)
            .map(String::as_str)
            .unwrap_or(FALLBACK_LINE)
    }

    /// A greeting, addressed by name when one is known
    pub fn greeting(&self, user_name: Option<&str>) -> String {
        let greeting = self.pick(&self.templates.greetings).to_string();
        match user_name {
            Some(name) => greeting
                .replace("Hi there!", &format!("Hi {}!", name))
                .replace("Hello!", &format!("Hello {}!", name))
                .replace("Hey!", &format!("Hey {}!", name))
                .replace("Welcome!", &format!("Welcome, {}!", name)),
            None => greeting,
        }
    }

    pub fn acknowledgment(&self) -> &str {
        self.pick(&self.templates.acknowledgments)
    }

    pub fn farewell(&self) -> &str {
        self.pick(&self.templates.farewells)
    }

    pub fn help(&self) -> &str {
        &self.templates.help
    }

    /// Reply for an utterance with no recognizable intent
    pub fn unknown_intent(&self) -> String {
        format!(
            "{} Try something like 'set workout alarm for 7 AM' or 'show my alarms'.",
            self.pick(&self.templates.errors)
        )
    }

    /// Question asking for `slot`
    pub fn prompt(&self, catalog: &IntentCatalog, intent: Intent, slot: SlotKind) -> String {
        let prompts = catalog.prompts(intent, slot);
        if prompts.is_empty() {
            format!("Please provide {}:", slot)
        } else {
            self.pick(prompts).to_string()
        }
    }

    /// First reply of a slot-filling dialogue
    pub fn ask(&self, prompt: &str) -> String {
        format!("{} {}", self.acknowledgment(), prompt)
    }

    /// Acknowledge a filled slot and continue with `next`
    pub fn collected(&self, slot: SlotKind, value: &str, next: &str) -> String {
        format!("{} {}: {}\n\n{}", self.acknowledgment(), slot.title(), value, next)
    }

    /// Validator complaint followed by a fresh attempt
    pub fn retry(&self, error: &SlotError) -> String {
        format!("{} Let's try again:", error.message)
    }

    /// Summary of the pending action with a yes/no question
    ///
    /// The date line is omitted when the alarm is for today.
    pub fn confirmation(&self, entities: &Entities, today: NaiveDate) -> String {
        let today_iso = today.format("%Y-%m-%d").to_string();
        let mut details = Vec::new();
        if let Some(label) = entities.get(&SlotKind::Label) {
            details.push(format!("🏷️ Alarm: '{}'", label));
        }
        if let Some(time) = entities.get(&SlotKind::Time) {
            details.push(format!("⏰ Time: {}", time));
        }
        if let Some(date) = entities.get(&SlotKind::Date).filter(|d| **d != today_iso) {
            details.push(format!("📅 Date: {}", date));
        }
        if let Some(repeat) = entities.get(&SlotKind::Repeat) {
            details.push(format!("🔁 Repeat: {}", repeat));
        }

        format!(
            "{}\n\n{}\n\n💬 Should I go ahead? (yes/no)",
            self.pick(&self.templates.confirmations),
            details.join("\n")
        )
    }

    /// Narrative for a completed action
    pub fn success(&self, intent: Intent, entities: &Entities, today: NaiveDate) -> String {
        let Some(templates) = self.templates.success.get(&intent) else {
            return "Action completed successfully!".to_string();
        };
        let template = self.pick(templates);

        let value = move |slot: SlotKind| entities.get(&slot).map(String::as_str);
        let when = value(SlotKind::Date)
            .map(|date| format!(" {}", when_phrase(date, today)))
            .unwrap_or_default();
        let repeating = value(SlotKind::Repeat)
            .map(|repeat| format!(", repeating {}", repeat))
            .unwrap_or_default();

        template
            .replace("{label}", value(SlotKind::Label).unwrap_or("alarm"))
            .replace("{time}", value(SlotKind::Time).unwrap_or_default())
            .replace("{repeat}", value(SlotKind::Repeat).unwrap_or_default())
            .replace("{when}", &when)
            .replace("{repeating}", &repeating)
    }

    /// One line per alarm for a `show_alarms` reply
    pub fn alarm_listing(&self, alarms: &[Alarm], today: NaiveDate) -> String {
        if alarms.is_empty() {
            return "You don't have any alarms yet. Try 'set workout alarm for 7 AM'.".to_string();
        }
        alarms
            .iter()
            .map(|alarm| {
                let repeat = if alarm.repeat.is_empty() || alarm.repeat == "none" {
                    String::new()
                } else {
                    format!(", repeats {}", alarm.repeat)
                };
                format!(
                    "• '{}' at {} {} ({}{})",
                    alarm.label,
                    alarm.time,
                    when_phrase(&alarm.date, today),
                    alarm.status,
                    repeat
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// "today", "tomorrow" or "Friday, October 23"
pub fn friendly_date(date: &str, today: NaiveDate) -> String {
    match NaiveDate::parse_from_str(date, "%Y-%m-%d") {
        Ok(d) if d == today => "today".to_string(),
        Ok(d) if d == today + Duration::days(1) => "tomorrow".to_string(),
        Ok(d) => d.format("%A, %B %-d").to_string(),
        Err(_) => date.to_string(),
    }
}

fn when_phrase(date: &str, today: NaiveDate) -> String {
    match friendly_date(date, today).as_str() {
        relative @ ("today" | "tomorrow") => relative.to_string(),
        other => format!("on {}", other),
    }
}
