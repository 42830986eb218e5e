//! Conversation session data structures

use crate::types::{DialogueState, Intent, SlotKind};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Normalized slot values keyed by slot
pub type Entities = BTreeMap<SlotKind, String>;

/// Dialogue state for one chat session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationSession {
    /// Session key assigned by the transport
    pub key: String,
    /// Current FSM state
    #[serde(default)]
    pub state: DialogueState,
    /// Intent being served, if any
    #[serde(default)]
    pub intent: Option<Intent>,
    /// Filled slots
    #[serde(default)]
    pub entities: Entities,
    /// Required slots still to collect, in prompt order
    #[serde(default)]
    pub missing_fields: Vec<SlotKind>,
    /// Consecutive invalid answers for the current prompt
    #[serde(default)]
    pub retry_count: u32,
    /// Display name captured from a greeting
    #[serde(default)]
    pub user_name: Option<String>,
    /// Every utterance received, diagnostic only
    #[serde(default)]
    pub history: Vec<Utterance>,
    /// Snapshot of the last executed action
    #[serde(default)]
    pub last_action: Option<LastAction>,
    /// Session creation time
    pub created_at: DateTime<Utc>,
    /// Last update time
    pub updated_at: DateTime<Utc>,
}

/// One user turn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Utterance {
    pub text: String,
    pub timestamp: NaiveDateTime,
}

/// What was executed most recently
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LastAction {
    pub intent: Intent,
    pub entities: Entities,
    pub timestamp: NaiveDateTime,
}

/// Counters for monitoring a conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationStats {
    pub current_state: DialogueState,
    pub current_intent: Option<Intent>,
    pub entities_collected: usize,
    pub missing_fields: usize,
    pub conversation_turns: usize,
    pub user_name: Option<String>,
    pub retry_count: u32,
}

/// Full conversation dump for offline analysis
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationLog {
    pub session_key: String,
    pub user_name: Option<String>,
    pub conversation_history: Vec<Utterance>,
    pub last_action: Option<LastAction>,
    pub stats: ConversationStats,
    pub timestamp: DateTime<Utc>,
}

impl ConversationSession {
    /// Create a new idle session
    pub fn new(key: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            key: key.into(),
            state: DialogueState::Idle,
            intent: None,
            entities: Entities::new(),
            missing_fields: Vec::new(),
            retry_count: 0,
            user_name: None,
            history: Vec::new(),
            last_action: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Drop the in-flight request; user name and history survive
    pub fn reset(&mut self) {
        self.state = DialogueState::Idle;
        self.intent = None;
        self.entities.clear();
        self.missing_fields.clear();
        self.retry_count = 0;
        self.updated_at = Utc::now();
    }

    /// Append an utterance to the diagnostic history
    pub fn record_utterance(&mut self, text: impl Into<String>, timestamp: NaiveDateTime) {
        self.history.push(Utterance {
            text: text.into(),
            timestamp,
        });
        self.updated_at = Utc::now();
    }

    /// Start serving `intent` with the given pre-filled slots
    ///
    /// `required` is the intent's declared slot order; the missing list keeps
    /// that order.
    pub fn begin(&mut self, intent: Intent, entities: Entities, required: &[SlotKind]) {
        self.intent = Some(intent);
        self.missing_fields = required
            .iter()
            .copied()
            .filter(|slot| !entities.contains_key(slot))
            .collect();
        self.entities = entities;
        self.retry_count = 0;
        self.state = if self.missing_fields.is_empty() {
            DialogueState::Confirming
        } else {
            DialogueState::Collecting
        };
        self.updated_at = Utc::now();
    }

    /// Slot the dialogue is currently asking for
    pub fn current_field(&self) -> Option<SlotKind> {
        self.missing_fields.first().copied()
    }

    /// Store a validated value, remove the slot from the missing list
    /// and clear the retry counter
    pub fn fill_slot(&mut self, slot: SlotKind, value: impl Into<String>) {
        self.entities.insert(slot, value.into());
        self.missing_fields.retain(|s| *s != slot);
        self.retry_count = 0;
        if self.missing_fields.is_empty() && self.state == DialogueState::Collecting {
            self.state = DialogueState::Confirming;
        }
        self.updated_at = Utc::now();
    }

    /// Count an invalid answer and return the new total
    pub fn register_retry(&mut self) -> u32 {
        self.retry_count += 1;
        self.updated_at = Utc::now();
        self.retry_count
    }

    /// Remember the action that just ran
    pub fn record_action(&mut self, intent: Intent, timestamp: NaiveDateTime) {
        self.last_action = Some(LastAction {
            intent,
            entities: self.entities.clone(),
            timestamp,
        });
    }

    /// Conversation counters
    pub fn stats(&self) -> ConversationStats {
        ConversationStats {
            current_state: self.state,
            current_intent: self.intent,
            entities_collected: self.entities.len(),
            missing_fields: self.missing_fields.len(),
            conversation_turns: self.history.len(),
            user_name: self.user_name.clone(),
            retry_count: self.retry_count,
        }
    }

    /// Export the conversation for analysis
    pub fn export(&self) -> ConversationLog {
        ConversationLog {
            session_key: self.key.clone(),
            user_name: self.user_name.clone(),
            conversation_history: self.history.clone(),
            last_action: self.last_action.clone(),
            stats: self.stats(),
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 10, 19)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_session_creation() {
        let session = ConversationSession::new("web:12345");
        assert_eq!(session.key, "web:12345");
        assert_eq!(session.state, DialogueState::Idle);
        assert!(session.entities.is_empty());
    }

    #[test]
    fn test_begin_computes_missing_in_declared_order() {
        let mut session = ConversationSession::new("test");
        let mut entities = Entities::new();
        entities.insert(SlotKind::Time, "7:00 AM".to_string());

        session.begin(
            Intent::SetAlarm,
            entities,
            &[SlotKind::Label, SlotKind::Time, SlotKind::Date],
        );

        assert_eq!(session.state, DialogueState::Collecting);
        assert_eq!(session.missing_fields, vec![SlotKind::Label, SlotKind::Date]);
        assert_eq!(session.current_field(), Some(SlotKind::Label));
    }

    #[test]
    fn test_fill_slot_keeps_sets_disjoint() {
        let mut session = ConversationSession::new("test");
        session.begin(Intent::CancelAlarm, Entities::new(), &[SlotKind::Label]);
        session.register_retry();

        session.fill_slot(SlotKind::Label, "gym");

        assert!(session.missing_fields.is_empty());
        assert_eq!(session.retry_count, 0);
        assert_eq!(session.state, DialogueState::Confirming);
        assert_eq!(session.entities.get(&SlotKind::Label).unwrap(), "gym");
    }

    #[test]
    fn test_reset_is_idempotent_and_keeps_name_and_history() {
        let mut session = ConversationSession::new("test");
        session.user_name = Some("Sarah".to_string());
        session.record_utterance("set gym alarm", at(8));
        session.begin(Intent::SetAlarm, Entities::new(), &[SlotKind::Label]);

        session.reset();
        let first = session.stats();
        session.reset();
        let second = session.stats();

        assert_eq!(first, second);
        assert_eq!(session.state, DialogueState::Idle);
        assert!(session.entities.is_empty());
        assert_eq!(session.user_name.as_deref(), Some("Sarah"));
        assert_eq!(session.history.len(), 1);
    }

    #[test]
    fn test_export_includes_last_action() {
        let mut session = ConversationSession::new("test");
        session.record_utterance("cancel gym alarm", at(9));
        let mut entities = Entities::new();
        entities.insert(SlotKind::Label, "gym".to_string());
        session.begin(Intent::CancelAlarm, entities, &[SlotKind::Label]);
        session.record_action(Intent::CancelAlarm, at(9));

        let log = session.export();
        assert_eq!(log.session_key, "test");
        assert_eq!(log.conversation_history.len(), 1);
        let action = log.last_action.unwrap();
        assert_eq!(action.intent, Intent::CancelAlarm);
        assert_eq!(action.entities.get(&SlotKind::Label).unwrap(), "gym");
        assert_eq!(log.stats.conversation_turns, 1);
    }
}
