//! Shared dialogue vocabulary: intents, slots and FSM states

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// An alarm action the user can ask for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    SetAlarm,
    CancelAlarm,
    UpdateAlarm,
    ShowAlarms,
    ExtendAlarm,
    RepeatAlarm,
    StartAlarm,
    StopAlarm,
}

impl Intent {
    /// All supported intents, in catalog order
    pub const ALL: [Intent; 8] = [
        Intent::SetAlarm,
        Intent::CancelAlarm,
        Intent::UpdateAlarm,
        Intent::ShowAlarms,
        Intent::ExtendAlarm,
        Intent::RepeatAlarm,
        Intent::StartAlarm,
        Intent::StopAlarm,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::SetAlarm => "set_alarm",
            Intent::CancelAlarm => "cancel_alarm",
            Intent::UpdateAlarm => "update_alarm",
            Intent::ShowAlarms => "show_alarms",
            Intent::ExtendAlarm => "extend_alarm",
            Intent::RepeatAlarm => "repeat_alarm",
            Intent::StartAlarm => "start_alarm",
            Intent::StopAlarm => "stop_alarm",
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Intent {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Intent::ALL
            .into_iter()
            .find(|intent| intent.as_str() == s)
            .ok_or_else(|| format!("unknown intent: {}", s))
    }
}

/// A named entity field the dialogue fills before acting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlotKind {
    Label,
    Time,
    Date,
    Repeat,
}

impl SlotKind {
    pub const ALL: [SlotKind; 4] = [
        SlotKind::Label,
        SlotKind::Time,
        SlotKind::Date,
        SlotKind::Repeat,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SlotKind::Label => "label",
            SlotKind::Time => "time",
            SlotKind::Date => "date",
            SlotKind::Repeat => "repeat",
        }
    }

    /// Capitalized name used in acknowledgments ("Time: 7:00 AM")
    pub fn title(&self) -> &'static str {
        match self {
            SlotKind::Label => "Label",
            SlotKind::Time => "Time",
            SlotKind::Date => "Date",
            SlotKind::Repeat => "Repeat",
        }
    }
}

impl fmt::Display for SlotKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SlotKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "label" => Ok(SlotKind::Label),
            "time" => Ok(SlotKind::Time),
            "date" => Ok(SlotKind::Date),
            "repeat" => Ok(SlotKind::Repeat),
            other => Err(format!("unknown slot: {}", other)),
        }
    }
}

/// Conversation FSM state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DialogueState {
    #[default]
    Idle,
    Collecting,
    Confirming,
}

impl DialogueState {
    pub fn as_str(&self) -> &'static str {
        match self {
            DialogueState::Idle => "IDLE",
            DialogueState::Collecting => "COLLECTING",
            DialogueState::Confirming => "CONFIRMING",
        }
    }
}

impl fmt::Display for DialogueState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intent_round_trips_through_str() {
        for intent in Intent::ALL {
            assert_eq!(intent.as_str().parse::<Intent>().unwrap(), intent);
        }
        assert!("snooze".parse::<Intent>().is_err());
    }

    #[test]
    fn test_slot_kind_serializes_lowercase() {
        let json = serde_json::to_string(&SlotKind::Repeat).unwrap();
        assert_eq!(json, "\"repeat\"");
        assert_eq!("TIME".parse::<SlotKind>().unwrap(), SlotKind::Time);
    }

    #[test]
    fn test_dialogue_state_default_is_idle() {
        assert_eq!(DialogueState::default(), DialogueState::Idle);
        let json = serde_json::to_string(&DialogueState::Confirming).unwrap();
        assert_eq!(json, "\"CONFIRMING\"");
    }
}
