//! Command generator - completed slot sets to structured store commands

use alarmist_core::alarm::{
    AlarmStatus, Command, Field, FieldValue, Operation, Selector, StatusFilter,
};
use alarmist_core::session::Entities;
use alarmist_core::{Intent, SlotKind};
use chrono::NaiveDate;

const DEFAULT_LABEL: &str = "alarm";
const DEFAULT_EXTENSION: &str = "10 minutes";
const DEFAULT_REPEAT: &str = "daily";

fn slot_field(slot: SlotKind) -> Field {
    match slot {
        SlotKind::Label => Field::Label,
        SlotKind::Time => Field::Time,
        SlotKind::Date => Field::Date,
        SlotKind::Repeat => Field::Repeat,
    }
}

/// Build the store command serving `intent` with the collected `entities`
///
/// Blank values are ignored. Selectors and payloads stay structured; quoting
/// only happens when a command is rendered for display.
pub fn generate(intent: Intent, entities: &Entities, today: NaiveDate) -> Command {
    let value = move |slot: SlotKind| {
        entities
            .get(&slot)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    };
    let label = value(SlotKind::Label).unwrap_or(DEFAULT_LABEL).to_string();

    match intent {
        Intent::SetAlarm => {
            let mut command = Command::new(Operation::Create);
            for slot in SlotKind::ALL {
                if let Some(v) = value(slot) {
                    command.payload.insert(slot_field(slot), FieldValue::text(v));
                }
            }
            command
                .payload
                .entry(Field::Date)
                .or_insert_with(|| FieldValue::text(today.format("%Y-%m-%d").to_string()));
            command
        }
        Intent::CancelAlarm => {
            let mut command = Command::new(Operation::Delete);
            command.selector = Selector {
                label: Some(label),
                time: value(SlotKind::Time).map(str::to_string),
                date: value(SlotKind::Date).map(str::to_string),
                status: None,
            };
            command
        }
        Intent::UpdateAlarm => {
            let mut command = Command::new(Operation::Update);
            command.selector = Selector::by_label(label);
            for slot in [SlotKind::Time, SlotKind::Date, SlotKind::Repeat] {
                if let Some(v) = value(slot) {
                    command.payload.insert(slot_field(slot), FieldValue::text(v));
                }
            }
            if command.payload.is_empty() {
                command.payload.insert(Field::UpdatedAt, FieldValue::Now);
            }
            command
        }
        Intent::ShowAlarms => {
            let mut command = Command::new(Operation::Query);
            command.selector.label = value(SlotKind::Label).map(str::to_string);
            command.selector.date = value(SlotKind::Date).map(str::to_string);
            command.order_by = vec![Field::Date, Field::Time];
            command
        }
        Intent::ExtendAlarm => {
            let mut command = Command::new(Operation::Update);
            command.selector = Selector::by_label(label);
            command.selector.status = Some(StatusFilter::Is(AlarmStatus::Active));
            command.payload.insert(
                Field::ExtendedBy,
                FieldValue::text(value(SlotKind::Time).unwrap_or(DEFAULT_EXTENSION)),
            );
            command
                .payload
                .insert(Field::Status, FieldValue::Status(AlarmStatus::Extended));
            command.payload.insert(Field::ExtendedAt, FieldValue::Now);
            command
        }
        Intent::RepeatAlarm => {
            let mut command = Command::new(Operation::Update);
            command.selector = Selector::by_label(label);
            command.payload.insert(
                Field::RepeatPattern,
                FieldValue::text(value(SlotKind::Repeat).unwrap_or(DEFAULT_REPEAT)),
            );
            command.payload.insert(Field::UpdatedAt, FieldValue::Now);
            command
        }
        Intent::StartAlarm => {
            let mut command = Command::new(Operation::Update);
            command.selector = Selector::by_label(label);
            command
                .payload
                .insert(Field::Status, FieldValue::Status(AlarmStatus::Active));
            command.payload.insert(Field::StartedAt, FieldValue::Now);
            command
        }
        Intent::StopAlarm => {
            let mut command = Command::new(Operation::Update);
            command.selector = Selector::by_label(label);
            command.selector.status = Some(StatusFilter::AnyOf(vec![
                AlarmStatus::Active,
                AlarmStatus::Ringing,
            ]));
            command
                .payload
                .insert(Field::Status, FieldValue::Status(AlarmStatus::Stopped));
            command.payload.insert(Field::StoppedAt, FieldValue::Now);
            command
        }
    }
}
