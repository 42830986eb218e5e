//! Structured alarm commands
//!
//! A [`Command`] is what the dialogue hands to the alarm store. Selectors and
//! payloads stay structured; [`Command::to_sql`] exists only for display and
//! escapes every literal.

use super::types::{Alarm, AlarmStatus};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Kind of store operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Create,
    Delete,
    Update,
    Query,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Operation::Create => "create",
            Operation::Delete => "delete",
            Operation::Update => "update",
            Operation::Query => "query",
        })
    }
}

/// Alarm attribute addressed by a payload or ordering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Label,
    Time,
    Date,
    Repeat,
    RepeatPattern,
    ExtendedBy,
    Status,
    UpdatedAt,
    ExtendedAt,
    StartedAt,
    StoppedAt,
}

impl Field {
    pub fn column(&self) -> &'static str {
        match self {
            Field::Label => "label",
            Field::Time => "time",
            Field::Date => "date",
            Field::Repeat => "repeat",
            Field::RepeatPattern => "repeat_pattern",
            Field::ExtendedBy => "extended_by",
            Field::Status => "status",
            Field::UpdatedAt => "updated_at",
            Field::ExtendedAt => "extended_at",
            Field::StartedAt => "started_at",
            Field::StoppedAt => "stopped_at",
        }
    }
}

/// Value assigned to a field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldValue {
    Text(String),
    Status(AlarmStatus),
    /// Stamp with the store's current time
    Now,
}

impl FieldValue {
    pub fn text(value: impl Into<String>) -> Self {
        FieldValue::Text(value.into())
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    fn to_sql(&self) -> String {
        match self {
            FieldValue::Text(s) => quote_literal(s),
            FieldValue::Status(status) => quote_literal(status.as_str()),
            FieldValue::Now => "CURRENT_TIMESTAMP".to_string(),
        }
    }
}

/// Field assignments of a create or update
pub type Payload = BTreeMap<Field, FieldValue>;

/// Status constraint of a selector
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusFilter {
    Is(AlarmStatus),
    AnyOf(Vec<AlarmStatus>),
}

impl StatusFilter {
    pub fn matches(&self, status: AlarmStatus) -> bool {
        match self {
            StatusFilter::Is(expected) => *expected == status,
            StatusFilter::AnyOf(allowed) => allowed.contains(&status),
        }
    }
}

/// Which alarms a command targets
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selector {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<StatusFilter>,
}

impl Selector {
    pub fn by_label(label: impl Into<String>) -> Self {
        Self {
            label: Some(label.into()),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.label.is_none() && self.time.is_none() && self.date.is_none() && self.status.is_none()
    }

    /// Whether `alarm` satisfies every present constraint
    pub fn matches(&self, alarm: &Alarm) -> bool {
        let text_matches = |expected: &Option<String>, actual: &str| {
            expected
                .as_deref()
                .map_or(true, |e| e.eq_ignore_ascii_case(actual))
        };
        text_matches(&self.label, &alarm.label)
            && text_matches(&self.time, &alarm.time)
            && text_matches(&self.date, &alarm.date)
            && self
                .status
                .as_ref()
                .map_or(true, |filter| filter.matches(alarm.status))
    }

    fn where_clause(&self) -> String {
        let mut conditions = Vec::new();
        for (column, value) in [
            ("label", &self.label),
            ("time", &self.time),
            ("date", &self.date),
        ] {
            if let Some(value) = value {
                conditions.push(format!("{} = {}", column, quote_literal(value)));
            }
        }
        match &self.status {
            Some(StatusFilter::Is(status)) => {
                conditions.push(format!("status = {}", quote_literal(status.as_str())));
            }
            Some(StatusFilter::AnyOf(statuses)) => {
                let list: Vec<String> = statuses.iter().map(|s| quote_literal(s.as_str())).collect();
                conditions.push(format!("status IN ({})", list.join(", ")));
            }
            None => {}
        }

        if conditions.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", conditions.join(" AND "))
        }
    }
}

/// A structured request against the alarm store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Command {
    pub operation: Operation,
    #[serde(default)]
    pub selector: Selector,
    #[serde(default)]
    pub payload: Payload,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub order_by: Vec<Field>,
}

impl Command {
    pub fn new(operation: Operation) -> Self {
        Self {
            operation,
            selector: Selector::default(),
            payload: Payload::new(),
            order_by: Vec::new(),
        }
    }

    /// Text value of a payload field
    pub fn text(&self, field: Field) -> Option<&str> {
        self.payload.get(&field).and_then(FieldValue::as_text)
    }

    /// Render as SQL for display; literals have quotes doubled
    pub fn to_sql(&self) -> String {
        match self.operation {
            Operation::Create => {
                let columns: Vec<&str> = self.payload.keys().map(Field::column).collect();
                let values: Vec<String> = self.payload.values().map(FieldValue::to_sql).collect();
                format!(
                    "INSERT INTO alarms ({}) VALUES ({});",
                    columns.join(", "),
                    values.join(", ")
                )
            }
            Operation::Delete => format!("DELETE FROM alarms{};", self.selector.where_clause()),
            Operation::Update => {
                let assignments: Vec<String> = self
                    .payload
                    .iter()
                    .map(|(field, value)| format!("{} = {}", field.column(), value.to_sql()))
                    .collect();
                format!(
                    "UPDATE alarms SET {}{};",
                    assignments.join(", "),
                    self.selector.where_clause()
                )
            }
            Operation::Query => {
                let mut sql = format!(
                    "SELECT label, time, date, repeat, status FROM alarms{}",
                    self.selector.where_clause()
                );
                if !self.order_by.is_empty() {
                    let order: Vec<String> = self
                        .order_by
                        .iter()
                        .map(|f| format!("{} ASC", f.column()))
                        .collect();
                    sql.push_str(&format!(" ORDER BY {}", order.join(", ")));
                }
                sql.push(';');
                sql
            }
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_sql())
    }
}

/// Quote a string literal, doubling embedded single quotes
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn alarm(label: &str, status: AlarmStatus) -> Alarm {
        Alarm {
            id: 1,
            label: label.to_string(),
            time: "7:00 AM".to_string(),
            date: "2026-10-20".to_string(),
            repeat: "none".to_string(),
            status,
            next_trigger: None,
            extended_by: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_quote_literal_doubles_quotes() {
        assert_eq!(quote_literal("mom's pills"), "'mom''s pills'");
    }

    #[test]
    fn test_create_sql_uses_payload_order() {
        let mut command = Command::new(Operation::Create);
        command.payload.insert(Field::Date, FieldValue::text("2026-10-20"));
        command.payload.insert(Field::Label, FieldValue::text("o'brien"));
        command.payload.insert(Field::Time, FieldValue::text("7:00 AM"));

        assert_eq!(
            command.to_sql(),
            "INSERT INTO alarms (label, time, date) VALUES ('o''brien', '7:00 AM', '2026-10-20');"
        );
    }

    #[test]
    fn test_update_sql_with_status_set() {
        let mut command = Command::new(Operation::Update);
        command.selector = Selector::by_label("gym");
        command.selector.status = Some(StatusFilter::AnyOf(vec![
            AlarmStatus::Active,
            AlarmStatus::Ringing,
        ]));
        command
            .payload
            .insert(Field::Status, FieldValue::Status(AlarmStatus::Stopped));
        command.payload.insert(Field::StoppedAt, FieldValue::Now);

        assert_eq!(
            command.to_sql(),
            "UPDATE alarms SET status = 'stopped', stopped_at = CURRENT_TIMESTAMP \
             WHERE label = 'gym' AND status IN ('active', 'ringing');"
        );
    }

    #[test]
    fn test_query_sql_orders() {
        let mut command = Command::new(Operation::Query);
        command.order_by = vec![Field::Date, Field::Time];
        assert_eq!(
            command.to_sql(),
            "SELECT label, time, date, repeat, status FROM alarms ORDER BY date ASC, time ASC;"
        );
    }

    #[test]
    fn test_selector_matches() {
        let mut selector = Selector::by_label("Gym");
        assert!(selector.matches(&alarm("gym", AlarmStatus::Active)));
        assert!(!selector.matches(&alarm("work", AlarmStatus::Active)));

        selector.status = Some(StatusFilter::Is(AlarmStatus::Active));
        assert!(!selector.matches(&alarm("gym", AlarmStatus::Stopped)));
        assert!(Selector::default().matches(&alarm("any", AlarmStatus::Triggered)));
    }
}
