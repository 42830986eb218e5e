//! Alarm records

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle of an alarm
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlarmStatus {
    #[default]
    Active,
    Ringing,
    Extended,
    Stopped,
    Triggered,
}

impl AlarmStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlarmStatus::Active => "active",
            AlarmStatus::Ringing => "ringing",
            AlarmStatus::Extended => "extended",
            AlarmStatus::Stopped => "stopped",
            AlarmStatus::Triggered => "triggered",
        }
    }
}

impl fmt::Display for AlarmStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AlarmStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "active" => Ok(AlarmStatus::Active),
            "ringing" => Ok(AlarmStatus::Ringing),
            "extended" => Ok(AlarmStatus::Extended),
            "stopped" => Ok(AlarmStatus::Stopped),
            "triggered" => Ok(AlarmStatus::Triggered),
            other => Err(format!("unknown alarm status: {}", other)),
        }
    }
}

/// A stored alarm
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alarm {
    pub id: u64,
    pub label: String,
    /// Display time as collected ("7:00 AM")
    pub time: String,
    /// ISO date the alarm was scheduled for
    pub date: String,
    /// Repeat tag ("none", "daily", "every_monday", ...)
    pub repeat: String,
    #[serde(default)]
    pub status: AlarmStatus,
    #[serde(rename = "nextTrigger", skip_serializing_if = "Option::is_none")]
    pub next_trigger: Option<NaiveDateTime>,
    #[serde(rename = "extendedBy", skip_serializing_if = "Option::is_none")]
    pub extended_by: Option<String>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

impl Alarm {
    /// Whether the alarm repeats every day
    pub fn is_daily(&self) -> bool {
        self.repeat.eq_ignore_ascii_case("daily")
    }
}

/// Persistent alarm book
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlarmBook {
    #[serde(default = "default_version")]
    pub version: i32,
    #[serde(rename = "nextId", default = "default_next_id")]
    pub next_id: u64,
    #[serde(default)]
    pub alarms: Vec<Alarm>,
}

fn default_version() -> i32 {
    1
}

fn default_next_id() -> u64 {
    1
}

impl Default for AlarmBook {
    fn default() -> Self {
        Self {
            version: default_version(),
            next_id: default_next_id(),
            alarms: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parse_and_display() {
        assert_eq!("Ringing".parse::<AlarmStatus>().unwrap(), AlarmStatus::Ringing);
        assert_eq!(AlarmStatus::Stopped.to_string(), "stopped");
        assert!("paused".parse::<AlarmStatus>().is_err());
    }

    #[test]
    fn test_alarm_book_default() {
        let book = AlarmBook::default();
        assert_eq!(book.version, 1);
        assert_eq!(book.next_id, 1);
        assert!(book.alarms.is_empty());
    }

    #[test]
    fn test_alarm_book_tolerates_sparse_json() {
        let book: AlarmBook = serde_json::from_str(r#"{"alarms":[]}"#).unwrap();
        assert_eq!(book.next_id, 1);
    }
}
