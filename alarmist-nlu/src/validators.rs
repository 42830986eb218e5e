//! Slot validators
//!
//! Each validator turns raw user text into the canonical display string of
//! its slot, or explains what was wrong. Malformed input is an ordinary
//! [`SlotError`], never a panic.

use alarmist_core::SlotKind;
use chrono::{Datelike, Duration, Local, NaiveDate, Weekday};
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

/// A rejected slot value with a message for the user
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct SlotError {
    pub slot: SlotKind,
    pub message: String,
}

impl SlotError {
    fn new(slot: SlotKind, message: impl Into<String>) -> Self {
        Self {
            slot,
            message: message.into(),
        }
    }
}

pub type SlotResult = Result<String, SlotError>;

static DURATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d+(?:\.\d+)?)\s*(seconds?|secs?|minutes?|mins?|hours?|hrs?)\b")
        .expect("valid duration regex")
});
static CLOCK_MERIDIEM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{1,2}):(\d{2})\s*(am|pm)$").expect("valid clock regex"));
static HOUR_MERIDIEM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{1,2})\s*(am|pm)$").expect("valid hour regex"));
static CLOCK_24: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{1,2}):(\d{2})$").expect("valid 24h regex"));

const WEEKDAYS: [(&str, Weekday); 7] = [
    ("monday", Weekday::Mon),
    ("tuesday", Weekday::Tue),
    ("wednesday", Weekday::Wed),
    ("thursday", Weekday::Thu),
    ("friday", Weekday::Fri),
    ("saturday", Weekday::Sat),
    ("sunday", Weekday::Sun),
];

/// Longest relative time or extension accepted: one week
const MAX_DURATION_SECS: f64 = 7.0 * 24.0 * 3600.0;
const DURATION_TOO_LONG: &str = "That's too long. Please choose a duration of up to 7 days.";

const LABEL_FILLER: &[&str] = &["the", "a", "an", "my", "this", "called", "named", "alarm"];

const INVALID_TIME: &str = "That doesn't look like a valid time. Could you try again?";

/// Validate a time of day or a duration
///
/// Durations normalize to "N unit" ("10 minutes"), named times to their
/// clock value, and every clock time to 12-hour display ("2:30 PM").
pub fn validate_time(raw: &str) -> SlotResult {
    let text = raw.trim().to_lowercase();
    if text.is_empty() {
        return Err(SlotError::new(
            SlotKind::Time,
            "I need to know what time you'd like the alarm. Could you tell me?",
        ));
    }

    if let Some(caps) = DURATION.captures(&text) {
        if let Ok(amount) = caps[1].parse::<f64>() {
            let (unit, seconds) = duration_unit(&caps[2]);
            if amount * seconds > MAX_DURATION_SECS {
                return Err(SlotError::new(SlotKind::Time, DURATION_TOO_LONG));
            }
            return Ok(format_duration(amount, unit));
        }
    }

    let named = match text.as_str() {
        "noon" => Some("12:00 PM"),
        "midnight" => Some("12:00 AM"),
        "morning" => Some("8:00 AM"),
        "afternoon" => Some("2:00 PM"),
        "evening" => Some("6:00 PM"),
        "night" => Some("10:00 PM"),
        _ => None,
    };
    if let Some(value) = named {
        return Ok(value.to_string());
    }

    if let Some(caps) = CLOCK_MERIDIEM.captures(&text) {
        let (hour, minute) = hour_minute(&caps[1], &caps[2])?;
        if !(1..=12).contains(&hour) || minute > 59 {
            return Err(SlotError::new(SlotKind::Time, INVALID_TIME));
        }
        return Ok(format!("{}:{:02} {}", hour, minute, caps[3].to_uppercase()));
    }

    if let Some(caps) = HOUR_MERIDIEM.captures(&text) {
        let (hour, _) = hour_minute(&caps[1], "0")?;
        if !(1..=12).contains(&hour) {
            return Err(SlotError::new(SlotKind::Time, INVALID_TIME));
        }
        return Ok(format!("{}:00 {}", hour, caps[2].to_uppercase()));
    }

    if let Some(caps) = CLOCK_24.captures(&text) {
        let (hour, minute) = hour_minute(&caps[1], &caps[2])?;
        if hour > 23 || minute > 59 {
            return Err(SlotError::new(SlotKind::Time, INVALID_TIME));
        }
        return Ok(to_12_hour(hour, minute));
    }

    Err(SlotError::new(
        SlotKind::Time,
        "I didn't understand that time format. Try something like '7:30 AM' or '14:30'.",
    ))
}

fn hour_minute(hour: &str, minute: &str) -> Result<(u32, u32), SlotError> {
    match (hour.parse(), minute.parse()) {
        (Ok(h), Ok(m)) => Ok((h, m)),
        _ => Err(SlotError::new(SlotKind::Time, INVALID_TIME)),
    }
}

fn to_12_hour(hour: u32, minute: u32) -> String {
    match hour {
        0 => format!("12:{:02} AM", minute),
        1..=11 => format!("{}:{:02} AM", hour, minute),
        12 => format!("12:{:02} PM", minute),
        _ => format!("{}:{:02} PM", hour - 12, minute),
    }
}

fn duration_unit(unit: &str) -> (&'static str, f64) {
    match unit {
        u if u.starts_with("sec") => ("second", 1.0),
        u if u.starts_with("min") => ("minute", 60.0),
        _ => ("hour", 3600.0),
    }
}

/// `amount` is at most [`MAX_DURATION_SECS`] worth of `unit`, so whole
/// amounts fit a `u64`
fn format_duration(amount: f64, unit: &str) -> String {
    let plural = if amount == 1.0 { "" } else { "s" };
    if amount.fract() == 0.0 {
        format!("{} {}{}", amount as u64, unit, plural)
    } else {
        format!("{} {}{}", amount, unit, plural)
    }
}

/// Validate a date against the local calendar
pub fn validate_date(raw: &str) -> SlotResult {
    validate_date_on(raw, Local::now().date_naive())
}

/// Validate a date relative to `today`
///
/// Weekday names resolve to the next occurrence strictly after today, so
/// naming today's weekday means a week from now.
pub fn validate_date_on(raw: &str, today: NaiveDate) -> SlotResult {
    let text = raw.trim().to_lowercase();
    if text.is_empty() {
        return Err(SlotError::new(
            SlotKind::Date,
            "Which day would you like this alarm? You can say 'today', 'tomorrow', or a day of the week.",
        ));
    }

    let date = match text.as_str() {
        "today" => Some(today),
        "tomorrow" => Some(today + Duration::days(1)),
        name => WEEKDAYS
            .iter()
            .find(|(day, _)| *day == name)
            .map(|(_, weekday)| next_weekday(today, *weekday)),
    };

    date.map(|d| d.format("%Y-%m-%d").to_string()).ok_or_else(|| {
        SlotError::new(
            SlotKind::Date,
            "I didn't understand that date. Try 'today', 'tomorrow', or a day of the week.",
        )
    })
}

fn next_weekday(today: NaiveDate, target: Weekday) -> NaiveDate {
    let ahead = (7 + target.num_days_from_monday() as i64
        - today.weekday().num_days_from_monday() as i64)
        % 7;
    today + Duration::days(if ahead == 0 { 7 } else { ahead })
}

/// Validate a repeat pattern into its canonical tag
pub fn validate_repeat(raw: &str) -> SlotResult {
    let text = raw.trim().to_lowercase();
    let hint = "Try 'daily', 'weekly', 'weekdays', or 'every monday'.";
    if text.is_empty() {
        return Err(SlotError::new(
            SlotKind::Repeat,
            format!("How often should this alarm repeat? {}", hint),
        ));
    }

    let canonical = match text.as_str() {
        "daily" | "every day" => Some("daily".to_string()),
        "weekly" | "every week" => Some("weekly".to_string()),
        "monthly" => Some("monthly".to_string()),
        "weekdays" => Some("weekdays".to_string()),
        "weekends" => Some("weekends".to_string()),
        other => other
            .strip_prefix("every ")
            .filter(|day| WEEKDAYS.iter().any(|(name, _)| name == day))
            .map(|day| format!("every_{}", day)),
    };

    canonical.ok_or_else(|| {
        SlotError::new(
            SlotKind::Repeat,
            format!("I didn't understand that repeat pattern. {}", hint),
        )
    })
}

/// Validate an alarm name: filler words and punctuation go, three words stay
pub fn validate_label(raw: &str) -> SlotResult {
    if raw.trim().is_empty() {
        return Err(SlotError::new(
            SlotKind::Label,
            "What would you like to call this alarm? Give it a name like 'workout', 'meeting', or 'medicine'.",
        ));
    }

    let words: Vec<String> = raw
        .split_whitespace()
        .map(|word| {
            word.chars()
                .filter(|c| c.is_alphanumeric() || *c == '_')
                .collect::<String>()
        })
        .filter(|word| !word.is_empty() && !LABEL_FILLER.contains(&word.to_lowercase().as_str()))
        .take(3)
        .collect();

    if words.is_empty() {
        return Err(SlotError::new(
            SlotKind::Label,
            "I need a name for this alarm. What should I call it?",
        ));
    }
    Ok(words.join(" "))
}

/// Validate `raw` as a value for `slot`
pub fn validate(slot: SlotKind, raw: &str, today: NaiveDate) -> SlotResult {
    match slot {
        SlotKind::Label => validate_label(raw),
        SlotKind::Time => validate_time(raw),
        SlotKind::Date => validate_date_on(raw, today),
        SlotKind::Repeat => validate_repeat(raw),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // 2026-10-18 is a Sunday
    fn sunday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 18).unwrap()
    }

    #[test]
    fn test_time_clock_formats() {
        assert_eq!(validate_time("7:30 AM").unwrap(), "7:30 AM");
        assert_eq!(validate_time("07:05pm").unwrap(), "7:05 PM");
        assert_eq!(validate_time("7 am").unwrap(), "7:00 AM");
        assert_eq!(validate_time("14:30").unwrap(), "2:30 PM");
        assert_eq!(validate_time("0:15").unwrap(), "12:15 AM");
        assert_eq!(validate_time("12:00").unwrap(), "12:00 PM");
    }

    #[test]
    fn test_time_named_and_durations() {
        assert_eq!(validate_time("noon").unwrap(), "12:00 PM");
        assert_eq!(validate_time("Midnight").unwrap(), "12:00 AM");
        assert_eq!(validate_time("10 minutes").unwrap(), "10 minutes");
        assert_eq!(validate_time("1 hr").unwrap(), "1 hour");
        assert_eq!(validate_time("1.5 hours").unwrap(), "1.5 hours");
        assert_eq!(validate_time("30 sec").unwrap(), "30 seconds");
    }

    #[test]
    fn test_time_caps_durations_at_a_week() {
        assert_eq!(validate_time("168 hours").unwrap(), "168 hours");
        let err = validate_time("99999999999 hours").unwrap_err();
        assert_eq!(err.slot, SlotKind::Time);
        assert!(err.message.contains("up to 7 days"));
        assert!(validate_time("604801 seconds").is_err());
    }

    #[test]
    fn test_time_rejects_garbage() {
        let err = validate_time("xyz").unwrap_err();
        assert_eq!(err.slot, SlotKind::Time);
        assert!(err.message.contains("7:30 AM"));
        assert!(validate_time("25:00").is_err());
        assert!(validate_time("13 pm").is_err());
        assert!(validate_time("").is_err());
    }

    #[test]
    fn test_date_relative_and_weekdays() {
        assert_eq!(validate_date_on("today", sunday()).unwrap(), "2026-10-18");
        assert_eq!(validate_date_on("Tomorrow", sunday()).unwrap(), "2026-10-19");
        assert_eq!(validate_date_on("sunday", sunday()).unwrap(), "2026-10-25");
        assert_eq!(validate_date_on("monday", sunday()).unwrap(), "2026-10-19");
        assert_eq!(validate_date_on("saturday", sunday()).unwrap(), "2026-10-24");
        assert!(validate_date_on("someday", sunday()).is_err());
        assert!(validate_date_on("12/25/2026", sunday()).is_err());
    }

    #[test]
    fn test_repeat_patterns() {
        assert_eq!(validate_repeat("every monday").unwrap(), "every_monday");
        assert_eq!(validate_repeat("Every Day").unwrap(), "daily");
        assert_eq!(validate_repeat("weekends").unwrap(), "weekends");
        assert!(validate_repeat("every fortnight").is_err());
        assert!(validate_repeat("sometimes").is_err());
    }

    #[test]
    fn test_label_cleanup() {
        assert_eq!(validate_label("my workout alarm").unwrap(), "workout");
        assert_eq!(validate_label("the 'big' team meeting today").unwrap(), "big team meeting");
        assert_eq!(validate_label("Mom's pills!").unwrap(), "Moms pills");
        assert!(validate_label("the alarm").is_err());
        assert!(validate_label("   ").is_err());
    }

    #[test]
    fn test_dispatch_by_slot() {
        assert_eq!(validate(SlotKind::Date, "tomorrow", sunday()).unwrap(), "2026-10-19");
        assert_eq!(validate(SlotKind::Label, "gym", sunday()).unwrap(), "gym");
        assert_eq!(
            validate(SlotKind::Repeat, "nah", sunday()).unwrap_err().slot,
            SlotKind::Repeat
        );
    }
}
