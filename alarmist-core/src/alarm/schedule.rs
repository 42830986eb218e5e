//! Turning display strings into trigger instants

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use once_cell::sync::Lazy;
use regex::Regex;

static CLOCK_TIME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{1,2}):(\d{2})\s*(am|pm)?$").expect("valid clock regex"));
static HOUR_ONLY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{1,2})\s*(am|pm)$").expect("valid hour regex"));
static DURATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d+(?:\.\d+)?)\s*(seconds?|secs?|minutes?|mins?|hours?|hrs?)\b")
        .expect("valid duration regex")
});

/// Parse "7:30", "07:30 PM" or "7 am" into a wall-clock time
pub fn parse_time(raw: &str) -> Option<NaiveTime> {
    let text = raw.trim().to_lowercase();

    let (hour, minute, period) = if let Some(caps) = CLOCK_TIME.captures(&text) {
        (
            caps[1].parse::<u32>().ok()?,
            caps[2].parse::<u32>().ok()?,
            caps.get(3).map(|m| m.as_str().to_string()),
        )
    } else if let Some(caps) = HOUR_ONLY.captures(&text) {
        (caps[1].parse::<u32>().ok()?, 0, Some(caps[2].to_string()))
    } else {
        return None;
    };

    let mut hour = hour;
    match period.as_deref() {
        Some("pm") if (1..=11).contains(&hour) => hour += 12,
        Some("am") if hour == 12 => hour = 0,
        _ => {}
    }

    NaiveTime::from_hms_opt(hour.min(23), minute.min(59), 0)
}

/// Parse "today", "tomorrow", ISO or slash dates; anything else is `today`
pub fn parse_date(raw: &str, today: NaiveDate) -> NaiveDate {
    let text = raw.trim().to_lowercase();
    match text.as_str() {
        "" | "today" => return today,
        "tomorrow" => return today + Duration::days(1),
        _ => {}
    }

    ["%Y-%m-%d", "%m/%d/%Y", "%d/%m/%Y"]
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(&text, fmt).ok())
        .unwrap_or(today)
}

/// Parse a duration such as "10 minutes" or "1.5 hrs"
///
/// Amounts too large for a [`Duration`] yield `None`.
pub fn parse_duration(raw: &str) -> Option<Duration> {
    let text = raw.trim().to_lowercase();
    let caps = DURATION.captures(&text)?;
    let amount: f64 = caps[1].parse().ok()?;
    let unit_seconds = match &caps[2] {
        u if u.starts_with("sec") => 1.0,
        u if u.starts_with("min") => 60.0,
        _ => 3600.0,
    };
    let millis = (amount * unit_seconds * 1000.0).round();
    if !millis.is_finite() || millis.abs() >= i64::MAX as f64 {
        return None;
    }
    Duration::try_milliseconds(millis as i64)
}

/// Next trigger for an alarm at `time` on `date`
///
/// An unparsable time means "the next minute". When the date is today (or
/// unspecified) and the minute has already passed, the alarm rolls over to
/// tomorrow.
pub fn next_trigger(time: &str, date: &str, now: NaiveDateTime) -> NaiveDateTime {
    let now_minute = truncate_to_minute(now);
    let today = now.date();
    let day = parse_date(date, today);
    let clock = parse_time(time).unwrap_or_else(|| (now_minute + Duration::minutes(1)).time());

    let mut trigger = day.and_time(clock);
    if trigger <= now_minute && day == today {
        trigger += Duration::days(1);
    }
    trigger
}

fn truncate_to_minute(at: NaiveDateTime) -> NaiveDateTime {
    at.with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(at)
}
