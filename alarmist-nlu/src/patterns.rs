//! Deterministic pattern tables used when the primary models are unavailable

use alarmist_core::Intent;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("valid built-in pattern")
}

/// Intent trigger patterns, tried in order against lowercased text
///
/// The catch-all `alarm.*for` and `my.*alarm` phrasings sit after every
/// specific verb so that "snooze my alarm" or "show alarms for today" keep
/// their verb's intent.
pub static INTENT_PATTERNS: Lazy<Vec<(Intent, Regex)>> = Lazy::new(|| {
    let table: &[(Intent, &[&str])] = &[
        (
            Intent::SetAlarm,
            &[
                r"\bset\b.*alarm",
                r"create.*alarm",
                r"\bnew\b.*alarm",
                r"\badd\b.*alarm",
                r"schedule.*alarm",
                r"wake.*\bme\b",
                r"remind.*\bme\b",
            ],
        ),
        (
            Intent::CancelAlarm,
            &[
                r"cancel.*alarm",
                r"delete.*alarm",
                r"remove.*alarm",
                r"turn.*\boff\b.*alarm",
                r"kill.*alarm",
            ],
        ),
        (
            Intent::UpdateAlarm,
            &[
                r"update.*alarm",
                r"change.*alarm",
                r"modify.*alarm",
                r"\bmove\b.*alarm",
                r"reschedule.*alarm",
                r"\bedit\b.*alarm",
            ],
        ),
        (
            Intent::ExtendAlarm,
            &[
                r"extend.*alarm",
                r"snooze",
                r"delay.*alarm",
                r"postpone.*alarm",
                r"push.*back",
            ],
        ),
        (
            Intent::RepeatAlarm,
            &[
                r"repeat.*alarm",
                r"alarm.*\brepeat",
                r"recurring.*alarm",
                r"daily.*alarm",
                r"weekly.*alarm",
                r"make.*repeat",
            ],
        ),
        (
            Intent::StartAlarm,
            &[
                r"start.*alarm",
                r"activate.*alarm",
                r"turn.*\bon\b.*alarm",
                r"enable.*alarm",
                r"begin.*alarm",
            ],
        ),
        (
            Intent::StopAlarm,
            &[
                r"\bstop\b.*alarm",
                r"deactivate.*alarm",
                r"disable.*alarm",
                r"\bend\b.*alarm",
                r"silence.*alarm",
            ],
        ),
        (
            Intent::ShowAlarms,
            &[
                r"show.*alarm",
                r"list.*alarm",
                r"display.*alarm",
                r"what.*alarm",
                r"check.*alarm",
                r"\bmy\b.*alarms",
            ],
        ),
        (Intent::SetAlarm, &[r"alarm.*\bfor\b"]),
    ];

    table
        .iter()
        .flat_map(|(intent, patterns)| patterns.iter().map(move |p| (*intent, compile(p))))
        .collect()
});

/// Words that confirm a pending action
pub const CONFIRM_WORDS: &[&str] = &["yes", "y", "confirm", "correct", "right", "ok", "sure"];

/// Words that reject a pending action
pub const DENY_WORDS: &[&str] = &["no", "n", "cancel", "wrong", "incorrect"];

/// Single-token time shapes: clock times, named times, durations
pub static TIME_TOKEN: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"^\d{1,2}:\d{2}(am|pm)$",
        r"^\d{1,2}(am|pm)$",
        r"^\d{1,2}:\d{2}$",
        r"^(morning|afternoon|evening|night|noon|midnight)$",
        r"^\d+(\.\d+)?(seconds?|secs?|minutes?|mins?|hours?|hrs?)$",
    ]
    .iter()
    .map(|p| compile(p))
    .collect()
});

pub static DATE_TOKEN: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"^(today|tomorrow|yesterday)$",
        r"^(monday|tuesday|wednesday|thursday|friday|saturday|sunday)$",
        r"^\d{1,2}[/\-]\d{1,2}[/\-]\d{2,4}$",
    ]
    .iter()
    .map(|p| compile(p))
    .collect()
});

pub static REPEAT_TOKEN: Lazy<Vec<Regex>> = Lazy::new(|| {
    [r"^(daily|weekly|monthly|yearly)$", r"^(weekdays|weekends)$"]
        .iter()
        .map(|p| compile(p))
        .collect()
});

/// A bare hour or clock time waiting for a following `am`/`pm` or unit
pub static BARE_NUMBER: Lazy<Regex> = Lazy::new(|| compile(r"^\d{1,2}(:\d{2})?$"));
pub static BARE_AMOUNT: Lazy<Regex> = Lazy::new(|| compile(r"^\d+(\.\d+)?$"));
pub static MERIDIEM: Lazy<Regex> = Lazy::new(|| compile(r"^(am|pm)$"));
pub static DURATION_UNIT: Lazy<Regex> =
    Lazy::new(|| compile(r"^(seconds?|secs?|minutes?|mins?|hours?|hrs?)$"));

/// Period words that may follow "every"
pub static REPEAT_PERIOD: Lazy<Regex> = Lazy::new(|| {
    compile(r"^(day|week|month|year|monday|tuesday|wednesday|thursday|friday|saturday|sunday)$")
});

/// Time token as a model might emit it ("7am", "7:30 pm")
pub static MODEL_TIME_TOKEN: Lazy<Regex> =
    Lazy::new(|| compile(r"^\d{1,2}(:\d{2})?\s*(am|pm)$"));

pub static LABEL_SHAPE: Lazy<Regex> = Lazy::new(|| compile(r"^[a-zA-Z][a-zA-Z0-9_\-]*$"));

/// Words that mark a nearby token as the alarm's name
pub const LABEL_CONTEXT: &[&str] = &["called", "named", "for", "alarm"];

/// Words around a literal "repeat" that make it a repeat request
pub const REPEAT_CONTEXT: &[&str] = &["set", "make", "create", "daily", "weekly", "monthly", "every"];

pub const DATE_WORDS: &[&str] = &[
    "today",
    "tomorrow",
    "monday",
    "tuesday",
    "wednesday",
    "thursday",
    "friday",
    "saturday",
    "sunday",
];

/// Tokens never taken as part of a label
pub static STOP_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        // filler
        "set", "alarm", "alarms", "for", "at", "on", "to", "the", "a", "an", "called", "named",
        "please", "can", "could", "would", "will", "i", "want", "need", "like", "my", "me",
        "and", "or", "but", "so", "then", "now", "also", "in", "by", "of", "it", "is", "up",
        "do", "have", "all", "every", "next", "with", "from", "this", "that",
        // action verbs
        "create", "add", "make", "new", "schedule", "wake", "remind", "cancel", "delete",
        "remove", "kill", "turn", "off", "update", "change", "modify", "move", "reschedule",
        "edit", "show", "list", "display", "what", "check", "extend", "snooze", "delay",
        "postpone", "push", "back", "repeat", "recurring", "start", "activate", "enable",
        "begin", "stop", "deactivate", "disable", "end", "silence",
        // conversational
        "hi", "hello", "hey", "yes", "no", "ok", "sure", "thanks",
    ]
    .into_iter()
    .collect()
});

/// Whether `text` contains any of `words` as a whole word
pub fn has_word(text: &str, words: &[&str]) -> bool {
    words_of(text).any(|w| words.contains(&w.as_str()))
}

/// Lowercased words of `text` with surrounding punctuation removed
pub fn words_of(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split_whitespace()
        .map(|w| clean_token(w).to_lowercase())
        .filter(|w| !w.is_empty())
}

/// Strip leading and trailing punctuation
pub fn clean_token(token: &str) -> &str {
    token.trim_matches(|c: char| !c.is_alphanumeric())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn first_intent(text: &str) -> Option<Intent> {
        let lower = text.to_lowercase();
        INTENT_PATTERNS
            .iter()
            .find(|(_, re)| re.is_match(&lower))
            .map(|(intent, _)| *intent)
    }

    #[test]
    fn test_intent_pattern_priorities() {
        assert_eq!(first_intent("Set workout alarm for 7 AM"), Some(Intent::SetAlarm));
        assert_eq!(first_intent("wake me up at 6"), Some(Intent::SetAlarm));
        assert_eq!(first_intent("cancel my gym alarm"), Some(Intent::CancelAlarm));
        assert_eq!(first_intent("snooze my alarm"), Some(Intent::ExtendAlarm));
        assert_eq!(first_intent("stop the gym alarm"), Some(Intent::StopAlarm));
        assert_eq!(first_intent("show my alarms for tomorrow"), Some(Intent::ShowAlarms));
        assert_eq!(first_intent("what alarms do I have"), Some(Intent::ShowAlarms));
        assert_eq!(first_intent("an alarm for my pills"), Some(Intent::SetAlarm));
        assert_eq!(first_intent("weekend alarm please"), None);
        assert_eq!(first_intent("how is the weather"), None);
    }

    #[test]
    fn test_has_word_is_word_level() {
        assert!(has_word("Yes, please", CONFIRM_WORDS));
        assert!(!has_word("yesterday", CONFIRM_WORDS));
        assert!(!has_word("now then", DENY_WORDS));
    }

    #[test]
    fn test_clean_token() {
        assert_eq!(clean_token("AM,"), "AM");
        assert_eq!(clean_token("'gym'"), "gym");
        assert_eq!(clean_token("7:30"), "7:30");
        assert_eq!(clean_token("tomorrow."), "tomorrow");
    }
}
