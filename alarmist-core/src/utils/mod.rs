//! Utility functions and injectable seams (clock, random choice)

use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime};
use rand::Rng;

/// Source of the current local time
pub trait Clock: Send + Sync {
    /// Current local wall-clock time
    fn now(&self) -> NaiveDateTime;

    /// Current local date
    fn today(&self) -> NaiveDate {
        self.now().date()
    }
}

/// Clock backed by the system's local time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Clock pinned to a single instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDateTime);

impl FixedClock {
    /// Pin the clock to `hour:minute` on `date`
    pub fn at(date: NaiveDate, hour: u32, minute: u32) -> Self {
        Self(date.and_hms_opt(hour, minute, 0).unwrap_or_else(|| date.and_time(NaiveTime::default())))
    }
}

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}

/// Picks an index into a list of alternatives
pub trait Chooser: Send + Sync {
    /// Return an index in `0..len`; `len` is never zero
    fn pick(&self, len: usize) -> usize;
}

/// Uniform random choice
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomChooser;

impl Chooser for RandomChooser {
    fn pick(&self, len: usize) -> usize {
        rand::thread_rng().gen_range(0..len.max(1))
    }
}

/// Always picks the same index (wrapped to the list length)
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedChooser(pub usize);

impl Chooser for FixedChooser {
    fn pick(&self, len: usize) -> usize {
        self.0 % len.max(1)
    }
}

/// Choose one entry of `options` through `chooser`
pub fn choose<'a, T>(chooser: &dyn Chooser, options: &'a [T]) -> Option<&'a T> {
    if options.is_empty() {
        None
    } else {
        options.get(chooser.pick(options.len()))
    }
}

/// Create a safe filename from a string
pub fn safe_filename(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '-' | '_' | '.' => c,
            _ => '_',
        })
        .collect()
}

/// Truncate a string to a maximum byte length, ensuring valid UTF-8 boundaries
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        s.to_string()
    } else {
        let mut end = max_len.saturating_sub(3);
        while !s.is_char_boundary(end) {
            end = end.saturating_sub(1);
        }
        format!("{}...", &s[..end])
    }
}

/// Title-case a single word ("sarah" -> "Sarah")
pub fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(|c| c.to_lowercase())).collect(),
        None => String::new(),
    }
}
