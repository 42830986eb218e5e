//! BIO tags and span merging

use alarmist_core::session::Entities;
use alarmist_core::SlotKind;
use std::fmt;
use std::str::FromStr;

/// Begin/Inside/Outside tag of one token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tag {
    Outside,
    Begin(SlotKind),
    Inside(SlotKind),
}

impl Tag {
    /// Slot kind the tag belongs to, if any
    pub fn slot(&self) -> Option<SlotKind> {
        match self {
            Tag::Outside => None,
            Tag::Begin(kind) | Tag::Inside(kind) => Some(*kind),
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tag::Outside => f.write_str("O"),
            Tag::Begin(kind) => write!(f, "B-{}", kind),
            Tag::Inside(kind) => write!(f, "I-{}", kind),
        }
    }
}

impl FromStr for Tag {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("o") {
            return Ok(Tag::Outside);
        }
        let (prefix, kind) = s
            .split_once('-')
            .ok_or_else(|| format!("malformed tag: {}", s))?;
        let kind: SlotKind = kind.parse()?;
        match prefix {
            "B" | "b" => Ok(Tag::Begin(kind)),
            "I" | "i" => Ok(Tag::Inside(kind)),
            other => Err(format!("unknown tag prefix: {}", other)),
        }
    }
}

/// A token with its tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaggedToken {
    pub token: String,
    pub tag: Tag,
}

impl TaggedToken {
    pub fn new(token: impl Into<String>, tag: Tag) -> Self {
        Self {
            token: token.into(),
            tag,
        }
    }
}

/// Merge tagged tokens into one value per slot
///
/// `I-x` tokens extend an open `B-x` span with a single space. An `I-x` with
/// no open span of the same kind is dropped and closes whatever span was
/// open. When a slot is tagged more than once the last span wins.
pub fn merge_tags(tokens: &[TaggedToken]) -> Entities {
    let mut entities = Entities::new();
    let mut open: Option<(SlotKind, String)> = None;

    for item in tokens {
        match item.tag {
            Tag::Begin(kind) => {
                if let Some((slot, value)) = open.take() {
                    entities.insert(slot, value);
                }
                open = Some((kind, item.token.clone()));
            }
            Tag::Inside(kind) => match open.as_mut() {
                Some((slot, value)) if *slot == kind => {
                    value.push(' ');
                    value.push_str(&item.token);
                }
                _ => {
                    if let Some((slot, value)) = open.take() {
                        entities.insert(slot, value);
                    }
                }
            },
            Tag::Outside => {
                if let Some((slot, value)) = open.take() {
                    entities.insert(slot, value);
                }
            }
        }
    }

    if let Some((slot, value)) = open {
        entities.insert(slot, value);
    }
    entities
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(pairs: &[(&str, &str)]) -> Vec<TaggedToken> {
        pairs
            .iter()
            .map(|(token, tag)| TaggedToken::new(*token, tag.parse().unwrap()))
            .collect()
    }

    #[test]
    fn test_parse_and_display() {
        assert_eq!("B-time".parse::<Tag>().unwrap(), Tag::Begin(SlotKind::Time));
        assert_eq!("I-label".parse::<Tag>().unwrap(), Tag::Inside(SlotKind::Label));
        assert_eq!("O".parse::<Tag>().unwrap(), Tag::Outside);
        assert!("B-color".parse::<Tag>().is_err());
        assert!("X-time".parse::<Tag>().is_err());
        assert!("time".parse::<Tag>().is_err());
        assert_eq!(Tag::Begin(SlotKind::Repeat).to_string(), "B-repeat");
    }

    #[test]
    fn test_merge_concatenates_inside_tokens() {
        let merged = merge_tags(&tokens(&[
            ("team", "B-label"),
            ("meeting", "I-label"),
            ("at", "O"),
            ("7", "B-time"),
            ("AM", "I-time"),
        ]));
        assert_eq!(merged.get(&SlotKind::Label).map(String::as_str), Some("team meeting"));
        assert_eq!(merged.get(&SlotKind::Time).map(String::as_str), Some("7 AM"));
    }

    #[test]
    fn test_merge_drops_dangling_inside() {
        let merged = merge_tags(&tokens(&[
            ("AM", "I-time"),
            ("gym", "B-label"),
            ("daily", "I-repeat"),
            ("now", "I-label"),
        ]));
        assert_eq!(merged.get(&SlotKind::Label).map(String::as_str), Some("gym"));
        assert!(!merged.contains_key(&SlotKind::Time));
        assert!(!merged.contains_key(&SlotKind::Repeat));
    }

    #[test]
    fn test_merge_outside_closes_span() {
        let merged = merge_tags(&tokens(&[
            ("gym", "B-label"),
            ("for", "O"),
            ("class", "I-label"),
        ]));
        assert_eq!(merged.get(&SlotKind::Label).map(String::as_str), Some("gym"));
    }

    #[test]
    fn test_merge_last_span_wins() {
        let merged = merge_tags(&tokens(&[("today", "B-date"), ("tomorrow", "B-date")]));
        assert_eq!(merged.get(&SlotKind::Date).map(String::as_str), Some("tomorrow"));
    }
}
