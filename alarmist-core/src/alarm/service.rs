//! File-backed alarm store

use std::cmp::Ordering;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, NaiveDateTime, Utc};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use super::command::{Field, FieldValue, Payload, Selector};
use super::schedule::{next_trigger, parse_duration, parse_time};
use super::store::AlarmStore;
use super::types::{Alarm, AlarmBook, AlarmStatus};
use crate::utils::{Clock, SystemClock};

/// An alarm whose trigger time has arrived
#[derive(Debug, Clone, PartialEq)]
pub struct DueAlarm {
    pub alarm: Alarm,
    pub scheduled_for: NaiveDateTime,
}

/// Alarm store kept in memory and optionally mirrored to a JSON file
pub struct AlarmService {
    store_path: Option<PathBuf>,
    clock: Arc<dyn Clock>,
    book: Arc<RwLock<Option<AlarmBook>>>,
}

impl AlarmService {
    /// Create a service persisting to `store_path`
    pub fn new(store_path: PathBuf) -> Self {
        Self::with_clock(Some(store_path), Arc::new(SystemClock))
    }

    /// Create a service that never touches disk
    pub fn in_memory() -> Self {
        Self::with_clock(None, Arc::new(SystemClock))
    }

    /// Create a service with an explicit clock
    pub fn with_clock(store_path: Option<PathBuf>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store_path,
            clock,
            book: Arc::new(RwLock::new(None)),
        }
    }

    async fn read_book(&self) -> crate::Result<AlarmBook> {
        let Some(path) = &self.store_path else {
            return Ok(AlarmBook::default());
        };
        if !path.exists() {
            return Ok(AlarmBook::default());
        }

        let content = tokio::fs::read_to_string(path).await?;
        let book: AlarmBook = serde_json::from_str(&content)
            .map_err(|e| crate::Error::Store(format!("failed to parse {:?}: {}", path, e)))?;
        debug!("Loaded {} alarms from disk", book.alarms.len());
        Ok(book)
    }

    async fn write_book(&self, book: &AlarmBook) -> crate::Result<()> {
        let Some(path) = &self.store_path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let content = serde_json::to_string_pretty(book)?;
        tokio::fs::write(path, content).await?;
        Ok(())
    }

    /// Run `f` against a copy of the book, saving afterwards when it reports
    /// a change
    ///
    /// The cache only takes the new book once it is on disk, so a failed
    /// write leaves both untouched.
    async fn mutate<T>(
        &self,
        f: impl FnOnce(&mut AlarmBook) -> (T, bool),
    ) -> crate::Result<T> {
        let mut guard = self.book.write().await;
        let mut book = match guard.as_ref() {
            Some(book) => book.clone(),
            None => self.read_book().await?,
        };

        let (result, changed) = f(&mut book);
        if changed {
            self.write_book(&book).await?;
        }
        *guard = Some(book);
        Ok(result)
    }

    /// All alarms, newest first
    pub async fn list(&self) -> crate::Result<Vec<Alarm>> {
        self.query(&Selector::default(), &[]).await
    }

    /// Fire the earliest alarm whose trigger time has passed
    ///
    /// Daily alarms are rescheduled one day later; everything else is marked
    /// triggered.
    pub async fn due(&self) -> crate::Result<Option<DueAlarm>> {
        let now = self.clock.now();
        self.mutate(|book| {
            let candidate = book
                .alarms
                .iter_mut()
                .filter(|a| matches!(a.status, AlarmStatus::Active | AlarmStatus::Extended))
                .filter(|a| a.next_trigger.map_or(false, |t| t <= now))
                .min_by_key(|a| a.next_trigger);

            let Some(alarm) = candidate else {
                return (None, false);
            };
            let Some(scheduled_for) = alarm.next_trigger else {
                return (None, false);
            };

            let next_day = scheduled_for.checked_add_signed(Duration::days(1));
            if let (true, Some(next_day)) = (alarm.is_daily(), next_day) {
                alarm.next_trigger = Some(next_day);
            } else {
                alarm.status = AlarmStatus::Triggered;
            }
            alarm.updated_at = Utc::now();
            info!("Alarm '{}' due at {}", alarm.label, scheduled_for);

            (
                Some(DueAlarm {
                    alarm: alarm.clone(),
                    scheduled_for,
                }),
                true,
            )
        })
        .await
    }
}

fn apply_payload(alarm: &mut Alarm, payload: &Payload, now: NaiveDateTime) {
    let mut reschedule = false;

    for (field, value) in payload {
        match (field, value) {
            (Field::Label, FieldValue::Text(v)) => alarm.label = v.clone(),
            (Field::Time, FieldValue::Text(v)) => {
                alarm.time = v.clone();
                reschedule = true;
            }
            (Field::Date, FieldValue::Text(v)) => {
                alarm.date = v.clone();
                reschedule = true;
            }
            (Field::Repeat | Field::RepeatPattern, FieldValue::Text(v)) => {
                alarm.repeat = v.to_lowercase();
            }
            (Field::Status, FieldValue::Status(status)) => alarm.status = *status,
            (Field::ExtendedBy, FieldValue::Text(v)) => {
                alarm.extended_by = Some(v.clone());
                let base = alarm.next_trigger.map_or(now, |t| t.max(now));
                match parse_duration(v).and_then(|extra| base.checked_add_signed(extra)) {
                    Some(pushed) => alarm.next_trigger = Some(pushed),
                    None => warn!("Cannot extend '{}' by {:?}; trigger unchanged", alarm.label, v),
                }
            }
            _ => {}
        }
    }

    if reschedule {
        alarm.next_trigger = Some(next_trigger(&alarm.time, &alarm.date, now));
        alarm.status = AlarmStatus::Active;
    }
    alarm.updated_at = Utc::now();
}

fn compare_by(field: Field, a: &Alarm, b: &Alarm) -> Ordering {
    match field {
        Field::Time => match (parse_time(&a.time), parse_time(&b.time)) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => a.time.cmp(&b.time),
        },
        Field::Date => a.date.cmp(&b.date),
        Field::Label => a.label.to_lowercase().cmp(&b.label.to_lowercase()),
        Field::Status => a.status.as_str().cmp(b.status.as_str()),
        Field::Repeat | Field::RepeatPattern => a.repeat.cmp(&b.repeat),
        _ => a.updated_at.cmp(&b.updated_at),
    }
}

#[async_trait]
impl AlarmStore for AlarmService {
    async fn create(&self, fields: &Payload) -> crate::Result<Alarm> {
        let now = self.clock.now();
        let text = move |field: Field| {
            fields
                .get(&field)
                .and_then(FieldValue::as_text)
                .map(str::trim)
                .filter(|v| !v.is_empty())
        };

        let label = text(Field::Label).unwrap_or("Alarm").to_string();
        let time = text(Field::Time).unwrap_or_default().to_string();
        let date = text(Field::Date)
            .map(str::to_string)
            .unwrap_or_else(|| now.date().format("%Y-%m-%d").to_string());
        let repeat = text(Field::Repeat)
            .or_else(|| text(Field::RepeatPattern))
            .unwrap_or("none")
            .to_lowercase();
        let trigger = next_trigger(&time, &date, now);

        self.mutate(move |book| {
            let stamp = Utc::now();
            let alarm = Alarm {
                id: book.next_id,
                label,
                time,
                date,
                repeat,
                status: AlarmStatus::Active,
                next_trigger: Some(trigger),
                extended_by: None,
                created_at: stamp,
                updated_at: stamp,
            };
            book.next_id += 1;
            book.alarms.push(alarm.clone());
            info!("Created alarm '{}' (id {}) for {}", alarm.label, alarm.id, trigger);
            (alarm, true)
        })
        .await
    }

    async fn update(&self, selector: &Selector, payload: &Payload) -> crate::Result<usize> {
        if selector.label.is_none() || payload.is_empty() {
            return Ok(0);
        }
        let now = self.clock.now();
        self.mutate(|book| {
            let mut count = 0;
            for alarm in book.alarms.iter_mut().filter(|a| selector.matches(a)) {
                apply_payload(alarm, payload, now);
                count += 1;
            }
            debug!("Updated {} alarms", count);
            (count, count > 0)
        })
        .await
    }

    async fn delete(&self, selector: &Selector) -> crate::Result<usize> {
        if selector.is_empty() {
            return Ok(0);
        }
        self.mutate(|book| {
            let before = book.alarms.len();
            book.alarms.retain(|a| !selector.matches(a));
            let removed = before - book.alarms.len();
            debug!("Deleted {} alarms", removed);
            (removed, removed > 0)
        })
        .await
    }

    async fn query(&self, selector: &Selector, order_by: &[Field]) -> crate::Result<Vec<Alarm>> {
        self.mutate(|book| {
            let mut alarms: Vec<Alarm> = book
                .alarms
                .iter()
                .filter(|a| selector.matches(a))
                .cloned()
                .collect();

            if order_by.is_empty() {
                alarms.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
            } else {
                alarms.sort_by(|a, b| {
                    order_by
                        .iter()
                        .fold(Ordering::Equal, |acc, field| acc.then_with(|| compare_by(*field, a, b)))
                });
            }
            (alarms, false)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alarm::command::StatusFilter;
    use crate::utils::FixedClock;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn clock() -> Arc<dyn Clock> {
        let date = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        Arc::new(FixedClock::at(date, 9, 0))
    }

    fn fields(pairs: &[(Field, &str)]) -> Payload {
        pairs
            .iter()
            .map(|(f, v)| (*f, FieldValue::text(*v)))
            .collect()
    }

    #[tokio::test]
    async fn test_create_defaults_and_rollover() {
        let service = AlarmService::with_clock(None, clock());
        let alarm = service
            .create(&fields(&[(Field::Label, "gym"), (Field::Time, "7:00 AM")]))
            .await
            .unwrap();

        assert_eq!(alarm.id, 1);
        assert_eq!(alarm.date, "2026-10-19");
        assert_eq!(alarm.repeat, "none");
        assert_eq!(
            alarm.next_trigger.unwrap().to_string(),
            "2026-10-20 07:00:00"
        );
    }

    #[tokio::test]
    async fn test_persists_across_instances() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("alarms.json");

        let service = AlarmService::with_clock(Some(path.clone()), clock());
        service
            .create(&fields(&[(Field::Label, "work"), (Field::Time, "8:00 AM")]))
            .await
            .unwrap();

        let reopened = AlarmService::with_clock(Some(path), clock());
        let alarms = reopened.list().await.unwrap();
        assert_eq!(alarms.len(), 1);
        assert_eq!(alarms[0].label, "work");
    }

    #[tokio::test]
    async fn test_update_reschedules_and_reactivates() {
        let service = AlarmService::with_clock(None, clock());
        service
            .create(&fields(&[(Field::Label, "gym"), (Field::Time, "7:00 AM")]))
            .await
            .unwrap();

        let mut stop = Payload::new();
        stop.insert(Field::Status, FieldValue::Status(AlarmStatus::Stopped));
        assert_eq!(service.update(&Selector::by_label("gym"), &stop).await.unwrap(), 1);

        let count = service
            .update(
                &Selector::by_label("gym"),
                &fields(&[(Field::Time, "10:30 AM")]),
            )
            .await
            .unwrap();
        assert_eq!(count, 1);

        let alarm = &service.list().await.unwrap()[0];
        assert_eq!(alarm.status, AlarmStatus::Active);
        assert_eq!(alarm.next_trigger.unwrap().to_string(), "2026-10-19 10:30:00");
    }

    #[tokio::test]
    async fn test_update_requires_label_selector() {
        let service = AlarmService::with_clock(None, clock());
        let count = service
            .update(&Selector::default(), &fields(&[(Field::Time, "9:00 AM")]))
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_extend_pushes_trigger() {
        let service = AlarmService::with_clock(None, clock());
        service
            .create(&fields(&[(Field::Label, "nap"), (Field::Time, "9:30 AM")]))
            .await
            .unwrap();

        let mut selector = Selector::by_label("nap");
        selector.status = Some(StatusFilter::Is(AlarmStatus::Active));
        let mut payload = fields(&[(Field::ExtendedBy, "10 minutes")]);
        payload.insert(Field::Status, FieldValue::Status(AlarmStatus::Extended));

        assert_eq!(service.update(&selector, &payload).await.unwrap(), 1);
        let alarm = &service.list().await.unwrap()[0];
        assert_eq!(alarm.status, AlarmStatus::Extended);
        assert_eq!(alarm.extended_by.as_deref(), Some("10 minutes"));
        assert_eq!(alarm.next_trigger.unwrap().to_string(), "2026-10-19 09:40:00");
    }

    #[tokio::test]
    async fn test_extend_beyond_calendar_keeps_trigger() {
        let service = AlarmService::with_clock(None, clock());
        let created = service
            .create(&fields(&[(Field::Label, "gym"), (Field::Time, "7:00 AM")]))
            .await
            .unwrap();
        assert!(created.next_trigger.is_some());

        let payload = fields(&[(Field::ExtendedBy, "99999999999 hours")]);
        let updated = service
            .update(&Selector::by_label("gym"), &payload)
            .await
            .unwrap();
        assert_eq!(updated, 1);

        let alarm = &service.list().await.unwrap()[0];
        assert_eq!(alarm.extended_by.as_deref(), Some("99999999999 hours"));
        assert_eq!(alarm.next_trigger, created.next_trigger);
    }

    #[tokio::test]
    async fn test_failed_write_leaves_book_unchanged() {
        let temp_dir = TempDir::new().unwrap();
        let blocker = temp_dir.path().join("data");
        std::fs::write(&blocker, "not a directory").unwrap();
        let service = AlarmService::with_clock(Some(blocker.join("alarms.json")), clock());

        let err = service
            .create(&fields(&[(Field::Label, "gym"), (Field::Time, "7:00 AM")]))
            .await
            .unwrap_err();
        assert!(matches!(err, crate::Error::Io(_)));
        assert!(service.list().await.unwrap().is_empty());
        assert!(service.due().await.unwrap().is_none());

        std::fs::remove_file(&blocker).unwrap();
        let alarm = service
            .create(&fields(&[(Field::Label, "gym"), (Field::Time, "7:00 AM")]))
            .await
            .unwrap();
        assert_eq!(alarm.id, 1);
        assert_eq!(service.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_and_query_order() {
        let service = AlarmService::with_clock(None, clock());
        for (label, time, date) in [
            ("late", "6:00 PM", "2026-10-20"),
            ("early", "6:00 AM", "2026-10-20"),
            ("first", "11:00 PM", "2026-10-19"),
        ] {
            service
                .create(&fields(&[
                    (Field::Label, label),
                    (Field::Time, time),
                    (Field::Date, date),
                ]))
                .await
                .unwrap();
        }

        let ordered = service
            .query(&Selector::default(), &[Field::Date, Field::Time])
            .await
            .unwrap();
        let labels: Vec<&str> = ordered.iter().map(|a| a.label.as_str()).collect();
        assert_eq!(labels, vec!["first", "early", "late"]);

        assert_eq!(service.delete(&Selector::by_label("early")).await.unwrap(), 1);
        assert_eq!(service.delete(&Selector::default()).await.unwrap(), 0);
        assert_eq!(service.list().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_due_fires_once_and_repeats_daily() {
        let date = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        let path = None;
        let early = AlarmService::with_clock(path, Arc::new(FixedClock::at(date, 6, 0)));
        early
            .create(&fields(&[(Field::Label, "once"), (Field::Time, "6:30 AM")]))
            .await
            .unwrap();
        early
            .create(&fields(&[
                (Field::Label, "daily"),
                (Field::Time, "6:15 AM"),
                (Field::Repeat, "daily"),
            ]))
            .await
            .unwrap();

        // Same book, later clock
        let later = AlarmService {
            store_path: None,
            clock: Arc::new(FixedClock::at(date, 7, 0)),
            book: early.book.clone(),
        };

        let first = later.due().await.unwrap().unwrap();
        assert_eq!(first.alarm.label, "daily");
        assert_eq!(first.alarm.status, AlarmStatus::Active);
        assert_eq!(
            first.alarm.next_trigger.unwrap().to_string(),
            "2026-10-20 06:15:00"
        );

        let second = later.due().await.unwrap().unwrap();
        assert_eq!(second.alarm.label, "once");
        assert_eq!(second.alarm.status, AlarmStatus::Triggered);

        assert!(later.due().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_corrupt_file_is_reported() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("alarms.json");
        std::fs::write(&path, "not json").unwrap();

        let service = AlarmService::with_clock(Some(path), clock());
        let err = service.list().await.unwrap_err();
        assert!(err.to_string().contains("Store error"));
    }

    #[test]
    fn test_missing_file_reads_as_empty() {
        let temp_dir = TempDir::new().unwrap();
        let service =
            AlarmService::with_clock(Some(temp_dir.path().join("none.json")), clock());
        let alarms = tokio_test::block_on(service.list()).unwrap();
        assert!(alarms.is_empty());
        assert!(tokio_test::block_on(service.due()).unwrap().is_none());
    }
}
