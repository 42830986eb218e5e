//! Alarm records, commands and storage

pub mod command;
pub mod schedule;
pub mod service;
pub mod store;
pub mod types;

pub use command::{Command, Field, FieldValue, Operation, Payload, Selector, StatusFilter};
pub use service::{AlarmService, DueAlarm};
pub use store::AlarmStore;
pub use types::{Alarm, AlarmBook, AlarmStatus};
