//! Core types and storage for alarmist
//!
//! This crate provides the shared vocabulary (intents, slots, dialogue
//! states), conversation sessions, the structured alarm command and the
//! alarm store used by the other alarmist components.

pub mod alarm;
pub mod config;
pub mod error;
pub mod logging;
pub mod session;
pub mod types;
pub mod utils;

pub use error::{Error, Result};
pub use types::{DialogueState, Intent, SlotKind};
