//! Dialogue engine for alarmist
//!
//! This crate provides the slot-filling state machine, the intent catalog,
//! response templates, command generation and command execution.

pub mod catalog;
pub mod command;
pub mod engine;
pub mod executor;
pub mod responses;

pub use catalog::{IntentCatalog, IntentSpec};
pub use command::generate;
pub use engine::{DialogueEngine, Execution, TurnOutcome};
pub use executor::{execute, ExecutionReport};
pub use responses::{friendly_date, ResponseComposer, ResponseTemplates};
