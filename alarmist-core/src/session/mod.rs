//! Conversation sessions
//!
//! A session holds the dialogue FSM state for one chat. Sessions are owned
//! by the transport through [`SessionManager`] and lent to the dialogue
//! engine one turn at a time.

pub mod manager;
pub mod store;

pub use manager::{SessionInfo, SessionManager};
pub use store::{
    ConversationLog, ConversationSession, ConversationStats, Entities, LastAction, Utterance,
};
