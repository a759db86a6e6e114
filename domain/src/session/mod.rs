//! Conversation session domain.
//!
//! - [`entities::Session`]: per-conversation context: message log, breaker,
//!   router state and turn counter
//! - [`entities::Message`]: one appended message, optionally carrying a
//!   structured payload

pub mod entities;
