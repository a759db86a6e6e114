//! Use cases
//!
//! Application-level operations that orchestrate domain logic.

pub mod drafting;
pub mod handle_turn;
pub mod knowledge_chain;
pub mod retrieve;
pub mod session_manager;
pub mod synthesize;

#[cfg(test)]
pub(crate) mod test_support;
