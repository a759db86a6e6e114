//! Port definitions (interfaces for external adapters)
//!
//! Ports define the contracts that infrastructure adapters must implement.

pub mod answer_drafter;
pub mod conversation_logger;
pub mod embedding;
pub mod llm_gateway;
pub mod progress;
pub mod session_store;
pub mod specialist_handler;
pub mod vector_store;
