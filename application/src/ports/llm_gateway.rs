//! LLM Gateway port
//!
//! Defines the interface for communicating with LLM providers.

use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur during LLM gateway operations
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Model not available: {0}")]
    ModelNotAvailable(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Missing credentials: {0}")]
    MissingCredentials(String),

    #[error("Timeout")]
    Timeout,

    #[error("Other error: {0}")]
    Other(String),
}

/// Gateway for LLM communication
///
/// This port defines how the application layer communicates with LLM providers.
/// Implementations (adapters) live in the infrastructure layer. Gateways are
/// shared across sessions and must not keep per-session state.
#[async_trait]
pub trait LlmGateway: Send + Sync {
    /// Single-shot completion with a system prompt
    async fn complete(&self, system: &str, prompt: &str) -> Result<String, GatewayError>;

    /// Model identifier, for logs
    fn model_name(&self) -> &str;
}
