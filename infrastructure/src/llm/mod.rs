//! LLM gateway adapters (requires the `http` feature).
//!
//! [`AnthropicGateway`] implements the
//! [`LlmGateway`](fincounsel_application::LlmGateway) port over the
//! Anthropic Messages API. It backs the `llm` drafter only; routing and
//! guardrails never call a model.

mod anthropic;

pub use anthropic::{AnthropicGateway, AnthropicSettings};
