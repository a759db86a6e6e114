//! Answer drafter port
//!
//! A drafter writes an unconstrained answer body from the query and the
//! retrieved passages. The synthesis stage applies the answer contract on
//! top, so drafters only need to stay within the passage content.

use crate::ports::llm_gateway::GatewayError;
use async_trait::async_trait;
use fincounsel_domain::{Draft, Passage};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SynthesisError {
    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),

    #[error("Empty draft")]
    EmptyDraft,
}

#[async_trait]
pub trait AnswerDrafter: Send + Sync {
    async fn draft(&self, query: &str, passages: &[Passage]) -> Result<Draft, SynthesisError>;

    /// Drafter identifier, for logs and traces
    fn name(&self) -> &'static str;
}
