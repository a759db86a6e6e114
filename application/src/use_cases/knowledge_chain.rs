//! Knowledge chain: guardrail → retrieval → synthesis.
//!
//! The guardrail always runs first. A blocked query never reaches the
//! embedder or the vector store.

use crate::ports::progress::{TurnProgress, TurnStage};
use crate::use_cases::retrieve::{RetrievalEngine, RetrievalError};
use crate::use_cases::synthesize::SynthesisStage;
use fincounsel_domain::{
    DomainError, GuardrailCategory, GuardrailVerdict, Passage, QueryGuardrail, RetrievalQuery,
    SynthesisResult,
};
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum KnowledgeChainError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Retrieval(#[from] RetrievalError),
}

/// Outcome of screening a query.
#[derive(Debug)]
pub enum Screened {
    Blocked {
        category: GuardrailCategory,
        message: &'static str,
    },
    Approved(RetrievalQuery),
}

pub struct KnowledgeChain {
    guardrail: Arc<dyn QueryGuardrail>,
    engine: RetrievalEngine,
    synthesis: SynthesisStage,
}

impl KnowledgeChain {
    pub fn new(
        guardrail: Arc<dyn QueryGuardrail>,
        engine: RetrievalEngine,
        synthesis: SynthesisStage,
    ) -> Self {
        Self {
            guardrail,
            engine,
            synthesis,
        }
    }

    pub fn engine(&self) -> &RetrievalEngine {
        &self.engine
    }

    pub fn synthesis(&self) -> &SynthesisStage {
        &self.synthesis
    }

    /// Classify the query and build the retrieval query if approved.
    pub fn screen(&self, raw: &str, progress: &dyn TurnProgress) -> Result<Screened, DomainError> {
        progress.on_stage(TurnStage::Guardrail);
        match self.guardrail.classify(raw) {
            GuardrailVerdict::Blocked { category, message } => {
                // Category only; the blocked text is never logged.
                info!(category = category.as_str(), "query blocked by guardrail");
                Ok(Screened::Blocked { category, message })
            }
            GuardrailVerdict::Approved => Ok(Screened::Approved(self.engine.query(raw)?)),
        }
    }

    pub async fn retrieve(
        &self,
        query: &RetrievalQuery,
        progress: &dyn TurnProgress,
    ) -> Result<Vec<Passage>, RetrievalError> {
        self.engine.retrieve(query, progress).await
    }

    pub async fn synthesize(
        &self,
        query: &RetrievalQuery,
        passages: &[Passage],
        progress: &dyn TurnProgress,
    ) -> SynthesisResult {
        progress.on_stage(TurnStage::Synthesis);
        self.synthesis.synthesize(&query.raw, passages).await
    }

    /// Run the whole chain outside of a session.
    ///
    /// A blocked query yields its refusal as the answer with no citations.
    pub async fn run(
        &self,
        raw: &str,
        progress: &dyn TurnProgress,
    ) -> Result<SynthesisResult, KnowledgeChainError> {
        let query = match self.screen(raw, progress)? {
            Screened::Blocked { message, .. } => {
                return Ok(SynthesisResult {
                    answer: message.to_string(),
                    citations: Vec::new(),
                    fallback: false,
                });
            }
            Screened::Approved(query) => query,
        };
        let passages = self.retrieve(&query, progress).await?;
        Ok(self.synthesize(&query, &passages, progress).await)
    }
}
