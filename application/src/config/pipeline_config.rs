//! Pipeline configuration container.
//!
//! [`PipelineConfig`] groups the split parameter types so the wiring code can
//! pass one value around. Use cases receive only the slices they need.

use crate::config::{BreakerParams, RetrievalParams, SessionParams, SynthesisParams};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PipelineConfig {
    pub retrieval: RetrievalParams,
    pub breaker: BreakerParams,
    pub synthesis: SynthesisParams,
    pub session: SessionParams,
}

impl PipelineConfig {
    pub fn new(
        retrieval: RetrievalParams,
        breaker: BreakerParams,
        synthesis: SynthesisParams,
        session: SessionParams,
    ) -> Self {
        Self {
            retrieval,
            breaker,
            synthesis,
            session,
        }
    }

    pub fn with_retrieval(mut self, retrieval: RetrievalParams) -> Self {
        self.retrieval = retrieval;
        self
    }

    pub fn with_breaker(mut self, breaker: BreakerParams) -> Self {
        self.breaker = breaker;
        self
    }

    pub fn with_synthesis(mut self, synthesis: SynthesisParams) -> Self {
        self.synthesis = synthesis;
        self
    }

    pub fn with_session(mut self, session: SessionParams) -> Self {
        self.session = session;
        self
    }
}
