//! Synthesis stage.
//!
//! Turns ranked passages into the final answer. The configured drafter
//! writes the body; the domain composer then enforces the answer contract
//! (paragraph count, verbatim limit, acronym rendering, sources list).

use crate::config::SynthesisParams;
use crate::ports::answer_drafter::AnswerDrafter;
use crate::use_cases::drafting::ExtractiveAnswerDrafter;
use fincounsel_domain::{AnswerComposer, Draft, ExtractiveDrafter, Passage, SynthesisResult};
use std::sync::Arc;
use tracing::{debug, warn};

pub struct SynthesisStage {
    drafter: Arc<dyn AnswerDrafter>,
    composer: AnswerComposer,
    max_phrase_words: usize,
}

impl SynthesisStage {
    pub fn new(drafter: Arc<dyn AnswerDrafter>, params: SynthesisParams) -> Self {
        Self {
            drafter,
            composer: AnswerComposer::new(params.max_verbatim_words),
            max_phrase_words: params.max_verbatim_words,
        }
    }

    /// Stage using the deterministic drafter only.
    pub fn extractive(params: SynthesisParams) -> Self {
        Self::new(
            Arc::new(ExtractiveAnswerDrafter::new(params.max_verbatim_words)),
            params,
        )
    }

    pub fn drafter_name(&self) -> &'static str {
        self.drafter.name()
    }

    /// Compose an answer for `query` from `passages`.
    ///
    /// With no passages the drafter is not called and the fixed fallback
    /// answer is returned. A failing drafter falls back to the extractive
    /// draft, so this never fails.
    pub async fn synthesize(&self, query: &str, passages: &[Passage]) -> SynthesisResult {
        if passages.is_empty() {
            debug!("no passages cleared the threshold, returning fallback answer");
            return AnswerComposer::fallback();
        }

        let draft = match self.drafter.draft(query, passages).await {
            Ok(draft) if !draft.body.trim().is_empty() => draft,
            Ok(_) => self.extractive_draft(query, passages, "empty draft"),
            Err(e) => self.extractive_draft(query, passages, &e.to_string()),
        };
        if draft.body.trim().is_empty() {
            debug!("no passage yielded a usable clause, returning fallback answer");
            return AnswerComposer::fallback();
        }

        let result = self.composer.compose(&draft, passages);
        debug!(
            drafter = self.drafter.name(),
            citations = result.citations.len(),
            "answer composed"
        );
        result
    }

    fn extractive_draft(&self, query: &str, passages: &[Passage], reason: &str) -> Draft {
        warn!(
            drafter = self.drafter.name(),
            reason, "drafter failed, using extractive draft"
        );
        ExtractiveDrafter::new(self.max_phrase_words).draft(query, passages)
    }
}
