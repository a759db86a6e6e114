//! Answer drafters.
//!
//! [`ExtractiveAnswerDrafter`] is deterministic and needs no external
//! service. [`LlmAnswerDrafter`] asks a model to paraphrase the numbered
//! passages and reads the `[n]` markers it leaves to learn which passages
//! contributed.

use crate::ports::answer_drafter::{AnswerDrafter, SynthesisError};
use crate::ports::llm_gateway::LlmGateway;
use async_trait::async_trait;
use fincounsel_domain::{Draft, ExtractiveDrafter, Passage};
use regex::Regex;
use std::sync::{Arc, LazyLock};
use tracing::debug;

/// Wraps the domain's key-phrase drafter.
pub struct ExtractiveAnswerDrafter {
    inner: ExtractiveDrafter,
}

impl ExtractiveAnswerDrafter {
    pub fn new(max_phrase_words: usize) -> Self {
        Self {
            inner: ExtractiveDrafter::new(max_phrase_words),
        }
    }
}

#[async_trait]
impl AnswerDrafter for ExtractiveAnswerDrafter {
    async fn draft(&self, query: &str, passages: &[Passage]) -> Result<Draft, SynthesisError> {
        let draft = self.inner.draft(query, passages);
        if draft.body.trim().is_empty() {
            return Err(SynthesisError::EmptyDraft);
        }
        Ok(draft)
    }

    fn name(&self) -> &'static str {
        "extractive"
    }
}

const SYSTEM_PROMPT: &str = "You are a finance tutor answering from study material. \
Use only the numbered passages you are given. Paraphrase in your own words and never copy \
more than a few consecutive words. Do not invent facts, figures or sources. \
Write two or three short paragraphs and mark each statement with the passage number it \
comes from, like [1] or [2]. Answer in the language of the question.";

static MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*\[(\d{1,2})\]").expect("valid marker regex"));

/// Model-backed drafter.
pub struct LlmAnswerDrafter {
    gateway: Arc<dyn LlmGateway>,
}

impl LlmAnswerDrafter {
    pub fn new(gateway: Arc<dyn LlmGateway>) -> Self {
        Self { gateway }
    }

    fn build_prompt(query: &str, passages: &[Passage]) -> String {
        let mut prompt = String::from("Passages:\n");
        for (i, passage) in passages.iter().enumerate() {
            prompt.push_str(&format!("[{}] ({}) {}\n", i + 1, passage.locator, passage.text));
        }
        prompt.push_str(&format!("\nQuestion: {}\n", query));
        prompt
    }
}

/// Strip `[n]` markers and collect the passage indices in first-use order.
/// Markers outside `1..=passage_count` are dropped.
fn extract_contributions(body: &str, passage_count: usize) -> (String, Vec<usize>) {
    let mut contributions = Vec::new();
    for caps in MARKER.captures_iter(body) {
        if let Ok(n) = caps[1].parse::<usize>()
            && (1..=passage_count).contains(&n)
            && !contributions.contains(&(n - 1))
        {
            contributions.push(n - 1);
        }
    }
    let cleaned = MARKER.replace_all(body, "").trim().to_string();
    (cleaned, contributions)
}

#[async_trait]
impl AnswerDrafter for LlmAnswerDrafter {
    async fn draft(&self, query: &str, passages: &[Passage]) -> Result<Draft, SynthesisError> {
        let prompt = Self::build_prompt(query, passages);
        let response = self.gateway.complete(SYSTEM_PROMPT, &prompt).await?;

        let (body, contributions) = extract_contributions(&response, passages.len());
        if body.is_empty() {
            return Err(SynthesisError::EmptyDraft);
        }
        debug!(
            model = self.gateway.model_name(),
            cited = contributions.len(),
            "LLM draft received"
        );
        Ok(Draft::new(body).with_contributions(contributions))
    }

    fn name(&self) -> &'static str {
        "llm"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::llm_gateway::GatewayError;
    use crate::use_cases::test_support::MockGateway;
    use fincounsel_domain::SourceLocator;

    fn passage(doc: &str, text: &str) -> Passage {
        Passage {
            source_id: doc.to_string(),
            locator: SourceLocator::new(doc),
            text: text.to_string(),
            distance: 0.2,
            similarity: 0.83,
            rank: 0,
        }
    }

    #[test]
    fn test_markers_give_contribution_order() {
        let (body, contributions) =
            extract_contributions("Duration measures rate risk [2]. It is a weighted time [1][2].", 2);
        assert_eq!(body, "Duration measures rate risk. It is a weighted time.");
        assert_eq!(contributions, vec![1, 0]);
    }

    #[test]
    fn test_out_of_range_markers_are_ignored() {
        let (_, contributions) = extract_contributions("Claim [7]. Other [1].", 2);
        assert_eq!(contributions, vec![0]);
    }

    #[tokio::test]
    async fn test_llm_drafter_numbers_passages_in_prompt() {
        let gateway = Arc::new(
            MockGateway::new().with_response(Ok("Convexity refines duration [1].".to_string())),
        );
        let drafter = LlmAnswerDrafter::new(gateway.clone());
        let passages = vec![passage("Bonds", "Convexity is the curvature of the price-yield curve.")];

        let draft = drafter.draft("What is convexity?", &passages).await.unwrap();
        assert_eq!(draft.body, "Convexity refines duration.");
        assert_eq!(draft.contributions, vec![0]);

        let prompt = &gateway.prompts()[0];
        assert!(prompt.contains("[1] (Bonds) Convexity is the curvature"));
        assert!(prompt.contains("Question: What is convexity?"));
    }

    #[tokio::test]
    async fn test_llm_drafter_propagates_gateway_errors() {
        let gateway = Arc::new(MockGateway::new().with_response(Err(GatewayError::Timeout)));
        let drafter = LlmAnswerDrafter::new(gateway);
        let result = drafter.draft("q", &[passage("Bonds", "text here")]).await;
        assert!(matches!(result, Err(SynthesisError::Gateway(GatewayError::Timeout))));
    }

    #[tokio::test]
    async fn test_extractive_drafter_rejects_empty_draft() {
        let drafter = ExtractiveAnswerDrafter::new(8);
        let result = drafter.draft("anything", &[passage("Notes", "x")]).await;
        assert!(matches!(result, Err(SynthesisError::EmptyDraft)));
    }
}
