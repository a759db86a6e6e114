//! Final answer composition.
//!
//! Enforced over any draft:
//! - empty passage list → [`FALLBACK_ANSWER`], no citations
//! - 2 or 3 paragraphs
//! - copied runs limited to `max_verbatim_words`
//! - acronym first-mention expansion
//! - trailing `Sources:` block, one locator per line, in contribution order

use crate::core::messages::FALLBACK_ANSWER;
use crate::retrieval::passage::Passage;
use crate::synthesis::acronyms::render_acronyms;
use crate::synthesis::result::{Draft, SynthesisResult};
use crate::synthesis::verbatim::limit_verbatim;

pub const DEFAULT_MAX_VERBATIM_WORDS: usize = 8;
pub const MIN_PARAGRAPHS: usize = 2;
pub const MAX_PARAGRAPHS: usize = 3;

#[derive(Debug, Clone)]
pub struct AnswerComposer {
    max_verbatim_words: usize,
}

impl Default for AnswerComposer {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_VERBATIM_WORDS)
    }
}

impl AnswerComposer {
    pub fn new(max_verbatim_words: usize) -> Self {
        Self {
            max_verbatim_words: max_verbatim_words.max(1),
        }
    }

    pub fn max_verbatim_words(&self) -> usize {
        self.max_verbatim_words
    }

    /// Result used when retrieval produced no passage.
    pub fn fallback() -> SynthesisResult {
        SynthesisResult {
            answer: FALLBACK_ANSWER.to_string(),
            citations: Vec::new(),
            fallback: true,
        }
    }

    /// Apply the answer contract to `draft`.
    ///
    /// An empty draft means no passage contributed, so the fallback answer
    /// is returned rather than a body with nothing to cite.
    pub fn compose(&self, draft: &Draft, passages: &[Passage]) -> SynthesisResult {
        if passages.is_empty() || draft.body.trim().is_empty() {
            return Self::fallback();
        }

        let citations = self.citations(draft, passages);
        let sources: Vec<&str> = passages.iter().map(|p| p.text.as_str()).collect();

        // Acronym expansion lengthens text, so the verbatim limit applies after it.
        let rendered = render_acronyms(&shape_paragraphs(&draft.body, citations.len()).join("\n\n"));
        let paragraphs: Vec<String> = rendered
            .split("\n\n")
            .map(|p| limit_verbatim(p, &sources, self.max_verbatim_words))
            .collect();

        let mut answer = paragraphs.join("\n\n");
        answer.push_str("\n\nSources:");
        for citation in &citations {
            answer.push_str("\n- ");
            answer.push_str(citation);
        }

        SynthesisResult {
            answer,
            citations,
            fallback: false,
        }
    }

    fn citations(&self, draft: &Draft, passages: &[Passage]) -> Vec<String> {
        let order: Vec<usize> = if draft.contributions.is_empty() {
            (0..passages.len()).collect()
        } else {
            draft
                .contributions
                .iter()
                .copied()
                .filter(|i| *i < passages.len())
                .collect()
        };

        let mut citations: Vec<String> = Vec::new();
        for index in order {
            let locator = passages[index].locator.to_string();
            if !citations.contains(&locator) {
                citations.push(locator);
            }
        }
        if citations.is_empty() {
            citations.push(passages[0].locator.to_string());
        }
        citations
    }
}

fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut current = String::new();
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        current.push(c);
        let boundary = matches!(c, '.' | '!' | '?')
            && chars.peek().is_none_or(|next| next.is_whitespace());
        if boundary {
            let sentence = current.trim().to_string();
            if !sentence.is_empty() {
                sentences.push(sentence);
            }
            current.clear();
        }
    }
    let rest = current.trim();
    if !rest.is_empty() {
        sentences.push(rest.to_string());
    }
    sentences
}

/// Reflow `body` into 2 or 3 paragraphs.
fn shape_paragraphs(body: &str, source_count: usize) -> Vec<String> {
    let mut paragraphs: Vec<String> = body
        .split("\n\n")
        .map(|p| p.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|p| !p.is_empty())
        .collect();

    if paragraphs.len() > MAX_PARAGRAPHS {
        let tail = paragraphs.split_off(MAX_PARAGRAPHS - 1).join(" ");
        paragraphs.push(tail);
    }

    if paragraphs.len() < MIN_PARAGRAPHS {
        let sentences = split_sentences(&paragraphs.concat());
        if sentences.len() >= 2 {
            let mid = sentences.len().div_ceil(2);
            paragraphs = vec![sentences[..mid].join(" "), sentences[mid..].join(" ")];
        } else {
            paragraphs = sentences;
            paragraphs.push(format!(
                "This summary is limited to {} retrieved passage{} of the indexed material.",
                source_count,
                if source_count == 1 { "" } else { "s" }
            ));
        }
    }
    paragraphs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retrieval::passage::SourceLocator;

    fn passage(doc: &str, section: &str, text: &str) -> Passage {
        Passage {
            source_id: format!("{}#{}", doc, section),
            locator: SourceLocator::new(doc).with_section(section),
            text: text.to_string(),
            distance: 0.2,
            similarity: 1.0 / 1.2,
            rank: 0,
        }
    }

    fn body_of(answer: &str) -> &str {
        answer.split("\n\nSources:").next().unwrap()
    }

    #[test]
    fn test_empty_passages_fall_back() {
        let result = AnswerComposer::default().compose(&Draft::new("ignored"), &[]);
        assert!(result.fallback);
        assert_eq!(result.answer, FALLBACK_ANSWER);
        assert!(result.citations.is_empty());
        assert!(!result.answer.contains("Sources:"));
    }

    #[test]
    fn test_sources_block_in_contribution_order() {
        let passages = vec![
            passage("Corporate Issuers", "p. 12", "Debt is cheaper than equity."),
            passage("Equity Valuation", "p. 88", "Dividends grow at a constant rate."),
        ];
        let draft = Draft::new("Growth matters.\n\nLeverage matters.").with_contributions(vec![1, 0, 1]);
        let result = AnswerComposer::default().compose(&draft, &passages);

        assert!(!result.fallback);
        assert_eq!(
            result.citations,
            vec!["Equity Valuation, p. 88", "Corporate Issuers, p. 12"]
        );
        assert!(result.answer.ends_with(
            "Sources:\n- Equity Valuation, p. 88\n- Corporate Issuers, p. 12"
        ));
    }

    #[test]
    fn test_single_paragraph_is_split() {
        let passages = vec![passage("Fixed Income", "s. 3", "Duration measures price sensitivity.")];
        let draft = Draft::new("Duration is a sensitivity measure. It is expressed in years. Convexity refines it.");
        let result = AnswerComposer::default().compose(&draft, &passages);
        let paragraphs: Vec<_> = body_of(&result.answer).split("\n\n").collect();
        assert_eq!(paragraphs.len(), 2);
    }

    #[test]
    fn test_too_many_paragraphs_are_merged() {
        let passages = vec![passage("Portfolio", "p. 1", "Beta.")];
        let draft = Draft::new("One.\n\nTwo.\n\nThree.\n\nFour.\n\nFive.");
        let result = AnswerComposer::default().compose(&draft, &passages);
        let paragraphs: Vec<_> = body_of(&result.answer).split("\n\n").collect();
        assert_eq!(paragraphs, vec!["One.", "Two.", "Three. Four. Five."]);
    }

    #[test]
    fn test_single_sentence_gets_second_paragraph() {
        let passages = vec![passage("Derivatives", "p. 4", "A call gives the right to buy.")];
        let result = AnswerComposer::default().compose(&Draft::new("A call is a right."), &passages);
        let paragraphs: Vec<_> = body_of(&result.answer).split("\n\n").collect();
        assert_eq!(paragraphs.len(), 2);
        assert!(paragraphs[1].contains("1 retrieved passage "));
    }

    #[test]
    fn test_empty_draft_falls_back_without_citations() {
        let passages = vec![passage("Glossary", "p. 3", "Duration")];
        let result = AnswerComposer::default().compose(&Draft::new("  "), &passages);
        assert!(result.fallback);
        assert_eq!(result.answer, FALLBACK_ANSWER);
        assert!(result.citations.is_empty());
    }

    #[test]
    fn test_verbatim_limit_holds_after_acronym_expansion() {
        // Five copied words before expansion, ten after it.
        let source = "Weighted Average Cost of Capital (WACC) is the hurdle rate for projects.";
        let passages = vec![passage("Corporate Issuers", "p. 41", source)];
        let draft = Draft::new("The WACC is the hurdle rate.\n\nIt blends equity and debt.");
        let result = AnswerComposer::new(6).compose(&draft, &passages);
        let body = body_of(&result.answer);

        assert!(body.starts_with("The Weighted Average Cost of Capital (WACC)"));
        assert!(body.contains('…'));
        assert!(crate::synthesis::verbatim::longest_copied_run(body, &[source]) <= 6);
    }

    #[test]
    fn test_acronyms_and_verbatim_applied() {
        let source = "The WACC is the minimum return a company must earn on its existing asset base overall.";
        let passages = vec![passage("Corporate Issuers", "p. 40", source)];
        let draft = Draft::new(
            "The WACC is the minimum return a company must earn on its existing asset base overall.\n\nFirms compare projects against WACC.",
        );
        let result = AnswerComposer::new(6).compose(&draft, &passages);
        let body = body_of(&result.answer);

        assert!(body.starts_with("The Weighted Average Cost of Capital (WACC)"));
        assert!(body.ends_with("against WACC."));
        assert!(body.contains('…'));
    }
}
