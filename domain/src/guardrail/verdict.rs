//! Guardrail verdicts and categories.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Restricted extraction pattern, in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GuardrailCategory {
    VerbatimTranscription,
    FullSection,
    SpecificPage,
    VerbatimQuote,
    StructureOutline,
}

const COPY_REFUSAL: &str = "Out of respect for the authors' copyright, I can't provide literal copies, \
transcriptions or reproductions of the source material. I can explain a concept in my own words, \
work through a specific calculation, or compare related models. Please rephrase your question \
around the idea or calculation you want to understand.";

const OUTLINE_REFUSAL: &str = "Out of respect for the authors' copyright, I can't reproduce the full \
structure, index or outline of the source material. Ask me about a specific topic instead, for \
example \"Explain WACC\" or \"How does duration work?\".";

impl GuardrailCategory {
    /// Evaluation order. The first matching category wins.
    pub const ORDERED: [GuardrailCategory; 5] = [
        GuardrailCategory::VerbatimTranscription,
        GuardrailCategory::FullSection,
        GuardrailCategory::SpecificPage,
        GuardrailCategory::VerbatimQuote,
        GuardrailCategory::StructureOutline,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            GuardrailCategory::VerbatimTranscription => "verbatim_transcription",
            GuardrailCategory::FullSection => "full_section",
            GuardrailCategory::SpecificPage => "specific_page",
            GuardrailCategory::VerbatimQuote => "verbatim_quote",
            GuardrailCategory::StructureOutline => "structure_outline",
        }
    }

    /// Constant explanatory message returned to the user.
    pub fn message(&self) -> &'static str {
        match self {
            GuardrailCategory::StructureOutline => OUTLINE_REFUSAL,
            _ => COPY_REFUSAL,
        }
    }
}

impl fmt::Display for GuardrailCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of classifying one query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardrailVerdict {
    Approved,
    Blocked {
        category: GuardrailCategory,
        message: &'static str,
    },
}

impl GuardrailVerdict {
    pub fn blocked(category: GuardrailCategory) -> Self {
        GuardrailVerdict::Blocked {
            category,
            message: category.message(),
        }
    }

    pub fn is_approved(&self) -> bool {
        matches!(self, GuardrailVerdict::Approved)
    }

    pub fn category(&self) -> Option<GuardrailCategory> {
        match self {
            GuardrailVerdict::Approved => None,
            GuardrailVerdict::Blocked { category, .. } => Some(*category),
        }
    }
}

/// Classifies raw query text before it reaches retrieval.
///
/// Implementations must be deterministic: the same text always yields the
/// same verdict.
pub trait QueryGuardrail: Send + Sync {
    fn classify(&self, text: &str) -> GuardrailVerdict;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blocked_carries_category_message() {
        let verdict = GuardrailVerdict::blocked(GuardrailCategory::StructureOutline);
        assert!(!verdict.is_approved());
        assert_eq!(verdict.category(), Some(GuardrailCategory::StructureOutline));
        match verdict {
            GuardrailVerdict::Blocked { message, .. } => assert_eq!(message, OUTLINE_REFUSAL),
            GuardrailVerdict::Approved => panic!("expected blocked"),
        }
    }

    #[test]
    fn test_copy_categories_share_refusal() {
        assert_eq!(
            GuardrailCategory::SpecificPage.message(),
            GuardrailCategory::VerbatimTranscription.message()
        );
    }
}
