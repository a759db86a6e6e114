//! Draft and synthesis result value objects.

use serde::{Deserialize, Serialize};

/// Unconstrained answer body produced by a drafter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Draft {
    pub body: String,
    /// Indices into the passage list, in the order they contributed.
    /// Empty means every passage contributed, in list order.
    pub contributions: Vec<usize>,
}

impl Draft {
    pub fn new(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            contributions: Vec::new(),
        }
    }

    pub fn with_contributions(mut self, contributions: Vec<usize>) -> Self {
        self.contributions = contributions;
        self
    }
}

/// Final answer of the retrieval chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SynthesisResult {
    pub answer: String,
    /// Source locators in contribution order
    pub citations: Vec<String>,
    /// No passage was available
    pub fallback: bool,
}
