//! Drafter selection value object

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which drafter writes the answer body before the composer constrains it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DrafterKind {
    /// Deterministic key-phrase drafter (default, no model call)
    #[default]
    Extractive,
    /// Language model drafter, falling back to extractive on failure
    Llm,
}

impl fmt::Display for DrafterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DrafterKind::Extractive => write!(f, "extractive"),
            DrafterKind::Llm => write!(f, "llm"),
        }
    }
}

impl std::str::FromStr for DrafterKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "extractive" => Ok(DrafterKind::Extractive),
            "llm" => Ok(DrafterKind::Llm),
            _ => Err(format!("Invalid DrafterKind: {}", s)),
        }
    }
}
