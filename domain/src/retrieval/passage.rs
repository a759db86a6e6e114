//! Retrieval query, raw search hits and ranked passages.

use crate::core::error::DomainError;
use crate::retrieval::enrichment::enrich_query;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a passage came from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceLocator {
    pub document: String,
    /// Page or section label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
}

impl SourceLocator {
    pub fn new(document: impl Into<String>) -> Self {
        Self {
            document: document.into(),
            section: None,
        }
    }

    pub fn with_section(mut self, section: impl Into<String>) -> Self {
        self.section = Some(section.into());
        self
    }
}

impl fmt::Display for SourceLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.section {
            Some(section) => write!(f, "{}, {}", self.document, section),
            None => f.write_str(&self.document),
        }
    }
}

/// One candidate returned by a vector store, before scoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub source_id: String,
    pub locator: SourceLocator,
    pub text: String,
    pub distance: f64,
}

/// A scored passage eligible for synthesis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Passage {
    pub source_id: String,
    pub locator: SourceLocator,
    pub text: String,
    /// Raw distance reported by the vector store
    pub distance: f64,
    /// Derived similarity in [0, 1]
    pub similarity: f64,
    /// Position in the vector store's result list
    pub rank: usize,
}

/// Validated retrieval parameters for one query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalQuery {
    pub raw: String,
    /// Raw text plus bilingual term expansions
    pub enriched: String,
    pub k: usize,
    pub min_similarity: f64,
}

impl RetrievalQuery {
    pub fn new(raw: impl Into<String>, k: usize, min_similarity: f64) -> Result<Self, DomainError> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            return Err(DomainError::EmptyQuery);
        }
        if k == 0 {
            return Err(DomainError::InvalidRetrievalParams(
                "k must be at least 1".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&min_similarity) {
            return Err(DomainError::InvalidRetrievalParams(format!(
                "min_similarity must be within [0, 1], got {}",
                min_similarity
            )));
        }
        let enriched = enrich_query(&raw);
        Ok(Self {
            raw,
            enriched,
            k,
            min_similarity,
        })
    }

    /// Number of candidates to request from the vector store.
    pub fn candidate_count(&self, overfetch_factor: usize) -> usize {
        self.k.saturating_mul(overfetch_factor.max(1))
    }
}
