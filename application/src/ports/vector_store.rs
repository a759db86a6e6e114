//! Vector store port

use async_trait::async_trait;
use fincounsel_domain::SearchHit;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum VectorStoreError {
    #[error("Vector store unavailable: {0}")]
    Unavailable(String),

    #[error("Query vector has dimension {actual}, index expects {expected}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Invalid vector store response: {0}")]
    InvalidResponse(String),
}

/// Nearest-neighbour search over the indexed corpus.
///
/// Results are ordered by ascending distance. The index was built with the
/// same metric and dimensionality that queries use.
#[async_trait]
pub trait VectorStore: Send + Sync {
    async fn search(&self, vector: &[f32], k: usize) -> Result<Vec<SearchHit>, VectorStoreError>;

    /// Dimensionality of the indexed vectors
    fn dimension(&self) -> usize;
}
