//! Embedding service port

use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EmbeddingError {
    #[error("Embedding service unavailable: {0}")]
    Unavailable(String),

    #[error("Invalid embedding response: {0}")]
    InvalidResponse(String),
}

/// Turns text into a fixed-length vector.
///
/// Every vector returned has length [`EmbeddingService::dimension`].
#[async_trait]
pub trait EmbeddingService: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;

    fn dimension(&self) -> usize;
}
