//! Retrieval engine.
//!
//! Embeds the enriched query, over-fetches candidates from the vector store,
//! then scores, filters and ranks them with the domain rules. Transient
//! failures of either call are retried with exponential backoff; a dimension
//! mismatch between embedder and index is fatal and never retried.

use crate::config::RetrievalParams;
use crate::ports::embedding::EmbeddingService;
use crate::ports::progress::{TurnProgress, TurnStage};
use crate::ports::vector_store::{VectorStore, VectorStoreError};
use fincounsel_domain::{DomainError, Passage, RetrievalQuery, SearchHit, rank_hits};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum RetrievalError {
    #[error("Retrieval unavailable after {attempts} attempts: {last_error}")]
    Unavailable { attempts: u32, last_error: String },

    #[error("Embedding dimension {embedding} does not match index dimension {index}")]
    DimensionMismatch { embedding: usize, index: usize },
}

impl RetrievalError {
    /// Configuration errors that retrying cannot fix.
    pub fn is_fatal(&self) -> bool {
        matches!(self, RetrievalError::DimensionMismatch { .. })
    }
}

enum AttemptError {
    Transient(String),
    Fatal(RetrievalError),
}

pub struct RetrievalEngine {
    embedder: Arc<dyn EmbeddingService>,
    store: Arc<dyn VectorStore>,
    params: RetrievalParams,
}

impl RetrievalEngine {
    /// Create an engine, rejecting an embedder and index of different
    /// dimensionality.
    pub fn new(
        embedder: Arc<dyn EmbeddingService>,
        store: Arc<dyn VectorStore>,
        params: RetrievalParams,
    ) -> Result<Self, RetrievalError> {
        if embedder.dimension() != store.dimension() {
            return Err(RetrievalError::DimensionMismatch {
                embedding: embedder.dimension(),
                index: store.dimension(),
            });
        }
        Ok(Self {
            embedder,
            store,
            params,
        })
    }

    pub fn params(&self) -> &RetrievalParams {
        &self.params
    }

    /// Build a validated query with the configured `k` and threshold.
    pub fn query(&self, raw: &str) -> Result<RetrievalQuery, DomainError> {
        RetrievalQuery::new(raw, self.params.k, self.params.min_similarity)
    }

    /// Fetch, score and filter passages for `query`.
    ///
    /// An empty list is a valid result.
    pub async fn retrieve(
        &self,
        query: &RetrievalQuery,
        progress: &dyn TurnProgress,
    ) -> Result<Vec<Passage>, RetrievalError> {
        let max_attempts = self.params.max_attempts.max(1);
        let mut last_error = String::new();

        for attempt in 1..=max_attempts {
            progress.on_stage(TurnStage::Retrieval { attempt });
            match self.attempt(query).await {
                Ok(hits) => {
                    let candidates = hits.len();
                    let passages = rank_hits(hits, query, self.params.transform);
                    debug!(
                        attempt,
                        candidates,
                        kept = passages.len(),
                        min_similarity = query.min_similarity,
                        "retrieval completed"
                    );
                    return Ok(passages);
                }
                Err(AttemptError::Fatal(e)) => return Err(e),
                Err(AttemptError::Transient(message)) => {
                    warn!(attempt, max_attempts, error = %message, "retrieval attempt failed");
                    last_error = message;
                    if attempt < max_attempts {
                        tokio::time::sleep(self.params.backoff_for(attempt)).await;
                    }
                }
            }
        }

        Err(RetrievalError::Unavailable {
            attempts: max_attempts,
            last_error,
        })
    }

    async fn attempt(&self, query: &RetrievalQuery) -> Result<Vec<SearchHit>, AttemptError> {
        let timeout = self.params.call_timeout;

        let vector = tokio::time::timeout(timeout, self.embedder.embed(&query.enriched))
            .await
            .map_err(|_| AttemptError::Transient(format!("embedding timed out after {:?}", timeout)))?
            .map_err(|e| AttemptError::Transient(e.to_string()))?;

        if vector.len() != self.store.dimension() {
            return Err(AttemptError::Fatal(RetrievalError::DimensionMismatch {
                embedding: vector.len(),
                index: self.store.dimension(),
            }));
        }

        let candidates = query.candidate_count(self.params.overfetch_factor);
        tokio::time::timeout(timeout, self.store.search(&vector, candidates))
            .await
            .map_err(|_| AttemptError::Transient(format!("search timed out after {:?}", timeout)))?
            .map_err(|e| match e {
                VectorStoreError::DimensionMismatch { expected, actual } => {
                    AttemptError::Fatal(RetrievalError::DimensionMismatch {
                        embedding: actual,
                        index: expected,
                    })
                }
                other => AttemptError::Transient(other.to_string()),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::embedding::EmbeddingError;
    use crate::ports::progress::NoProgress;
    use crate::use_cases::test_support::{MockEmbedder, MockVectorStore, hit_with_similarity};
    use std::time::Duration;

    fn engine(store: Arc<MockVectorStore>, params: RetrievalParams) -> RetrievalEngine {
        RetrievalEngine::new(Arc::new(MockEmbedder::new(4)), store, params).unwrap()
    }

    #[tokio::test]
    async fn test_filters_by_threshold_and_overfetches() {
        let store = Arc::new(MockVectorStore::new(4).with_response(Ok(vec![
            hit_with_similarity("a", 0.72),
            hit_with_similarity("b", 0.61),
            hit_with_similarity("c", 0.30),
        ])));
        let engine = engine(store.clone(), RetrievalParams::default().with_k(5).with_min_similarity(0.5));

        let query = engine.query("explain the cost of capital").unwrap();
        let passages = engine.retrieve(&query, &NoProgress).await.unwrap();

        assert_eq!(passages.len(), 2);
        assert!((passages[0].similarity - 0.72).abs() < 1e-9);
        assert!((passages[1].similarity - 0.61).abs() < 1e-9);
        assert_eq!(store.requested_k(), vec![10]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_transient_failure() {
        let store = Arc::new(
            MockVectorStore::new(4)
                .with_response(Err(VectorStoreError::Unavailable("connection refused".into())))
                .with_response(Ok(vec![hit_with_similarity("a", 0.9)])),
        );
        let engine = engine(store.clone(), RetrievalParams::default());

        let query = engine.query("duration").unwrap();
        let passages = engine.retrieve(&query, &NoProgress).await.unwrap();

        assert_eq!(passages.len(), 1);
        assert_eq!(store.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_embedding_failure_is_retried() {
        let store = Arc::new(
            MockVectorStore::new(4).with_response(Ok(vec![hit_with_similarity("a", 0.8)])),
        );
        let embedder = Arc::new(
            MockEmbedder::new(4).with_failure(EmbeddingError::Unavailable("503".into())),
        );
        let engine = RetrievalEngine::new(embedder, store.clone(), RetrievalParams::default()).unwrap();

        let query = engine.query("yield to maturity").unwrap();
        let passages = engine.retrieve(&query, &NoProgress).await.unwrap();

        assert_eq!(passages.len(), 1);
        assert_eq!(store.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_retries_report_unavailable() {
        let store = Arc::new(
            MockVectorStore::new(4)
                .with_response(Err(VectorStoreError::Unavailable("down".into())))
                .with_response(Err(VectorStoreError::Unavailable("still down".into()))),
        );
        let engine = engine(store.clone(), RetrievalParams::default().with_max_attempts(2));

        let query = engine.query("convexity").unwrap();
        let err = engine.retrieve(&query, &NoProgress).await.unwrap_err();

        match err {
            RetrievalError::Unavailable { attempts, last_error } => {
                assert_eq!(attempts, 2);
                assert!(last_error.contains("still down"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(!RetrievalError::Unavailable { attempts: 1, last_error: String::new() }.is_fatal());
        assert_eq!(store.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_store_times_out() {
        let store = Arc::new(
            MockVectorStore::new(4)
                .with_delay(Duration::from_secs(30))
                .with_response(Ok(vec![]))
                .with_response(Ok(vec![])),
        );
        let engine = engine(
            store.clone(),
            RetrievalParams::default().with_call_timeout(Duration::from_secs(1)),
        );

        let query = engine.query("beta").unwrap();
        let err = engine.retrieve(&query, &NoProgress).await.unwrap_err();
        assert!(err.to_string().contains("timed out"));
    }

    #[tokio::test]
    async fn test_empty_result_is_not_an_error() {
        let store = Arc::new(MockVectorStore::new(4).with_response(Ok(vec![hit_with_similarity("a", 0.2)])));
        let engine = engine(store, RetrievalParams::default().with_min_similarity(0.5));
        let query = engine.query("obscure topic").unwrap();
        assert!(engine.retrieve(&query, &NoProgress).await.unwrap().is_empty());
    }

    #[test]
    fn test_dimension_mismatch_is_fatal_at_construction() {
        let result = RetrievalEngine::new(
            Arc::new(MockEmbedder::new(384)),
            Arc::new(MockVectorStore::new(768)),
            RetrievalParams::default(),
        );
        match result {
            Err(err) => assert!(err.is_fatal()),
            Ok(_) => panic!("expected dimension mismatch"),
        }
    }

    #[tokio::test]
    async fn test_dimension_mismatch_from_store_is_not_retried() {
        let store = Arc::new(MockVectorStore::new(4).with_response(Err(
            VectorStoreError::DimensionMismatch {
                expected: 4,
                actual: 3,
            },
        )));
        let engine = engine(store.clone(), RetrievalParams::default().with_max_attempts(3));
        let query = engine.query("wacc").unwrap();
        let err = engine.retrieve(&query, &NoProgress).await.unwrap_err();
        assert!(err.is_fatal());
        assert_eq!(store.calls(), 1);
    }
}
