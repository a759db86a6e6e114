//! Exhaustive L2 search over an in-memory corpus.
//!
//! The corpus file is JSON Lines, one passage per line:
//!
//! ```json
//! {"id": "cf-12", "document": "Corporate Finance Notes", "section": "p. 12", "text": "...", "embedding": [0.1, ...]}
//! ```
//!
//! `section` and `embedding` are optional; passages without a vector are
//! embedded at load time with the configured [`EmbeddingService`].

use async_trait::async_trait;
use fincounsel_application::ports::embedding::EmbeddingService;
use fincounsel_application::ports::vector_store::{VectorStore, VectorStoreError};
use fincounsel_domain::{SearchHit, SourceLocator};
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum CorpusError {
    #[error("Could not read corpus {path}: {message}")]
    Io { path: String, message: String },

    #[error("Corpus line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("Corpus line {line}: vector has dimension {actual}, expected {expected}")]
    Dimension {
        line: usize,
        expected: usize,
        actual: usize,
    },

    #[error("Corpus line {line}: embedding failed: {message}")]
    Embedding { line: usize, message: String },
}

#[derive(Debug, Deserialize)]
struct CorpusLine {
    id: String,
    document: String,
    #[serde(default)]
    section: Option<String>,
    text: String,
    #[serde(default)]
    embedding: Option<Vec<f32>>,
}

#[derive(Debug, Clone)]
struct Entry {
    id: String,
    locator: SourceLocator,
    text: String,
    vector: Vec<f32>,
}

pub struct InMemoryVectorStore {
    dimension: usize,
    entries: Vec<Entry>,
}

impl InMemoryVectorStore {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            entries: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn insert(
        &mut self,
        id: impl Into<String>,
        locator: SourceLocator,
        text: impl Into<String>,
        vector: Vec<f32>,
    ) -> Result<(), VectorStoreError> {
        if vector.len() != self.dimension {
            return Err(VectorStoreError::DimensionMismatch {
                expected: self.dimension,
                actual: vector.len(),
            });
        }
        self.entries.push(Entry {
            id: id.into(),
            locator,
            text: text.into(),
            vector,
        });
        Ok(())
    }

    /// Load a JSONL corpus, embedding passages that carry no vector.
    pub async fn load_jsonl(
        path: impl AsRef<Path>,
        embedder: &dyn EmbeddingService,
    ) -> Result<Self, CorpusError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| CorpusError::Io {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;

        let dimension = embedder.dimension();
        let mut store = Self::new(dimension);
        let mut embedded = 0usize;

        for (index, raw) in content.lines().enumerate() {
            let line = index + 1;
            if raw.trim().is_empty() {
                continue;
            }
            let entry: CorpusLine = serde_json::from_str(raw).map_err(|e| CorpusError::Parse {
                line,
                message: e.to_string(),
            })?;

            let vector = match entry.embedding {
                Some(vector) => vector,
                None => {
                    embedded += 1;
                    embedder
                        .embed(&entry.text)
                        .await
                        .map_err(|e| CorpusError::Embedding {
                            line,
                            message: e.to_string(),
                        })?
                }
            };

            let locator = match entry.section {
                Some(section) => SourceLocator::new(entry.document).with_section(section),
                None => SourceLocator::new(entry.document),
            };
            store
                .insert(entry.id, locator, entry.text, vector)
                .map_err(|e| match e {
                    VectorStoreError::DimensionMismatch { expected, actual } => {
                        CorpusError::Dimension {
                            line,
                            expected,
                            actual,
                        }
                    }
                    other => CorpusError::Parse {
                        line,
                        message: other.to_string(),
                    },
                })?;
        }

        info!(
            path = %path.display(),
            passages = store.len(),
            embedded,
            "Loaded corpus"
        );
        Ok(store)
    }
}

fn l2_distance(a: &[f32], b: &[f32]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| f64::from(x - y).powi(2))
        .sum::<f64>()
        .sqrt()
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn search(&self, vector: &[f32], k: usize) -> Result<Vec<SearchHit>, VectorStoreError> {
        if vector.len() != self.dimension {
            return Err(VectorStoreError::DimensionMismatch {
                expected: self.dimension,
                actual: vector.len(),
            });
        }

        let mut hits: Vec<SearchHit> = self
            .entries
            .iter()
            .map(|entry| SearchHit {
                source_id: entry.id.clone(),
                locator: entry.locator.clone(),
                text: entry.text.clone(),
                distance: l2_distance(vector, &entry.vector),
            })
            .collect();
        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits.truncate(k);
        Ok(hits)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retrieval::HashingEmbedder;

    #[tokio::test]
    async fn test_search_orders_by_ascending_distance() {
        let mut store = InMemoryVectorStore::new(2);
        store
            .insert("far", SourceLocator::new("Notes"), "far", vec![3.0, 4.0])
            .unwrap();
        store
            .insert("near", SourceLocator::new("Notes"), "near", vec![0.0, 1.0])
            .unwrap();
        store
            .insert("exact", SourceLocator::new("Notes"), "exact", vec![0.0, 0.0])
            .unwrap();

        let hits = store.search(&[0.0, 0.0], 2).await.unwrap();
        let ids: Vec<_> = hits.iter().map(|h| h.source_id.as_str()).collect();
        assert_eq!(ids, vec!["exact", "near"]);
        assert_eq!(hits[0].distance, 0.0);
        assert_eq!(hits[1].distance, 1.0);
    }

    #[tokio::test]
    async fn test_query_dimension_is_checked() {
        let store = InMemoryVectorStore::new(3);
        let err = store.search(&[1.0, 0.0], 1).await.unwrap_err();
        assert!(matches!(
            err,
            VectorStoreError::DimensionMismatch {
                expected: 3,
                actual: 2
            }
        ));
    }

    #[tokio::test]
    async fn test_load_jsonl_embeds_missing_vectors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("corpus.jsonl");
        std::fs::write(
            &path,
            concat!(
                r#"{"id": "cf-1", "document": "Corporate Finance Notes", "section": "p. 12", "text": "WACC blends the cost of equity and the after-tax cost of debt."}"#,
                "\n\n",
                r#"{"id": "opt-1", "document": "Derivatives Primer", "text": "A call option gives the right to buy at the strike price."}"#,
                "\n",
            ),
        )
        .unwrap();

        let embedder = HashingEmbedder::new(128);
        let store = InMemoryVectorStore::load_jsonl(&path, &embedder).await.unwrap();
        assert_eq!(store.len(), 2);

        let query = embedder.embed_text("cost of equity and cost of debt");
        let hits = store.search(&query, 1).await.unwrap();
        assert_eq!(hits[0].source_id, "cf-1");
        assert_eq!(hits[0].locator.to_string(), "Corporate Finance Notes, p. 12");
    }

    #[tokio::test]
    async fn test_load_jsonl_reports_bad_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("corpus.jsonl");
        std::fs::write(
            &path,
            r#"{"id": "x", "document": "Notes", "text": "t", "embedding": [1.0, 2.0]}"#,
        )
        .unwrap();

        let embedder = HashingEmbedder::new(4);
        let err = InMemoryVectorStore::load_jsonl(&path, &embedder)
            .await
            .err()
            .unwrap();
        assert!(matches!(
            err,
            CorpusError::Dimension {
                line: 1,
                expected: 4,
                actual: 2
            }
        ));

        std::fs::write(&path, "not json\n").unwrap();
        let err = InMemoryVectorStore::load_jsonl(&path, &embedder)
            .await
            .err()
            .unwrap();
        assert!(matches!(err, CorpusError::Parse { line: 1, .. }));
    }
}
