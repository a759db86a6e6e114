//! Elasticsearch kNN search over a dense-vector index.
//!
//! Documents hold the passage text, its source document and section, and a
//! `dense_vector` field indexed with `l2_norm` similarity. Elasticsearch
//! reports `_score = 1 / (1 + d²)` for `l2_norm`; it is converted back to
//! the raw L2 distance so scoring stays with the retrieval engine.

use async_trait::async_trait;
use fincounsel_application::ports::vector_store::{VectorStore, VectorStoreError};
use fincounsel_domain::{SearchHit, SourceLocator};
use serde::Deserialize;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::debug;

/// Field names inside the index.
#[derive(Debug, Clone)]
pub struct IndexFields {
    pub vector: String,
    pub text: String,
    pub document: String,
    pub section: String,
}

impl Default for IndexFields {
    fn default() -> Self {
        Self {
            vector: "embedding".to_string(),
            text: "text".to_string(),
            document: "document".to_string(),
            section: "section".to_string(),
        }
    }
}

#[derive(Deserialize)]
struct SearchResponse {
    hits: Hits,
}

#[derive(Deserialize)]
struct Hits {
    hits: Vec<Hit>,
}

#[derive(Deserialize)]
struct Hit {
    #[serde(rename = "_id")]
    id: String,
    #[serde(rename = "_score")]
    score: f64,
    #[serde(rename = "_source", default)]
    source: Value,
}

pub struct ElasticsearchVectorStore {
    client: reqwest::Client,
    search_url: String,
    fields: IndexFields,
    api_key: Option<String>,
    dimension: usize,
}

impl ElasticsearchVectorStore {
    pub fn new(
        url: &str,
        index: &str,
        fields: IndexFields,
        api_key: Option<String>,
        dimension: usize,
        timeout: Duration,
    ) -> Result<Self, VectorStoreError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| VectorStoreError::Unavailable(format!("HTTP client: {}", e)))?;
        Ok(Self {
            client,
            search_url: format!("{}/{}/_search", url.trim_end_matches('/'), index),
            fields,
            api_key,
            dimension,
        })
    }

    pub fn search_url(&self) -> &str {
        &self.search_url
    }

    fn query_body(&self, vector: &[f32], k: usize) -> Value {
        json!({
            "knn": {
                "field": self.fields.vector,
                "query_vector": vector,
                "k": k,
                "num_candidates": (k * 10).max(50),
            },
            "size": k,
            "_source": [self.fields.text, self.fields.document, self.fields.section],
        })
    }

    fn parse(&self, body: &str) -> Result<Vec<SearchHit>, VectorStoreError> {
        let response: SearchResponse = serde_json::from_str(body)
            .map_err(|e| VectorStoreError::InvalidResponse(format!("JSON parse error: {}", e)))?;

        let mut hits = response
            .hits
            .hits
            .into_iter()
            .map(|hit| self.to_search_hit(hit))
            .collect::<Result<Vec<_>, _>>()?;
        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        Ok(hits)
    }

    fn to_search_hit(&self, hit: Hit) -> Result<SearchHit, VectorStoreError> {
        let field = |name: &str| hit.source.get(name).and_then(Value::as_str).map(str::to_string);
        let text = field(&self.fields.text).ok_or_else(|| {
            VectorStoreError::InvalidResponse(format!(
                "hit {} has no '{}' field",
                hit.id, self.fields.text
            ))
        })?;
        let document = field(&self.fields.document).unwrap_or_else(|| "Unknown source".to_string());
        let locator = match field(&self.fields.section) {
            Some(section) => SourceLocator::new(document).with_section(section),
            None => SourceLocator::new(document),
        };
        if !(hit.score > 0.0 && hit.score <= 1.0) {
            return Err(VectorStoreError::InvalidResponse(format!(
                "hit {} has score {} outside (0, 1]",
                hit.id, hit.score
            )));
        }

        Ok(SearchHit {
            source_id: hit.id,
            locator,
            text,
            distance: (1.0 / hit.score - 1.0).max(0.0).sqrt(),
        })
    }
}

#[async_trait]
impl VectorStore for ElasticsearchVectorStore {
    async fn search(&self, vector: &[f32], k: usize) -> Result<Vec<SearchHit>, VectorStoreError> {
        if vector.len() != self.dimension {
            return Err(VectorStoreError::DimensionMismatch {
                expected: self.dimension,
                actual: vector.len(),
            });
        }

        let mut request = self.client.post(&self.search_url).json(&self.query_body(vector, k));
        if let Some(key) = &self.api_key {
            request = request.header("Authorization", format!("ApiKey {}", key));
        }

        let response = request
            .send()
            .await
            .map_err(|e| VectorStoreError::Unavailable(format!("HTTP error: {}", e)))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| VectorStoreError::Unavailable(format!("reading body: {}", e)))?;
        if !status.is_success() {
            return Err(VectorStoreError::Unavailable(format!(
                "{} returned {}",
                self.search_url, status
            )));
        }

        let hits = self.parse(&body)?;
        debug!(hits = hits.len(), k, "Elasticsearch kNN search completed");
        Ok(hits)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}
