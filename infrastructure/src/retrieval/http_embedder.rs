//! OpenAI-compatible `/embeddings` client.

use async_trait::async_trait;
use fincounsel_application::ports::embedding::{EmbeddingError, EmbeddingService};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: [&'a str; 1],
}

#[derive(Deserialize)]
struct EmbedResponse {
    data: Vec<EmbedData>,
}

#[derive(Deserialize)]
struct EmbedData {
    embedding: Vec<f32>,
}

/// Embedding client for any service speaking the OpenAI embeddings schema.
///
/// A single attempt per call; retries belong to the retrieval engine.
pub struct HttpEmbeddingService {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
    dimension: usize,
}

impl HttpEmbeddingService {
    pub fn new(
        base_url: &str,
        model: impl Into<String>,
        api_key: Option<String>,
        dimension: usize,
        timeout: Duration,
    ) -> Result<Self, EmbeddingError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| EmbeddingError::Unavailable(format!("HTTP client: {}", e)))?;
        Ok(Self {
            client,
            endpoint: format!("{}/embeddings", base_url.trim_end_matches('/')),
            model: model.into(),
            api_key,
            dimension,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn parse(&self, body: &str) -> Result<Vec<f32>, EmbeddingError> {
        let response: EmbedResponse = serde_json::from_str(body)
            .map_err(|e| EmbeddingError::InvalidResponse(format!("JSON parse error: {}", e)))?;
        let vector = response
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| EmbeddingError::InvalidResponse("empty data array".into()))?;
        if vector.len() != self.dimension {
            return Err(EmbeddingError::InvalidResponse(format!(
                "expected {} dimensions, got {}",
                self.dimension,
                vector.len()
            )));
        }
        Ok(vector)
    }
}

#[async_trait]
impl EmbeddingService for HttpEmbeddingService {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let mut request = self.client.post(&self.endpoint).json(&EmbedRequest {
            model: &self.model,
            input: [text],
        });
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| EmbeddingError::Unavailable(format!("HTTP error: {}", e)))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| EmbeddingError::Unavailable(format!("reading body: {}", e)))?;
        if !status.is_success() {
            return Err(EmbeddingError::Unavailable(format!(
                "{} returned {}",
                self.endpoint, status
            )));
        }

        debug!(model = %self.model, bytes = body.len(), "Embedding response received");
        self.parse(&body)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}
