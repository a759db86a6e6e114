//! External service configuration from TOML (`[llm]`, `[embedding]`, `[vector_store]`)
//!
//! Credentials are never read from the file; each section names the
//! environment variable that holds its key.

use serde::{Deserialize, Serialize};

fn env_key(var: &str) -> Option<String> {
    std::env::var(var).ok().filter(|k| !k.trim().is_empty())
}

/// Anthropic Messages API configuration (used by the `llm` drafter).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLlmConfig {
    pub model: String,
    /// Environment variable name for the API key
    pub api_key_env: String,
    pub base_url: String,
    pub max_tokens: u32,
    /// Anthropic API version header
    pub api_version: String,
    pub timeout_secs: u64,
}

impl Default for FileLlmConfig {
    fn default() -> Self {
        Self {
            model: "claude-sonnet-4-5".to_string(),
            api_key_env: "ANTHROPIC_API_KEY".to_string(),
            base_url: "https://api.anthropic.com".to_string(),
            max_tokens: 1024,
            api_version: "2023-06-01".to_string(),
            timeout_secs: 30,
        }
    }
}

impl FileLlmConfig {
    pub fn api_key(&self) -> Option<String> {
        env_key(&self.api_key_env)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProvider {
    /// Deterministic feature hashing, no network
    #[default]
    Hashing,
    /// OpenAI-compatible `/embeddings` endpoint
    Http,
}

/// Raw embedding configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileEmbeddingConfig {
    pub provider: EmbeddingProvider,
    pub dimension: usize,
    pub model: String,
    pub base_url: String,
    pub api_key_env: String,
    pub timeout_secs: u64,
}

impl Default for FileEmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: EmbeddingProvider::Hashing,
            dimension: 384,
            model: "text-embedding-3-small".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            timeout_secs: 10,
        }
    }
}

impl FileEmbeddingConfig {
    pub fn api_key(&self) -> Option<String> {
        env_key(&self.api_key_env)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VectorStoreProvider {
    /// JSONL corpus loaded into memory
    #[default]
    Memory,
    /// Elasticsearch kNN search
    Elasticsearch,
}

/// Raw vector store configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileVectorStoreConfig {
    pub provider: VectorStoreProvider,
    /// JSONL corpus for the memory store
    pub corpus_path: Option<String>,
    pub url: String,
    pub index: String,
    pub vector_field: String,
    pub text_field: String,
    pub document_field: String,
    pub section_field: String,
    /// Environment variable holding an Elasticsearch API key
    pub api_key_env: String,
    pub timeout_secs: u64,
}

impl Default for FileVectorStoreConfig {
    fn default() -> Self {
        Self {
            provider: VectorStoreProvider::Memory,
            corpus_path: None,
            url: "http://localhost:9200".to_string(),
            index: "study-material".to_string(),
            vector_field: "embedding".to_string(),
            text_field: "text".to_string(),
            document_field: "document".to_string(),
            section_field: "section".to_string(),
            api_key_env: "ELASTICSEARCH_API_KEY".to_string(),
            timeout_secs: 10,
        }
    }
}

impl FileVectorStoreConfig {
    pub fn api_key(&self) -> Option<String> {
        env_key(&self.api_key_env)
    }
}
