//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! They are deserialized directly and use domain types where appropriate.

mod output;
mod pipeline;
mod providers;

pub use output::{FileLoggingConfig, FileOutputConfig, FileOutputFormat, FileReplConfig};
pub use pipeline::{FileBreakerConfig, FileRetrievalConfig, FileSessionConfig, FileSynthesisConfig};
pub use providers::{
    EmbeddingProvider, FileEmbeddingConfig, FileLlmConfig, FileVectorStoreConfig,
    VectorStoreProvider,
};

use fincounsel_application::PipelineConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration validation errors
#[derive(Error, Debug, PartialEq)]
pub enum ConfigValidationError {
    #[error("retrieval.k must be at least 1")]
    InvalidResultCount,

    #[error("retrieval.min_similarity must be in (0, 1], got {0}")]
    InvalidSimilarityThreshold(f64),

    #[error("{0} cannot be 0")]
    ZeroValue(&'static str),

    #[error("{0} cannot be empty")]
    EmptyValue(&'static str),
}

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub retrieval: FileRetrievalConfig,
    pub breaker: FileBreakerConfig,
    pub synthesis: FileSynthesisConfig,
    pub session: FileSessionConfig,
    /// Anthropic settings for the `llm` drafter
    pub llm: FileLlmConfig,
    pub embedding: FileEmbeddingConfig,
    pub vector_store: FileVectorStoreConfig,
    pub logging: FileLoggingConfig,
    pub output: FileOutputConfig,
    pub repl: FileReplConfig,
}

impl FileConfig {
    /// Validate the configuration, stopping at the first problem found.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.retrieval.k == 0 {
            return Err(ConfigValidationError::InvalidResultCount);
        }
        let threshold = self.retrieval.min_similarity;
        if !(threshold > 0.0 && threshold <= 1.0) {
            return Err(ConfigValidationError::InvalidSimilarityThreshold(threshold));
        }

        let non_zero = [
            ("retrieval.overfetch_factor", self.retrieval.overfetch_factor as u64),
            ("retrieval.max_attempts", self.retrieval.max_attempts as u64),
            ("retrieval.timeout_secs", self.retrieval.timeout_secs),
            ("breaker.threshold", self.breaker.threshold as u64),
            ("synthesis.max_verbatim_words", self.synthesis.max_verbatim_words as u64),
            ("session.idle_timeout_secs", self.session.idle_timeout_secs),
            ("session.handler_timeout_secs", self.session.handler_timeout_secs),
            ("embedding.dimension", self.embedding.dimension as u64),
            ("llm.max_tokens", self.llm.max_tokens as u64),
        ];
        if let Some((field, _)) = non_zero.iter().find(|(_, value)| *value == 0) {
            return Err(ConfigValidationError::ZeroValue(field));
        }

        if self.llm.model.trim().is_empty() {
            return Err(ConfigValidationError::EmptyValue("llm.model"));
        }
        if self.vector_store.provider == VectorStoreProvider::Elasticsearch
            && self.vector_store.index.trim().is_empty()
        {
            return Err(ConfigValidationError::EmptyValue("vector_store.index"));
        }

        Ok(())
    }

    /// Convert the pipeline sections into application parameters
    pub fn to_pipeline_config(&self) -> PipelineConfig {
        PipelineConfig::new(
            self.retrieval.to_params(),
            self.breaker.to_params(),
            self.synthesis.to_params(),
            self.session.to_params(),
        )
    }
}
