//! Infrastructure layer for fincounsel
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer, including configuration file loading.
//!
//! Adapters that talk to remote services (Elasticsearch, embedding APIs,
//! Anthropic) are compiled with the `http` feature.

pub mod calculators;
pub mod config;
#[cfg(feature = "http")]
pub mod llm;
pub mod logging;
pub mod retrieval;
pub mod session;

// Re-export commonly used types
pub use calculators::FinancialCalculators;
pub use config::{
    ConfigLoader, ConfigValidationError, EmbeddingProvider, FileConfig, FileOutputConfig,
    FileOutputFormat, FileReplConfig, VectorStoreProvider,
};
pub use logging::JsonlConversationLogger;
pub use retrieval::{CorpusError, HashingEmbedder, InMemoryVectorStore};
pub use session::JsonSessionStore;

#[cfg(feature = "http")]
pub use llm::{AnthropicGateway, AnthropicSettings};
#[cfg(feature = "http")]
pub use retrieval::{ElasticsearchVectorStore, HttpEmbeddingService, IndexFields};
