//! Retrieval adapters: vector stores and embedding services.
//!
//! - [`InMemoryVectorStore`]: exhaustive L2 search over a JSONL corpus
//! - [`HashingEmbedder`]: deterministic offline embeddings
//!
//! With the `http` feature:
//!
//! - [`ElasticsearchVectorStore`]: kNN search against an Elasticsearch index
//! - [`HttpEmbeddingService`]: OpenAI-compatible `/embeddings` endpoint

mod hashing_embedder;
mod memory_store;

#[cfg(feature = "http")]
mod elasticsearch;
#[cfg(feature = "http")]
mod http_embedder;

pub use hashing_embedder::HashingEmbedder;
pub use memory_store::{CorpusError, InMemoryVectorStore};

#[cfg(feature = "http")]
pub use elasticsearch::{ElasticsearchVectorStore, IndexFields};
#[cfg(feature = "http")]
pub use http_embedder::HttpEmbeddingService;
