//! Retrieval value objects and the pure scoring pipeline.
//!
//! The I/O half (embedding, vector-store calls, retries) lives in the
//! application layer; everything here is deterministic.

pub mod enrichment;
pub mod passage;
pub mod ranking;
pub mod similarity;
