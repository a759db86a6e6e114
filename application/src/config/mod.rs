//! Application-level configuration.
//!
//! This module provides configuration types that control how use cases behave:
//!
//! - [`RetrievalParams`]: result count, threshold, over-fetch, retry and timeout
//! - [`BreakerParams`]: circuit breaker threshold and actor retries
//! - [`SynthesisParams`]: verbatim limit and drafter choice
//! - [`SessionParams`]: idle eviction, turn deadline and handler timeout
//! - [`PipelineConfig`]: container handed to the session manager

pub mod pipeline_config;
pub mod pipeline_params;

pub use pipeline_config::PipelineConfig;
pub use pipeline_params::{BreakerParams, RetrievalParams, SessionParams, SynthesisParams};
