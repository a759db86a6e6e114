//! Core domain concepts shared across all subdomains.
//!
//! - [`error::DomainError`]: domain-level errors
//! - [`messages`]: fixed user-facing texts
//! - [`query::Query`]: a validated user query

pub mod error;
pub mod messages;
pub mod query;
