//! Per-session circuit breaker.
//!
//! - [`category::ErrorCategory`] / [`category::ErrorRecord`]: failure taxonomy
//! - [`circuit::CircuitBreaker`]: independent per-category counters with a
//!   trip threshold

pub mod category;
pub mod circuit;
