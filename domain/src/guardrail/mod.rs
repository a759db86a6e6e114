//! Pre-retrieval query guardrail.
//!
//! The verdict contract ([`verdict::GuardrailVerdict`]) is stable; the matching
//! mechanism sits behind [`verdict::QueryGuardrail`]. The default
//! [`patterns::PatternGuardrail`] evaluates an ordered regex table.

pub mod patterns;
pub mod verdict;
