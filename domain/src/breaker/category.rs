//! Failure categories tracked by the circuit breaker.

use crate::routing::tag::CapabilityTag;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Category of a recorded failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// A handler raised during execution
    ToolFailure,
    /// Malformed or missing handler arguments
    ValidationFailure,
    /// No actor can serve the request
    CapabilityGap,
    /// The query matched a restricted extraction pattern
    GuardrailBlock,
    /// An external call failed or timed out after retries
    UpstreamUnavailable,
}

impl ErrorCategory {
    pub const ALL: [ErrorCategory; 5] = [
        ErrorCategory::ToolFailure,
        ErrorCategory::ValidationFailure,
        ErrorCategory::CapabilityGap,
        ErrorCategory::GuardrailBlock,
        ErrorCategory::UpstreamUnavailable,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::ToolFailure => "tool_failure",
            ErrorCategory::ValidationFailure => "validation_failure",
            ErrorCategory::CapabilityGap => "capability_gap",
            ErrorCategory::GuardrailBlock => "guardrail_block",
            ErrorCategory::UpstreamUnavailable => "upstream_unavailable",
        }
    }

    /// Whether a successful dispatch of `tag` clears this category.
    ///
    /// | category | cleared by |
    /// |---|---|
    /// | `tool_failure`, `validation_failure` | any handler success |
    /// | `guardrail_block`, `upstream_unavailable` | retrieval chain success |
    /// | `capability_gap` | any successful dispatch |
    pub fn is_cleared_by(&self, tag: CapabilityTag) -> bool {
        match self {
            ErrorCategory::ToolFailure | ErrorCategory::ValidationFailure => {
                matches!(tag, CapabilityTag::Handler(_))
            }
            ErrorCategory::GuardrailBlock | ErrorCategory::UpstreamUnavailable => {
                matches!(tag, CapabilityTag::Retrieval)
            }
            ErrorCategory::CapabilityGap => tag.is_dispatch(),
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Occurrence record for one category within a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorRecord {
    pub category: ErrorCategory,
    pub count: u32,
    pub last_seen_turn: u64,
}

impl ErrorRecord {
    pub fn new(category: ErrorCategory) -> Self {
        Self {
            category,
            count: 0,
            last_seen_turn: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::tag::HandlerDomain;

    #[test]
    fn test_serialize_snake_case() {
        let json = serde_json::to_string(&ErrorCategory::UpstreamUnavailable).unwrap();
        assert_eq!(json, "\"upstream_unavailable\"");
    }

    #[test]
    fn test_handler_success_clears_only_handler_categories() {
        let tag = CapabilityTag::Handler(HandlerDomain::Equity);
        assert!(ErrorCategory::ToolFailure.is_cleared_by(tag));
        assert!(ErrorCategory::ValidationFailure.is_cleared_by(tag));
        assert!(!ErrorCategory::UpstreamUnavailable.is_cleared_by(tag));
        assert!(!ErrorCategory::GuardrailBlock.is_cleared_by(tag));
    }

    #[test]
    fn test_retrieval_success_does_not_clear_tool_failure() {
        assert!(!ErrorCategory::ToolFailure.is_cleared_by(CapabilityTag::Retrieval));
        assert!(ErrorCategory::UpstreamUnavailable.is_cleared_by(CapabilityTag::Retrieval));
    }

    #[test]
    fn test_finish_clears_nothing() {
        for category in ErrorCategory::ALL {
            assert!(!category.is_cleared_by(CapabilityTag::Finish));
        }
    }
}
