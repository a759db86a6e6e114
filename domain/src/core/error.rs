//! Domain error types

use crate::routing::state::{RouterEvent, RouterState};
use thiserror::Error;

/// Domain-level errors
#[derive(Error, Debug, PartialEq)]
pub enum DomainError {
    #[error("Empty query")]
    EmptyQuery,

    #[error("Invalid router transition: {event:?} from {state:?}")]
    InvalidTransition {
        state: RouterState,
        event: RouterEvent,
    },

    #[error("Invalid retrieval parameters: {0}")]
    InvalidRetrievalParams(String),

    #[error("Session is halted")]
    SessionHalted,

    #[error("Operation cancelled")]
    Cancelled,
}

impl DomainError {
    /// Check if this error represents a cancellation
    pub fn is_cancelled(&self) -> bool {
        matches!(self, DomainError::Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancelled_error_display() {
        let error = DomainError::Cancelled;
        assert_eq!(error.to_string(), "Operation cancelled");
    }

    #[test]
    fn test_is_cancelled_check() {
        assert!(DomainError::Cancelled.is_cancelled());
        assert!(!DomainError::EmptyQuery.is_cancelled());
        assert!(!DomainError::SessionHalted.is_cancelled());
    }

    #[test]
    fn test_invalid_transition_display_names_both_sides() {
        let error = DomainError::InvalidTransition {
            state: RouterState::Done,
            event: RouterEvent::RetrievalCompleted,
        };
        let text = error.to_string();
        assert!(text.contains("RetrievalCompleted"));
        assert!(text.contains("Done"));
    }
}
