//! Router state table.
//!
//! ```text
//!            BeginTurn
//!   (any terminal) ──────► Routing
//!   Routing ── Decided(tag) ──► Dispatched(tag)
//!   Routing ── Decided(Finish) ──► Done
//!   Dispatched(Retrieval) ── RetrievalCompleted ──► Synthesizing
//!   Dispatched(other) ── Completed ──► Done
//!   Dispatched(tag) ── Retry ──► Dispatched(tag)
//!   Synthesizing ── Completed ──► Done
//!   Routing | Dispatched ── GapReached ──► Done
//!   any ── Halt ──► Halted   (absorbing until the session is reset)
//! ```
//!
//! Retrieval and synthesis form one compound step: there is no edge from
//! `Dispatched(Retrieval)` or `Synthesizing` back to `Routing`.

use crate::core::error::DomainError;
use crate::routing::tag::CapabilityTag;
use serde::{Deserialize, Serialize};

/// Per-turn router state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "state", content = "tag")]
pub enum RouterState {
    #[default]
    Routing,
    Dispatched(CapabilityTag),
    Synthesizing,
    Done,
    Halted,
}

/// Inputs to the state table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouterEvent {
    /// A new turn starts
    BeginTurn,
    /// `decide` chose a tag
    Decided(CapabilityTag),
    /// The dispatched actor is retried after a recorded failure
    Retry,
    /// Retrieval finished (possibly empty); synthesis follows automatically
    RetrievalCompleted,
    /// The current actor produced the turn's answer
    Completed,
    /// The turn ends without an answer from an actor (gap, refusal, degraded)
    GapReached,
    /// The circuit breaker tripped
    Halt,
}

impl RouterState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RouterState::Done | RouterState::Halted)
    }

    pub fn is_halted(&self) -> bool {
        matches!(self, RouterState::Halted)
    }

    /// Apply one event, returning the next state.
    pub fn apply(self, event: RouterEvent) -> Result<RouterState, DomainError> {
        use RouterEvent as E;
        use RouterState as S;

        let next = match (self, event) {
            (_, E::Halt) => S::Halted,
            (S::Halted, _) => return Err(self.invalid(event)),
            (S::Done, E::BeginTurn) | (S::Routing, E::BeginTurn) => S::Routing,
            (S::Routing, E::Decided(CapabilityTag::Finish)) => S::Done,
            (S::Routing, E::Decided(tag)) => S::Dispatched(tag),
            (S::Routing, E::GapReached) => S::Done,
            (S::Dispatched(tag), E::Retry) => S::Dispatched(tag),
            (S::Dispatched(CapabilityTag::Retrieval), E::RetrievalCompleted) => S::Synthesizing,
            (S::Dispatched(CapabilityTag::Retrieval), E::Completed) => {
                return Err(self.invalid(event));
            }
            (S::Dispatched(_), E::Completed) => S::Done,
            (S::Dispatched(_), E::GapReached) => S::Done,
            (S::Synthesizing, E::Completed) => S::Done,
            _ => return Err(self.invalid(event)),
        };
        Ok(next)
    }

    fn invalid(self, event: RouterEvent) -> DomainError {
        DomainError::InvalidTransition { state: self, event }
    }
}
