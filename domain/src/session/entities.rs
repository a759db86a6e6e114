//! Session domain entities

use crate::breaker::category::ErrorCategory;
use crate::breaker::circuit::{BreakerStatus, CircuitBreaker};
use crate::core::error::DomainError;
use crate::core::query::Query;
use crate::routing::state::{RouterEvent, RouterState};
use crate::routing::tag::{CapabilityTag, HandlerDomain};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Session identifier (Value Object)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a process-unique id from the current time.
    pub fn generate() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        let seq = COUNTER.fetch_add(1, Ordering::Relaxed);
        Self(format!(
            "{}-{}",
            Utc::now().format("%Y%m%dT%H%M%S%3f"),
            seq
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SessionId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Role of a message in a conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

/// Structured data attached to an assistant message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum MessagePayload {
    HandlerResult {
        domain: HandlerDomain,
        calculation: String,
        values: BTreeMap<String, f64>,
    },
    Citations { sources: Vec<String> },
}

/// A message in a conversation (Entity)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<MessagePayload>,
    /// Turn the message belongs to
    pub turn: u64,
}

impl Message {
    pub fn user(content: impl Into<String>, turn: u64) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            payload: None,
            turn,
        }
    }

    pub fn assistant(content: impl Into<String>, turn: u64) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            payload: None,
            turn,
        }
    }

    pub fn with_payload(mut self, payload: MessagePayload) -> Self {
        self.payload = Some(payload);
        self
    }

    pub fn is_user(&self) -> bool {
        self.role == Role::User
    }
}

/// Per-conversation context (Entity)
///
/// Owns the append-only message log, the circuit breaker, the router state
/// and the turn counter. Only the breaker can move a session to
/// [`RouterState::Halted`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    id: SessionId,
    messages: Vec<Message>,
    breaker: CircuitBreaker,
    state: RouterState,
    turn: u64,
    created_at: DateTime<Utc>,
    last_active: DateTime<Utc>,
}

impl Session {
    pub fn new(id: SessionId, breaker_threshold: u32) -> Self {
        let now = Utc::now();
        Self {
            id,
            messages: Vec::new(),
            breaker: CircuitBreaker::new(breaker_threshold),
            state: RouterState::Routing,
            turn: 0,
            created_at: now,
            last_active: now,
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn latest_message(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }

    pub fn state(&self) -> RouterState {
        self.state
    }

    pub fn turn(&self) -> u64 {
        self.turn
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn last_active(&self) -> DateTime<Utc> {
        self.last_active
    }

    pub fn is_halted(&self) -> bool {
        self.state.is_halted()
    }

    /// Start a new turn with the user's query.
    ///
    /// A state left mid-turn (for example by a crash before the snapshot was
    /// replaced) is discarded and the turn starts from `Routing`.
    pub fn begin_turn(&mut self, query: &Query) -> Result<u64, DomainError> {
        if self.is_halted() {
            return Err(DomainError::SessionHalted);
        }
        if !self.state.is_terminal() {
            self.state = RouterState::Routing;
        }
        self.state = self.state.apply(RouterEvent::BeginTurn)?;
        self.turn += 1;
        self.messages.push(Message::user(query.content(), self.turn));
        self.touch(Utc::now());
        Ok(self.turn)
    }

    /// Advance the router state. `Halt` is reserved for the breaker.
    pub fn advance(&mut self, event: RouterEvent) -> Result<RouterState, DomainError> {
        if event == RouterEvent::Halt {
            return Err(DomainError::InvalidTransition {
                state: self.state,
                event,
            });
        }
        self.state = self.state.apply(event)?;
        Ok(self.state)
    }

    /// Record a failure in the breaker, halting the session if it trips.
    pub fn record_failure(&mut self, category: ErrorCategory) -> BreakerStatus {
        let status = self.breaker.record_failure(category, self.turn);
        if status.is_open() {
            self.state = RouterState::Halted;
        }
        status
    }

    /// Record a successful dispatch of `tag`.
    pub fn record_success(&mut self, tag: CapabilityTag) {
        self.breaker.record_success(tag);
    }

    /// Append the assistant's answer for the current turn.
    pub fn append_assistant(&mut self, content: impl Into<String>, payload: Option<MessagePayload>) {
        let mut message = Message::assistant(content, self.turn);
        message.payload = payload;
        self.messages.push(message);
    }

    /// Clear history, counters and state.
    pub fn reset(&mut self) {
        self.messages.clear();
        self.breaker.reset();
        self.state = RouterState::Routing;
        self.turn = 0;
        self.touch(Utc::now());
    }

    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.last_active = now;
    }

    /// Time since the last turn started.
    pub fn idle_for(&self, now: DateTime<Utc>) -> chrono::Duration {
        now - self.last_active
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(text: &str) -> Query {
        Query::new(text).unwrap()
    }

    #[test]
    fn test_begin_turn_appends_user_message() {
        let mut session = Session::new(SessionId::new("s1"), 2);
        let turn = session.begin_turn(&query("what is duration?")).unwrap();
        assert_eq!(turn, 1);
        assert_eq!(session.state(), RouterState::Routing);
        let latest = session.latest_message().unwrap();
        assert!(latest.is_user());
        assert_eq!(latest.turn, 1);
    }

    #[test]
    fn test_only_breaker_halts() {
        let mut session = Session::new(SessionId::new("s1"), 2);
        session.begin_turn(&query("calculate npv")).unwrap();
        assert!(session.advance(RouterEvent::Halt).is_err());
        assert!(!session.is_halted());

        session.record_failure(ErrorCategory::ToolFailure);
        assert!(!session.is_halted());
        let status = session.record_failure(ErrorCategory::ToolFailure);
        assert!(status.is_open());
        assert!(session.is_halted());
        assert_eq!(
            session.begin_turn(&query("hello")),
            Err(DomainError::SessionHalted)
        );
    }

    #[test]
    fn test_interrupted_turn_restarts_from_routing() {
        let mut session = Session::new(SessionId::new("s1"), 2);
        session.begin_turn(&query("explain beta")).unwrap();
        session
            .advance(RouterEvent::Decided(CapabilityTag::Retrieval))
            .unwrap();

        session.begin_turn(&query("explain alpha")).unwrap();
        assert_eq!(session.state(), RouterState::Routing);
        assert_eq!(session.turn(), 2);
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut session = Session::new(SessionId::new("s1"), 1);
        session.begin_turn(&query("calculate wacc")).unwrap();
        session.record_failure(ErrorCategory::ValidationFailure);
        assert!(session.is_halted());

        session.reset();
        assert!(!session.is_halted());
        assert!(session.messages().is_empty());
        assert_eq!(session.breaker().count(ErrorCategory::ValidationFailure), 0);
        assert_eq!(session.turn(), 0);
    }

    #[test]
    fn test_serde_round_trip_keeps_counters() {
        let mut session = Session::new(SessionId::new("persisted"), 2);
        session.begin_turn(&query("calculate capm")).unwrap();
        session.record_failure(ErrorCategory::ToolFailure);
        session.append_assistant(
            "CAPM cost of equity: 11.4%",
            Some(MessagePayload::HandlerResult {
                domain: HandlerDomain::Portfolio,
                calculation: "capm".to_string(),
                values: BTreeMap::from([("cost_of_equity_pct".to_string(), 11.4)]),
            }),
        );

        let json = serde_json::to_string(&session).unwrap();
        let restored: Session = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, session);
        assert_eq!(restored.breaker().count(ErrorCategory::ToolFailure), 1);
    }

    #[test]
    fn test_generated_ids_are_unique() {
        assert_ne!(SessionId::generate(), SessionId::generate());
    }
}
