//! Domain layer for fincounsel
//!
//! This crate contains the core business logic, entities, and value objects.
//! It has no dependencies on infrastructure or presentation concerns.
//!
//! # Core Concepts
//!
//! ## Routing
//!
//! Every turn is routed by [`decide`], a pure function from the session's
//! latest message to one [`CapabilityTag`]. The per-turn [`RouterState`]
//! table makes retrieval followed by synthesis a single compound step.
//!
//! ## Circuit breaker
//!
//! Each [`Session`] owns a [`CircuitBreaker`] with one counter per
//! [`ErrorCategory`]. Reaching the threshold halts the session.
//!
//! ## Knowledge chain
//!
//! [`PatternGuardrail`] → retrieval scoring ([`rank_hits`]) →
//! [`AnswerComposer`].

pub mod breaker;
pub mod config;
pub mod core;
pub mod glossary;
pub mod guardrail;
pub mod handler;
pub mod help;
pub mod retrieval;
pub mod routing;
pub mod session;
pub mod synthesis;

// Re-export commonly used types
pub use breaker::{
    category::{ErrorCategory, ErrorRecord},
    circuit::{BreakerStatus, CircuitBreaker},
};
pub use config::{DrafterKind, OutputFormat};
pub use core::{
    error::DomainError,
    messages::{
        CAPABILITY_GAP_MESSAGE, DEGRADED_MESSAGE, FALLBACK_ANSWER, SAFETY_MESSAGE,
        TOOL_FAILURE_MESSAGE, VALIDATION_MESSAGE,
    },
    query::Query,
};
pub use guardrail::{
    patterns::PatternGuardrail,
    verdict::{GuardrailCategory, GuardrailVerdict, QueryGuardrail},
};
pub use handler::{
    args::{ArgValue, HandlerArgs},
    value_objects::{HandlerError, HandlerErrorKind, HandlerOutput, HandlerRequest},
};
pub use help::HELP_GUIDE;
pub use retrieval::{
    enrichment::enrich_query,
    passage::{Passage, RetrievalQuery, SearchHit, SourceLocator},
    ranking::rank_hits,
    similarity::SimilarityTransform,
};
pub use routing::{
    intent::{CapabilityGap, RouteDecision, decide, decide_text},
    state::{RouterEvent, RouterState},
    tag::{CapabilityTag, HandlerDomain},
};
pub use session::entities::{Message, MessagePayload, Role, Session, SessionId};
pub use synthesis::{
    composer::{AnswerComposer, DEFAULT_MAX_VERBATIM_WORDS},
    extractive::ExtractiveDrafter,
    result::{Draft, SynthesisResult},
};
