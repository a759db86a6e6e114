//! Handle Turn use case.
//!
//! Runs one turn of a session: decide, dispatch, record the outcome in the
//! circuit breaker, then retry or finalize. The session is mutated in place;
//! the [`SessionManager`](super::session_manager::SessionManager) decides
//! whether the mutated copy is kept.
//!
//! Per-turn flow:
//! 1. A halted session answers with the safety message and dispatches nothing
//! 2. `decide` picks one tag (or a capability gap)
//! 3. Handlers are retried once on a tool failure while the breaker is closed
//! 4. Retrieval and synthesis run as one compound step
//! 5. Every failure is recorded; reaching the threshold halts the session

use crate::config::BreakerParams;
use crate::ports::conversation_logger::{
    ConversationEvent, ConversationLogger, NoConversationLogger,
};
use crate::ports::progress::{TurnProgress, TurnStage};
use crate::ports::session_store::StoreError;
use crate::ports::specialist_handler::SpecialistHandler;
use crate::use_cases::knowledge_chain::{KnowledgeChain, Screened};
use crate::use_cases::retrieve::RetrievalError;
use fincounsel_domain::{
    CAPABILITY_GAP_MESSAGE, CapabilityTag, DEGRADED_MESSAGE, DomainError, ErrorCategory,
    HELP_GUIDE, HandlerArgs, HandlerDomain, HandlerError, HandlerOutput, HandlerRequest,
    MessagePayload, Query, RouteDecision, RouterEvent, RouterState, SAFETY_MESSAGE, Session,
    SessionId, TOOL_FAILURE_MESSAGE, VALIDATION_MESSAGE, decide,
};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors that end a turn without an answer.
///
/// Actor failures are not errors here; they are recorded in the breaker and
/// answered with a fixed message.
#[derive(Error, Debug)]
pub enum HandleTurnError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Session store error: {0}")]
    Store(#[from] StoreError),

    #[error("Turn exceeded its deadline")]
    DeadlineExceeded,

    #[error("Operation cancelled")]
    Cancelled,
}

impl HandleTurnError {
    /// Check if this error represents a cancellation
    pub fn is_cancelled(&self) -> bool {
        matches!(self, HandleTurnError::Cancelled)
            || matches!(self, HandleTurnError::Domain(e) if e.is_cancelled())
    }
}

/// One recorded actor failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorEvent {
    pub category: ErrorCategory,
    pub actor: String,
    pub detail: String,
}

/// What happened during a turn. Internal categories appear here, never in
/// the answer text.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TurnTrace {
    /// Every dispatch, in order (a retry appears twice)
    pub actor_sequence: Vec<String>,
    pub error_events: Vec<ErrorEvent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rationale: Option<String>,
    pub final_state: RouterState,
}

/// Answer to one user message.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TurnReply {
    pub session_id: SessionId,
    pub turn: u64,
    pub answer: String,
    pub citations: Vec<String>,
    /// No passage cleared the similarity threshold
    pub fallback: bool,
    pub halted: bool,
    pub trace: TurnTrace,
}

/// Use case for handling one user message.
pub struct HandleTurnUseCase {
    chain: Arc<KnowledgeChain>,
    handler: Arc<dyn SpecialistHandler>,
    breaker: BreakerParams,
    handler_timeout: Duration,
    conversation_logger: Arc<dyn ConversationLogger>,
}

impl HandleTurnUseCase {
    pub fn new(chain: Arc<KnowledgeChain>, handler: Arc<dyn SpecialistHandler>) -> Self {
        Self {
            chain,
            handler,
            breaker: BreakerParams::default(),
            handler_timeout: Duration::from_secs(5),
            conversation_logger: Arc::new(NoConversationLogger),
        }
    }

    pub fn with_breaker_params(mut self, params: BreakerParams) -> Self {
        self.breaker = params;
        self
    }

    pub fn with_handler_timeout(mut self, timeout: Duration) -> Self {
        self.handler_timeout = timeout;
        self
    }

    /// Create with a conversation logger.
    pub fn with_conversation_logger(mut self, logger: Arc<dyn ConversationLogger>) -> Self {
        self.conversation_logger = logger;
        self
    }

    pub fn breaker_params(&self) -> &BreakerParams {
        &self.breaker
    }

    /// Handle one message against `session`.
    pub async fn execute(
        &self,
        session: &mut Session,
        text: &str,
        progress: &dyn TurnProgress,
    ) -> Result<TurnReply, HandleTurnError> {
        if session.is_halted() {
            debug!(session = %session.id(), "session halted, refusing turn");
            return Ok(self.halted_reply(session, TurnTrace::default()));
        }

        let query = Query::new(text)?;
        let turn = session.begin_turn(&query)?;
        self.conversation_logger.log(ConversationEvent::new(
            "turn_started",
            serde_json::json!({
                "session": session.id().as_str(),
                "turn": turn,
            }),
        ));

        progress.on_stage(TurnStage::Routing);
        let mut trace = TurnTrace::default();

        let decision = match decide(session) {
            Ok(decision) => decision,
            Err(gap) => {
                info!(session = %session.id(), turn, "capability gap: {}", gap.rationale);
                trace.rationale = Some(gap.rationale.clone());
                trace.error_events.push(ErrorEvent {
                    category: ErrorCategory::CapabilityGap,
                    actor: "router".to_string(),
                    detail: gap.rationale,
                });
                let reply = self.fail_turn(
                    session,
                    ErrorCategory::CapabilityGap,
                    CAPABILITY_GAP_MESSAGE,
                    trace,
                )?;
                return Ok(self.finish(reply, progress));
            }
        };

        info!(
            session = %session.id(),
            turn,
            tag = %decision.tag,
            "route decided: {}",
            decision.rationale
        );
        self.conversation_logger.log(ConversationEvent::new(
            "route_decided",
            serde_json::json!({
                "session": session.id().as_str(),
                "turn": turn,
                "tag": decision.tag.to_string(),
                "rationale": decision.rationale,
            }),
        ));
        trace.rationale = Some(decision.rationale.clone());

        let reply = match decision.tag {
            CapabilityTag::Finish => {
                session.advance(RouterEvent::Decided(CapabilityTag::Finish))?;
                self.reply(session, String::new(), Vec::new(), false, trace)
            }
            CapabilityTag::Help => {
                session.advance(RouterEvent::Decided(CapabilityTag::Help))?;
                progress.on_stage(TurnStage::Dispatching(CapabilityTag::Help));
                trace.actor_sequence.push(CapabilityTag::Help.to_string());
                session.record_success(CapabilityTag::Help);
                session.advance(RouterEvent::Completed)?;
                session.append_assistant(HELP_GUIDE, None);
                self.reply(session, HELP_GUIDE.to_string(), Vec::new(), false, trace)
            }
            CapabilityTag::Handler(domain) => {
                session.advance(RouterEvent::Decided(decision.tag))?;
                self.run_handler(session, domain, &query, &decision, trace, progress)
                    .await?
            }
            CapabilityTag::Retrieval => {
                session.advance(RouterEvent::Decided(CapabilityTag::Retrieval))?;
                self.run_knowledge_chain(session, &query, trace, progress)
                    .await?
            }
        };

        Ok(self.finish(reply, progress))
    }

    async fn run_handler(
        &self,
        session: &mut Session,
        domain: HandlerDomain,
        query: &Query,
        decision: &RouteDecision,
        mut trace: TurnTrace,
        progress: &dyn TurnProgress,
    ) -> Result<TurnReply, HandleTurnError> {
        let tag = CapabilityTag::Handler(domain);
        let mut request = HandlerRequest::new(HandlerArgs::parse(query.content()));
        if let Some(calculation) = &decision.calculation {
            request = request.with_calculation(calculation.clone());
        }
        debug!(
            handler = %tag,
            params = request.args.param_count(),
            "handler request"
        );

        let max_dispatches = self.breaker.max_dispatches();
        let mut dispatches = 0;

        loop {
            dispatches += 1;
            progress.on_stage(TurnStage::Dispatching(tag));
            trace.actor_sequence.push(tag.to_string());

            let error = match self.invoke_handler(domain, &request).await {
                Ok(output) => {
                    session.record_success(tag);
                    session.advance(RouterEvent::Completed)?;
                    let payload = MessagePayload::HandlerResult {
                        domain: output.domain,
                        calculation: output.calculation.clone(),
                        values: output.values.clone(),
                    };
                    session.append_assistant(output.summary.clone(), Some(payload));
                    self.conversation_logger.log(ConversationEvent::new(
                        "handler_completed",
                        serde_json::json!({
                            "session": session.id().as_str(),
                            "turn": session.turn(),
                            "handler": tag.to_string(),
                            "calculation": output.calculation,
                            "values": output.values,
                        }),
                    ));
                    return Ok(self.reply(session, output.summary, Vec::new(), false, trace));
                }
                Err(error) => error,
            };

            let category = error.category();
            warn!(
                session = %session.id(),
                handler = %tag,
                category = %category,
                attempt = dispatches,
                "handler failed: {}",
                error.message
            );
            trace.error_events.push(ErrorEvent {
                category,
                actor: tag.to_string(),
                detail: error.message.clone(),
            });
            self.log_failure(session, category, &tag.to_string(), &error.message);

            let status = session.record_failure(category);
            if status.is_open() {
                return Ok(self.trip(session, category, trace));
            }

            if category == ErrorCategory::ToolFailure && dispatches < max_dispatches {
                debug!(handler = %tag, attempt = dispatches + 1, "retrying handler");
                session.advance(RouterEvent::Retry)?;
                continue;
            }

            session.advance(RouterEvent::GapReached)?;
            let message = match category {
                ErrorCategory::ValidationFailure => VALIDATION_MESSAGE,
                _ => TOOL_FAILURE_MESSAGE,
            };
            session.append_assistant(message, None);
            return Ok(self.reply(session, message.to_string(), Vec::new(), false, trace));
        }
    }

    async fn invoke_handler(
        &self,
        domain: HandlerDomain,
        request: &HandlerRequest,
    ) -> Result<HandlerOutput, HandlerError> {
        match tokio::time::timeout(self.handler_timeout, self.handler.invoke(domain, request)).await
        {
            Ok(result) => result,
            Err(_) => Err(HandlerError::execution(format!(
                "handler timed out after {:?}",
                self.handler_timeout
            ))),
        }
    }

    async fn run_knowledge_chain(
        &self,
        session: &mut Session,
        query: &Query,
        mut trace: TurnTrace,
        progress: &dyn TurnProgress,
    ) -> Result<TurnReply, HandleTurnError> {
        let actor = CapabilityTag::Retrieval.to_string();
        progress.on_stage(TurnStage::Dispatching(CapabilityTag::Retrieval));
        trace.actor_sequence.push(actor.clone());

        let retrieval_query = match self.chain.screen(query.content(), progress)? {
            Screened::Approved(retrieval_query) => retrieval_query,
            Screened::Blocked { category, message } => {
                trace.error_events.push(ErrorEvent {
                    category: ErrorCategory::GuardrailBlock,
                    actor: "guardrail".to_string(),
                    detail: category.as_str().to_string(),
                });
                self.conversation_logger.log(ConversationEvent::new(
                    "guardrail_blocked",
                    serde_json::json!({
                        "session": session.id().as_str(),
                        "turn": session.turn(),
                        "category": category.as_str(),
                    }),
                ));
                return self.fail_turn(session, ErrorCategory::GuardrailBlock, message, trace);
            }
        };

        let passages = match self.chain.retrieve(&retrieval_query, progress).await {
            Ok(passages) => passages,
            Err(e @ RetrievalError::DimensionMismatch { .. }) => {
                return Err(HandleTurnError::Configuration(e.to_string()));
            }
            Err(e) => {
                warn!(session = %session.id(), "retrieval failed: {}", e);
                let category = ErrorCategory::UpstreamUnavailable;
                trace.error_events.push(ErrorEvent {
                    category,
                    actor: actor.clone(),
                    detail: e.to_string(),
                });
                self.log_failure(session, category, &actor, &e.to_string());
                return self.fail_turn(session, category, DEGRADED_MESSAGE, trace);
            }
        };

        session.advance(RouterEvent::RetrievalCompleted)?;
        session.record_success(CapabilityTag::Retrieval);
        self.conversation_logger.log(ConversationEvent::new(
            "retrieval_completed",
            serde_json::json!({
                "session": session.id().as_str(),
                "turn": session.turn(),
                "passages": passages.len(),
                "sources": passages.iter().map(|p| p.locator.to_string()).collect::<Vec<_>>(),
            }),
        ));

        let result = self
            .chain
            .synthesize(&retrieval_query, &passages, progress)
            .await;
        session.advance(RouterEvent::Completed)?;

        let payload = (!result.citations.is_empty()).then(|| MessagePayload::Citations {
            sources: result.citations.clone(),
        });
        session.append_assistant(result.answer.clone(), payload);
        Ok(self.reply(
            session,
            result.answer,
            result.citations,
            result.fallback,
            trace,
        ))
    }

    /// Record `category`, then either halt or end the turn with `message`.
    fn fail_turn(
        &self,
        session: &mut Session,
        category: ErrorCategory,
        message: &str,
        trace: TurnTrace,
    ) -> Result<TurnReply, HandleTurnError> {
        if session.record_failure(category).is_open() {
            return Ok(self.trip(session, category, trace));
        }
        session.advance(RouterEvent::GapReached)?;
        session.append_assistant(message, None);
        Ok(self.reply(session, message.to_string(), Vec::new(), false, trace))
    }

    fn trip(&self, session: &mut Session, category: ErrorCategory, trace: TurnTrace) -> TurnReply {
        warn!(
            session = %session.id(),
            turn = session.turn(),
            category = %category,
            "circuit breaker tripped, session halted"
        );
        self.conversation_logger.log(ConversationEvent::new(
            "session_halted",
            serde_json::json!({
                "session": session.id().as_str(),
                "turn": session.turn(),
                "tripped_by": category,
            }),
        ));
        session.append_assistant(SAFETY_MESSAGE, None);
        self.halted_reply(session, trace)
    }

    fn halted_reply(&self, session: &Session, trace: TurnTrace) -> TurnReply {
        self.reply(session, SAFETY_MESSAGE.to_string(), Vec::new(), false, trace)
    }

    fn log_failure(&self, session: &Session, category: ErrorCategory, actor: &str, detail: &str) {
        self.conversation_logger.log(ConversationEvent::new(
            "actor_failed",
            serde_json::json!({
                "session": session.id().as_str(),
                "turn": session.turn(),
                "actor": actor,
                "category": category,
                "detail": detail,
            }),
        ));
    }

    fn reply(
        &self,
        session: &Session,
        answer: String,
        citations: Vec<String>,
        fallback: bool,
        mut trace: TurnTrace,
    ) -> TurnReply {
        trace.final_state = session.state();
        TurnReply {
            session_id: session.id().clone(),
            turn: session.turn(),
            answer,
            citations,
            fallback,
            halted: session.is_halted(),
            trace,
        }
    }

    fn finish(&self, reply: TurnReply, progress: &dyn TurnProgress) -> TurnReply {
        progress.on_turn_complete();
        self.conversation_logger.log(ConversationEvent::new(
            "turn_completed",
            serde_json::json!({
                "session": reply.session_id.as_str(),
                "turn": reply.turn,
                "final_state": reply.trace.final_state,
                "actors": reply.trace.actor_sequence,
                "errors": reply.trace.error_events.iter().map(|e| e.category).collect::<Vec<_>>(),
                "citations": reply.citations.len(),
            }),
        ));
        reply
    }
}
