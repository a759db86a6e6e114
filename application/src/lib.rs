//! Application layer for fincounsel
//!
//! This crate contains use cases, port definitions, and application configuration.
//! It depends only on the domain layer.

pub mod config;
pub mod ports;
pub mod use_cases;

// Re-export commonly used types
pub use config::{BreakerParams, PipelineConfig, RetrievalParams, SessionParams, SynthesisParams};
pub use ports::{
    answer_drafter::{AnswerDrafter, SynthesisError},
    conversation_logger::{ConversationEvent, ConversationLogger, NoConversationLogger},
    embedding::{EmbeddingError, EmbeddingService},
    llm_gateway::{GatewayError, LlmGateway},
    progress::{NoProgress, TurnProgress, TurnStage},
    session_store::{NoSessionStore, SessionStore, StoreError},
    specialist_handler::SpecialistHandler,
    vector_store::{VectorStore, VectorStoreError},
};
pub use use_cases::drafting::{ExtractiveAnswerDrafter, LlmAnswerDrafter};
pub use use_cases::handle_turn::{
    ErrorEvent, HandleTurnError, HandleTurnUseCase, TurnReply, TurnTrace,
};
pub use use_cases::knowledge_chain::{KnowledgeChain, KnowledgeChainError, Screened};
pub use use_cases::retrieve::{RetrievalEngine, RetrievalError};
pub use use_cases::session_manager::SessionManager;
pub use use_cases::synthesize::SynthesisStage;
