//! Hand-written port mocks shared by the use-case tests.

use crate::ports::conversation_logger::{ConversationEvent, ConversationLogger};
use crate::ports::embedding::{EmbeddingError, EmbeddingService};
use crate::ports::llm_gateway::{GatewayError, LlmGateway};
use crate::ports::session_store::{SessionStore, StoreError};
use crate::ports::specialist_handler::SpecialistHandler;
use crate::ports::vector_store::{VectorStore, VectorStoreError};
use async_trait::async_trait;
use fincounsel_domain::{
    HandlerDomain, HandlerError, HandlerOutput, HandlerRequest, SearchHit, Session, SessionId,
    SourceLocator,
};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

/// Build a hit whose inverse-distance similarity is `similarity`.
pub fn hit_with_similarity(source_id: &str, similarity: f64) -> SearchHit {
    SearchHit {
        source_id: source_id.to_string(),
        locator: SourceLocator::new("Corporate Finance Notes").with_section(format!("section {}", source_id)),
        text: format!(
            "Passage {} explains that the weighted average cost of capital blends the cost of equity \
             and the after-tax cost of debt. Firms discount expected free cash flows at this rate.",
            source_id
        ),
        distance: 1.0 / similarity - 1.0,
    }
}

pub struct MockEmbedder {
    dimension: usize,
    failures: Mutex<VecDeque<EmbeddingError>>,
}

impl MockEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            failures: Mutex::new(VecDeque::new()),
        }
    }

    pub fn with_failure(self, error: EmbeddingError) -> Self {
        self.failures.lock().unwrap().push_back(error);
        self
    }
}

#[async_trait]
impl EmbeddingService for MockEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>, EmbeddingError> {
        if let Some(error) = self.failures.lock().unwrap().pop_front() {
            return Err(error);
        }
        Ok(vec![0.5; self.dimension])
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

/// Scripted vector store. Returns an empty result once the script runs out.
pub struct MockVectorStore {
    dimension: usize,
    delay: Option<Duration>,
    responses: Mutex<VecDeque<Result<Vec<SearchHit>, VectorStoreError>>>,
    requested: Mutex<Vec<usize>>,
}

impl MockVectorStore {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            delay: None,
            responses: Mutex::new(VecDeque::new()),
            requested: Mutex::new(Vec::new()),
        }
    }

    pub fn with_response(self, response: Result<Vec<SearchHit>, VectorStoreError>) -> Self {
        self.responses.lock().unwrap().push_back(response);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.requested.lock().unwrap().len()
    }

    pub fn requested_k(&self) -> Vec<usize> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait]
impl VectorStore for MockVectorStore {
    async fn search(&self, _vector: &[f32], k: usize) -> Result<Vec<SearchHit>, VectorStoreError> {
        self.requested.lock().unwrap().push(k);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let next = self.responses.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Ok(Vec::new()))
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

/// Scripted specialist handler recording every invocation.
pub struct MockHandler {
    responses: Mutex<VecDeque<Result<HandlerOutput, HandlerError>>>,
    invocations: Mutex<Vec<(HandlerDomain, HandlerRequest)>>,
}

impl MockHandler {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            invocations: Mutex::new(Vec::new()),
        }
    }

    pub fn with_response(self, response: Result<HandlerOutput, HandlerError>) -> Self {
        self.responses.lock().unwrap().push_back(response);
        self
    }

    pub fn calls(&self) -> usize {
        self.invocations.lock().unwrap().len()
    }

    pub fn invocations(&self) -> Vec<(HandlerDomain, HandlerRequest)> {
        self.invocations.lock().unwrap().clone()
    }
}

#[async_trait]
impl SpecialistHandler for MockHandler {
    async fn invoke(
        &self,
        domain: HandlerDomain,
        request: &HandlerRequest,
    ) -> Result<HandlerOutput, HandlerError> {
        self.invocations
            .lock()
            .unwrap()
            .push((domain, request.clone()));
        let next = self.responses.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Err(HandlerError::execution("no scripted response")))
    }
}

pub struct MockGateway {
    responses: Mutex<VecDeque<Result<String, GatewayError>>>,
    prompts: Mutex<Vec<String>>,
}

impl MockGateway {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn with_response(self, response: Result<String, GatewayError>) -> Self {
        self.responses.lock().unwrap().push_back(response);
        self
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmGateway for MockGateway {
    async fn complete(&self, _system: &str, prompt: &str) -> Result<String, GatewayError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        let next = self.responses.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Err(GatewayError::Other("no scripted response".into())))
    }

    fn model_name(&self) -> &str {
        "mock-model"
    }
}

/// Collects conversation events for assertions.
pub struct RecordingLogger {
    events: Mutex<Vec<(String, serde_json::Value)>>,
}

impl RecordingLogger {
    pub fn new() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
        }
    }

    pub fn event_types(&self) -> Vec<String> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .map(|(t, _)| t.clone())
            .collect()
    }

    pub fn payloads(&self, event_type: &str) -> Vec<serde_json::Value> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|(t, _)| t == event_type)
            .map(|(_, p)| p.clone())
            .collect()
    }
}

impl ConversationLogger for RecordingLogger {
    fn log(&self, event: ConversationEvent) {
        self.events
            .lock()
            .unwrap()
            .push((event.event_type.to_string(), event.payload));
    }
}

/// In-memory session store.
pub struct MemorySessionStore {
    sessions: Mutex<HashMap<SessionId, Session>>,
    saves: Mutex<usize>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            saves: Mutex::new(0),
        }
    }

    pub fn get(&self, id: &SessionId) -> Option<Session> {
        self.sessions.lock().unwrap().get(id).cloned()
    }

    pub fn saves(&self) -> usize {
        *self.saves.lock().unwrap()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self, id: &SessionId) -> Result<Option<Session>, StoreError> {
        Ok(self.sessions.lock().unwrap().get(id).cloned())
    }

    async fn save(&self, session: &Session) -> Result<(), StoreError> {
        *self.saves.lock().unwrap() += 1;
        self.sessions
            .lock()
            .unwrap()
            .insert(session.id().clone(), session.clone());
        Ok(())
    }

    async fn delete(&self, id: &SessionId) -> Result<(), StoreError> {
        self.sessions.lock().unwrap().remove(id);
        Ok(())
    }
}

/// Turn use case wired to mocks, with the default guardrail and the
/// extractive synthesis stage.
pub fn turn_use_case(
    store: std::sync::Arc<MockVectorStore>,
    handler: std::sync::Arc<MockHandler>,
) -> crate::use_cases::handle_turn::HandleTurnUseCase {
    use crate::config::{RetrievalParams, SynthesisParams};
    use crate::use_cases::handle_turn::HandleTurnUseCase;
    use crate::use_cases::knowledge_chain::KnowledgeChain;
    use crate::use_cases::retrieve::RetrievalEngine;
    use crate::use_cases::synthesize::SynthesisStage;
    use fincounsel_domain::PatternGuardrail;
    use std::sync::Arc;

    let engine = RetrievalEngine::new(
        Arc::new(MockEmbedder::new(store.dimension())),
        store,
        RetrievalParams::default().with_backoff_base(Duration::from_millis(1)),
    )
    .unwrap();
    let chain = Arc::new(KnowledgeChain::new(
        Arc::new(PatternGuardrail::new()),
        engine,
        SynthesisStage::extractive(SynthesisParams::default()),
    ));
    HandleTurnUseCase::new(chain, handler)
}
