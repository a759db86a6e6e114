//! Session manager.
//!
//! Owns the live sessions and serializes turns per session: each session sits
//! behind its own `tokio::sync::Mutex`, so turns of one session never overlap
//! while different sessions run concurrently.
//!
//! A turn runs against a staged copy of the session. The copy replaces the
//! live session (and is persisted) only if the turn finished before its
//! deadline and without being cancelled.

use crate::config::SessionParams;
use crate::ports::progress::TurnProgress;
use crate::ports::session_store::SessionStore;
use crate::use_cases::handle_turn::{HandleTurnError, HandleTurnUseCase, TurnReply};
use chrono::{DateTime, Utc};
use fincounsel_domain::{Session, SessionId};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub struct SessionManager {
    use_case: HandleTurnUseCase,
    store: Arc<dyn SessionStore>,
    params: SessionParams,
    sessions: Mutex<HashMap<SessionId, Arc<Mutex<Session>>>>,
}

impl SessionManager {
    pub fn new(
        use_case: HandleTurnUseCase,
        store: Arc<dyn SessionStore>,
        params: SessionParams,
    ) -> Self {
        Self {
            use_case,
            store,
            params,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    fn threshold(&self) -> u32 {
        self.use_case.breaker_params().threshold
    }

    /// Live handle for `id`, resuming from the store or creating a new
    /// session on first use.
    async fn handle(&self, id: &SessionId) -> Result<Arc<Mutex<Session>>, HandleTurnError> {
        let mut sessions = self.sessions.lock().await;
        if let Some(handle) = sessions.get(id) {
            return Ok(handle.clone());
        }

        let session = match self.store.load(id).await? {
            Some(session) => {
                info!(
                    session = %id,
                    turn = session.turn(),
                    halted = session.is_halted(),
                    "resumed session from store"
                );
                session
            }
            None => {
                debug!(session = %id, "starting new session");
                Session::new(id.clone(), self.threshold())
            }
        };
        let handle = Arc::new(Mutex::new(session));
        sessions.insert(id.clone(), handle.clone());
        Ok(handle)
    }

    /// Handle one user message for session `id`.
    ///
    /// Returns [`HandleTurnError::Cancelled`] or
    /// [`HandleTurnError::DeadlineExceeded`] without changing the session
    /// when the turn is abandoned.
    pub async fn handle_turn(
        &self,
        id: &SessionId,
        text: &str,
        cancellation: &CancellationToken,
        progress: &dyn TurnProgress,
    ) -> Result<TurnReply, HandleTurnError> {
        let handle = self.handle(id).await?;
        let mut live = handle.lock().await;

        if cancellation.is_cancelled() {
            return Err(HandleTurnError::Cancelled);
        }

        let mut staged = live.clone();
        let result = {
            let turn = async {
                match self.params.turn_deadline {
                    Some(deadline) => {
                        tokio::time::timeout(deadline, self.use_case.execute(&mut staged, text, progress))
                            .await
                            .map_err(|_| HandleTurnError::DeadlineExceeded)?
                    }
                    None => self.use_case.execute(&mut staged, text, progress).await,
                }
            };
            tokio::select! {
                biased;
                _ = cancellation.cancelled() => Err(HandleTurnError::Cancelled),
                result = turn => result,
            }
        };

        let reply = match result {
            Ok(reply) if !cancellation.is_cancelled() => reply,
            Ok(_) => {
                info!(session = %id, "turn cancelled after completion, discarding");
                return Err(HandleTurnError::Cancelled);
            }
            Err(e) => {
                if matches!(e, HandleTurnError::Cancelled | HandleTurnError::DeadlineExceeded) {
                    info!(session = %id, "turn abandoned: {}", e);
                }
                return Err(e);
            }
        };

        *live = staged;
        if let Err(e) = self.store.save(&live).await {
            warn!(session = %id, "failed to persist session: {}", e);
        }
        Ok(reply)
    }

    /// Clear the history and breaker of session `id`.
    pub async fn reset(&self, id: &SessionId) -> Result<(), HandleTurnError> {
        let handle = self.handle(id).await?;
        let mut session = handle.lock().await;
        session.reset();
        self.store.save(&session).await?;
        info!(session = %id, "session reset");
        Ok(())
    }

    /// Drop session `id` from memory and from the store.
    pub async fn end(&self, id: &SessionId) -> Result<(), HandleTurnError> {
        self.sessions.lock().await.remove(id);
        self.store.delete(id).await?;
        info!(session = %id, "session ended");
        Ok(())
    }

    /// Copy of session `id`, live or stored.
    pub async fn snapshot(&self, id: &SessionId) -> Result<Option<Session>, HandleTurnError> {
        let handle = self.sessions.lock().await.get(id).cloned();
        match handle {
            Some(handle) => Ok(Some(handle.lock().await.clone())),
            None => Ok(self.store.load(id).await?),
        }
    }

    /// Number of sessions held in memory.
    pub async fn live_sessions(&self) -> usize {
        self.sessions.lock().await.len()
    }

    /// Evict sessions idle longer than the configured timeout as of `now`.
    ///
    /// Sessions with a turn in progress are skipped. Evicted sessions stay in
    /// the store and resume on their next turn.
    pub async fn evict_idle_at(&self, now: DateTime<Utc>) -> Vec<SessionId> {
        let timeout = self.params.idle_timeout;
        let mut sessions = self.sessions.lock().await;
        let idle: Vec<SessionId> = sessions
            .iter()
            .filter_map(|(id, handle)| {
                let session = handle.try_lock().ok()?;
                let idle_for = session.idle_for(now).to_std().ok()?;
                (idle_for > timeout).then(|| id.clone())
            })
            .collect();

        for id in &idle {
            sessions.remove(id);
        }
        if !idle.is_empty() {
            debug!(evicted = idle.len(), "evicted idle sessions");
        }
        idle
    }

    pub async fn evict_idle(&self) -> Vec<SessionId> {
        self.evict_idle_at(Utc::now()).await
    }
}
