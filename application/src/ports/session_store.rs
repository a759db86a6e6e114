//! Session persistence port
//!
//! A snapshot holds the message log, breaker counters and router state.
//! Loading a snapshot resumes a session without re-running any dispatch.

use async_trait::async_trait;
use fincounsel_domain::{Session, SessionId};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Session id cannot be used as a storage key: {0}")]
    InvalidId(String),
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn load(&self, id: &SessionId) -> Result<Option<Session>, StoreError>;

    async fn save(&self, session: &Session) -> Result<(), StoreError>;

    async fn delete(&self, id: &SessionId) -> Result<(), StoreError>;
}

/// Store that keeps nothing; sessions live only in memory.
pub struct NoSessionStore;

#[async_trait]
impl SessionStore for NoSessionStore {
    async fn load(&self, _id: &SessionId) -> Result<Option<Session>, StoreError> {
        Ok(None)
    }

    async fn save(&self, _session: &Session) -> Result<(), StoreError> {
        Ok(())
    }

    async fn delete(&self, _id: &SessionId) -> Result<(), StoreError> {
        Ok(())
    }
}
