//! One pretty-printed JSON snapshot per session id.

use async_trait::async_trait;
use fincounsel_application::ports::session_store::{SessionStore, StoreError};
use fincounsel_domain::{Session, SessionId};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

/// File-backed [`SessionStore`] writing `<dir>/<session id>.json`.
///
/// Saves go to a temporary sibling first and are renamed into place, so a
/// crash mid-write leaves the previous snapshot intact.
pub struct JsonSessionStore {
    dir: PathBuf,
}

impl JsonSessionStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, id: &SessionId) -> Result<PathBuf, StoreError> {
        let key = id.as_str();
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
            && !key.starts_with('.');
        if !valid {
            return Err(StoreError::InvalidId(key.to_string()));
        }
        Ok(self.dir.join(format!("{}.json", key)))
    }
}

fn io_error(path: &Path, e: std::io::Error) -> StoreError {
    StoreError::Io(format!("{}: {}", path.display(), e))
}

#[async_trait]
impl SessionStore for JsonSessionStore {
    async fn load(&self, id: &SessionId) -> Result<Option<Session>, StoreError> {
        let path = self.path_for(id)?;
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(io_error(&path, e)),
        };
        let session = serde_json::from_slice(&bytes)
            .map_err(|e| StoreError::Serialization(format!("{}: {}", path.display(), e)))?;
        debug!(session = %id, "Loaded session snapshot");
        Ok(Some(session))
    }

    async fn save(&self, session: &Session) -> Result<(), StoreError> {
        let path = self.path_for(session.id())?;
        let json = serde_json::to_vec_pretty(session)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;

        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| io_error(&self.dir, e))?;
        let staging = path.with_extension("json.tmp");
        tokio::fs::write(&staging, json)
            .await
            .map_err(|e| io_error(&staging, e))?;
        tokio::fs::rename(&staging, &path)
            .await
            .map_err(|e| io_error(&path, e))?;

        debug!(session = %session.id(), turn = session.turn(), "Saved session snapshot");
        Ok(())
    }

    async fn delete(&self, id: &SessionId) -> Result<(), StoreError> {
        let path = self.path_for(id)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_error(&path, e)),
        }
    }
}
