//! In-process session store, used when history is disabled and in tests.

use super::session::{RunStatus, SessionRecord, SessionStore, SessionTotals};
use crate::config::ScanProfile;
use crate::error::{StorageError, StorageResult};
use crate::scanner::HostResult;
use crate::types::SessionId;
use async_trait::async_trait;
use std::sync::{Mutex, MutexGuard};

/// Keeps session records in memory for the life of the process.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    sessions: Mutex<Vec<SessionRecord>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every record, in creation order.
    pub fn sessions(&self) -> Vec<SessionRecord> {
        self.lock().clone()
    }

    pub fn get(&self, id: &SessionId) -> Option<SessionRecord> {
        self.lock().iter().find(|r| r.id == *id).cloned()
    }

    fn modify(
        &self,
        id: &SessionId,
        change: impl FnOnce(&mut SessionRecord),
    ) -> StorageResult<()> {
        let mut sessions = self.lock();
        let record = sessions
            .iter_mut()
            .find(|r| r.id == *id)
            .ok_or_else(|| StorageError::SessionNotFound(id.to_string()))?;
        change(record);
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, Vec<SessionRecord>> {
        self.sessions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn create_session(
        &self,
        target: &str,
        profile: ScanProfile,
        ports: Option<&str>,
    ) -> StorageResult<SessionId> {
        let record = SessionRecord::new(target, profile, ports);
        let id = record.id;
        self.lock().push(record);
        Ok(id)
    }

    async fn save_result(&self, id: &SessionId, result: &HostResult) -> StorageResult<()> {
        self.modify(id, |record| record.results.push(result.clone()))
    }

    async fn update_session(
        &self,
        id: &SessionId,
        status: RunStatus,
        totals: SessionTotals,
    ) -> StorageResult<()> {
        self.modify(id, |record| record.apply_update(status, totals))
    }
}
