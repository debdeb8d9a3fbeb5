//! JSON-file session storage.
//!
//! Stores each session as a separate JSON file for simplicity and durability.
//! Supports listing, querying, and exporting sessions.

use super::session::{
    latest_completed, network_map, search_records, statistics, HostMatch, NetworkMap, RunStatus,
    SessionRecord, SessionStore, SessionTotals, StoreStatistics,
};
use crate::config::{Paths, ScanProfile};
use crate::error::{StorageError, StorageResult};
use crate::scanner::HostResult;
use crate::types::SessionId;
use async_trait::async_trait;
use chrono::Utc;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

/// JSON file-based session store.
///
/// Clones share the write lock, so a clone handed to a blocking task
/// still serialises with the original.
#[derive(Clone)]
pub struct JsonSessionStore {
    sessions_dir: PathBuf,
    // Serialises read-modify-write cycles on session files.
    write_lock: Arc<Mutex<()>>,
}

impl JsonSessionStore {
    /// Open (and create if needed) a store rooted at `dir`.
    pub fn open(dir: impl AsRef<Path>) -> StorageResult<Self> {
        let sessions_dir = dir.as_ref().to_path_buf();

        fs::create_dir_all(&sessions_dir)
            .map_err(|e| StorageError::DirectoryError(e.to_string()))?;

        Ok(Self {
            sessions_dir,
            write_lock: Arc::new(Mutex::new(())),
        })
    }

    /// Open the store in the user's data directory.
    pub fn open_default(paths: &Paths) -> StorageResult<Self> {
        Self::open(paths.sessions_dir())
    }

    /// Write a session record.
    pub fn save(&self, record: &SessionRecord) -> StorageResult<()> {
        let file = self.session_file(&record.id);
        let content = serde_json::to_string_pretty(record)?;

        fs::write(&file, content).map_err(|e| StorageError::SaveFailed(e.to_string()))
    }

    /// Load a session record by ID.
    pub fn load(&self, id: &SessionId) -> StorageResult<SessionRecord> {
        let file = self.session_file(id);

        if !file.exists() {
            return Err(StorageError::SessionNotFound(id.to_string()));
        }

        let content =
            fs::read_to_string(&file).map_err(|e| StorageError::LoadFailed(e.to_string()))?;

        serde_json::from_str(&content).map_err(|e| StorageError::LoadFailed(e.to_string()))
    }

    /// Load by full ID or by a unique prefix of one.
    pub fn find(&self, id_or_prefix: &str) -> StorageResult<SessionRecord> {
        match id_or_prefix.parse::<SessionId>() {
            Ok(id) => self.load(&id),
            Err(_) => self.find_by_prefix(id_or_prefix),
        }
    }

    /// Find a session by short ID prefix.
    pub fn find_by_prefix(&self, prefix: &str) -> StorageResult<SessionRecord> {
        let matches: Vec<_> = self
            .list_ids()?
            .into_iter()
            .filter(|id| id.matches_prefix(prefix))
            .collect();

        match matches.as_slice() {
            [] => Err(StorageError::SessionNotFound(prefix.to_string())),
            [id] => self.load(id),
            _ => Err(StorageError::AmbiguousPrefix {
                prefix: prefix.to_string(),
                matches: matches.len(),
            }),
        }
    }

    /// List all session IDs.
    pub fn list_ids(&self) -> StorageResult<Vec<SessionId>> {
        let mut ids = Vec::new();

        for entry in fs::read_dir(&self.sessions_dir)
            .map_err(|e| StorageError::DirectoryError(e.to_string()))?
        {
            let entry = entry.map_err(|e| StorageError::DirectoryError(e.to_string()))?;
            let path = entry.path();

            if path.extension().is_some_and(|ext| ext == "json") {
                if let Some(stem) = path.file_stem() {
                    if let Ok(id) = stem.to_string_lossy().parse::<SessionId>() {
                        ids.push(id);
                    }
                }
            }
        }

        Ok(ids)
    }

    /// Every readable session, newest first.
    pub fn all(&self) -> StorageResult<Vec<SessionRecord>> {
        let mut records = Vec::new();

        for id in self.list_ids()? {
            match self.load(&id) {
                Ok(record) => records.push(record),
                Err(e) => tracing::warn!(session = %id, error = %e, "skipping unreadable session"),
            }
        }

        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(records)
    }

    /// A page of sessions, newest first.
    pub fn list(&self, limit: usize, offset: usize) -> StorageResult<Vec<SessionRecord>> {
        Ok(self.all()?.into_iter().skip(offset).take(limit).collect())
    }

    /// Delete a session record.
    pub fn delete(&self, id: &SessionId) -> StorageResult<()> {
        let file = self.session_file(id);

        if !file.exists() {
            return Err(StorageError::SessionNotFound(id.to_string()));
        }

        fs::remove_file(&file).map_err(|e| StorageError::SaveFailed(e.to_string()))
    }

    /// Host results whose address contains `query`, newest first.
    pub fn search_hosts(&self, query: &str, limit: usize) -> StorageResult<Vec<HostMatch>> {
        Ok(search_records(&self.all()?, query, limit))
    }

    /// Aggregate statistics over every stored session.
    pub fn statistics(&self) -> StorageResult<StoreStatistics> {
        Ok(statistics(&self.all()?, Utc::now()))
    }

    /// Network map of the given session, or of the newest completed one.
    /// `None` when no session has completed yet.
    pub fn network_map(&self, id_or_prefix: Option<&str>) -> StorageResult<Option<NetworkMap>> {
        match id_or_prefix {
            Some(id) => Ok(Some(network_map(&self.find(id)?))),
            None => Ok(latest_completed(&self.all()?).map(network_map)),
        }
    }

    fn modify(
        &self,
        id: &SessionId,
        change: impl FnOnce(&mut SessionRecord),
    ) -> StorageResult<()> {
        let _guard = self.lock();
        let mut record = self.load(id)?;
        change(&mut record);
        self.save(&record)
    }

    /// Run file work on the blocking pool instead of a runtime worker.
    async fn blocking<T, F>(&self, work: F) -> StorageResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&JsonSessionStore) -> StorageResult<T> + Send + 'static,
    {
        let store = self.clone();
        tokio::task::spawn_blocking(move || work(&store))
            .await
            .map_err(|e| StorageError::SaveFailed(format!("storage task failed: {e}")))?
    }

    fn lock(&self) -> MutexGuard<'_, ()> {
        self.write_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Get the file path for a session.
    fn session_file(&self, id: &SessionId) -> PathBuf {
        self.sessions_dir.join(format!("{}.json", id))
    }
}

#[async_trait]
impl SessionStore for JsonSessionStore {
    async fn create_session(
        &self,
        target: &str,
        profile: ScanProfile,
        ports: Option<&str>,
    ) -> StorageResult<SessionId> {
        let record = SessionRecord::new(target, profile, ports);
        self.blocking(move |store| {
            store.save(&record)?;
            Ok(record.id)
        })
        .await
    }

    async fn save_result(&self, id: &SessionId, result: &HostResult) -> StorageResult<()> {
        let (id, result) = (*id, result.clone());
        self.blocking(move |store| store.modify(&id, |record| record.results.push(result)))
            .await
    }

    async fn update_session(
        &self,
        id: &SessionId,
        status: RunStatus,
        totals: SessionTotals,
    ) -> StorageResult<()> {
        let id = *id;
        self.blocking(move |store| store.modify(&id, |record| record.apply_update(status, totals)))
            .await
    }
}
