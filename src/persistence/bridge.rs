use chrono::{DateTime, Utc};
use tracing::{debug, error, warn};

use super::channel::StorageChange;
use super::snapshot::PersistedSnapshot;
use super::storage::{KeyValueStore, StorageError};
use crate::error::CompareError;
use crate::store::CompareSetStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Nothing stored under the key.
    Empty,
    Restored { items: usize },
    /// Load already ran for this bridge.
    AlreadyLoaded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// Initial load has not completed; writing now could clobber a snapshot
    /// that was never read.
    Deferred,
    Removed,
    Written { refresh_timestamp: DateTime<Utc> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The change concerns another key.
    Ignored,
    Cleared,
    Replaced { items: usize },
}

/// Keeps the persisted snapshot and the in-memory set consistent.
///
/// The bridge is the only writer of its key. Values received through
/// [`PersistenceBridge::reconcile`] only update memory and are never written
/// back, so contexts cannot echo each other's writes.
#[derive(Debug)]
pub struct PersistenceBridge<S> {
    storage: S,
    key: String,
    initial_load_complete: bool,
}

impl<S: KeyValueStore> PersistenceBridge<S> {
    pub fn new(storage: S, key: impl Into<String>) -> Self {
        Self {
            storage,
            key: key.into(),
            initial_load_complete: false,
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.initial_load_complete
    }

    /// Populate `set` from the stored snapshot.
    ///
    /// Runs once. Whatever the result, the bridge is marked loaded afterwards
    /// so later saves proceed; a corrupt snapshot leaves `set` empty.
    pub fn load(&mut self, set: &mut CompareSetStore) -> Result<LoadOutcome, CompareError> {
        if self.initial_load_complete {
            return Ok(LoadOutcome::AlreadyLoaded);
        }
        let result = self.read_into(set);
        self.initial_load_complete = true;

        if result.is_err() {
            set.clear();
        }
        result
    }

    fn read_into(&self, set: &mut CompareSetStore) -> Result<LoadOutcome, CompareError> {
        let raw = self
            .storage
            .get(&self.key)
            .map_err(|source| CompareError::StorageReadFailed {
                key: self.key.clone(),
                source,
            })?;

        let Some(raw) = raw.filter(|r| !r.is_empty()) else {
            debug!(key = %self.key, "no stored compare set");
            return Ok(LoadOutcome::Empty);
        };

        let snapshot =
            PersistedSnapshot::decode(&raw).map_err(|source| CompareError::StorageCorrupt {
                key: self.key.clone(),
                source,
            })?;

        set.replace(snapshot.items, Some(snapshot.refresh_timestamp));
        debug!(key = %self.key, size = set.len(), "restored compare set");
        Ok(LoadOutcome::Restored { items: set.len() })
    }

    /// Persist the current state of `set`.
    ///
    /// An empty set deletes the key. A set without a refresh timestamp is
    /// stamped with `now`, and `set` adopts that stamp. On failure the
    /// in-memory state is kept as is.
    pub fn save(
        &self,
        set: &mut CompareSetStore,
        now: DateTime<Utc>,
    ) -> Result<SaveOutcome, CompareError> {
        if !self.initial_load_complete {
            return Ok(SaveOutcome::Deferred);
        }

        if set.is_empty() {
            self.storage
                .remove(&self.key)
                .map_err(|source| self.persist_failed(source))?;
            debug!(key = %self.key, "removed empty compare set");
            return Ok(SaveOutcome::Removed);
        }

        let refresh_timestamp = set.refresh_timestamp().unwrap_or(now);
        let snapshot = PersistedSnapshot::new(set.items().to_vec(), refresh_timestamp);
        let raw = snapshot
            .encode()
            .map_err(|e| self.persist_failed(StorageError::Serialization(e)))?;

        self.storage
            .set(&self.key, &raw)
            .map_err(|source| self.persist_failed(source))?;

        set.adopt_timestamp(refresh_timestamp);
        debug!(key = %self.key, size = set.len(), "persisted compare set");
        Ok(SaveOutcome::Written { refresh_timestamp })
    }

    /// Apply a change made by another context. Last writer wins: the
    /// incoming snapshot replaces `set` wholesale.
    pub fn reconcile(
        &self,
        set: &mut CompareSetStore,
        change: &StorageChange,
    ) -> Result<SyncOutcome, CompareError> {
        if change.key != self.key {
            return Ok(SyncOutcome::Ignored);
        }

        let Some(raw) = change.new_value.as_deref().filter(|r| !r.is_empty()) else {
            set.clear();
            debug!(key = %self.key, origin = change.origin.as_u64(), "compare set cleared by another context");
            return Ok(SyncOutcome::Cleared);
        };

        let snapshot = PersistedSnapshot::decode(raw).map_err(|source| {
            error!(key = %self.key, origin = change.origin.as_u64(), error = %source, "unreadable external change");
            CompareError::StorageSyncFailed {
                key: self.key.clone(),
                source,
            }
        })?;

        let incoming = snapshot.items.len();
        set.replace(snapshot.items, Some(snapshot.refresh_timestamp));
        if set.len() != incoming {
            warn!(key = %self.key, incoming, kept = set.len(), "external snapshot normalized");
        }
        debug!(key = %self.key, size = set.len(), "compare set replaced by another context");
        Ok(SyncOutcome::Replaced { items: set.len() })
    }

    fn persist_failed(&self, source: StorageError) -> CompareError {
        error!(key = %self.key, error = %source, "failed to persist compare set");
        CompareError::StoragePersistFailed {
            key: self.key.clone(),
            source,
        }
    }
}
