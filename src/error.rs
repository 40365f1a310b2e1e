//! Failure taxonomy and the report pipeline.
//!
//! Every failure carries an [`ErrorKind`]. Recoverable kinds are published as
//! transient [`ErrorReport`]s (with an optional retry). Non-recoverable kinds
//! become the comparison's current error until cleared.

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::persistence::channel::StorageChange;
use crate::persistence::storage::StorageError;
use crate::refresh::lookup::LookupError;
use crate::types::identifiers::ItemId;

#[derive(Debug, Error)]
pub enum CompareError {
    #[error("Item is missing a usable id")]
    InvalidItem,
    #[error("Cannot add {item_id}: compare set is full ({max} items)")]
    CapacityExceeded { item_id: ItemId, max: usize },
    #[error("Stored snapshot under {key} is unreadable: {source}")]
    StorageCorrupt {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("Failed to persist snapshot under {key}: {source}")]
    StoragePersistFailed {
        key: String,
        #[source]
        source: StorageError,
    },
    #[error("Failed to read snapshot under {key}: {source}")]
    StorageReadFailed {
        key: String,
        #[source]
        source: StorageError,
    },
    #[error("Cannot apply external change to {key}: {source}")]
    StorageSyncFailed {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("Refresh of {requested} items failed: {reason}")]
    RefreshFailed { requested: usize, reason: RefreshFailure },
}

impl CompareError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CompareError::InvalidItem => ErrorKind::InvalidItem,
            CompareError::CapacityExceeded { .. } => ErrorKind::CapacityExceeded,
            CompareError::StorageCorrupt { .. } | CompareError::StorageReadFailed { .. } => {
                ErrorKind::StorageCorrupt
            }
            CompareError::StoragePersistFailed { .. } => ErrorKind::StoragePersistFailed,
            CompareError::StorageSyncFailed { .. } => ErrorKind::StorageSyncFailed,
            CompareError::RefreshFailed { .. } => ErrorKind::RefreshFailed,
        }
    }
}

/// Why a refresh produced nothing usable.
#[derive(Debug, Error)]
pub enum RefreshFailure {
    #[error("no item resolved")]
    NothingResolved,
    #[error("lookup failed: {0}")]
    Lookup(#[from] LookupError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    InvalidItem,
    CapacityExceeded,
    StorageCorrupt,
    StoragePersistFailed,
    StorageSyncFailed,
    RefreshFailed,
}

impl ErrorKind {
    /// Recoverable failures are transient and may offer a retry. The rest
    /// are held as the current error state.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, ErrorKind::StorageSyncFailed | ErrorKind::RefreshFailed)
    }

    /// User-facing message.
    pub fn message(&self, max_size: usize) -> String {
        match self {
            ErrorKind::InvalidItem => "Cannot process item in comparison list.".into(),
            ErrorKind::CapacityExceeded => {
                format!("You can compare up to {max_size} items at a time.")
            }
            ErrorKind::StorageCorrupt => "Unable to load comparison list.".into(),
            ErrorKind::StoragePersistFailed => "Unable to save comparison list.".into(),
            ErrorKind::StorageSyncFailed => {
                "Unable to synchronize comparison list between tabs.".into()
            }
            ErrorKind::RefreshFailed => "Unable to refresh item details for comparison.".into(),
        }
    }
}

/// Operation a recoverable report can re-run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryAction {
    Refresh,
    /// Re-parse the payload of the change that failed to apply.
    Resync(StorageChange),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorReport {
    pub kind: ErrorKind,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub recoverable: bool,
    pub retry: Option<RetryAction>,
}

impl ErrorReport {
    pub fn new(kind: ErrorKind, message: String, timestamp: DateTime<Utc>) -> Self {
        Self {
            kind,
            message,
            timestamp,
            recoverable: kind.is_recoverable(),
            retry: None,
        }
    }

    pub fn with_retry(mut self, retry: RetryAction) -> Self {
        self.retry = Some(retry);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recoverability_follows_kind() {
        assert!(ErrorKind::RefreshFailed.is_recoverable());
        assert!(ErrorKind::StorageSyncFailed.is_recoverable());
        assert!(!ErrorKind::InvalidItem.is_recoverable());
        assert!(!ErrorKind::CapacityExceeded.is_recoverable());
        assert!(!ErrorKind::StorageCorrupt.is_recoverable());
        assert!(!ErrorKind::StoragePersistFailed.is_recoverable());
    }

    #[test]
    fn capacity_message_names_limit() {
        assert_eq!(
            ErrorKind::CapacityExceeded.message(3),
            "You can compare up to 3 items at a time."
        );
    }

    #[test]
    fn compare_error_maps_to_kind() {
        let err = CompareError::CapacityExceeded {
            item_id: ItemId::from("z"),
            max: 3,
        };
        assert_eq!(err.kind(), ErrorKind::CapacityExceeded);
        assert_eq!(err.to_string(), "Cannot add z: compare set is full (3 items)");
    }
}
