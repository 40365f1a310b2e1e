use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::item::ComparedItem;

/// The unit of persistence and of cross-context sync.
///
/// Stored as one JSON value:
/// `{"items": [...], "refreshTimestamp": <epoch millis>}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedSnapshot {
    pub items: Vec<ComparedItem>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub refresh_timestamp: DateTime<Utc>,
}

impl PersistedSnapshot {
    pub fn new(items: Vec<ComparedItem>, refresh_timestamp: DateTime<Utc>) -> Self {
        Self {
            items,
            refresh_timestamp,
        }
    }

    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn decode(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}
