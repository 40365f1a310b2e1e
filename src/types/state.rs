use chrono::{DateTime, Utc};

use crate::error::ErrorReport;
use crate::item::ComparedItem;

/// Point-in-time view handed to consumers.
#[derive(Debug, Clone, PartialEq)]
pub struct CompareState {
    pub items: Vec<ComparedItem>,
    pub refresh_timestamp: Option<DateTime<Utc>>,
    /// A refresh is in flight.
    pub is_loading: bool,
    /// Current non-recoverable error, held until cleared.
    pub last_error: Option<ErrorReport>,
    pub min_size: usize,
}

impl CompareState {
    /// Whether there are enough items for a comparison to be shown.
    pub fn is_active(&self) -> bool {
        self.items.len() >= self.min_size
    }
}
