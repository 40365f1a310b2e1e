use async_trait::async_trait;
use thiserror::Error;

use crate::item::ComparedItem;
use crate::types::identifiers::ItemId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LookupOptions {
    /// Bypass any intermediate cache and ask the source of truth.
    pub force_refresh: bool,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LookupError {
    #[error("lookup service unavailable: {0}")]
    Unavailable(String),
    #[error("lookup of {id} failed: {message}")]
    Failed { id: ItemId, message: String },
}

/// Authoritative source of item payloads.
///
/// `Ok(None)` means the item no longer exists; that is a normal outcome,
/// not an error. Implementations must tolerate concurrent calls.
#[async_trait]
pub trait ItemLookup: Send + Sync {
    async fn fetch_item_by_id(
        &self,
        id: &ItemId,
        options: LookupOptions,
    ) -> Result<Option<ComparedItem>, LookupError>;
}
