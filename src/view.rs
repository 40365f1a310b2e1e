//! Helpers for the comparison page.

use crate::clock::Clock;
use crate::compare::Comparison;
use crate::error::CompareError;
use crate::item::{attribute_rows, AttributeRow};
use crate::persistence::KeyValueStore;
use crate::refresh::ItemLookup;
use crate::types::identifiers::ItemId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemovalRequest {
    Removed,
    /// Removing would end the comparison; the caller must confirm first.
    NeedsConfirmation(ItemId),
}

/// Two-step removal: dropping below the active threshold asks first.
#[derive(Debug, Default)]
pub struct RemovalFlow {
    pending: Option<ItemId>,
}

impl RemovalFlow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending(&self) -> Option<&ItemId> {
        self.pending.as_ref()
    }

    pub fn request<S, L, C>(
        &mut self,
        comparison: &Comparison<S, L, C>,
        id: ItemId,
    ) -> Result<RemovalRequest, CompareError>
    where
        S: KeyValueStore,
        L: ItemLookup,
        C: Clock,
    {
        if comparison.len() <= comparison.config().min_size {
            self.pending = Some(id.clone());
            return Ok(RemovalRequest::NeedsConfirmation(id));
        }
        comparison.remove(&id)?;
        Ok(RemovalRequest::Removed)
    }

    /// Carry out the pending removal. Returns the removed id, if any.
    pub fn confirm<S, L, C>(
        &mut self,
        comparison: &Comparison<S, L, C>,
    ) -> Result<Option<ItemId>, CompareError>
    where
        S: KeyValueStore,
        L: ItemLookup,
        C: Clock,
    {
        let Some(id) = self.pending.take() else {
            return Ok(None);
        };
        comparison.remove(&id)?;
        Ok(Some(id))
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }
}

/// Attribute table for the current set, or `None` when there are too few
/// items for a comparison.
pub fn comparison_table<S, L, C>(comparison: &Comparison<S, L, C>) -> Option<Vec<AttributeRow>>
where
    S: KeyValueStore,
    L: ItemLookup,
    C: Clock,
{
    let state = comparison.state();
    if !state.is_active() {
        return None;
    }
    Some(attribute_rows(&state.items))
}
