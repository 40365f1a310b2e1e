//! In-memory compare set.
//!
//! Owns the capacity and uniqueness invariants and the refresh timestamp.
//! Performs no I/O; callers persist after each mutation.

use chrono::{DateTime, Utc};

use crate::error::CompareError;
use crate::item::ComparedItem;
use crate::types::identifiers::{ItemId, SetFingerprint};

/// Result of a successful toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggled {
    Added,
    Removed,
}

#[derive(Debug, Clone)]
pub struct CompareSetStore {
    items: Vec<ComparedItem>,
    refresh_timestamp: Option<DateTime<Utc>>,
    max_size: usize,
}

impl CompareSetStore {
    pub fn new(max_size: usize) -> Self {
        Self {
            items: Vec::with_capacity(max_size),
            refresh_timestamp: None,
            max_size,
        }
    }

    pub fn items(&self) -> &[ComparedItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn refresh_timestamp(&self) -> Option<DateTime<Utc>> {
        self.refresh_timestamp
    }

    pub fn contains(&self, id: &ItemId) -> bool {
        self.items.iter().any(|item| &item.id == id)
    }

    pub fn ids(&self) -> Vec<ItemId> {
        self.items.iter().map(|item| item.id.clone()).collect()
    }

    pub fn fingerprint(&self) -> SetFingerprint {
        SetFingerprint::of(self.items.iter().map(|item| &item.id))
    }

    /// Remove `item` if present, otherwise append it.
    ///
    /// A full set rejects additions and is left unchanged.
    pub fn toggle(&mut self, item: ComparedItem) -> Result<Toggled, CompareError> {
        if item.id.is_empty() {
            return Err(CompareError::InvalidItem);
        }

        if self.contains(&item.id) {
            self.retain_without(&item.id);
            return Ok(Toggled::Removed);
        }

        if self.items.len() >= self.max_size {
            return Err(CompareError::CapacityExceeded {
                item_id: item.id,
                max: self.max_size,
            });
        }

        self.items.push(item);
        Ok(Toggled::Added)
    }

    /// Remove the item with `id`. Absent ids are a no-op.
    ///
    /// Returns whether an item was removed.
    pub fn remove(&mut self, id: &ItemId) -> Result<bool, CompareError> {
        if id.is_empty() {
            return Err(CompareError::InvalidItem);
        }

        let before = self.items.len();
        self.retain_without(id);
        Ok(self.items.len() != before)
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.refresh_timestamp = None;
    }

    /// Wholesale replacement from a snapshot (load or external change).
    ///
    /// Input that violates the set invariants is normalized: empty and
    /// duplicate ids are dropped (first occurrence wins) and the tail beyond
    /// capacity is cut.
    pub fn replace(&mut self, items: Vec<ComparedItem>, refresh_timestamp: Option<DateTime<Utc>>) {
        self.items = normalize(items, self.max_size);
        self.refresh_timestamp = if self.items.is_empty() {
            None
        } else {
            refresh_timestamp
        };
    }

    /// Swap in freshly fetched items and stamp them fresh.
    pub fn apply_refresh(&mut self, items: Vec<ComparedItem>, refreshed_at: DateTime<Utc>) {
        self.replace(items, Some(refreshed_at));
    }

    /// Record the timestamp that was written alongside a first save.
    pub fn adopt_timestamp(&mut self, timestamp: DateTime<Utc>) {
        if self.refresh_timestamp.is_none() && !self.items.is_empty() {
            self.refresh_timestamp = Some(timestamp);
        }
    }

    fn retain_without(&mut self, id: &ItemId) {
        self.items.retain(|item| &item.id != id);
        if self.items.is_empty() {
            self.refresh_timestamp = None;
        }
    }
}

fn normalize(items: Vec<ComparedItem>, max_size: usize) -> Vec<ComparedItem> {
    let mut kept: Vec<ComparedItem> = Vec::with_capacity(items.len().min(max_size));
    for item in items {
        if kept.len() == max_size {
            break;
        }
        if item.id.is_empty() || kept.iter().any(|k| k.id == item.id) {
            continue;
        }
        kept.push(item);
    }
    kept
}
