//! Cross-context change notifications.
//!
//! Every context attached to the same store writes through a
//! [`NotifyingStore`], which publishes a [`StorageChange`] on each write. A
//! subscription only yields changes made by *other* contexts, mirroring how
//! browsers deliver storage events.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::debug;

use super::storage::{KeyValueStore, StorageError};

const DEFAULT_CHANNEL_CAPACITY: usize = 64;

/// Identity of one browsing context (tab) sharing the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContextId(u64);

impl ContextId {
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

/// A write observed on the shared store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageChange {
    pub key: String,
    pub old_value: Option<String>,
    /// `None` when the key was removed.
    pub new_value: Option<String>,
    pub origin: ContextId,
}

/// Broadcast channel shared by every context of one origin.
#[derive(Debug, Clone)]
pub struct ChangeChannel {
    sender: broadcast::Sender<StorageChange>,
    next_context: Arc<AtomicU64>,
}

impl ChangeChannel {
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        assert!(capacity > 0, "change channel capacity must be positive");
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            next_context: Arc::new(AtomicU64::new(1)),
        }
    }

    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Allocate an identity for a new context.
    pub fn register(&self) -> ContextId {
        ContextId(self.next_context.fetch_add(1, Ordering::Relaxed))
    }

    pub fn publish(&self, change: StorageChange) {
        // No receivers is fine: no other context is listening yet.
        let _ = self.sender.send(change);
    }

    /// Subscribe on behalf of `context`; its own writes are filtered out.
    #[must_use]
    pub fn subscribe(&self, context: ContextId) -> ChangeSubscription {
        ChangeSubscription {
            context,
            receiver: self.sender.subscribe(),
        }
    }
}

impl Default for ChangeChannel {
    fn default() -> Self {
        Self::new()
    }
}

pub struct ChangeSubscription {
    context: ContextId,
    receiver: broadcast::Receiver<StorageChange>,
}

impl ChangeSubscription {
    /// Next change written by another context. `None` once every publisher
    /// has been dropped.
    pub async fn next(&mut self) -> Option<StorageChange> {
        loop {
            match self.receiver.recv().await {
                Ok(change) if change.origin == self.context => continue,
                Ok(change) => return Some(change),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    // Snapshots are whole values, so only the newest matters.
                    debug!(skipped, "change subscription lagged");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Non-blocking variant of [`ChangeSubscription::next`].
    pub fn try_next(&mut self) -> Option<StorageChange> {
        loop {
            match self.receiver.try_recv() {
                Ok(change) if change.origin == self.context => continue,
                Ok(change) => return Some(change),
                Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
                Err(_) => return None,
            }
        }
    }
}

/// Store wrapper that announces every write on a [`ChangeChannel`].
#[derive(Debug, Clone)]
pub struct NotifyingStore<S> {
    inner: S,
    channel: ChangeChannel,
    context: ContextId,
}

impl<S: KeyValueStore> NotifyingStore<S> {
    /// Attach a new context to `inner`, allocating its identity on `channel`.
    pub fn attach(inner: S, channel: &ChangeChannel) -> Self {
        Self {
            inner,
            context: channel.register(),
            channel: channel.clone(),
        }
    }

    pub fn context(&self) -> ContextId {
        self.context
    }

    pub fn subscribe(&self) -> ChangeSubscription {
        self.channel.subscribe(self.context)
    }

    fn announce(&self, key: &str, old_value: Option<String>, new_value: Option<String>) {
        if old_value == new_value {
            return;
        }
        self.channel.publish(StorageChange {
            key: key.to_string(),
            old_value,
            new_value,
            origin: self.context,
        });
    }
}

impl<S: KeyValueStore> KeyValueStore for NotifyingStore<S> {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let old_value = self.inner.get(key)?;
        self.inner.set(key, value)?;
        self.announce(key, old_value, Some(value.to_string()));
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let old_value = self.inner.get(key)?;
        self.inner.remove(key)?;
        self.announce(key, old_value, None);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::storage::MemoryStore;

    #[test]
    fn writer_does_not_see_its_own_changes() {
        let channel = ChangeChannel::new();
        let shared = MemoryStore::new();
        let tab_a = NotifyingStore::attach(shared.clone(), &channel);
        let tab_b = NotifyingStore::attach(shared, &channel);

        let mut sub_a = tab_a.subscribe();
        let mut sub_b = tab_b.subscribe();

        tab_a.set("k", "v1").unwrap();

        assert!(sub_a.try_next().is_none());
        let change = sub_b.try_next().expect("tab b should observe tab a's write");
        assert_eq!(change.origin, tab_a.context());
        assert_eq!(change.old_value, None);
        assert_eq!(change.new_value.as_deref(), Some("v1"));
    }

    #[test]
    fn unchanged_values_are_not_announced() {
        let channel = ChangeChannel::new();
        let shared = MemoryStore::new();
        let tab_a = NotifyingStore::attach(shared.clone(), &channel);
        let tab_b = NotifyingStore::attach(shared, &channel);
        let mut sub_b = tab_b.subscribe();

        tab_a.set("k", "same").unwrap();
        tab_a.set("k", "same").unwrap();
        tab_a.remove("missing").unwrap();

        assert!(sub_b.try_next().is_some());
        assert!(sub_b.try_next().is_none());
    }

    #[tokio::test]
    async fn removal_is_delivered_as_none() {
        let channel = ChangeChannel::new();
        let shared = MemoryStore::new();
        let tab_a = NotifyingStore::attach(shared.clone(), &channel);
        let tab_b = NotifyingStore::attach(shared, &channel);
        let mut sub_b = tab_b.subscribe();

        tab_a.set("k", "v").unwrap();
        tab_a.remove("k").unwrap();

        assert_eq!(sub_b.next().await.unwrap().new_value.as_deref(), Some("v"));
        let removal = sub_b.next().await.unwrap();
        assert_eq!(removal.old_value.as_deref(), Some("v"));
        assert_eq!(removal.new_value, None);
    }
}
