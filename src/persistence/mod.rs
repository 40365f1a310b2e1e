pub mod bridge;
pub mod channel;
pub mod file_store;
pub mod snapshot;
pub mod storage;

pub use bridge::{LoadOutcome, PersistenceBridge, SaveOutcome, SyncOutcome};
pub use channel::{ChangeChannel, ChangeSubscription, ContextId, NotifyingStore, StorageChange};
pub use file_store::FileStore;
pub use snapshot::PersistedSnapshot;
pub use storage::{KeyValueStore, MemoryStore, StorageError};
