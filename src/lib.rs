//! Bounded comparison set for storefront clients.
//!
//! `compare-core` keeps a small ordered set of items a shopper is comparing.
//! The set is capped, persisted as one snapshot in a key-value store, kept
//! in step across contexts sharing that store (last writer wins), and its
//! item payloads are re-fetched from a lookup service once they go stale.
//!
//! The entry point is [`Comparison`].

pub mod clock;
pub mod compare;
pub mod config;
pub mod error;
pub mod item;
pub mod persistence;
pub mod refresh;
pub mod store;
pub mod types;
pub mod view;

pub use clock::{Clock, ManualClock, SystemClock};
pub use compare::Comparison;
pub use config::{CompareConfig, ConfigError};
pub use error::{CompareError, ErrorKind, ErrorReport, RetryAction};
pub use item::{ComparedItem, ItemId};
pub use refresh::{ItemLookup, LookupError, LookupOptions, RefreshOutcome};
pub use store::Toggled;
pub use types::CompareState;
