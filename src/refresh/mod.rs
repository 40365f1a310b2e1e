//! Staleness-driven refresh of compared items.

pub mod lookup;
pub mod staleness;

use futures::future::try_join_all;
use tracing::warn;

use crate::item::ComparedItem;
use crate::types::identifiers::ItemId;
pub use lookup::{ItemLookup, LookupError, LookupOptions};
pub use staleness::is_stale;

/// Result of a refresh request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// Nothing to refresh: the set is empty.
    Skipped,
    /// Fresh items were swapped in.
    Applied { kept: usize, dropped: usize },
    /// Another refresh was in flight; a follow-up has been queued behind it.
    Coalesced,
    /// The set changed while the lookups ran; the results were dropped.
    Discarded,
}

/// Single in-flight guard with one coalesced follow-up.
#[derive(Debug, Default)]
pub struct RefreshGuard {
    in_flight: bool,
    follow_up: bool,
}

impl RefreshGuard {
    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }

    /// Claim the guard. Returns `false` (and queues a follow-up) when a
    /// refresh is already running.
    pub fn try_begin(&mut self) -> bool {
        if self.in_flight {
            self.follow_up = true;
            return false;
        }
        self.in_flight = true;
        true
    }

    /// Release the guard. Returns whether a follow-up was requested while
    /// it was held; the flag is consumed.
    pub fn finish(&mut self) -> bool {
        self.in_flight = false;
        std::mem::take(&mut self.follow_up)
    }
}

/// Fetch every id concurrently with `force_refresh` set.
///
/// Not-found items are dropped, as are results whose id does not match the
/// requested one. Any lookup error fails the whole batch.
pub async fn fetch_fresh<L>(lookup: &L, ids: &[ItemId]) -> Result<Vec<ComparedItem>, LookupError>
where
    L: ItemLookup + ?Sized,
{
    let options = LookupOptions {
        force_refresh: true,
    };
    let results = try_join_all(ids.iter().map(|id| lookup.fetch_item_by_id(id, options))).await?;

    let fresh = ids
        .iter()
        .zip(results)
        .filter_map(|(requested, found)| match found {
            Some(item) if &item.id == requested => Some(item),
            Some(item) => {
                warn!(item_id = %requested, returned = %item.id, "lookup returned a different item");
                None
            }
            None => None,
        })
        .collect();
    Ok(fresh)
}
