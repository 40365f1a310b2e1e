//! Consumer-facing comparison handle.
//!
//! [`Comparison`] wires the in-memory set, the persistence bridge and the
//! refresher together. Construct one per context and share it (e.g. behind
//! an `Arc`) with whatever needs it.

use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::broadcast;
use tracing::{debug, error, warn};

use crate::clock::{Clock, SystemClock};
use crate::config::{CompareConfig, ConfigError};
use crate::error::{CompareError, ErrorReport, RefreshFailure, RetryAction};
use crate::item::ComparedItem;
use crate::persistence::{
    ChangeSubscription, KeyValueStore, LoadOutcome, PersistenceBridge, StorageChange, SyncOutcome,
};
use crate::refresh::{fetch_fresh, is_stale, ItemLookup, LookupError, RefreshGuard, RefreshOutcome};
use crate::store::{CompareSetStore, Toggled};
use crate::types::identifiers::{ItemId, SetFingerprint};
use crate::types::state::CompareState;

const REPORT_CHANNEL_CAPACITY: usize = 16;

struct Inner<S> {
    set: CompareSetStore,
    bridge: PersistenceBridge<S>,
    guard: RefreshGuard,
    last_error: Option<ErrorReport>,
}

pub struct Comparison<S, L, C = SystemClock> {
    config: CompareConfig,
    inner: Mutex<Inner<S>>,
    lookup: L,
    clock: C,
    reports: broadcast::Sender<ErrorReport>,
}

impl<S, L> Comparison<S, L, SystemClock>
where
    S: KeyValueStore,
    L: ItemLookup,
{
    pub fn new(config: CompareConfig, storage: S, lookup: L) -> Result<Self, ConfigError> {
        Self::with_clock(config, storage, lookup, SystemClock)
    }
}

impl<S, L, C> Comparison<S, L, C>
where
    S: KeyValueStore,
    L: ItemLookup,
    C: Clock,
{
    pub fn with_clock(
        config: CompareConfig,
        storage: S,
        lookup: L,
        clock: C,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let (reports, _) = broadcast::channel(REPORT_CHANNEL_CAPACITY);
        let inner = Inner {
            set: CompareSetStore::new(config.max_size),
            bridge: PersistenceBridge::new(storage, config.storage_key.clone()),
            guard: RefreshGuard::default(),
            last_error: None,
        };
        Ok(Self {
            config,
            inner: Mutex::new(inner),
            lookup,
            clock,
            reports,
        })
    }

    pub fn config(&self) -> &CompareConfig {
        &self.config
    }

    /// Restore the persisted snapshot. Only the first call reads storage;
    /// saves are held back until it has run.
    pub fn load(&self) -> Result<LoadOutcome, CompareError> {
        let mut guard = self.lock();
        let inner = &mut *guard;
        let result = inner.bridge.load(&mut inner.set);
        if let Err(err) = &result {
            error!(key = %self.config.storage_key, error = %err, "failed to load compare set");
            self.report(inner, err, None);
        }
        result
    }

    pub fn state(&self) -> CompareState {
        let inner = self.lock();
        CompareState {
            items: inner.set.items().to_vec(),
            refresh_timestamp: inner.set.refresh_timestamp(),
            is_loading: inner.guard.is_in_flight(),
            last_error: inner.last_error.clone(),
            min_size: self.config.min_size,
        }
    }

    pub fn is_compared(&self, id: &ItemId) -> bool {
        self.lock().set.contains(id)
    }

    pub fn len(&self) -> usize {
        self.lock().set.len()
    }

    pub fn toggle(&self, item: ComparedItem) -> Result<Toggled, CompareError> {
        let mut guard = self.lock();
        let inner = &mut *guard;
        let item_id = item.id.clone();

        match inner.set.toggle(item) {
            Ok(toggled) => {
                debug!(item_id = %item_id, ?toggled, size = inner.set.len(), "toggled compared item");
                self.persist(inner);
                Ok(toggled)
            }
            Err(err) => {
                warn!(item_id = %item_id, size = inner.set.len(), max = self.config.max_size, error = %err, "toggle rejected");
                self.report(inner, &err, None);
                Err(err)
            }
        }
    }

    /// Remove `id` from the set. Returns whether anything was removed.
    pub fn remove(&self, id: &ItemId) -> Result<bool, CompareError> {
        let mut guard = self.lock();
        let inner = &mut *guard;

        match inner.set.remove(id) {
            Ok(removed) => {
                if removed {
                    debug!(item_id = %id, size = inner.set.len(), "removed compared item");
                    self.persist(inner);
                }
                Ok(removed)
            }
            Err(err) => {
                warn!(item_id = %id, error = %err, "remove rejected");
                self.report(inner, &err, None);
                Err(err)
            }
        }
    }

    pub fn clear(&self) {
        let mut guard = self.lock();
        let inner = &mut *guard;
        inner.set.clear();
        debug!("cleared compare set");
        self.persist(inner);
    }

    pub fn clear_error(&self) {
        self.lock().last_error = None;
    }

    /// Recoverable failures are published here as they happen.
    pub fn subscribe_reports(&self) -> broadcast::Receiver<ErrorReport> {
        self.reports.subscribe()
    }

    /// Apply a change another context made to the shared store.
    ///
    /// Only memory is updated; the received value is never written back.
    pub fn handle_external_change(&self, change: &StorageChange) -> Result<SyncOutcome, CompareError> {
        let mut guard = self.lock();
        let inner = &mut *guard;
        let result = inner.bridge.reconcile(&mut inner.set, change);
        if let Err(err) = &result {
            self.report(inner, err, Some(RetryAction::Resync(change.clone())));
        }
        result
    }

    /// Apply external changes until the channel closes.
    pub async fn sync_from(&self, mut subscription: ChangeSubscription) {
        while let Some(change) = subscription.next().await {
            // Failures are reported through the report channel.
            let _ = self.handle_external_change(&change);
        }
        debug!("change subscription closed");
    }

    pub fn is_refresh_due(&self) -> bool {
        let inner = self.lock();
        !inner.set.is_empty()
            && is_stale(
                inner.set.refresh_timestamp(),
                self.clock.now(),
                self.config.freshness_window(),
            )
    }

    /// Refresh when the set is non-empty and its data has gone stale.
    pub async fn refresh_if_stale(&self) -> Result<RefreshOutcome, CompareError> {
        if !self.is_refresh_due() {
            return Ok(RefreshOutcome::Skipped);
        }
        self.force_refresh().await
    }

    /// Re-fetch every compared item from the lookup service.
    ///
    /// At most one refresh runs at a time. A call made while one is in flight
    /// returns [`RefreshOutcome::Coalesced`] and a single follow-up refresh
    /// runs once the current one completes.
    pub async fn force_refresh(&self) -> Result<RefreshOutcome, CompareError> {
        loop {
            let (ids, fingerprint) = {
                let mut inner = self.lock();
                if inner.set.is_empty() {
                    return Ok(RefreshOutcome::Skipped);
                }
                if !inner.guard.try_begin() {
                    debug!("refresh already in flight, coalescing");
                    return Ok(RefreshOutcome::Coalesced);
                }
                inner.last_error = None;
                (inner.set.ids(), inner.set.fingerprint())
            };

            let fetched = fetch_fresh(&self.lookup, &ids).await;

            let (result, run_again) = {
                let mut guard = self.lock();
                let inner = &mut *guard;
                let follow_up = inner.guard.finish();
                let result = self.apply_fetched(inner, &ids, &fingerprint, fetched);
                let discarded = matches!(result, Ok(RefreshOutcome::Discarded));
                let still_due = !inner.set.is_empty()
                    && is_stale(
                        inner.set.refresh_timestamp(),
                        self.clock.now(),
                        self.config.freshness_window(),
                    );
                (result, follow_up || (discarded && still_due))
            };

            if !run_again {
                return result;
            }
            debug!("running coalesced follow-up refresh");
        }
    }

    /// Re-run the operation a recoverable report was raised for.
    pub async fn retry(&self, report: &ErrorReport) -> Result<(), CompareError> {
        match &report.retry {
            Some(RetryAction::Refresh) => self.force_refresh().await.map(|_| ()),
            Some(RetryAction::Resync(change)) => self.handle_external_change(change).map(|_| ()),
            None => Ok(()),
        }
    }

    fn apply_fetched(
        &self,
        inner: &mut Inner<S>,
        requested: &[ItemId],
        fingerprint: &SetFingerprint,
        fetched: Result<Vec<ComparedItem>, LookupError>,
    ) -> Result<RefreshOutcome, CompareError> {
        if &inner.set.fingerprint() != fingerprint {
            warn!(
                requested = requested.len(),
                size = inner.set.len(),
                "compare set changed during refresh, discarding results"
            );
            return Ok(RefreshOutcome::Discarded);
        }

        let failure = match fetched {
            Ok(items) if !items.is_empty() => {
                let kept = items.len();
                let dropped = requested.len() - kept;
                inner.set.apply_refresh(items, self.clock.now());
                debug!(kept, dropped, "refreshed compared items");
                self.persist(inner);
                return Ok(RefreshOutcome::Applied { kept, dropped });
            }
            Ok(_) => RefreshFailure::NothingResolved,
            Err(e) => RefreshFailure::Lookup(e),
        };

        let err = CompareError::RefreshFailed {
            requested: requested.len(),
            reason: failure,
        };
        error!(requested = requested.len(), error = %err, "refresh failed, keeping cached items");
        self.report(inner, &err, Some(RetryAction::Refresh));
        Err(err)
    }

    /// Save after a local mutation. Failures are reported, never rolled back.
    fn persist(&self, inner: &mut Inner<S>) {
        if let Err(err) = inner.bridge.save(&mut inner.set, self.clock.now()) {
            self.report(inner, &err, None);
        }
    }

    fn report(&self, inner: &mut Inner<S>, err: &CompareError, retry: Option<RetryAction>) {
        let kind = err.kind();
        let mut report = ErrorReport::new(kind, kind.message(self.config.max_size), self.clock.now());
        if report.recoverable {
            if let Some(retry) = retry {
                report = report.with_retry(retry);
            }
            // Nobody listening is fine; the failure is already logged.
            let _ = self.reports.send(report);
        } else {
            inner.last_error = Some(report);
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner<S>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
