#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use compare_core::persistence::KeyValueStore;
use compare_core::{
    CompareConfig, ComparedItem, Comparison, ItemId, ItemLookup, LookupError, LookupOptions,
    ManualClock,
};
use tokio::sync::Semaphore;

pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap()
}

pub fn item(id: &str) -> ComparedItem {
    ComparedItem::new(id, format!("Item {id}"), id)
}

pub fn fresh(id: &str) -> ComparedItem {
    ComparedItem::new(id, format!("Fresh {id}"), id)
}

pub fn ids(items: &[ComparedItem]) -> Vec<&str> {
    items.iter().map(|i| i.id.as_str()).collect()
}

#[derive(Debug, Clone)]
pub enum Scripted {
    Found(ComparedItem),
    NotFound,
    Fail,
}

/// Lookup fake answering from a script. Unscripted ids resolve to
/// `fresh(id)`. An optional gate holds every lookup until opened.
#[derive(Clone, Default)]
pub struct ScriptedLookup {
    script: Arc<Mutex<HashMap<String, Scripted>>>,
    calls: Arc<AtomicUsize>,
    forced: Arc<AtomicUsize>,
    gate: Option<Arc<Semaphore>>,
}

impl ScriptedLookup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn gated() -> Self {
        Self {
            gate: Some(Arc::new(Semaphore::new(0))),
            ..Self::default()
        }
    }

    pub fn script(&self, id: &str, response: Scripted) {
        self.script.lock().unwrap().insert(id.to_string(), response);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn forced_calls(&self) -> usize {
        self.forced.load(Ordering::SeqCst)
    }

    pub fn open_gate(&self) {
        if let Some(gate) = &self.gate {
            gate.add_permits(1);
        }
    }
}

#[async_trait]
impl ItemLookup for ScriptedLookup {
    async fn fetch_item_by_id(
        &self,
        id: &ItemId,
        options: LookupOptions,
    ) -> Result<Option<ComparedItem>, LookupError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if options.force_refresh {
            self.forced.fetch_add(1, Ordering::SeqCst);
        }
        if let Some(gate) = &self.gate {
            let _permit = gate.acquire().await.unwrap();
        }

        let response = self.script.lock().unwrap().get(id.as_str()).cloned();
        match response {
            Some(Scripted::Found(item)) => Ok(Some(item)),
            Some(Scripted::NotFound) => Ok(None),
            Some(Scripted::Fail) => Err(LookupError::Unavailable(format!("{id} timed out"))),
            None => Ok(Some(fresh(id.as_str()))),
        }
    }
}

pub type TestComparison<S> = Comparison<S, ScriptedLookup, ManualClock>;

pub fn comparison<S: KeyValueStore>(
    storage: S,
    lookup: ScriptedLookup,
    clock: ManualClock,
) -> TestComparison<S> {
    Comparison::with_clock(CompareConfig::v0(), storage, lookup, clock).unwrap()
}

pub fn loaded<S: KeyValueStore>(
    storage: S,
    lookup: ScriptedLookup,
    clock: ManualClock,
) -> TestComparison<S> {
    let comparison = comparison(storage, lookup, clock);
    comparison.load().unwrap();
    comparison
}
