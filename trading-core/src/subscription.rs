//! Registry of subscribed contracts.
//!
//! Entries are only ever added: the registry outlives every market-data
//! connection and is replayed after each login.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use trading::{ContractKey, Exchange};

#[derive(Debug, Clone, Default)]
pub struct SubscriptionRegistry {
    entries: Arc<RwLock<BTreeSet<ContractKey>>>,
    all_market: Arc<AtomicBool>,
}

impl SubscriptionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `key`. Returns `false` if it was already present.
    pub fn add(&self, key: ContractKey) -> bool {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key)
    }

    pub fn contains(&self, key: &ContractKey) -> bool {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(key)
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy of the current entries, in key order.
    pub fn snapshot(&self) -> Vec<ContractKey> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect()
    }

    /// Current entries grouped by exchange, ready for batched venue calls.
    pub fn symbols_by_exchange(&self) -> BTreeMap<Exchange, Vec<String>> {
        let mut grouped: BTreeMap<Exchange, Vec<String>> = BTreeMap::new();
        for key in self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
        {
            grouped
                .entry(key.exchange)
                .or_default()
                .push(key.symbol.clone());
        }
        grouped
    }

    /// Turns on whole-market mode. There is no way back.
    pub fn enable_all_market(&self) {
        self.all_market.store(true, Ordering::SeqCst);
    }

    pub fn is_all_market(&self) -> bool {
        self.all_market.load(Ordering::SeqCst)
    }

    /// Whether a tick for `key` belongs to this process.
    pub fn accepts(&self, key: &ContractKey) -> bool {
        self.is_all_market() || self.contains(key)
    }
}
