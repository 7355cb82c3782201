//! Process-wide contract metadata cache.
//!
//! The directory is filled from two sides: the contract store at trading
//! login and the venue's contract query responses. Every tick normalizer
//! reads it to round prices. Entries are upserted, never removed.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, PoisonError, RwLock};
use trading::{ContractKey, ContractMeta, Exchange};

/// Shared, cloneable handle on the contract cache.
///
/// Clones share the same storage. Each lock is held only for a single
/// lookup or insert, so readers never see a half-written entry.
#[derive(Debug, Clone, Default)]
pub struct ContractDirectory {
    contracts: Arc<RwLock<HashMap<ContractKey, ContractMeta>>>,
    loaded: Arc<RwLock<HashSet<Exchange>>>,
}

impl ContractDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the metadata for `key`.
    pub fn get(&self, key: &ContractKey) -> Option<ContractMeta> {
        self.contracts
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    /// Price tick and display name for `key`, without copying the whole entry.
    pub fn rounding_info(&self, key: &ContractKey) -> Option<(f64, String)> {
        self.contracts
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .map(|meta| (meta.price_tick, meta.name.clone()))
    }

    /// Adds or replaces one entry.
    pub fn upsert(&self, meta: ContractMeta) {
        self.contracts
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(meta.key.clone(), meta);
    }

    /// Adds or replaces a batch of entries under one lock.
    ///
    /// # Returns
    ///
    /// * `usize` - The number of entries written.
    pub fn extend(&self, metas: impl IntoIterator<Item = ContractMeta>) -> usize {
        let mut contracts = self
            .contracts
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let mut written = 0;
        for meta in metas {
            contracts.insert(meta.key.clone(), meta);
            written += 1;
        }
        written
    }

    pub fn contains(&self, key: &ContractKey) -> bool {
        self.contracts
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.contracts
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Records that the contract query for `exchange` delivered its last page.
    pub fn mark_loaded(&self, exchange: Exchange) {
        self.loaded
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(exchange);
    }

    pub fn is_loaded(&self, exchange: Exchange) -> bool {
        self.loaded
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&exchange)
    }
}
