// SPDX-FileCopyrightText: 2026 tzquery contributors
//
// SPDX-License-Identifier: Apache-2.0

//! Bounded, single-flight cache for contract script metadata.
//!
//! Script decoding is expensive and scripts never change once deployed, so
//! metadata is cached per contract address in a fixed-capacity LRU. Concurrent
//! misses for the same address collapse into a single remote fetch: a per-key
//! in-flight cell is resolved once and every waiter receives the same
//! [`ScriptMetadata`] allocation.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use tokio::sync::{Mutex, OnceCell};
use tracing::debug;

use crate::errors::TzQueryError;
use crate::script::ScriptMetadata;

/// Default number of contract scripts kept resident.
pub const DEFAULT_SCRIPT_CACHE_CAPACITY: usize = 1024;

#[derive(Debug, Clone)]
struct CacheEntry {
    script: Arc<ScriptMetadata>,
    /// Access sequence for deterministic LRU ordering.
    last_access: u64,
}

type InflightCell = Arc<OnceCell<Arc<ScriptMetadata>>>;

#[derive(Debug, Default)]
struct CacheState {
    entries: HashMap<String, CacheEntry>,
    /// Per-address in-flight loads; removed once the load settles.
    inflight: HashMap<String, InflightCell>,
    next_seq: u64,
    stats: CacheStats,
}

/// Counters describing cache effectiveness.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub entries: usize,
}

impl CacheStats {
    /// Hit rate in percent; 0 when the cache has not been queried.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            return 0.0;
        }
        self.hits as f64 / total as f64 * 100.0
    }
}

/// Concurrency-safe LRU cache of [`ScriptMetadata`] keyed by contract
/// address.
#[derive(Debug)]
pub struct ScriptCache {
    capacity: usize,
    state: Mutex<CacheState>,
}

impl ScriptCache {
    /// Creates a cache holding at most `capacity` scripts (minimum 1).
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            state: Mutex::new(CacheState::default()),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Looks up a cached script, marking it most recently used.
    pub async fn get(&self, address: &str) -> Option<Arc<ScriptMetadata>> {
        let mut state = self.state.lock().await;
        // Reborrow so entry and stats borrows split by field.
        let state = &mut *state;
        let seq = state.next_seq;
        state.next_seq += 1;
        match state.entries.get_mut(address) {
            Some(entry) => {
                entry.last_access = seq;
                state.stats.hits += 1;
                Some(entry.script.clone())
            }
            None => {
                state.stats.misses += 1;
                None
            }
        }
    }

    /// Inserts a script, evicting least-recently-used entries as needed.
    pub async fn insert(&self, address: impl Into<String>, script: Arc<ScriptMetadata>) {
        let mut state = self.state.lock().await;
        let state = &mut *state;
        let seq = state.next_seq;
        state.next_seq += 1;
        Self::insert_locked(state, self.capacity, address.into(), script, seq);
    }

    /// Returns the cached script for `address`, loading it at most once.
    ///
    /// On a miss, concurrent callers for the same address share one in-flight
    /// load and all receive the same `Arc`. A failed load caches nothing; the
    /// error goes to the caller whose loader ran, and the remaining callers
    /// retry on the shared cell in turn, so at most one load is in flight per
    /// address at any time.
    pub async fn get_or_load<F, Fut>(
        &self,
        address: &str,
        loader: F,
    ) -> Result<Arc<ScriptMetadata>, TzQueryError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<ScriptMetadata, TzQueryError>>,
    {
        let cell = {
            let mut state = self.state.lock().await;
            let state = &mut *state;
            let seq = state.next_seq;
            state.next_seq += 1;
            if let Some(entry) = state.entries.get_mut(address) {
                entry.last_access = seq;
                state.stats.hits += 1;
                return Ok(entry.script.clone());
            }
            state.stats.misses += 1;
            state
                .inflight
                .entry(address.to_string())
                .or_insert_with(|| Arc::new(OnceCell::new()))
                .clone()
        };

        let result = cell
            .get_or_try_init(|| async {
                debug!(address, "loading contract script");
                loader().await.map(Arc::new)
            })
            .await
            .cloned();

        // The cell stays registered across failed attempts so newcomers keep
        // joining it; it is deregistered only once a load has settled the
        // value, and only if the map still holds this exact cell.
        if let Ok(script) = &result {
            let mut state = self.state.lock().await;
            let state = &mut *state;
            if state
                .inflight
                .get(address)
                .is_some_and(|c| Arc::ptr_eq(c, &cell))
            {
                state.inflight.remove(address);
            }
            let seq = state.next_seq;
            state.next_seq += 1;
            Self::insert_locked(
                state,
                self.capacity,
                address.to_string(),
                script.clone(),
                seq,
            );
        }
        result
    }

    /// Point-in-time cache counters.
    pub async fn stats(&self) -> CacheStats {
        let state = self.state.lock().await;
        let mut stats = state.stats.clone();
        stats.entries = state.entries.len();
        stats
    }

    fn insert_locked(
        state: &mut CacheState,
        capacity: usize,
        address: String,
        script: Arc<ScriptMetadata>,
        seq: u64,
    ) {
        if !state.entries.contains_key(&address) {
            while state.entries.len() >= capacity {
                Self::evict_lru(state);
            }
        }
        state.entries.insert(
            address,
            CacheEntry {
                script,
                last_access: seq,
            },
        );
    }

    fn evict_lru(state: &mut CacheState) {
        let lru_key = state
            .entries
            .iter()
            .min_by_key(|(_, entry)| entry.last_access)
            .map(|(key, _)| key.clone());
        if let Some(key) = lru_key {
            debug!(address = %key, "evicting least recently used script");
            state.entries.remove(&key);
            state.stats.evictions += 1;
        }
    }
}

impl Default for ScriptCache {
    fn default() -> Self {
        Self::new(DEFAULT_SCRIPT_CACHE_CAPACITY)
    }
}
