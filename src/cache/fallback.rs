//! In-process fallback store
//!
//! Holds values and expiry deadlines behind a single mutex so that
//! `increment` is an atomic read-modify-write and an expiry timer removes a
//! key from both maps in one critical section. Operations here never fail.
//!
//! Expiry is emulated with one spawned Tokio task per armed key. Re-arming a
//! key aborts the previous task; a generation number guards against a timer
//! that already woke up and is waiting for the lock.

use super::pattern::FallbackPattern;
use crate::value::CacheValue;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::task::AbortHandle;
use tracing::{debug, warn};

#[derive(Debug)]
struct ExpiryTimer {
    deadline: DateTime<Utc>,
    generation: u64,
    handle: AbortHandle,
}

#[derive(Debug, Default)]
struct FallbackState {
    values: HashMap<String, CacheValue>,
    expiry: HashMap<String, ExpiryTimer>,
    next_generation: u64,
}

/// Local key-value map with timer-driven expiry
#[derive(Debug, Default)]
pub struct FallbackStore {
    state: Arc<Mutex<FallbackState>>,
}

impl FallbackStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The stored value if present and truthy, else `default`
    pub fn get(&self, key: &str, default: Option<CacheValue>) -> Option<CacheValue> {
        let state = self.state.lock();
        match state.values.get(key) {
            Some(value) if value.is_truthy() => Some(value.clone()),
            _ => default,
        }
    }

    /// Overwrite `key`; a pending expiry for the key keeps running
    pub fn set(&self, key: &str, value: CacheValue) -> CacheValue {
        let mut state = self.state.lock();
        state.values.insert(key.to_string(), value.clone());
        value
    }

    /// Add one to the counter at `key`, starting from zero
    pub fn increment(&self, key: &str) -> i64 {
        let mut state = self.state.lock();
        let current = match state.values.get(key) {
            None => 0,
            Some(value) => value.as_int().unwrap_or_else(|| {
                warn!(key = key, "Fallback value is not an integer, restarting counter");
                0
            }),
        };
        let next = current.saturating_add(1);
        state.values.insert(key.to_string(), CacheValue::Int(next));
        next
    }

    /// Delete `key` from both maps once `after` has elapsed
    ///
    /// Arms a timer even when the key is absent, so a value written before the
    /// deadline is still removed. Must be called inside a Tokio runtime.
    pub fn expire(&self, key: &str, after: Duration) -> i64 {
        let deadline = chrono::Duration::from_std(after)
            .ok()
            .and_then(|delta| Utc::now().checked_add_signed(delta))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        let mut state = self.state.lock();
        state.next_generation += 1;
        let generation = state.next_generation;

        let handle = tokio::spawn(run_expiry(
            Arc::downgrade(&self.state),
            key.to_string(),
            generation,
            after,
        ))
        .abort_handle();

        let timer = ExpiryTimer {
            deadline,
            generation,
            handle,
        };
        if let Some(previous) = state.expiry.insert(key.to_string(), timer) {
            previous.handle.abort();
            debug!(key = key, "Replaced pending fallback expiry");
        }

        1
    }

    /// Whole seconds until `key` expires, 0 when no expiry is pending
    ///
    /// Rounded to the nearest second, so a key with less than half a second
    /// left also reads 0. A timer armed on a key that holds no value is not
    /// reported.
    pub fn ttl(&self, key: &str) -> i64 {
        let state = self.state.lock();
        if !state.values.contains_key(key) {
            return 0;
        }
        let Some(timer) = state.expiry.get(key) else {
            return 0;
        };
        let remaining_ms = (timer.deadline - Utc::now()).num_milliseconds().max(0);
        (remaining_ms + 500) / 1000
    }

    /// Every stored key that matches `pattern`, sorted
    pub fn keys(&self, pattern: &str) -> Vec<String> {
        let pattern = FallbackPattern::new(pattern);
        let state = self.state.lock();
        let mut keys: Vec<String> = state
            .values
            .keys()
            .filter(|key| pattern.matches(key))
            .cloned()
            .collect();
        keys.sort_unstable();
        keys
    }

    /// Number of stored keys
    pub fn len(&self) -> usize {
        self.state.lock().values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of keys with a pending expiry
    pub fn pending_expiries(&self) -> usize {
        self.state.lock().expiry.len()
    }
}

impl Drop for FallbackStore {
    fn drop(&mut self) {
        for timer in self.state.lock().expiry.values() {
            timer.handle.abort();
        }
    }
}

async fn run_expiry(state: Weak<Mutex<FallbackState>>, key: String, generation: u64, after: Duration) {
    tokio::time::sleep(after).await;

    let Some(state) = state.upgrade() else {
        return;
    };
    let mut state = state.lock();
    let current = state
        .expiry
        .get(&key)
        .is_some_and(|timer| timer.generation == generation);
    if current {
        state.expiry.remove(&key);
        let removed = state.values.remove(&key).is_some();
        debug!(key = %key, removed = removed, "Fallback key expired");
    }
}
