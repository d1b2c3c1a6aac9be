use cachemem::{BackendError, BackendErrorKind, BackendResult, RemoteBackend};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// In-memory stand-in for a Redis server
///
/// Clones share state, so a test can keep one handle to script failures after
/// moving another into a facade.
#[derive(Debug, Clone, Default)]
pub struct MockBackend {
    state: Arc<MockState>,
}

#[derive(Debug, Default)]
struct MockState {
    data: Mutex<HashMap<String, String>>,
    ttls: Mutex<HashMap<String, i64>>,
    connect_failure: Mutex<Option<BackendErrorKind>>,
    command_failure: Mutex<Option<BackendErrorKind>>,
    calls: AtomicUsize,
}

#[allow(dead_code)]
impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend whose connect attempt fails with `kind`
    pub fn refusing(kind: BackendErrorKind) -> Self {
        let backend = Self::new();
        *backend.state.connect_failure.lock() = Some(kind);
        backend
    }

    /// Make every following command fail with `kind`
    pub fn fail_with(&self, kind: BackendErrorKind) {
        *self.state.command_failure.lock() = Some(kind);
    }

    /// Let commands succeed again
    pub fn recover(&self) {
        *self.state.command_failure.lock() = None;
        *self.state.connect_failure.lock() = None;
    }

    /// Store a value directly on the "server"
    pub fn seed(&self, key: &str, value: &str) {
        self.state
            .data
            .lock()
            .insert(key.to_string(), value.to_string());
    }

    pub fn stored(&self, key: &str) -> Option<String> {
        self.state.data.lock().get(key).cloned()
    }

    /// Commands that reached the backend (connect excluded)
    pub fn remote_calls(&self) -> usize {
        self.state.calls.load(Ordering::SeqCst)
    }

    fn begin(&self, command: &'static str) -> BackendResult<()> {
        self.state.calls.fetch_add(1, Ordering::SeqCst);
        match *self.state.command_failure.lock() {
            Some(kind) => Err(BackendError::new(kind, command, "scripted failure")),
            None => Ok(()),
        }
    }
}

impl RemoteBackend for MockBackend {
    async fn connect(&self) -> BackendResult<()> {
        match *self.state.connect_failure.lock() {
            Some(kind) => Err(BackendError::new(kind, "CONNECT", "connect refused")),
            None => Ok(()),
        }
    }

    async fn get(&self, key: &str) -> BackendResult<Option<String>> {
        self.begin("GET")?;
        Ok(self.stored(key))
    }

    async fn set(&self, key: &str, value: &str) -> BackendResult<()> {
        self.begin("SET")?;
        self.seed(key, value);
        self.state.ttls.lock().remove(key);
        Ok(())
    }

    async fn incr(&self, key: &str) -> BackendResult<i64> {
        self.begin("INCR")?;
        let mut data = self.state.data.lock();
        let current = match data.get(key) {
            Some(raw) => raw.parse::<i64>().map_err(|_| {
                BackendError::operation("INCR", "value is not an integer or out of range")
            })?,
            None => 0,
        };
        data.insert(key.to_string(), (current + 1).to_string());
        Ok(current + 1)
    }

    async fn expire(&self, key: &str, seconds: u64) -> BackendResult<i64> {
        self.begin("EXPIRE")?;
        if !self.state.data.lock().contains_key(key) {
            return Ok(0);
        }
        let seconds = i64::try_from(seconds).unwrap_or(i64::MAX);
        self.state.ttls.lock().insert(key.to_string(), seconds);
        Ok(1)
    }

    async fn ttl(&self, key: &str) -> BackendResult<i64> {
        self.begin("TTL")?;
        if !self.state.data.lock().contains_key(key) {
            return Ok(-2);
        }
        Ok(self.state.ttls.lock().get(key).copied().unwrap_or(-1))
    }

    async fn keys(&self, pattern: &str) -> BackendResult<Vec<String>> {
        self.begin("KEYS")?;
        // Only trailing-star globs are needed by the tests
        let prefix = pattern.trim_end_matches('*');
        let mut keys: Vec<String> = self
            .state
            .data
            .lock()
            .keys()
            .filter(|key| key.starts_with(prefix))
            .cloned()
            .collect();
        keys.sort();
        Ok(keys)
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }
}
