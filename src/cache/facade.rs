//! Two-tier cache facade
//!
//! Every operation first tries the remote backend and answers from the
//! in-process [`FallbackStore`] when the remote call fails. A failure that
//! shows the connection itself is gone latches the facade into
//! [`BackendMode::Local`] for the rest of its life: the remote handle is
//! dropped and never dialed again.
//!
//! ```text
//!            ┌──────── Remote ────────┐  refused / closed   ┌── Local ──┐
//!  call ───► │ remote op ─ok─► result │ ──────────────────► │ fallback  │
//!            │     └─err─► fallback   │     (one way)       │  only     │
//!            └────────────────────────┘                     └───────────┘
//! ```

use super::fallback::FallbackStore;
use super::providers::RedisBackend;
use super::traits::RemoteBackend;
use crate::config::CacheConfig;
use crate::error::{BackendError, BackendResult, ConfigResult};
use crate::value::CacheValue;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Which tier serves operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BackendMode {
    /// Remote first, fallback per failed call
    Remote,
    /// Fallback only; terminal
    Local,
}

struct FacadeInner<B> {
    remote: RwLock<Option<Arc<B>>>,
    local_mode: AtomicBool,
    fallback: FallbackStore,
    default_expiration: Duration,
}

impl<B: RemoteBackend> FacadeInner<B> {
    fn remote_handle(&self) -> Option<Arc<B>> {
        if self.local_mode.load(Ordering::Acquire) {
            return None;
        }
        self.remote.read().clone()
    }

    /// Latch into local mode and release the remote handle, once
    fn enter_local_mode(&self, cause: &BackendError) {
        if self.local_mode.swap(true, Ordering::AcqRel) {
            return;
        }

        let released = self.remote.write().take();
        let provider = released
            .as_ref()
            .map_or("none", |backend| backend.provider_name());
        warn!(
            provider = provider,
            command = cause.command(),
            kind = %cause.kind(),
            error = %cause,
            "Remote cache unreachable, switching to local mode"
        );
        drop(released);
    }
}

/// Cache facade over a remote backend with an in-process fallback
///
/// Cheap to clone; clones share the latch and the fallback store. No public
/// operation returns an error: callers always get a (possibly degraded)
/// result and cannot tell which tier produced it.
pub struct CacheFacade<B: RemoteBackend = RedisBackend> {
    inner: Arc<FacadeInner<B>>,
}

impl<B: RemoteBackend> Clone for CacheFacade<B> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<B: RemoteBackend> std::fmt::Debug for CacheFacade<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheFacade")
            .field("mode", &self.mode())
            .field("fallback_keys", &self.fallback_len())
            .field("default_expiration", &self.inner.default_expiration)
            .finish()
    }
}

impl CacheFacade<RedisBackend> {
    /// Facade over Redis at the configured host and port
    ///
    /// Returns immediately; the connection is attempted in the background
    /// with the configured connect timeout. A refused connection switches the
    /// facade to local mode. Must be called inside a Tokio runtime.
    pub fn new(config: &CacheConfig) -> Self {
        if !config.enabled {
            info!("Remote cache disabled by configuration, using local store only");
            return Self::local(config);
        }

        match RedisBackend::from_config(config) {
            Ok(backend) => {
                info!(
                    host = %config.host,
                    port = config.port,
                    connect_timeout_ms = config.connect_timeout_ms,
                    "Connecting to remote cache"
                );
                Self::with_backend(backend, config.default_expiration())
            }
            Err(e) => {
                warn!(error = %e, "Invalid remote cache address, using local store only");
                Self::local(config)
            }
        }
    }

    /// Facade configured from `CACHEMEM__*` environment variables
    pub fn from_env() -> ConfigResult<Self> {
        Ok(Self::new(&CacheConfig::from_env()?))
    }

    /// Facade that starts (and stays) in local mode
    pub fn local(config: &CacheConfig) -> Self {
        Self {
            inner: Arc::new(FacadeInner {
                remote: RwLock::new(None),
                local_mode: AtomicBool::new(true),
                fallback: FallbackStore::new(),
                default_expiration: config.default_expiration(),
            }),
        }
    }
}

impl<B: RemoteBackend> CacheFacade<B> {
    /// Facade over an arbitrary backend
    ///
    /// Spawns the connection observer. Must be called inside a Tokio runtime.
    pub fn with_backend(backend: B, default_expiration: Duration) -> Self {
        let facade = Self {
            inner: Arc::new(FacadeInner {
                remote: RwLock::new(Some(Arc::new(backend))),
                local_mode: AtomicBool::new(false),
                fallback: FallbackStore::new(),
                default_expiration,
            }),
        };
        facade.observe_connection();
        facade
    }

    fn observe_connection(&self) {
        let Some(backend) = self.inner.remote_handle() else {
            return;
        };
        let inner: Weak<FacadeInner<B>> = Arc::downgrade(&self.inner);

        tokio::spawn(async move {
            let outcome = backend.connect().await;
            let provider = backend.provider_name();
            drop(backend);

            match outcome {
                Ok(()) => debug!(provider = provider, "Remote cache connected"),
                Err(err) if err.kind().is_fatal() => {
                    if let Some(inner) = inner.upgrade() {
                        inner.enter_local_mode(&err);
                    }
                }
                Err(err) => warn!(
                    provider = provider,
                    kind = %err.kind(),
                    error = %err,
                    "Remote cache connect failed, will retry on next command"
                ),
            }
        });
    }

    /// Run `op` against the remote; `None` means answer from the fallback
    async fn try_remote<T, F, Fut>(&self, command: &'static str, key: &str, op: F) -> Option<T>
    where
        F: FnOnce(Arc<B>) -> Fut,
        Fut: Future<Output = BackendResult<T>>,
    {
        let backend = self.inner.remote_handle()?;

        match op(backend).await {
            Ok(value) => Some(value),
            Err(err) => {
                warn!(
                    command = command,
                    key = key,
                    kind = %err.kind(),
                    error = %err,
                    "Remote cache miss, serving from fallback store"
                );
                if err.kind().is_fatal() {
                    self.inner.enter_local_mode(&err);
                }
                None
            }
        }
    }

    /// Value at `key`, or `default` when absent or empty
    pub async fn get(&self, key: &str, default: Option<CacheValue>) -> Option<CacheValue> {
        let value = match self
            .try_remote("GET", key, |backend| async move { backend.get(key).await })
            .await
        {
            Some(remote) => remote.filter(|v| !v.is_empty()).map(CacheValue::Str),
            None => self.inner.fallback.get(key, None),
        };
        debug!(key = key, hit = value.is_some(), "get");
        value.or(default)
    }

    /// Store `value` at `key` and return it
    pub async fn set(&self, key: &str, value: impl Into<CacheValue>) -> CacheValue {
        let value = value.into();
        let wire = value.to_wire();

        let stored = self
            .try_remote("SET", key, |backend| async move {
                backend.set(key, &wire).await
            })
            .await;
        if stored.is_none() {
            self.inner.fallback.set(key, value.clone());
        }
        debug!(key = key, "set");
        value
    }

    /// Add one to the counter at `key` and return the new value
    pub async fn increment(&self, key: &str) -> i64 {
        let value = match self
            .try_remote("INCR", key, |backend| async move { backend.incr(key).await })
            .await
        {
            Some(remote) => remote,
            None => self.inner.fallback.increment(key),
        };
        debug!(key = key, value = value, "increment");
        value
    }

    /// Delete `key` after `seconds`, or after the default expiration when
    /// `seconds` is `None` or zero
    pub async fn expire(&self, key: &str, seconds: Option<u64>) -> i64 {
        let seconds = seconds
            .filter(|s| *s > 0)
            .unwrap_or_else(|| self.inner.default_expiration.as_secs());

        let result = match self
            .try_remote("EXPIRE", key, |backend| async move {
                backend.expire(key, seconds).await
            })
            .await
        {
            Some(remote) => remote,
            None => self
                .inner
                .fallback
                .expire(key, Duration::from_secs(seconds)),
        };
        debug!(key = key, seconds = seconds, "expire");
        result
    }

    /// Seconds until `key` expires; 0 when it has no expiry or does not exist
    pub async fn ttl(&self, key: &str) -> i64 {
        match self
            .try_remote("TTL", key, |backend| async move { backend.ttl(key).await })
            .await
        {
            Some(remote) => remote.max(0),
            None => self.inner.fallback.ttl(key),
        }
    }

    /// Keys matching `pattern`
    ///
    /// Glob semantics on the remote; a substring approximation in the
    /// fallback (see [`FallbackPattern`](super::pattern::FallbackPattern)).
    pub async fn keys(&self, pattern: &str) -> Vec<String> {
        match self
            .try_remote("KEYS", pattern, |backend| async move {
                backend.keys(pattern).await
            })
            .await
        {
            Some(remote) => remote,
            None => self.inner.fallback.keys(pattern),
        }
    }

    pub fn mode(&self) -> BackendMode {
        if self.is_local_mode() {
            BackendMode::Local
        } else {
            BackendMode::Remote
        }
    }

    pub fn is_local_mode(&self) -> bool {
        self.inner.local_mode.load(Ordering::Acquire)
    }

    pub fn default_expiration(&self) -> Duration {
        self.inner.default_expiration
    }

    /// Number of keys held by the fallback store
    pub fn fallback_len(&self) -> usize {
        self.inner.fallback.len()
    }
}
