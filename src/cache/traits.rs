//! Remote backend contract

use crate::error::BackendResult;
use std::future::Future;

/// Operations the facade needs from a remote cache server
///
/// Implemented by [`RedisBackend`](super::providers::RedisBackend) and by test
/// doubles. Every failure carries a [`BackendErrorKind`](crate::error::BackendErrorKind)
/// so the facade can tell a dead connection from a failed command.
pub trait RemoteBackend: Send + Sync + 'static {
    /// Establish the connection
    ///
    /// Called once by the facade's connection observer right after
    /// construction. Commands issued while this is in flight wait for it.
    fn connect(&self) -> impl Future<Output = BackendResult<()>> + Send;

    /// Fetch the value stored at `key`, `None` when absent
    fn get(&self, key: &str) -> impl Future<Output = BackendResult<Option<String>>> + Send;

    /// Store `value` at `key` without a TTL
    fn set(&self, key: &str, value: &str) -> impl Future<Output = BackendResult<()>> + Send;

    /// Add one to the integer at `key`, creating it at 1
    fn incr(&self, key: &str) -> impl Future<Output = BackendResult<i64>> + Send;

    /// Delete `key` after `seconds`; returns 1 if a timeout was set
    fn expire(&self, key: &str, seconds: u64)
        -> impl Future<Output = BackendResult<i64>> + Send;

    /// Remaining seconds; -1 for no expiry, -2 for no key
    fn ttl(&self, key: &str) -> impl Future<Output = BackendResult<i64>> + Send;

    /// All keys matching a glob-style `pattern`
    fn keys(&self, pattern: &str) -> impl Future<Output = BackendResult<Vec<String>>> + Send;

    /// Name used in logs
    fn provider_name(&self) -> &'static str;
}
