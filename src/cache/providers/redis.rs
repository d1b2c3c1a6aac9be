//! Redis remote backend
//!
//! Uses a single multiplexed async connection, established lazily by the
//! facade's connection observer. Commands issued while the connect is in
//! flight wait on the same initialization instead of dialing again.

use crate::cache::traits::RemoteBackend;
use crate::config::CacheConfig;
use crate::error::{BackendError, BackendResult};
use redis::aio::MultiplexedConnection;
use redis::FromRedisValue;
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::debug;

/// Number of keys requested per SCAN round trip
const SCAN_BATCH_SIZE: usize = 100;

/// Redis-backed implementation of [`RemoteBackend`]
pub struct RedisBackend {
    client: redis::Client,
    connection: OnceCell<MultiplexedConnection>,
    connect_timeout: Duration,
    response_timeout: Option<Duration>,
}

impl std::fmt::Debug for RedisBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisBackend")
            .field("addr", &self.client.get_connection_info().addr)
            .field("connected", &self.connection.initialized())
            .field("connect_timeout", &self.connect_timeout)
            .field("response_timeout", &self.response_timeout)
            .finish()
    }
}

impl RedisBackend {
    /// Create a backend for the configured host and port
    ///
    /// Does not touch the network; call [`RemoteBackend::connect`] to dial.
    pub fn from_config(config: &CacheConfig) -> BackendResult<Self> {
        let client = redis::Client::open(config.redis_url().as_str())
            .map_err(|e| BackendError::from_redis("CONNECT", &e))?;

        Ok(Self {
            client,
            connection: OnceCell::new(),
            connect_timeout: config.connect_timeout(),
            response_timeout: config.response_timeout(),
        })
    }

    async fn connection(&self) -> BackendResult<MultiplexedConnection> {
        let conn = self
            .connection
            .get_or_try_init(|| async {
                let connect = self.client.get_multiplexed_async_connection();
                match tokio::time::timeout(self.connect_timeout, connect).await {
                    Ok(Ok(conn)) => Ok(conn),
                    Ok(Err(e)) => Err(BackendError::from_redis("CONNECT", &e)),
                    Err(_) => Err(BackendError::operation(
                        "CONNECT",
                        format!(
                            "no connection within {}ms",
                            self.connect_timeout.as_millis()
                        ),
                    )),
                }
            })
            .await?;
        Ok(conn.clone())
    }

    async fn run<T: FromRedisValue>(&self, command: &'static str, cmd: redis::Cmd) -> BackendResult<T> {
        let mut conn = self.connection().await?;
        let query = cmd.query_async::<T>(&mut conn);

        let result = match self.response_timeout {
            Some(limit) => tokio::time::timeout(limit, query).await.map_err(|_| {
                BackendError::operation(
                    command,
                    format!("no response within {}ms", limit.as_millis()),
                )
            })?,
            None => query.await,
        };

        result.map_err(|e| BackendError::from_redis(command, &e))
    }
}

impl RemoteBackend for RedisBackend {
    async fn connect(&self) -> BackendResult<()> {
        self.connection().await?;
        debug!(
            addr = %self.client.get_connection_info().addr,
            "Redis connection established"
        );
        Ok(())
    }

    async fn get(&self, key: &str) -> BackendResult<Option<String>> {
        let mut cmd = redis::cmd("GET");
        cmd.arg(key);
        self.run("GET", cmd).await
    }

    async fn set(&self, key: &str, value: &str) -> BackendResult<()> {
        let mut cmd = redis::cmd("SET");
        cmd.arg(key).arg(value);
        self.run("SET", cmd).await
    }

    async fn incr(&self, key: &str) -> BackendResult<i64> {
        let mut cmd = redis::cmd("INCR");
        cmd.arg(key);
        self.run("INCR", cmd).await
    }

    async fn expire(&self, key: &str, seconds: u64) -> BackendResult<i64> {
        let mut cmd = redis::cmd("EXPIRE");
        cmd.arg(key).arg(seconds);
        self.run("EXPIRE", cmd).await
    }

    async fn ttl(&self, key: &str) -> BackendResult<i64> {
        let mut cmd = redis::cmd("TTL");
        cmd.arg(key);
        self.run("TTL", cmd).await
    }

    async fn keys(&self, pattern: &str) -> BackendResult<Vec<String>> {
        let mut found = Vec::new();
        let mut cursor: u64 = 0;

        // SCAN instead of KEYS so large keyspaces don't block the server
        loop {
            let mut cmd = redis::cmd("SCAN");
            cmd.arg(cursor)
                .arg("MATCH")
                .arg(pattern)
                .arg("COUNT")
                .arg(SCAN_BATCH_SIZE);
            let (next_cursor, keys): (u64, Vec<String>) = self.run("SCAN", cmd).await?;

            found.extend(keys);
            cursor = next_cursor;
            if cursor == 0 {
                break;
            }
        }

        // SCAN may return a key more than once across iterations
        found.sort_unstable();
        found.dedup();
        Ok(found)
    }

    fn provider_name(&self) -> &'static str {
        "redis"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BackendErrorKind;

    fn unused_port_config() -> CacheConfig {
        // Port 1 is privileged and never has a Redis listening in CI
        CacheConfig {
            host: "127.0.0.1".to_string(),
            port: 1,
            ..CacheConfig::default()
        }
    }

    #[test]
    fn test_from_config_does_not_connect() {
        let backend = RedisBackend::from_config(&unused_port_config()).unwrap();
        assert!(!backend.connection.initialized());
        assert_eq!(backend.provider_name(), "redis");
    }

    #[tokio::test]
    async fn test_connect_refused_is_transport_unavailable() {
        let backend = RedisBackend::from_config(&unused_port_config()).unwrap();
        let err = backend.connect().await.unwrap_err();
        assert_eq!(err.kind(), BackendErrorKind::TransportUnavailable);
        assert_eq!(err.command(), "CONNECT");
    }

    #[cfg(feature = "test-services")]
    mod integration {
        use super::*;

        fn live_config() -> CacheConfig {
            let url = std::env::var("REDIS_URL")
                .unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string());
            let without_scheme = url.trim_start_matches("redis://").trim_end_matches('/');
            let (host, port) = without_scheme
                .rsplit_once(':')
                .unwrap_or((without_scheme, "6379"));
            CacheConfig {
                host: host.to_string(),
                port: port.parse().unwrap_or(6379),
                ..CacheConfig::default()
            }
        }

        fn unique_key(label: &str) -> String {
            format!(
                "cachemem:test:{label}:{}",
                chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default()
            )
        }

        #[tokio::test]
        async fn test_redis_round_trip_commands() {
            let backend = RedisBackend::from_config(&live_config()).unwrap();
            backend.connect().await.unwrap();

            let key = unique_key("crud");
            assert_eq!(backend.get(&key).await.unwrap(), None);
            backend.set(&key, "value").await.unwrap();
            assert_eq!(backend.get(&key).await.unwrap(), Some("value".to_string()));
            assert_eq!(backend.ttl(&key).await.unwrap(), -1);
            assert_eq!(backend.expire(&key, 30).await.unwrap(), 1);
            assert!(backend.ttl(&key).await.unwrap() > 0);
        }

        #[tokio::test]
        async fn test_redis_incr_and_scan() {
            let backend = RedisBackend::from_config(&live_config()).unwrap();
            backend.connect().await.unwrap();

            let prefix = unique_key("scan");
            for i in 1..=3 {
                assert_eq!(backend.incr(&format!("{prefix}:a")).await.unwrap(), i);
            }
            backend.set(&format!("{prefix}:b"), "x").await.unwrap();

            let keys = backend.keys(&format!("{prefix}:*")).await.unwrap();
            assert_eq!(keys, vec![format!("{prefix}:a"), format!("{prefix}:b")]);

            for key in keys {
                backend.expire(&key, 1).await.unwrap();
            }
        }
    }
}
