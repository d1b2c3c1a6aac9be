//! # Cache Configuration
//!
//! Settings for the remote connection and the fallback tier.
//!
//! ## Sources
//!
//! Values are layered by [`ConfigLoader`]: built-in defaults, then an optional
//! TOML/YAML/JSON file, then `CACHEMEM__*` environment variables.
//!
//! ```rust,no_run
//! use cachemem::config::ConfigLoader;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // CACHEMEM__PORT=6380 overrides whatever the file says
//! let config = ConfigLoader::new().with_file("config/cachemem.toml").load()?;
//! println!("remote at {}", config.redis_url());
//! # Ok(())
//! # }
//! ```

pub mod loader;

use crate::error::{ConfigResult, ConfigurationError};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub use loader::ConfigLoader;

/// Connection and fallback settings for a [`CacheFacade`](crate::CacheFacade)
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Use the remote backend at all; `false` starts the facade in local mode
    pub enabled: bool,
    /// Remote host name or address
    pub host: String,
    /// Remote port
    pub port: u16,
    /// How long the initial connect may take
    pub connect_timeout_ms: u64,
    /// Per-command response limit; unset means wait for the client
    pub response_timeout_ms: Option<u64>,
    /// Expiry applied when `expire` is called without a duration
    pub default_expiration_seconds: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            host: "127.0.0.1".to_string(),
            port: 6379,
            connect_timeout_ms: 1000,
            response_timeout_ms: None,
            default_expiration_seconds: 10,
        }
    }
}

impl CacheConfig {
    /// Config for a remote at `host:port` with every other field defaulted
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Self::default()
        }
    }

    /// Defaults overridden by `CACHEMEM__*` environment variables
    pub fn from_env() -> ConfigResult<Self> {
        ConfigLoader::new().load()
    }

    pub fn redis_url(&self) -> String {
        format!("redis://{}:{}/", self.host, self.port)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn response_timeout(&self) -> Option<Duration> {
        self.response_timeout_ms.map(Duration::from_millis)
    }

    pub fn default_expiration(&self) -> Duration {
        Duration::from_secs(self.default_expiration_seconds)
    }

    /// Reject values the facade cannot run with
    pub fn validate(&self) -> ConfigResult<()> {
        if self.host.trim().is_empty() {
            return Err(ConfigurationError::invalid_value("host", "must not be empty"));
        }
        if self.port == 0 {
            return Err(ConfigurationError::invalid_value("port", "must be > 0"));
        }
        if self.connect_timeout_ms == 0 {
            return Err(ConfigurationError::invalid_value(
                "connect_timeout_ms",
                "must be > 0",
            ));
        }
        if self.response_timeout_ms == Some(0) {
            return Err(ConfigurationError::invalid_value(
                "response_timeout_ms",
                "must be > 0 when set",
            ));
        }
        if self.default_expiration_seconds == 0 {
            return Err(ConfigurationError::invalid_value(
                "default_expiration_seconds",
                "must be > 0",
            ));
        }
        Ok(())
    }
}
