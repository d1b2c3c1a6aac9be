//! Configuration Loader
//!
//! Merges defaults, an optional file and environment overrides into a
//! validated [`CacheConfig`].

use super::CacheConfig;
use crate::error::ConfigResult;
use config::{Config, Environment, File};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Environment variable prefix, e.g. `CACHEMEM__PORT`
pub const ENV_PREFIX: &str = "CACHEMEM";

/// Builder for layered configuration loading
#[derive(Debug, Clone, Default)]
pub struct ConfigLoader {
    file: Option<PathBuf>,
    env_overrides: Option<HashMap<String, String>>,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read settings from `path`; the format follows the extension
    pub fn with_file(mut self, path: impl AsRef<Path>) -> Self {
        self.file = Some(path.as_ref().to_path_buf());
        self
    }

    /// Use `vars` instead of the process environment
    ///
    /// Keys are full variable names (`CACHEMEM__PORT`). Lets tests exercise
    /// overrides without mutating global state.
    pub fn with_env_overrides(mut self, vars: HashMap<String, String>) -> Self {
        self.env_overrides = Some(vars);
        self
    }

    pub fn load(&self) -> ConfigResult<CacheConfig> {
        let mut builder = Config::builder();

        if let Some(path) = &self.file {
            debug!(path = %path.display(), "Loading cache configuration file");
            builder = builder.add_source(File::from(path.as_path()).required(true));
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true)
                .source(self.env_overrides.clone()),
        );

        let config: CacheConfig = builder.build()?.try_deserialize()?;
        config.validate()?;

        debug!(
            host = %config.host,
            port = config.port,
            enabled = config.enabled,
            connect_timeout_ms = config.connect_timeout_ms,
            default_expiration_seconds = config.default_expiration_seconds,
            "Cache configuration loaded"
        );

        Ok(config)
    }
}
