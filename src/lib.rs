#![allow(clippy::doc_markdown)] // Allow technical terms like Redis, TTL in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # cachemem
//!
//! A key-value cache facade that keeps answering when its Redis server does
//! not.
//!
//! ## Overview
//!
//! [`CacheFacade`] exposes `get`, `set`, `increment`, `expire`, `ttl` and
//! `keys`. Each call goes to Redis first. A failed call is answered from an
//! in-process store instead, and a refused or closed connection switches the
//! facade to that store permanently. Expiry in the local store is emulated
//! with timers so `ttl` keeps its meaning.
//!
//! ## Module Organization
//!
//! - [`cache`] - facade, fallback store, remote backend contract and Redis provider
//! - [`config`] - layered configuration loading
//! - [`error`] - backend error classification and configuration errors
//! - [`logging`] - structured logging setup
//! - [`value`] - the string-or-integer value type
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use cachemem::{CacheConfig, CacheFacade};
//!
//! # async fn example() {
//! let cache = CacheFacade::new(&CacheConfig::new("127.0.0.1", 6379));
//!
//! cache.set("greeting", "hello").await;
//! let hits = cache.increment("hits").await;
//! cache.expire("greeting", Some(30)).await;
//!
//! let greeting = cache.get("greeting", Some("fallback".into())).await;
//! println!("{greeting:?} after {hits} hits, {}s left", cache.ttl("greeting").await);
//! # }
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod logging;
pub mod value;

pub use cache::{BackendMode, CacheFacade, FallbackStore, RedisBackend, RemoteBackend};
pub use config::{CacheConfig, ConfigLoader};
pub use error::{
    BackendError, BackendErrorKind, BackendResult, ConfigResult, ConfigurationError,
};
pub use value::CacheValue;
