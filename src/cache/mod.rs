//! # Resilient Cache
//!
//! ## Architecture
//!
//! ```text
//! CacheFacade<B: RemoteBackend>
//!   ├── remote: Option<Arc<B>>   <- RedisBackend in production, dropped on latch
//!   ├── local_mode: AtomicBool   <- one-way Remote -> Local latch
//!   └── fallback: FallbackStore  <- values + expiry deadlines under one mutex
//! ```
//!
//! ## Failure handling
//!
//! - **Transient command failure**: that call is answered from the fallback
//! - **Refused or closed connection**: latch into local mode, drop the remote
//! - **Callers never see an error**: diagnostics go to `tracing` only
//!
//! ## Example
//!
//! ```rust
//! use cachemem::{BackendMode, CacheConfig, CacheFacade};
//!
//! # tokio_test::block_on(async {
//! let cache = CacheFacade::local(&CacheConfig::default());
//! assert_eq!(cache.mode(), BackendMode::Local);
//!
//! cache.set("user:1", "alice").await;
//! assert_eq!(cache.increment("visits").await, 1);
//! assert_eq!(cache.keys("user").await, vec!["user:1"]);
//! # });
//! ```

pub mod facade;
pub mod fallback;
pub mod pattern;
pub mod providers;
pub mod traits;

pub use facade::{BackendMode, CacheFacade};
pub use fallback::FallbackStore;
pub use pattern::FallbackPattern;
pub use providers::RedisBackend;
pub use traits::RemoteBackend;
