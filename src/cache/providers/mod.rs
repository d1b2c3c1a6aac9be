//! Remote backend implementations

pub mod redis;

pub use self::redis::RedisBackend;
