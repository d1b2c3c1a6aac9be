//! Values held by the cache.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A cached value: either a string or an integer
///
/// The remote tier stores everything as strings, so values read back from
/// Redis are always [`CacheValue::Str`]. Counters written by `increment` in
/// the fallback store are [`CacheValue::Int`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CacheValue {
    Int(i64),
    Str(String),
}

impl CacheValue {
    /// Borrow the value as a string if it is one
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            Self::Int(_) => None,
        }
    }

    /// Integer view of the value; decimal strings parse
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            Self::Str(s) => s.trim().parse().ok(),
        }
    }

    /// Empty strings and zero count as "no value"
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Str(s) => !s.is_empty(),
            Self::Int(n) => *n != 0,
        }
    }

    /// Render the value as the string the remote stores
    pub fn to_wire(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for CacheValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(s) => f.write_str(s),
            Self::Int(n) => write!(f, "{n}"),
        }
    }
}

impl From<&str> for CacheValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for CacheValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<i64> for CacheValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}
