//! Key matching for `keys` in the fallback tier
//!
//! The remote understands glob patterns (`user:*`, `h?llo`, `[ab]c`). The
//! fallback only approximates them: every non-word character is stripped and
//! the remainder must appear somewhere in the key. `user:*` therefore matches
//! `user:1` but also `superuser:1`, and `*` matches every key.

use regex::Regex;
use std::sync::OnceLock;

fn non_word() -> &'static Regex {
    static NON_WORD: OnceLock<Regex> = OnceLock::new();
    NON_WORD.get_or_init(|| Regex::new(r"\W+").expect("static pattern compiles"))
}

/// A glob pattern reduced to the fallback's substring test
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FallbackPattern {
    needle: String,
}

impl FallbackPattern {
    pub fn new(pattern: &str) -> Self {
        Self {
            needle: non_word().replace_all(pattern, "").into_owned(),
        }
    }

    /// The word characters left after stripping
    pub fn needle(&self) -> &str {
        &self.needle
    }

    pub fn matches(&self, key: &str) -> bool {
        key.contains(&self.needle)
    }
}
