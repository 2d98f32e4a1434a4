//! Delimiter table: the pairs `%` and unmatched-block motions jump between.
//!
//! The table is derived from the `matchpairs` option and read on every `%`.
//! It lives process-wide behind an [`ArcSwap`]: readers take a snapshot
//! without locking, and the option-change notification builds a fresh table
//! and swaps it in whole. A reader holding an old snapshot finishes its scan
//! on that snapshot.
//!
//! # Layout
//!
//! A table is a flat list `open1 close1 open2 close2 …`, so a char's index
//! parity says whether it opens (even) or closes (odd) and its partner sits
//! right next to it.

use std::sync::{Arc, LazyLock};

use arc_swap::ArcSwap;

/// Pairs used before any `matchpairs` notification arrives.
pub const DEFAULT_PAIRS: &str = "{}()[]<>";

// ---------------------------------------------------------------------------
// DelimiterTable
// ---------------------------------------------------------------------------

/// An immutable list of open/close delimiter pairs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DelimiterTable {
    chars: Vec<char>,
}

impl DelimiterTable {
    /// Build a table from a flat `open close open close …` string. A
    /// trailing unpaired char is dropped.
    #[must_use]
    pub fn from_pairs(pairs: &str) -> Self {
        let mut chars: Vec<char> = pairs.chars().collect();
        chars.truncate(chars.len() & !1);
        Self { chars }
    }

    /// Build a table from a `matchpairs` value such as `(:),{:},[:]`.
    ///
    /// Each comma-separated entry must be exactly three chars long; the
    /// first and last become a pair. Anything else is skipped.
    #[must_use]
    pub fn parse_matchpairs(value: &str) -> Self {
        let chars = value
            .split(',')
            .filter_map(|entry| {
                let mut it = entry.chars();
                match (it.next(), it.next(), it.next(), it.next()) {
                    (Some(open), Some(_), Some(close), None) => Some([open, close]),
                    _ => None,
                }
            })
            .flatten()
            .collect();
        Self { chars }
    }

    /// Index of `ch` in the flat pair list.
    #[inline]
    #[must_use]
    pub fn index_of(&self, ch: char) -> Option<usize> {
        self.chars.iter().position(|&c| c == ch)
    }

    #[inline]
    #[must_use]
    pub fn contains(&self, ch: char) -> bool {
        self.chars.contains(&ch)
    }

    /// The partner of `ch` and whether `ch` is the opening side.
    #[must_use]
    pub fn partner(&self, ch: char) -> Option<(char, bool)> {
        let idx = self.index_of(ch)?;
        if idx % 2 == 0 {
            Some((self.chars[idx + 1], true))
        } else {
            Some((self.chars[idx - 1], false))
        }
    }

    /// The table as its flat pair string.
    #[must_use]
    pub fn as_pairs(&self) -> String {
        self.chars.iter().collect()
    }
}

impl Default for DelimiterTable {
    fn default() -> Self {
        Self::from_pairs(DEFAULT_PAIRS)
    }
}

// ---------------------------------------------------------------------------
// DelimiterCache
// ---------------------------------------------------------------------------

/// A swappable snapshot of the current [`DelimiterTable`].
#[derive(Debug)]
pub struct DelimiterCache {
    current: ArcSwap<DelimiterTable>,
}

impl DelimiterCache {
    #[must_use]
    pub fn new(table: DelimiterTable) -> Self {
        Self {
            current: ArcSwap::from_pointee(table),
        }
    }

    /// The current snapshot.
    #[inline]
    #[must_use]
    pub fn load(&self) -> Arc<DelimiterTable> {
        self.current.load_full()
    }

    /// Rebuild from a `matchpairs` value and publish the result.
    pub fn rebuild(&self, matchpairs: &str) {
        let table = DelimiterTable::parse_matchpairs(matchpairs);
        tracing::debug!(pairs = %table.as_pairs(), "delimiter table rebuilt");
        self.current.store(Arc::new(table));
    }
}

impl Default for DelimiterCache {
    fn default() -> Self {
        Self::new(DelimiterTable::default())
    }
}

static DELIMITERS: LazyLock<DelimiterCache> = LazyLock::new(DelimiterCache::default);

/// The process-wide delimiter table snapshot.
#[must_use]
pub fn delimiter_table() -> Arc<DelimiterTable> {
    DELIMITERS.load()
}

/// `matchpairs` change notification: rebuild the process-wide table.
pub fn matchpairs_changed(value: &str) {
    DELIMITERS.rebuild(value);
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
