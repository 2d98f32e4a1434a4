//! Offsets, positions, ranges and directions.
//!
//! The engine speaks **char offsets** into the whole buffer. An offset counts
//! Unicode scalar values from the start of the text, the same unit `ropey`
//! indexes by, so `offset == len` is the position just past the last char.
//!
//! [`Position`] is the (line, col) view of an offset, both 0-indexed, and is
//! only used where a motion genuinely works line by line (pattern search,
//! match reporting). Conversion between the two lives on
//! [`Buffer`](crate::Buffer).

use std::fmt;

// ---------------------------------------------------------------------------
// Position
// ---------------------------------------------------------------------------

/// A (line, column) position, both 0-indexed. `col` counts chars.
///
/// Positions order lexicographically: line first, then column.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position {
    pub line: usize,
    pub col: usize,
}

impl Position {
    #[inline]
    #[must_use]
    pub const fn new(line: usize, col: usize) -> Self {
        Self { line, col }
    }
}

impl Ord for Position {
    #[inline]
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.line
            .cmp(&other.line)
            .then(self.col.cmp(&other.col))
    }
}

impl PartialOrd for Position {
    #[inline]
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Debug for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pos({}:{})", self.line, self.col)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // 1-indexed, matching Vim's `line:col` status.
        write!(f, "{}:{}", self.line + 1, self.col + 1)
    }
}

// ---------------------------------------------------------------------------
// Range
// ---------------------------------------------------------------------------

/// A half-open span of char offsets: `[start, end)`.
///
/// `start <= end` always holds. An empty range (`start == end`) is a valid
/// result, e.g. the inner contents of `()`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Range {
    pub start: usize,
    pub end: usize,
}

impl Range {
    /// Create a range. Panics in debug if `start > end`.
    #[inline]
    #[must_use]
    pub const fn new(start: usize, end: usize) -> Self {
        debug_assert!(start <= end, "Range::new requires start <= end");
        Self { start, end }
    }

    /// A zero-width range at `offset`.
    #[inline]
    #[must_use]
    pub const fn point(offset: usize) -> Self {
        Self {
            start: offset,
            end: offset,
        }
    }

    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.start == self.end
    }

    #[inline]
    #[must_use]
    pub const fn len(self) -> usize {
        self.end - self.start
    }

    /// True when `offset` falls within `[start, end)`.
    #[inline]
    #[must_use]
    pub const fn contains(self, offset: usize) -> bool {
        offset >= self.start && offset < self.end
    }
}

impl fmt::Debug for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Range({}..{})", self.start, self.end)
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

// ---------------------------------------------------------------------------
// Direction
// ---------------------------------------------------------------------------

/// Scan direction of a motion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Forward,
    Backward,
}

impl Direction {
    /// `+1` for forward, `-1` for backward.
    #[inline]
    #[must_use]
    pub const fn step(self) -> isize {
        match self {
            Self::Forward => 1,
            Self::Backward => -1,
        }
    }

    /// Direction implied by the sign of a signed count. Zero counts as forward.
    #[inline]
    #[must_use]
    pub const fn of_count(count: isize) -> Self {
        if count < 0 { Self::Backward } else { Self::Forward }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
