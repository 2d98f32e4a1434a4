//! Compiled search patterns and their line-anchored execution.
//!
//! A Vim search asks one question of its regex engine over and over: "what
//! is the first match that starts on line L at or after column C?". The
//! answer may run onto later lines. [`Pattern::execute`] answers exactly
//! that and nothing more. The motion code decides which answers to keep.

use regex::{Regex, RegexBuilder};
use thiserror::Error;
use vm_text::Position;

use crate::haystack::Haystack;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Why a pattern could not be compiled.
#[derive(Debug, Error)]
pub enum PatternError {
    #[error("empty search pattern")]
    Empty,
    #[error(transparent)]
    Invalid(#[from] regex::Error),
}

// ---------------------------------------------------------------------------
// LineMatch
// ---------------------------------------------------------------------------

/// A match found by [`Pattern::execute`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineMatch {
    /// First char of the match.
    pub start: Position,
    /// One past the last char of the match.
    pub end: Position,
    /// Number of lines the match touches, counting the line it starts on.
    pub lines: usize,
}

// ---------------------------------------------------------------------------
// Pattern
// ---------------------------------------------------------------------------

/// A compiled pattern.
///
/// Compiled in multi-line mode, so `^` and `$` anchor at line boundaries
/// anywhere in the buffer.
#[derive(Debug, Clone)]
pub struct Pattern {
    regex: Regex,
}

impl Pattern {
    /// Compile `pattern`.
    ///
    /// # Errors
    ///
    /// [`PatternError::Empty`] for an empty pattern and
    /// [`PatternError::Invalid`] when the regex engine rejects it.
    pub fn compile(pattern: &str, ignore_case: bool) -> Result<Self, PatternError> {
        if pattern.is_empty() {
            return Err(PatternError::Empty);
        }
        let regex = RegexBuilder::new(pattern)
            .case_insensitive(ignore_case)
            .multi_line(true)
            .build()?;
        Ok(Self { regex })
    }

    /// The source text of the pattern.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }

    /// Leftmost match starting on `line` at column `col` or later.
    ///
    /// Text before `col` still counts as context for anchors and word
    /// boundaries. A match may start at the end of the line (`$`) but not on
    /// a later line. Returns `None` when `line` is past the buffer or `col`
    /// is past the line's content.
    #[must_use]
    pub fn execute(&self, hay: &Haystack<'_>, line: usize, col: usize) -> Option<LineMatch> {
        let buf = hay.buffer();
        if line >= buf.line_count() || col > buf.line_content_len(line) {
            return None;
        }
        let from = buf.line_start_offset(line) + col;
        let found = self.regex.find_at(hay.text(), hay.char_to_byte(from))?;
        let start = hay.byte_to_char(found.start());
        if start > buf.line_end_offset(line, true) {
            return None;
        }
        let start = buf.offset_to_position(start);
        let end = buf.offset_to_position(hay.byte_to_char(found.end()));
        Some(LineMatch {
            start,
            end,
            lines: end.line - line + 1,
        })
    }
}

// ---------------------------------------------------------------------------
// Case policy & pattern building
// ---------------------------------------------------------------------------

/// Decide whether a search for `pattern` ignores case.
///
/// `ignore_case` is the base policy. With `smart_case`, an uppercase letter
/// in the pattern that is not escaped by a preceding `\` makes the search
/// case-sensitive.
#[must_use]
pub fn should_ignore_case(pattern: &str, ignore_case: bool, smart_case: bool) -> bool {
    ignore_case && !(smart_case && contains_upper_case(pattern))
}

fn contains_upper_case(pattern: &str) -> bool {
    let mut prev = None;
    for ch in pattern.chars() {
        if ch.is_uppercase() && prev != Some('\\') {
            return true;
        }
        prev = Some(ch);
    }
    false
}

/// Pattern that searches for the literal `word`, wrapped in word-boundary
/// assertions when `whole_word` is set (Vim `*` vs `g*`).
#[must_use]
pub fn make_search_pattern(word: &str, whole_word: bool) -> String {
    let escaped = regex::escape(word);
    if whole_word {
        format!(r"\b{{start}}{escaped}\b{{end}}")
    } else {
        escaped
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
