//! Read-only text buffer the motions scan.
//!
//! A `Buffer` wraps a [`ropey::Rope`] and answers the handful of questions a
//! motion asks about its text: where a line starts and ends, which line an
//! offset sits on, whether a line is blank.
//!
//! # Line model
//!
//! Only `\n` terminates a line. ropey is built without its `unicode_lines`
//! and `cr_lines` features so that rope line indices agree with the motions,
//! which scan for `'\n'` directly. A `\r` before the newline is ordinary
//! content.
//!
//! A buffer ending in `\n` has a trailing empty line, so `"a\n"` has two
//! lines. An empty buffer has one.

use std::fmt;

use ropey::{Rope, RopeSlice};

use crate::position::{Direction, Position};

// ---------------------------------------------------------------------------
// Buffer
// ---------------------------------------------------------------------------

/// A text buffer backed by a rope.
///
/// All offsets are char indices into the whole text. Accessors that take a
/// line number clamp out-of-range lines to the end of the buffer rather than
/// failing, since motions routinely probe one line past either end.
#[derive(Clone)]
pub struct Buffer {
    rope: Rope,
}

impl Buffer {
    // -- Construction -------------------------------------------------------

    /// Create an empty buffer.
    #[must_use]
    pub fn new() -> Self {
        Self { rope: Rope::new() }
    }

    /// Create a buffer from a string.
    #[must_use]
    pub fn from_text(text: &str) -> Self {
        Self {
            rope: Rope::from_str(text),
        }
    }

    // -- Text access --------------------------------------------------------

    /// The underlying rope.
    #[inline]
    #[must_use]
    pub const fn rope(&self) -> &Rope {
        &self.rope
    }

    /// The whole text as a slice, for char-by-char scanning.
    #[inline]
    #[must_use]
    pub fn chars(&self) -> RopeSlice<'_> {
        self.rope.slice(..)
    }

    /// Total character count.
    #[inline]
    #[must_use]
    pub fn file_size(&self) -> usize {
        self.rope.len_chars()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rope.len_chars() == 0
    }

    /// Number of lines, counting the empty line after a trailing `\n`.
    #[inline]
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.rope.len_lines()
    }

    /// The character at `offset`, or `None` past the end.
    #[inline]
    #[must_use]
    pub fn char_at(&self, offset: usize) -> Option<char> {
        (offset < self.rope.len_chars()).then(|| self.rope.char(offset))
    }

    /// The content of `line` without its newline. Empty for lines past the
    /// end.
    #[must_use]
    pub fn line_text(&self, line: usize) -> String {
        let start = self.line_start_offset(line);
        let end = self.line_end_offset(line, true);
        self.rope.slice(start..end).to_string()
    }

    /// Number of chars in `line` excluding the newline. Zero past the end.
    #[must_use]
    pub fn line_content_len(&self, line: usize) -> usize {
        self.line_end_offset(line, true) - self.line_start_offset(line)
    }

    // -- Line geometry ------------------------------------------------------

    /// Offset of the first char of `line`. Lines past the end map to the
    /// buffer length.
    #[must_use]
    pub fn line_start_offset(&self, line: usize) -> usize {
        if line >= self.rope.len_lines() {
            return self.rope.len_chars();
        }
        self.rope.line_to_char(line)
    }

    /// End of `line`.
    ///
    /// With `allow_end` this is the offset of the line's `\n` (or the buffer
    /// length on the last line), the insert-mode end. Without it, it is the
    /// last char of the line, or the line start when the line is empty.
    #[must_use]
    pub fn line_end_offset(&self, line: usize, allow_end: bool) -> usize {
        if line >= self.rope.len_lines() {
            let len = self.rope.len_chars();
            return if allow_end { len } else { len.saturating_sub(1) };
        }
        let start = self.rope.line_to_char(line);
        let slice = self.rope.line(line);
        let mut end = start + slice.len_chars();
        if end > start && slice.char(slice.len_chars() - 1) == '\n' {
            end -= 1;
        }
        if allow_end || end == start {
            end
        } else {
            end - 1
        }
    }

    // -- Coordinate conversion ----------------------------------------------

    /// Line containing `offset`. Offsets past the end land on the last line.
    #[inline]
    #[must_use]
    pub fn line_of_offset(&self, offset: usize) -> usize {
        self.rope.char_to_line(offset.min(self.rope.len_chars()))
    }

    /// Convert an offset to (line, col). Offsets past the end are clamped.
    #[must_use]
    pub fn offset_to_position(&self, offset: usize) -> Position {
        let offset = offset.min(self.rope.len_chars());
        let line = self.rope.char_to_line(offset);
        Position::new(line, offset - self.rope.line_to_char(line))
    }

    /// Convert (line, col) to an offset, clamped to the buffer length.
    #[must_use]
    pub fn position_to_offset(&self, pos: Position) -> usize {
        (self.line_start_offset(pos.line) + pos.col).min(self.rope.len_chars())
    }

    /// Start of the line containing `offset`.
    #[inline]
    #[must_use]
    pub fn line_start_for_offset(&self, offset: usize) -> usize {
        self.line_start_offset(self.line_of_offset(offset))
    }

    /// Offset of the `\n` ending the line containing `offset`, or the buffer
    /// length on the last line.
    #[inline]
    #[must_use]
    pub fn line_end_for_offset(&self, offset: usize) -> usize {
        self.line_end_offset(self.line_of_offset(offset), true)
    }

    /// Clamp `offset` into its own line.
    ///
    /// Offsets at or past the end of the buffer are treated as belonging to
    /// the last line. Without `allow_end` the result never sits on the
    /// newline itself.
    #[must_use]
    pub fn normalize_offset(&self, offset: usize, allow_end: bool) -> usize {
        if offset == 0 {
            return 0;
        }
        let line = if offset < self.rope.len_chars() {
            self.rope.char_to_line(offset)
        } else {
            self.rope.len_lines() - 1
        };
        let min = self.line_start_offset(line);
        let max = self.line_end_offset(line, allow_end);
        offset.min(max).max(min)
    }

    // -- Line classification ------------------------------------------------

    /// True when `line` holds no text.
    ///
    /// With `allow_blanks`, a line of whitespace that is terminated by `\n`
    /// also counts. Lines past the end are empty.
    #[must_use]
    pub fn is_line_empty(&self, line: usize, allow_blanks: bool) -> bool {
        let len = self.rope.len_chars();
        if len == 0 {
            return true;
        }
        let offset = self.line_start_offset(line);
        if offset >= len || self.rope.char(offset) == '\n' {
            return true;
        }
        if allow_blanks {
            for ch in self.rope.chars_at(offset) {
                if ch == '\n' {
                    return true;
                }
                if !ch.is_whitespace() {
                    return false;
                }
            }
        }
        false
    }

    /// True when the rest of the line in direction `dir`, not counting the
    /// char at `offset` or the line's outermost char, contains a
    /// non-whitespace char.
    #[must_use]
    pub fn any_non_whitespace(&self, offset: usize, dir: Direction) -> bool {
        let (start, end) = match dir {
            Direction::Forward => (
                (offset + 1).min(self.rope.len_chars().saturating_sub(1)),
                self.line_end_for_offset(offset),
            ),
            Direction::Backward => (
                self.line_start_for_offset(offset),
                offset.saturating_sub(1),
            ),
        };
        (start..end).any(|i| !self.rope.char(i).is_whitespace())
    }
}

impl Default for Buffer {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Buffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Buffer")
            .field("lines", &self.line_count())
            .field("chars", &self.file_size())
            .finish()
    }
}

/// Unicode space separators, the characters Vim's sentence motion treats as
/// a gap between sentences. Tabs and newlines are not included.
#[must_use]
pub const fn is_space_char(ch: char) -> bool {
    matches!(
        ch,
        ' ' | '\u{a0}'
            | '\u{1680}'
            | '\u{2000}'..='\u{200a}'
            | '\u{2028}'
            | '\u{2029}'
            | '\u{202f}'
            | '\u{205f}'
            | '\u{3000}'
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
