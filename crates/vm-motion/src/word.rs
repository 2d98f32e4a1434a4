//! Words: classification, `w`/`e` primitives, `iw`/`aw` and word counts.
//!
//! # Words vs WORDs
//!
//! A **word** is a run of keyword characters (letters, digits, underscore)
//! or a run of other non-blank characters. A **WORD** is any run of
//! non-blank characters: with `big` set, every non-blank classifies as
//! [`CharType::Keyword`].
//!
//! An empty line is also a word: whitespace skipping stops at a second
//! consecutive `\n`.
//!
//! # Primitives
//!
//! | Function | Vim | Lands on |
//! |----------|-----|----------|
//! | [`find_next_word`] | `w` / `b` | start of the `count`-th word |
//! | [`find_next_word_end`] | `e` / `ge` | end of the `count`-th word |
//!
//! Both take a signed count (negative is backward) and a `size` past which
//! they never look. With `space_words` a whitespace run counts as a word of
//! its own, which is what inner text objects want.

#![allow(clippy::cast_possible_wrap, clippy::cast_sign_loss)]

use ropey::RopeSlice;
use vm_text::{Buffer, Direction, Range};

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// Character class for word boundary detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharType {
    /// Letters, digits, underscore. Every non-blank in WORD mode.
    Keyword,
    /// Non-blank, non-keyword characters.
    Punctuation,
    /// Blanks and line breaks.
    Whitespace,
}

/// Classify `ch`. With `big`, punctuation and keywords are one class.
#[must_use]
pub fn char_type(ch: char, big: bool) -> CharType {
    if ch.is_whitespace() {
        CharType::Whitespace
    } else if big || ch.is_alphanumeric() || ch == '_' {
        CharType::Keyword
    } else {
        CharType::Punctuation
    }
}

#[inline]
fn type_at(chars: RopeSlice<'_>, i: isize, big: bool) -> CharType {
    char_type(chars.char(i as usize), big)
}

// ---------------------------------------------------------------------------
// Primitives
// ---------------------------------------------------------------------------

/// Offset of the start of the `|count|`-th next word, backward for a
/// negative count. Never looks at or past `size`.
#[must_use]
pub fn find_next_word(
    chars: RopeSlice<'_>,
    pos: usize,
    size: usize,
    count: isize,
    big: bool,
    space_words: bool,
) -> usize {
    if chars.len_chars() == 0 {
        return 0;
    }
    let size = size.min(chars.len_chars()) as isize;
    let step = Direction::of_count(count).step();
    let pos = pos as isize;
    let mut res = pos;
    for _ in 0..count.unsigned_abs() {
        res = next_word_one(chars, res, size, step, big, space_words);
        if res == pos || res == 0 || res == size - 1 {
            break;
        }
    }
    res.max(0) as usize
}

/// Offset of the end of the `|count|`-th next word, backward for a
/// negative count. Never looks at or past `size`.
#[must_use]
pub fn find_next_word_end(
    chars: RopeSlice<'_>,
    pos: usize,
    size: usize,
    count: isize,
    big: bool,
    space_words: bool,
) -> usize {
    if chars.len_chars() == 0 {
        return 0;
    }
    let size = size.min(chars.len_chars()) as isize;
    let step = Direction::of_count(count).step();
    let pos = pos as isize;
    let mut res = pos;
    for _ in 0..count.unsigned_abs() {
        res = next_word_end_one(chars, res, size, step, big, space_words);
        if res == pos || res == 0 || res == size - 1 {
            break;
        }
    }
    res.max(0) as usize
}

/// Skip whitespace from `offset` in direction `step`, stopping on an empty
/// line (two `\n` in a row).
fn skip_space(chars: RopeSlice<'_>, mut offset: isize, step: isize, size: isize) -> isize {
    let mut prev = '\0';
    while offset >= 0 && offset < size {
        let c = chars.char(offset as usize);
        if c == '\n' && prev == '\n' {
            break;
        }
        if char_type(c, false) != CharType::Whitespace {
            break;
        }
        prev = c;
        offset += step;
    }
    if offset < size { offset } else { size - 1 }
}

fn next_word_one(chars: RopeSlice<'_>, pos: isize, size: isize, step: isize, big: bool, space_words: bool) -> isize {
    let len = chars.len_chars() as isize;
    let mut pos = if pos < size { pos } else { size.min(len - 1) };

    // Backward: start from the end of a word, not from inside the gap.
    if step < 0 && pos > 0 {
        if type_at(chars, pos - 1, big) == CharType::Whitespace && !space_words {
            pos = skip_space(chars, pos - 1, step, size) + 1;
        }
        if pos > 0 && type_at(chars, pos, big) != type_at(chars, pos - 1, big) {
            pos += step;
        }
    }

    let mut res = pos;
    if pos < 0 || pos >= size {
        return pos;
    }

    let mut kind = type_at(chars, pos, big);
    if kind == CharType::Whitespace && step < 0 && pos > 0 && !space_words {
        kind = type_at(chars, pos - 1, big);
    }

    let mut found = false;
    pos += step;
    while pos >= 0 && pos < size && !found {
        let next = type_at(chars, pos, big);
        if next != kind {
            if next == CharType::Whitespace && step >= 0 && !space_words {
                pos = skip_space(chars, pos, step, size);
                res = pos;
            } else if step < 0 {
                res = pos + 1;
            } else {
                res = pos;
            }
            found = true;
        }
        pos += step;
    }

    if found {
        res.clamp(0, size - 1)
    } else if pos <= 0 {
        0
    } else if pos >= size {
        size
    } else {
        res
    }
}

fn next_word_end_one(chars: RopeSlice<'_>, pos: isize, size: isize, step: isize, big: bool, space_words: bool) -> isize {
    let mut pos = pos;

    // Forward: start from the start of a word, not from inside the gap.
    if step > 0 && pos < size - 1 {
        if type_at(chars, pos + 1, big) == CharType::Whitespace && !space_words {
            pos = skip_space(chars, pos + 1, step, size) - 1;
        }
        if pos < size - 1 && type_at(chars, pos, big) != type_at(chars, pos + 1, big) {
            pos += step;
        }
    }

    let mut res = pos;
    if pos < 0 || pos >= size {
        return pos;
    }

    let mut kind = type_at(chars, pos, big);
    if kind == CharType::Whitespace && step >= 0 && pos < size - 1 && !space_words {
        kind = type_at(chars, pos + 1, big);
    }

    let mut found = false;
    pos += step;
    while pos >= 0 && pos < size && !found {
        let next = type_at(chars, pos, big);
        if next != kind {
            if step >= 0 {
                res = pos - 1;
            } else if next == CharType::Whitespace && !space_words {
                pos = skip_space(chars, pos, step, size);
                res = pos;
            } else {
                res = pos;
            }
            found = true;
        }
        pos += step;
    }

    if found {
        res.clamp(0, size - 1)
    } else if pos == size {
        size - 1
    } else {
        res
    }
}

// ---------------------------------------------------------------------------
// Word under the cursor
// ---------------------------------------------------------------------------

/// The keyword run at or after `offset` on its line, or failing that the
/// punctuation run. Used for `*` and `#`.
///
/// A run followed by a non-keyword char is taken as a single char.
#[must_use]
pub fn find_word_under_cursor(buf: &Buffer, offset: usize) -> Option<Range> {
    let chars = buf.chars();
    let len = chars.len_chars();
    if offset >= len {
        return None;
    }
    let stop = buf.line_end_for_offset(offset);
    let class = |i: usize| char_type(chars.char(i), false);

    let mut start = offset;
    for wanted in [CharType::Keyword, CharType::Punctuation] {
        start = offset;
        if class(start) == wanted {
            while start > 0 && class(start - 1) == wanted {
                start -= 1;
            }
        } else {
            while start < stop && class(start) != wanted {
                start += 1;
            }
        }
        if start != stop {
            break;
        }
    }
    if start == stop {
        return None;
    }

    let end = if start + 1 >= len || class(start + 1) != CharType::Keyword {
        start + 1
    } else {
        find_next_word_end(chars, start, stop, 1, false, false) + 1
    };
    Some(Range::new(start, end))
}

// ---------------------------------------------------------------------------
// Word text object
// ---------------------------------------------------------------------------

/// Where the caret sits relative to word boundaries.
#[derive(Debug, Clone, Copy)]
struct WordBoundary {
    /// The caret is on whitespace.
    start_space: bool,
    /// The char before the caret has another class (or there is none).
    on_word_start: bool,
    /// The char after the caret has another class (or there is none).
    on_word_end: bool,
}

impl WordBoundary {
    fn at(chars: RopeSlice<'_>, pos: usize, big: bool) -> Self {
        let class = |i: usize| char_type(chars.char(i), big);
        let here = class(pos);
        Self {
            start_space: here == CharType::Whitespace,
            on_word_start: pos == 0 || class(pos - 1) != here,
            on_word_end: pos + 1 >= chars.len_chars() || class(pos + 1) != here,
        }
    }
}

/// `iw` / `aw` / `iW` / `aW`: the range of `count` words around the caret.
///
/// `dir` is the direction an existing selection grows in. The outer forms
/// take the whitespace after the words, or the whitespace before them when
/// the words are followed by more text on the line.
#[must_use]
pub fn find_word_text_object(
    buf: &Buffer,
    offset: usize,
    count: usize,
    dir: Direction,
    is_outer: bool,
    is_big: bool,
    has_selection: bool,
) -> Range {
    let chars = buf.chars();
    let max = chars.len_chars();
    if max == 0 {
        return Range::point(0);
    }
    let pos = offset;
    if pos >= max {
        return Range::point(max - 1);
    }

    let count = count as isize;
    let forward = dir == Direction::Forward;
    let space_words = !is_outer;
    let at = WordBoundary::at(chars, pos, is_big);
    let outer_space = at.start_space && is_outer;
    tracing::trace!(pos, count, ?dir, is_outer, is_big, has_selection, ?at, "word object");

    let mut start = pos;
    if (!at.on_word_start && !outer_space) || has_selection || (count > 1 && !forward) {
        let back = if forward {
            1
        } else {
            count - isize::from(at.on_word_start && !has_selection)
        };
        start = buf.normalize_offset(find_next_word(chars, pos, max, -back, is_big, space_words), false);
    }

    let mut end = pos;
    if !at.on_word_end || has_selection || (count > 1 && forward) || outer_space {
        let ahead = if forward {
            count - isize::from(at.on_word_end && !has_selection && !outer_space)
        } else {
            1
        };
        end = find_next_word_end(chars, pos, max, ahead, is_big, space_words);
    }

    let is_space = |i: usize| char_type(chars.char(i), false) == CharType::Whitespace;

    let mut go_back = (at.start_space && !has_selection) || (!at.start_space && has_selection && !at.on_word_start);
    let mut go_forward = forward
        && is_outer
        && ((!at.start_space && !at.on_word_end) || (at.start_space && at.on_word_end && has_selection));

    if forward && is_outer {
        let first_end = if count > 1 {
            find_next_word_end(chars, pos, max, 1, is_big, false)
        } else {
            end
        };
        if first_end + 1 < max && !is_space(first_end + 1) {
            go_back = true;
            go_forward = true;
        }
        // Note the inverted class: a keyword/punctuation change counts.
        if !go_forward
            && !at.start_space
            && !has_selection
            && end + 1 < max
            && char_type(chars.char(end + 1), !is_big) != char_type(chars.char(end), !is_big)
        {
            go_forward = true;
        }
    }
    if !forward && is_outer && at.start_space && pos > 0 && !is_space(pos - 1) {
        go_back = true;
    }

    if go_forward && buf.any_non_whitespace(end, Direction::Forward) {
        while end + 1 < max && is_space(end + 1) {
            end += 1;
        }
    }
    if go_back && buf.any_non_whitespace(start, Direction::Backward) {
        while start > 0 && is_space(start - 1) {
            start -= 1;
        }
    }

    tracing::debug!(start, end, go_back, go_forward, "word object bounds");
    Range::new(start, end + 1)
}

// ---------------------------------------------------------------------------
// Word count
// ---------------------------------------------------------------------------

/// Result of a word tally: the number of words and the 1-based index of the
/// word holding the cursor (0 when the cursor is in no word).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WordCount {
    pub count: usize,
    pub position: usize,
}

/// Count the WORDs in `range` and locate `cursor` among them (`g CTRL-G`).
///
/// A cursor on the whitespace between two words belongs to the earlier one.
#[must_use]
pub fn count_words(buf: &Buffer, range: Range, cursor: usize) -> WordCount {
    let chars = buf.chars();
    let Range { start, end } = range;
    let end = end.min(chars.len_chars());
    if (start..end).all(|i| chars.char(i).is_whitespace()) {
        return WordCount::default();
    }
    // Only whitespace is left from `at` onward.
    let blank_tail = |at: usize| at >= end || (at..end).all(|i| chars.char(i).is_whitespace());

    let mut count = 1;
    let mut position = 0;
    let mut last: Option<usize> = None;
    let mut res = start;
    loop {
        res = find_next_word(chars, res, end, 1, true, false);
        if res == start || res == 0 || last == Some(res) {
            break;
        }
        if blank_tail(res) {
            if position == 0 && last.is_none_or(|l| l < cursor) {
                position = count;
            }
            break;
        }

        count += 1;
        if res == cursor {
            position = count;
        } else if last.is_none_or(|l| l < cursor) && res >= cursor {
            position = if count == 2 { 1 } else { count - 1 };
        }
        last = Some(res);
    }

    if position == 0 && res == cursor {
        position = count;
    }
    WordCount { count, position }
}

/// [`count_words`] over the whole buffer.
#[must_use]
pub fn count_words_in_buffer(buf: &Buffer, cursor: usize) -> WordCount {
    count_words(buf, Range::new(0, buf.file_size()), cursor)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn r(start: usize, end: usize) -> Range {
        Range::new(start, end)
    }

    fn object(text: &str, pos: usize, count: usize, outer: bool) -> Range {
        let buf = Buffer::from_text(text);
        find_word_text_object(&buf, pos, count, Direction::Forward, outer, false, false)
    }

    // -- Classification -----------------------------------------------------

    #[test]
    fn classify_chars() {
        assert_eq!(char_type('a', false), CharType::Keyword);
        assert_eq!(char_type('_', false), CharType::Keyword);
        assert_eq!(char_type('é', false), CharType::Keyword);
        assert_eq!(char_type('.', false), CharType::Punctuation);
        assert_eq!(char_type('.', true), CharType::Keyword);
        assert_eq!(char_type('\t', true), CharType::Whitespace);
        assert_eq!(char_type('\n', false), CharType::Whitespace);
    }

    // -- Primitives ---------------------------------------------------------

    #[test]
    fn next_word_start() {
        let buf = Buffer::from_text("one two three");
        let chars = buf.chars();
        assert_eq!(find_next_word(chars, 0, 13, 1, false, false), 4);
        assert_eq!(find_next_word(chars, 0, 13, 2, false, false), 8);
        assert_eq!(find_next_word(chars, 9, 13, -1, false, false), 8);
        assert_eq!(find_next_word(chars, 8, 13, -1, false, false), 4);
    }

    #[test]
    fn next_word_stops_at_punctuation_unless_big() {
        let buf = Buffer::from_text("foo.bar baz");
        let chars = buf.chars();
        assert_eq!(find_next_word(chars, 0, 11, 1, false, false), 3);
        assert_eq!(find_next_word(chars, 0, 11, 1, true, false), 8);
    }

    #[test]
    fn next_word_stops_on_empty_line() {
        let buf = Buffer::from_text("a\n\nb");
        assert_eq!(find_next_word(buf.chars(), 0, 4, 1, false, false), 2);
    }

    #[test]
    fn next_word_end() {
        let buf = Buffer::from_text("one two three");
        let chars = buf.chars();
        assert_eq!(find_next_word_end(chars, 0, 13, 1, false, false), 2);
        assert_eq!(find_next_word_end(chars, 2, 13, 1, false, false), 6);
        assert_eq!(find_next_word_end(chars, 9, 13, 1, false, false), 12);
    }

    // -- Word under cursor --------------------------------------------------

    #[test]
    fn word_under_cursor_skips_leading_blanks() {
        let buf = Buffer::from_text("  hello world");
        assert_eq!(find_word_under_cursor(&buf, 0), Some(r(2, 7)));
    }

    #[test]
    fn word_under_cursor_from_middle() {
        let buf = Buffer::from_text("foo bar");
        assert_eq!(find_word_under_cursor(&buf, 5), Some(r(4, 7)));
    }

    #[test]
    fn word_under_cursor_prefers_keywords() {
        let buf = Buffer::from_text("a + b");
        assert_eq!(find_word_under_cursor(&buf, 1), Some(r(4, 5)));
    }

    #[test]
    fn word_under_cursor_punctuation_is_one_char() {
        let buf = Buffer::from_text("+++");
        assert_eq!(find_word_under_cursor(&buf, 0), Some(r(0, 1)));
    }

    #[test]
    fn word_under_cursor_stays_on_line() {
        let buf = Buffer::from_text("a\n\nb");
        assert_eq!(find_word_under_cursor(&buf, 2), None);
        assert_eq!(find_word_under_cursor(&buf, 9), None);
    }

    // -- Text object --------------------------------------------------------

    #[test]
    fn inner_word() {
        assert_eq!(object("foo bar", 1, 1, false), r(0, 3));
    }

    #[test]
    fn outer_word_takes_trailing_space() {
        assert_eq!(object("foo bar", 0, 1, true), r(0, 4));
        assert_eq!(object("foo bar baz", 4, 1, true), r(4, 8));
    }

    #[test]
    fn inner_word_on_whitespace_selects_the_gap() {
        assert_eq!(object("foo   bar", 4, 1, false), r(3, 6));
    }

    #[test]
    fn inner_word_count_includes_gaps() {
        assert_eq!(object("a b c", 0, 2, false), r(0, 2));
    }

    #[test]
    fn empty_buffer_object() {
        assert_eq!(object("", 0, 1, true), r(0, 0));
    }

    // -- Word count ---------------------------------------------------------

    #[test]
    fn count_words_and_cursor_word() {
        let buf = Buffer::from_text("one two three");
        assert_eq!(count_words_in_buffer(&buf, 0), WordCount { count: 3, position: 1 });
        assert_eq!(count_words_in_buffer(&buf, 4), WordCount { count: 3, position: 2 });
        assert_eq!(count_words_in_buffer(&buf, 10), WordCount { count: 3, position: 3 });
    }

    #[test]
    fn count_words_gap_belongs_to_previous_word() {
        let buf = Buffer::from_text("one two three");
        assert_eq!(count_words_in_buffer(&buf, 3).position, 1);
    }

    #[test]
    fn count_words_ignores_trailing_newline() {
        let buf = Buffer::from_text("one two three\n");
        assert_eq!(count_words_in_buffer(&buf, 13), WordCount { count: 3, position: 3 });
    }

    #[test]
    fn count_words_final_newline_is_not_a_word() {
        // The step onto the last `\n` would be a third transition; it ends
        // the tally instead.
        let buf = Buffer::from_text("a b\n");
        assert_eq!(count_words_in_buffer(&buf, 0), WordCount { count: 2, position: 1 });
        assert_eq!(count_words_in_buffer(&buf, 3), WordCount { count: 2, position: 2 });
    }

    #[test]
    fn count_words_blank_buffer() {
        let buf = Buffer::from_text("  \n");
        assert_eq!(count_words_in_buffer(&buf, 0), WordCount::default());
    }
}
