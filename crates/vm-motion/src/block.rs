//! Delimiter and block matching: `%`, `[(`, `])`, `i(`, `a{`, `i"`.
//!
//! # Scanning model
//!
//! Every block motion reduces to [`find_block_location`]: walk the text in
//! one direction from a start offset, keep a nesting counter, and stop at the
//! `count`-th target delimiter that is not closed off by an inner pair.
//!
//! String and character literals are tracked on the fly. A delimiter inside
//! `"..."` or `'.'` does not count unless the scan was asked to allow it and
//! started inside a string too. Literal state is per line: a newline resets
//! it, so an unterminated quote never poisons the rest of the buffer.
//!
//! | Function                              | Vim        |
//! |---------------------------------------|------------|
//! | [`find_matching_pair_on_current_line`]| `%`        |
//! | [`find_unmatched_block`]              | `[(` `])`  |
//! | [`find_block_range`]                  | `i(` `a(`  |
//! | [`find_block_quote_in_line_range`]    | `i"` `a"`  |

#![allow(clippy::cast_possible_wrap, clippy::cast_sign_loss)]

use ropey::RopeSlice;
use vm_text::{Buffer, Caret, Direction, Range};

use crate::comment::{CommentMetadata, find_matching_comment};
use crate::delimiters::delimiter_table;

/// Block pairs the text objects understand, independent of `matchpairs`.
pub const BLOCK_CHARS: &str = "{}()[]<>";

// ---------------------------------------------------------------------------
// Literal tracking
// ---------------------------------------------------------------------------

/// True when the char at `pos` is `quote` and is preceded by an even number
/// of backslashes.
#[must_use]
pub fn is_quote_without_escape(chars: RopeSlice<'_>, pos: usize, quote: char) -> bool {
    if pos >= chars.len_chars() || chars.char(pos) != quote {
        return false;
    }
    let backslashes = (0..pos)
        .rev()
        .take_while(|&i| chars.char(i) == '\\')
        .count();
    backslashes % 2 == 0
}

/// Whether offset `pos` sits inside a string literal (`str`) or a character
/// literal (`!str`), judged from the start of its line.
///
/// A `"` inside a char literal and a `'` inside a string are plain chars.
/// Offsets on a newline are never inside a literal.
fn check_in_string(chars: RopeSlice<'_>, pos: isize, str: bool) -> bool {
    let len = chars.len_chars();
    if len == 0 {
        return false;
    }
    let end = usize::try_from(pos).unwrap_or(0).min(len);
    if end < len && chars.char(end) == '\n' {
        return false;
    }
    let begin = (0..end)
        .rev()
        .find(|&i| chars.char(i) == '\n')
        .map_or(0, |nl| nl + 1);

    let mut in_quote = false;
    let mut in_char = false;
    for i in begin..end {
        match chars.char(i) {
            '"' if !in_char && is_quote_without_escape(chars, i, '"') => in_quote = !in_quote,
            '\'' if !in_quote && is_quote_without_escape(chars, i, '\'') => in_char = !in_char,
            _ => {}
        }
    }
    if str { in_quote } else { in_char }
}

/// First char from `needles` at or after `pos` in direction `dir`.
fn find_first_of(
    chars: RopeSlice<'_>,
    mut pos: isize,
    needles: &[char],
    dir: Direction,
) -> Option<(char, isize)> {
    let len = chars.len_chars() as isize;
    while pos >= 0 && pos < len {
        let c = chars.char(pos as usize);
        if needles.contains(&c) {
            return Some((c, pos));
        }
        pos += dir.step();
    }
    None
}

// ---------------------------------------------------------------------------
// Block location
// ---------------------------------------------------------------------------

/// Find the `count`-th unmatched `target` scanning from `pos` in `dir`.
///
/// Every `found` passed on the way opens a nested pair whose `target` is
/// skipped. The char at `pos` itself never opens a pair, so starting on a
/// delimiter finds its partner. Delimiters inside string or char literals are
/// ignored; with `allow_in_string` a target counts when its string state
/// equals the start position's.
///
/// Returns `None` when the text runs out before `count` targets are seen.
#[must_use]
pub fn find_block_location(
    chars: RopeSlice<'_>,
    found: char,
    target: char,
    dir: Direction,
    pos: usize,
    count: usize,
    allow_in_string: bool,
) -> Option<usize> {
    let len = chars.len_chars() as isize;
    let in_check = |x: isize| {
        if dir == Direction::Backward && x > 0 {
            x - 1
        } else {
            x + 1
        }
    };

    let initial = pos as isize;
    let mut pos = initial;
    let mut in_string = check_in_string(chars, in_check(pos), true);
    let initial_in_string = in_string;
    let mut in_char = check_in_string(chars, in_check(pos), false);
    let mut stack = 0usize;
    let mut remaining = count;
    let mut res = None;
    let needles = ['\'', '"', '\n', target, found];

    while pos >= 0 && pos < len && remaining > 0 {
        let (c, at) = find_first_of(chars, pos, &needles, dir)?;
        pos = at;
        let string_ok = if allow_in_string {
            initial_in_string == in_string
        } else {
            !in_string
        };
        if c == target && string_ok && !in_char {
            if stack == 0 {
                res = Some(pos as usize);
                remaining -= 1;
            } else {
                stack -= 1;
            }
        } else if c == '\n' {
            in_string = false;
            in_char = false;
        } else if pos != initial {
            if !in_string && !in_char && c == found {
                stack += 1;
            } else if !in_char {
                in_string = check_in_string(chars, in_check(pos), true);
            } else if !in_string {
                in_char = check_in_string(chars, in_check(pos), false);
            }
        }
        pos += dir.step();
    }

    if remaining == 0 { res } else { None }
}

/// `[(`, `[{`, `])`, `]}`: the `count`-th unmatched `ch` around `offset`.
///
/// An opening `ch` is searched backward and a closing one forward, going by
/// its place in the delimiter table. Starting on `ch` itself skips it.
#[must_use]
pub fn find_unmatched_block(buf: &Buffer, offset: usize, ch: char, count: usize) -> Option<usize> {
    let (partner, opens) = delimiter_table().partner(ch)?;
    let dir = if opens {
        Direction::Backward
    } else {
        Direction::Forward
    };
    let chars = buf.chars();
    let mut pos = offset;
    if buf.char_at(pos) == Some(ch) {
        pos = pos.checked_add_signed(dir.step())?;
    }
    find_block_location(chars, partner, ch, dir, pos, count, false)
}

// ---------------------------------------------------------------------------
// Block text objects
// ---------------------------------------------------------------------------

/// Opening and closing char of the block pair `ch` belongs to.
fn block_pair(ch: char) -> Option<(char, char)> {
    let idx = BLOCK_CHARS.chars().position(|c| c == ch)?;
    let open = idx & !1;
    let mut pair = BLOCK_CHARS.chars().skip(open);
    Some((pair.next()?, pair.next()?))
}

/// `i(` / `a(` and friends: the `count`-th block of `ch` around the caret.
///
/// `ch` may be either side of the pair. With a visual selection the block
/// must enclose the whole selection. An inner selection that already spans
/// exactly one block's contents widens to the enclosing block on repeat.
///
/// When the caret sits inside a double-quoted string, a block inside that
/// string is preferred. The inner range drops a newline right after the
/// opener and a whitespace-only line before the closer.
#[must_use]
pub fn find_block_range(
    buf: &Buffer,
    caret: Caret,
    ch: char,
    count: usize,
    is_outer: bool,
) -> Option<Range> {
    let chars = buf.chars();
    let len = chars.len_chars();
    let (open, close) = block_pair(ch)?;

    let mut pos = caret.offset();
    let mut start = caret.selection_start();
    let end = caret.selection_end();
    let mut range_selection = end - start > 1;
    if range_selection && start == 0 {
        return None;
    }

    // A previous inner selection behaves like an outer one.
    if !is_outer
        && start >= 1
        && chars.char(start - 1) == open
        && end < len
        && chars.char(end) == close
    {
        start -= 1;
        pos = start;
        range_selection = true;
    }

    // A selection searches around [start, end], a single char around (pos-1, pos].
    if range_selection {
        pos = start.saturating_sub(1);
    }

    let mut block = None;
    let mut found_in_string = false;
    let quote = if check_in_string(chars, pos as isize, true) {
        find_block_quote_in_line_range(buf, caret, '"', false)
            .filter(|quote| quote.start <= pos && pos <= quote.end)
    } else {
        None
    };
    if let Some(quote) = quote {
        let inner = chars.slice(quote.start..quote.end);
        let rel = pos - quote.start;
        let open_at = find_block_location(inner, close, open, Direction::Backward, rel, count, false)
            .or_else(|| find_block_location(inner, close, open, Direction::Forward, rel, count, false));
        if let Some(open_at) = open_at {
            found_in_string = true;
            block = find_block_location(inner, open, close, Direction::Forward, open_at, 1, false)
                .map(|close_at| (open_at + quote.start, close_at + quote.start));
        }
    }

    if !found_in_string {
        let open_at = find_block_location(chars, close, open, Direction::Backward, pos, count, false)
            .or_else(|| find_block_location(chars, close, open, Direction::Forward, pos, count, false))?;
        block = find_block_location(chars, open, close, Direction::Forward, open_at, 1, false)
            .map(|close_at| (open_at, close_at));
    }

    let (mut bstart, bend) = block?;
    let mut bend_excl = bend + 1;
    if !is_outer {
        bstart += 1;
        if buf.char_at(bstart) == Some('\n') {
            bstart += 1;
        }
        let line_start = buf.line_start_for_offset(bend);
        let all_white = (line_start..bend).all(|i| chars.char(i).is_whitespace());
        // A closer on its own line also drops the newline before it.
        bend_excl = if all_white {
            line_start.saturating_sub(1)
        } else {
            bend
        };
        bend_excl = bend_excl.max(bstart);
    }

    tracing::debug!(open = %open, start = bstart, end = bend_excl, is_outer, "block range");
    Some(Range::new(bstart, bend_excl))
}

/// `i"` / `a"`: the pair of unescaped `quote` chars on the caret's line that
/// contains the caret, or else the next pair after it.
///
/// Quotes pair up left to right. The outer range also takes the whitespace
/// after the closing quote, or the whitespace before the opening one when
/// there is none after.
#[must_use]
pub fn find_block_quote_in_line_range(
    buf: &Buffer,
    caret: Caret,
    quote: char,
    is_outer: bool,
) -> Option<Range> {
    let chars = buf.chars();
    let offset = caret.offset();
    let line_start = buf.line_start_for_offset(offset);
    let line_end = buf.line_end_for_offset(offset);

    let quotes: Vec<usize> = (line_start..line_end)
        .filter(|&i| is_quote_without_escape(chars, i, quote))
        .collect();

    let (open, close) = quotes
        .chunks_exact(2)
        .map(|pair| (pair[0], pair[1]))
        .find(|&(open, close)| offset >= open && offset <= close)
        .or_else(|| {
            quotes
                .chunks_exact(2)
                .map(|pair| (pair[0], pair[1]))
                .find(|&(open, _)| open > offset)
        })?;

    if !is_outer {
        return Some(Range::new(open + 1, close));
    }

    let mut start = open;
    let mut end = close + 1;
    let trailing = (end..line_end)
        .take_while(|&i| chars.char(i).is_whitespace())
        .count();
    if trailing > 0 {
        end += trailing;
    } else {
        start -= (line_start..start)
            .rev()
            .take_while(|&i| chars.char(i).is_whitespace())
            .count();
    }
    Some(Range::new(start, end))
}

// ---------------------------------------------------------------------------
// Match pair (%)
// ---------------------------------------------------------------------------

/// `%`: jump to the partner of the first delimiter at or after `offset` on
/// the current line.
///
/// When `comments` is supplied and `offset` sits on a block comment's opening
/// or closing delimiter, the jump goes to the other end of the comment
/// instead. Delimiters come from the current delimiter table. The partner
/// may sit inside a string when the delimiter does too.
#[must_use]
pub fn find_matching_pair_on_current_line(
    buf: &Buffer,
    offset: usize,
    comments: Option<&dyn CommentMetadata>,
) -> Option<usize> {
    if let Some(jump) = comments.and_then(|meta| find_matching_comment(meta, offset)) {
        return Some(jump);
    }

    let chars = buf.chars();
    let end = buf.line_end_for_offset(offset);
    let mut pos = offset;
    // Visual mode may leave the caret just past the line's last char.
    if pos > 0 && pos == end {
        pos = end - 1;
    }

    let table = delimiter_table();
    let (pos, ch) = (pos..end).find_map(|i| {
        let c = chars.char(i);
        table.contains(c).then_some((i, c))
    })?;
    let (target, opens) = table.partner(ch)?;
    let dir = if opens {
        Direction::Forward
    } else {
        Direction::Backward
    };
    find_block_location(chars, ch, target, dir, pos, 1, true)
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

    fn text_of(buf: &Buffer, range: Range) -> String {
        buf.rope().slice(range.start..range.end).to_string()
    }

    // -- Escapes and literals -----------------------------------------------

    #[test]
    fn quote_escape_parity() {
        let buf = Buffer::from_text(r#"a\"b\\"c"#);
        let chars = buf.chars();
        assert!(!is_quote_without_escape(chars, 2, '"'));
        assert!(is_quote_without_escape(chars, 6, '"'));
        assert!(!is_quote_without_escape(chars, 0, '"'));
    }

    #[test]
    fn string_state_is_per_line() {
        let buf = Buffer::from_text("x = \"ab\nc\"");
        let chars = buf.chars();
        assert!(check_in_string(chars, 5, true));
        assert!(!check_in_string(chars, 4, true));
        // The unterminated string does not leak onto the next line.
        assert!(!check_in_string(chars, 8, true));
        assert!(!check_in_string(chars, 7, true));
    }

    #[test]
    fn char_literal_hides_double_quote() {
        let buf = Buffer::from_text("c = '\"' + x");
        let chars = buf.chars();
        assert!(check_in_string(chars, 5, false));
        assert!(!check_in_string(chars, 9, true));
    }

    // -- find_block_location ------------------------------------------------

    #[test]
    fn block_location_skips_nested_pairs() {
        let buf = Buffer::from_text("(a (b) c)");
        let chars = buf.chars();
        assert_eq!(find_block_location(chars, '(', ')', Direction::Forward, 0, 1, false), Some(8));
        assert_eq!(find_block_location(chars, ')', '(', Direction::Backward, 8, 1, false), Some(0));
    }

    #[test]
    fn block_location_counts_outward() {
        let buf = Buffer::from_text("((( x )))");
        let chars = buf.chars();
        assert_eq!(find_block_location(chars, ')', '(', Direction::Backward, 4, 1, false), Some(2));
        assert_eq!(find_block_location(chars, ')', '(', Direction::Backward, 4, 3, false), Some(0));
        assert_eq!(find_block_location(chars, ')', '(', Direction::Backward, 4, 4, false), None);
    }

    #[test]
    fn block_location_ignores_delimiters_in_strings() {
        let buf = Buffer::from_text("f(\")\", x)");
        let chars = buf.chars();
        assert_eq!(find_block_location(chars, '(', ')', Direction::Forward, 1, 1, false), Some(8));
    }

    #[test]
    fn block_location_spans_lines() {
        let buf = Buffer::from_text("{\n  x\n}");
        let chars = buf.chars();
        assert_eq!(find_block_location(chars, '{', '}', Direction::Forward, 0, 1, false), Some(6));
    }

    #[test]
    fn block_location_unbalanced_is_none() {
        let buf = Buffer::from_text("(a (b c)");
        let chars = buf.chars();
        assert_eq!(find_block_location(chars, '(', ')', Direction::Forward, 0, 1, false), None);
    }

    // -- find_unmatched_block -----------------------------------------------

    #[test]
    fn unmatched_open_and_close() {
        let buf = Buffer::from_text("(a (b) c)");
        assert_eq!(find_unmatched_block(&buf, 7, '(', 1), Some(0));
        assert_eq!(find_unmatched_block(&buf, 1, ')', 1), Some(8));
        // Starting on the target itself looks past it.
        assert_eq!(find_unmatched_block(&buf, 3, '(', 1), Some(0));
    }

    #[test]
    fn unmatched_unknown_char_is_none() {
        let buf = Buffer::from_text("abc");
        assert_eq!(find_unmatched_block(&buf, 1, 'x', 1), None);
    }

    // -- find_block_range ---------------------------------------------------

    #[test]
    fn inner_and_outer_nested_parens() {
        let buf = Buffer::from_text("(a(b)c)");
        assert_eq!(find_block_range(&buf, Caret::at(3), '(', 1, false), Some(r(3, 4)));
        assert_eq!(find_block_range(&buf, Caret::at(3), '(', 1, true), Some(r(2, 5)));
        assert_eq!(find_block_range(&buf, Caret::at(3), ')', 1, true), Some(r(2, 5)));
    }

    #[test]
    fn count_reaches_the_outer_block() {
        let buf = Buffer::from_text("(a(b)c)");
        assert_eq!(find_block_range(&buf, Caret::at(3), '(', 2, true), Some(r(0, 7)));
    }

    #[test]
    fn repeated_inner_selection_widens() {
        let buf = Buffer::from_text("(a(b)c)");
        // `b` selected as if by a previous `vi(`.
        let caret = Caret::visual(3, 3);
        let widened = find_block_range(&buf, caret, '(', 1, false).unwrap();
        assert_eq!(text_of(&buf, widened), "a(b)c");
    }

    #[test]
    fn caret_on_opener_selects_its_block() {
        let buf = Buffer::from_text("x (yz) w");
        assert_eq!(find_block_range(&buf, Caret::at(2), '(', 1, false), Some(r(3, 5)));
    }

    #[test]
    fn inner_block_trims_lines() {
        let buf = Buffer::from_text("{\n  foo\n}");
        let inner = find_block_range(&buf, Caret::at(4), '{', 1, false).unwrap();
        assert_eq!(text_of(&buf, inner), "  foo");
    }

    #[test]
    fn empty_block_has_empty_inner_range() {
        let buf = Buffer::from_text("f()");
        assert_eq!(find_block_range(&buf, Caret::at(2), '(', 1, false), Some(r(2, 2)));
    }

    #[test]
    fn block_inside_string_is_preferred() {
        let buf = Buffer::from_text("s = \"a(b)c\" + (d)");
        let inner = find_block_range(&buf, Caret::at(7), '(', 1, false).unwrap();
        assert_eq!(text_of(&buf, inner), "b");
    }

    #[test]
    fn no_enclosing_block_is_none() {
        let buf = Buffer::from_text("abc");
        assert_eq!(find_block_range(&buf, Caret::at(1), '(', 1, false), None);
    }

    #[test]
    fn selection_from_buffer_start_is_none() {
        let buf = Buffer::from_text("(abc)");
        assert_eq!(find_block_range(&buf, Caret::visual(0, 2), '(', 1, true), None);
    }

    // -- Quote objects ------------------------------------------------------

    #[test]
    fn quote_pair_around_caret() {
        let buf = Buffer::from_text(r#"say "hi" now"#);
        let caret = Caret::at(5);
        assert_eq!(find_block_quote_in_line_range(&buf, caret, '"', false), Some(r(5, 7)));
        assert_eq!(find_block_quote_in_line_range(&buf, caret, '"', true), Some(r(4, 9)));
    }

    #[test]
    fn quote_pair_after_caret() {
        let buf = Buffer::from_text(r#"x = "a""#);
        assert_eq!(find_block_quote_in_line_range(&buf, Caret::at(0), '"', false), Some(r(5, 6)));
    }

    #[test]
    fn outer_quote_takes_leading_space_at_line_end() {
        let buf = Buffer::from_text(r#"x = "a""#);
        assert_eq!(find_block_quote_in_line_range(&buf, Caret::at(5), '"', true), Some(r(3, 7)));
    }

    #[test]
    fn escaped_quote_does_not_pair() {
        let buf = Buffer::from_text(r#""a\"b" c"#);
        assert_eq!(find_block_quote_in_line_range(&buf, Caret::at(1), '"', false), Some(r(1, 5)));
    }

    // -- Match pair (%) -----------------------------------------------------

    #[test]
    fn percent_jumps_forward_and_back() {
        let buf = Buffer::from_text("if (a[0]) { b }");
        assert_eq!(find_matching_pair_on_current_line(&buf, 0, None), Some(8));
        assert_eq!(find_matching_pair_on_current_line(&buf, 8, None), Some(3));
        assert_eq!(find_matching_pair_on_current_line(&buf, 5, None), Some(7));
    }

    #[test]
    fn percent_without_delimiter_is_none() {
        let buf = Buffer::from_text("plain text\n(x)");
        assert_eq!(find_matching_pair_on_current_line(&buf, 0, None), None);
    }

    #[test]
    fn percent_skips_delimiters_in_strings() {
        let buf = Buffer::from_text(r#"p("(", x)"#);
        assert_eq!(find_matching_pair_on_current_line(&buf, 1, None), Some(8));
    }
}
