//! Paragraphs and sections: `{`, `}`, `ip`, `ap`, `[[`, `]]`.
//!
//! A paragraph boundary is the first empty line of a run of empty lines
//! that follows text. With `allow_blanks`, lines holding only whitespace
//! count as empty too.
//!
//! Line numbers are signed internally because the scans step one line past
//! either end of the buffer. A negative line is treated as empty.

#![allow(clippy::cast_possible_wrap, clippy::cast_sign_loss)]

use vm_text::{Buffer, Caret, Direction, Range};

#[inline]
fn is_empty_line(buf: &Buffer, line: isize, allow_blanks: bool) -> bool {
    line < 0 || buf.is_line_empty(line as usize, allow_blanks)
}

/// First non-empty line from `line` in direction `dir`, or the first line
/// outside the buffer.
fn skip_empty_lines(buf: &Buffer, mut line: isize, dir: isize, allow_blanks: bool) -> isize {
    let max = buf.line_count() as isize;
    while line >= 0 && line < max {
        if !is_empty_line(buf, line, allow_blanks) {
            return line;
        }
        line += dir;
    }
    line
}

/// One paragraph step: the next empty line after the text at or after
/// `line`.
pub(crate) fn next_paragraph_line_from(buf: &Buffer, line: isize, dir: isize, allow_blanks: bool) -> Option<usize> {
    let max = buf.line_count() as isize;
    let mut line = skip_empty_lines(buf, line, dir, allow_blanks);
    while line >= 0 && line < max {
        if is_empty_line(buf, line, allow_blanks) {
            return Some(line as usize);
        }
        line += dir;
    }
    None
}

/// Offset of the paragraph boundary after `line`, or the buffer edge in
/// direction `dir`. Sentences treat this as a sentence boundary.
pub(crate) fn next_paragraph_offset(buf: &Buffer, line: usize, dir: isize, allow_blanks: bool) -> isize {
    match next_paragraph_line_from(buf, line as isize, dir, allow_blanks) {
        Some(found) => buf.line_start_offset(found) as isize,
        None if dir > 0 => buf.file_size() as isize - 1,
        None => 0,
    }
}

// ---------------------------------------------------------------------------
// Motions
// ---------------------------------------------------------------------------

/// Line of the `|count|`-th paragraph boundary from `line`.
///
/// Running out of boundaries on the last repetition clamps to the first or
/// last line. Running out earlier yields `None`.
#[must_use]
pub fn find_next_paragraph_line(buf: &Buffer, line: usize, count: isize, allow_blanks: bool) -> Option<usize> {
    let max = buf.line_count() as isize;
    let dir = Direction::of_count(count).step();
    let mut remaining = count.unsigned_abs();
    let mut line = line as isize;

    while remaining > 0 && line >= 0 {
        line = next_paragraph_line_from(buf, line, dir, allow_blanks).map_or(-1, |l| l as isize);
        remaining -= 1;
    }
    if line < 0 && remaining == 0 {
        line = if dir > 0 { max - 1 } else { 0 };
    }
    (line >= 0).then_some(line as usize)
}

/// `}` / `{`: offset of the start of the `|count|`-th paragraph boundary
/// from the line holding `offset`.
#[must_use]
pub fn find_next_paragraph(buf: &Buffer, offset: usize, count: isize, allow_blanks: bool) -> Option<usize> {
    let line = find_next_paragraph_line(buf, buf.line_of_offset(offset), count, allow_blanks)?;
    Some(buf.line_start_offset(line))
}

/// `ip` / `ap`: whole lines of `count` paragraphs around the caret.
///
/// The range starts at the first line's start and ends after the last
/// line's newline. Inner counts each run of empty lines as a paragraph of
/// its own; outer takes the empty lines after the text, or before it when
/// none follow.
#[must_use]
pub fn find_paragraph_range(buf: &Buffer, caret: Caret, count: usize, is_outer: bool) -> Option<Range> {
    let line = buf.line_of_offset(caret.offset()) as isize;
    let max = buf.line_count() as isize;
    let empty = |l: isize| is_empty_line(buf, l, true);
    let line_back = || find_next_paragraph_line(buf, line as usize, -1, true).map_or(0, |l| l as isize);

    let mut sline;
    let mut eline;
    let mut fix_start = false;
    let mut fix_end = false;

    if is_outer {
        sline = if empty(line) { line } else { line_back() };
        eline = find_next_paragraph_line(buf, line as usize, count as isize, true)? as isize;

        if empty(sline) && empty(eline) {
            if sline == line {
                eline -= 1;
                fix_start = true;
            } else {
                sline += 1;
                fix_end = true;
            }
        } else if !empty(eline) && !empty(sline) && sline > 0 {
            sline -= 1;
            fix_start = true;
        } else if empty(eline) {
            fix_end = true;
        } else if empty(sline) {
            fix_start = true;
        }
    } else {
        sline = line;
        if empty(sline) {
            eline = line - 1;
        } else {
            sline = line_back();
            if empty(sline) {
                sline += 1;
            }
            eline = line;
        }

        // Text and empty-line runs alternate; each counts once.
        let mut on_text = !empty(sline);
        for i in 0..count {
            if on_text {
                eline = next_paragraph_line_from(buf, eline, 1, true).map_or(-1, |l| l as isize) - 1;
                if eline < 0 {
                    if i + 1 == count {
                        eline = max - 1;
                    } else {
                        return None;
                    }
                }
            } else {
                eline += 1;
            }
            on_text = !on_text;
        }
        fix_start = true;
        fix_end = true;
    }

    if fix_start && empty(sline) {
        while sline > 0 && empty(sline - 1) {
            sline -= 1;
        }
    }
    if fix_end && empty(eline) {
        while eline < max - 1 && empty(eline + 1) {
            eline += 1;
        }
    }

    tracing::debug!(sline, eline, is_outer, "paragraph bounds");
    if eline < sline.max(0) {
        return None;
    }
    let start = buf.line_start_offset(sline.max(0) as usize);
    let end = buf.line_start_offset(eline as usize + 1);
    Some(Range::new(start, end))
}

/// `]]` / `[[` and friends: start of the `count`-th line in direction `dir`
/// that begins with `kind` or a form feed.
///
/// The first line of the buffer is never a match. Without a match the
/// result is the buffer's first or last char.
#[must_use]
pub fn find_section(buf: &Buffer, offset: usize, kind: char, dir: Direction, count: usize) -> usize {
    let max = buf.line_count() as isize;
    let step = dir.step();
    let mut line = buf.line_of_offset(offset) as isize + step;
    let mut count = count;
    let mut res = None;

    while line > 0 && line < max && count > 0 {
        let start = buf.line_start_offset(line as usize);
        if buf.char_at(start).is_some_and(|ch| ch == kind || ch == '\u{c}') {
            res = Some(start);
            count -= 1;
        }
        line += step;
    }

    res.unwrap_or(match dir {
        Direction::Backward => 0,
        Direction::Forward => buf.file_size().saturating_sub(1),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const TEXT: &str = "a\nb\n\nc\n";

    fn r(start: usize, end: usize) -> Range {
        Range::new(start, end)
    }

    fn para(text: &str, offset: usize, count: usize, outer: bool) -> Option<Range> {
        find_paragraph_range(&Buffer::from_text(text), Caret::at(offset), count, outer)
    }

    // -- Boundaries ---------------------------------------------------------

    #[test]
    fn next_paragraph_forward_and_back() {
        let buf = Buffer::from_text(TEXT);
        assert_eq!(find_next_paragraph(&buf, 0, 1, false), Some(4));
        assert_eq!(find_next_paragraph(&buf, 5, -1, false), Some(4));
    }

    #[test]
    fn next_paragraph_clamps_to_last_line() {
        let buf = Buffer::from_text("a\nb");
        assert_eq!(find_next_paragraph_line(&buf, 0, 1, false), Some(1));
        assert_eq!(find_next_paragraph(&buf, 0, 1, false), Some(2));
    }

    #[test]
    fn next_paragraph_clamps_to_first_line() {
        let buf = Buffer::from_text("a\nb");
        assert_eq!(find_next_paragraph_line(&buf, 1, -1, false), Some(0));
    }

    #[test]
    fn blank_lines_need_allow_blanks() {
        let buf = Buffer::from_text("a\n  \nb");
        assert_eq!(find_next_paragraph_line(&buf, 0, 1, true), Some(1));
        assert_eq!(find_next_paragraph_line(&buf, 0, 1, false), Some(2));
    }

    #[test]
    fn exhausted_count_is_none() {
        let buf = Buffer::from_text("a\nb");
        assert_eq!(find_next_paragraph_line(&buf, 0, 3, false), None);
    }

    // -- Text object --------------------------------------------------------

    #[test]
    fn inner_paragraph() {
        assert_eq!(para(TEXT, 0, 1, false), Some(r(0, 4)));
    }

    #[test]
    fn inner_paragraph_on_empty_line() {
        assert_eq!(para(TEXT, 4, 1, false), Some(r(4, 5)));
    }

    #[test]
    fn inner_paragraph_count_takes_gap() {
        assert_eq!(para(TEXT, 0, 2, false), Some(r(0, 5)));
    }

    #[test]
    fn outer_paragraph_takes_trailing_blank() {
        assert_eq!(para(TEXT, 0, 1, true), Some(r(0, 5)));
    }

    #[test]
    fn outer_paragraph_without_trailing_newline() {
        assert_eq!(para("a\nb", 0, 1, true), Some(r(0, 3)));
    }

    // -- Sections -----------------------------------------------------------

    #[test]
    fn sections() {
        let buf = Buffer::from_text("fn a\n{\nx\n}\n{\ny");
        assert_eq!(find_section(&buf, 0, '{', Direction::Forward, 1), 5);
        assert_eq!(find_section(&buf, 0, '{', Direction::Forward, 2), 11);
        assert_eq!(find_section(&buf, 13, '{', Direction::Backward, 1), 11);
        assert_eq!(find_section(&buf, 7, '}', Direction::Backward, 1), 0);
        assert_eq!(find_section(&buf, 0, '}', Direction::Forward, 3), 9);
    }

    #[test]
    fn form_feed_starts_a_section() {
        let buf = Buffer::from_text("a\n\u{c}b\nc");
        assert_eq!(find_section(&buf, 0, '{', Direction::Forward, 1), 2);
    }
}
