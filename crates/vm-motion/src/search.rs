//! Pattern search: `/`, `?`, `n`, `N` and match highlighting.
//!
//! [`search`] follows Vim's `searchit`: the pattern is executed one line at
//! a time, and the first line of the search gets special treatment so a
//! repeated `n` never lands on the match under the cursor again.
//!
//! # Search flow
//!
//! 1. Resolve case sensitivity (`ignorecase` / `smartcase`) and compile.
//! 2. For each of `count` repetitions, scan lines outward from the current
//!    match in the search direction. Without [`SearchOptions::WHOLE_FILE`]
//!    only the current line is eligible.
//! 3. With [`SearchOptions::WRAP_SCAN`], a second pass restarts from the
//!    other end of the buffer and stops on the line the search began on.
//!
//! [`find_all`] is the exhaustive, non-overlapping scan used to paint every
//! match in a line range.

#![allow(clippy::cast_possible_wrap, clippy::cast_sign_loss)]

use bitflags::bitflags;
use thiserror::Error;
use vm_pattern::{Haystack, LineMatch, Pattern, PatternError, should_ignore_case};
use vm_text::{Buffer, Direction, Position, Range};

// ---------------------------------------------------------------------------
// Options & errors
// ---------------------------------------------------------------------------

bitflags! {
    /// Flags steering a single [`search`] call.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
    pub struct SearchOptions: u8 {
        /// Search toward the start of the buffer.
        const BACKWARDS     = 0b0000_0001;
        /// Continue from the other end of the buffer after reaching an edge.
        const WRAP_SCAN     = 0b0000_0010;
        /// Scan every line, not only the line the search starts on.
        const WHOLE_FILE    = 0b0000_0100;
        /// Base case policy (`ignorecase`).
        const IGNORE_CASE   = 0b0000_1000;
        /// An uppercase letter in the pattern forces a case-sensitive match.
        const SMART_CASE    = 0b0001_0000;
        /// Compare the match end against the start position (`/e`).
        const WANT_END_POS  = 0b0010_0000;
        /// Attach a user-facing message to a failed search.
        const SHOW_MESSAGES = 0b0100_0000;
    }
}

impl SearchOptions {
    /// Search direction encoded in the flags.
    #[inline]
    #[must_use]
    pub const fn direction(self) -> Direction {
        if self.contains(Self::BACKWARDS) {
            Direction::Backward
        } else {
            Direction::Forward
        }
    }
}

/// User-facing text for a failed search.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SearchMessage {
    /// Both passes of a wrapping search came up empty.
    #[error("E486: Pattern not found: {0}")]
    PatternNotFound(String),
    #[error("E384: search hit TOP without match for: {0}")]
    HitTop(String),
    #[error("E385: search hit BOTTOM without match for: {0}")]
    HitBottom(String),
}

/// Why a [`search`] produced no range.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("empty search pattern")]
    EmptyPattern,
    #[error("invalid search pattern")]
    InvalidPattern(#[source] PatternError),
    /// No match. `message` is set only when
    /// [`SearchOptions::SHOW_MESSAGES`] was requested.
    #[error("pattern not found")]
    NotFound { message: Option<SearchMessage> },
}

impl SearchError {
    /// The message to show the user, if one was requested.
    #[must_use]
    pub const fn message(&self) -> Option<&SearchMessage> {
        match self {
            Self::NotFound { message } => message.as_ref(),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// search
// ---------------------------------------------------------------------------

/// Find the `count`-th match of `pattern` from offset `start`.
///
/// Returns the final match as `[start, end)`. Every repetition must succeed.
///
/// # Errors
///
/// [`SearchError::EmptyPattern`] and [`SearchError::InvalidPattern`] when
/// the pattern cannot be used, [`SearchError::NotFound`] when a repetition
/// finds nothing.
pub fn search(
    buf: &Buffer,
    pattern: &str,
    start: usize,
    count: usize,
    opts: SearchOptions,
) -> Result<Range, SearchError> {
    if pattern.is_empty() {
        tracing::warn!("empty search pattern");
        return Err(SearchError::EmptyPattern);
    }
    let ignore_case = should_ignore_case(
        pattern,
        opts.contains(SearchOptions::IGNORE_CASE),
        opts.contains(SearchOptions::SMART_CASE),
    );
    let compiled = Pattern::compile(pattern, ignore_case).map_err(|err| {
        tracing::debug!(%pattern, %err, "bad search pattern");
        SearchError::InvalidPattern(err)
    })?;

    let hay = Haystack::new(buf);
    let dir = opts.direction();
    let mut scan = Scan {
        pattern: &compiled,
        hay: &hay,
        opts,
        dir,
        extra_col: usize::from(dir == Direction::Forward),
        first_match: true,
    };

    let mut pos = buf.offset_to_position(start);
    let mut end = pos;
    for _ in 0..count.max(1) {
        match scan.find_one(pos) {
            Ok(found) => {
                pos = found.start;
                end = found.end;
            }
            Err(lnum) => {
                let message = opts
                    .contains(SearchOptions::SHOW_MESSAGES)
                    .then(|| not_found_message(pattern, opts, lnum));
                return Err(SearchError::NotFound { message });
            }
        }
    }
    Ok(Range::new(
        buf.position_to_offset(pos),
        buf.position_to_offset(end),
    ))
}

/// [`search`] with every failure collapsed to `None`.
#[must_use]
pub fn find_pattern(
    buf: &Buffer,
    pattern: &str,
    start: usize,
    count: usize,
    opts: SearchOptions,
) -> Option<Range> {
    search(buf, pattern, start, count, opts).ok()
}

fn not_found_message(pattern: &str, opts: SearchOptions, lnum: isize) -> SearchMessage {
    let pattern = pattern.to_string();
    if opts.contains(SearchOptions::WRAP_SCAN) {
        SearchMessage::PatternNotFound(pattern)
    } else if lnum <= 0 {
        SearchMessage::HitTop(pattern)
    } else {
        SearchMessage::HitBottom(pattern)
    }
}

// ---------------------------------------------------------------------------
// Line scanning
// ---------------------------------------------------------------------------

enum LineScan {
    /// An acceptable match on this line.
    Found(LineMatch),
    /// The line matched, but only on the wrong side of the start position.
    Rejected,
    /// Nothing on this line.
    Empty,
}

struct Scan<'a> {
    pattern: &'a Pattern,
    hay: &'a Haystack<'a>,
    opts: SearchOptions,
    dir: Direction,
    extra_col: usize,
    /// Cleared after the first successful repetition.
    first_match: bool,
}

impl Scan<'_> {
    /// One repetition. On failure returns the line the scan stopped on.
    fn find_one(&mut self, start: Position) -> Result<LineMatch, isize> {
        let lines = self.hay.buffer().line_count() as isize;
        let step = self.dir.step();
        let mut lnum = start.line as isize;
        let mut at_first_line = true;
        // Backward from column 0 has nothing left on this line.
        if self.dir == Direction::Backward && start.col == 0 {
            lnum -= 1;
            at_first_line = false;
        }

        for pass in 0..2 {
            let (first, last) = if self.opts.contains(SearchOptions::WHOLE_FILE) {
                (0, lines)
            } else {
                (lnum, lnum + 1)
            };
            while lnum >= first && lnum < last {
                match self.scan_line(lnum, start, pass, at_first_line) {
                    LineScan::Found(found) => {
                        self.first_match = false;
                        return Ok(found);
                    }
                    LineScan::Rejected => {}
                    LineScan::Empty => {
                        if pass != 0 && lnum == start.line as isize {
                            break;
                        }
                    }
                }
                lnum += step;
                at_first_line = false;
            }
            at_first_line = false;
            if !self.opts.contains(SearchOptions::WRAP_SCAN) {
                break;
            }
            lnum = match self.dir {
                Direction::Forward => 0,
                Direction::Backward => lines - 1,
            };
        }
        Err(lnum)
    }

    fn scan_line(&self, lnum: isize, start: Position, pass: usize, at_first_line: bool) -> LineScan {
        if lnum < 0 {
            return LineScan::Empty;
        }
        let line = lnum as usize;
        let Some(mut found) = self.pattern.execute(self.hay, line, 0) else {
            return LineScan::Empty;
        };
        let content = self.hay.buffer().line_content_len(line);

        match self.dir {
            Direction::Forward => {
                if at_first_line {
                    while self.before_start(&found, start, found.start.col >= content) {
                        if found.lines > 1 {
                            return LineScan::Rejected;
                        }
                        match self.next_on_line(&found, line, content) {
                            Some(next) => found = next,
                            None => return LineScan::Rejected,
                        }
                    }
                }
            }
            Direction::Backward => {
                // Execution only runs forward, so walk the line and keep the
                // last match that still precedes the start.
                let mut kept = None;
                loop {
                    if pass != 0 || self.precedes(&found, start) {
                        kept = Some(found);
                    } else {
                        break;
                    }
                    if found.lines > 1 {
                        break;
                    }
                    match self.next_on_line(&found, line, content) {
                        Some(next) => found = next,
                        None => break,
                    }
                }
                match kept {
                    Some(last) => found = last,
                    None => return LineScan::Rejected,
                }
            }
        }
        LineScan::Found(found)
    }

    /// Forward first-line test: is `found` still at or before the start?
    ///
    /// A match on the end of the line is compared one column back, where
    /// the cursor will end up, so `/$` does not get stuck.
    fn before_start(&self, found: &LineMatch, start: Position, at_eol: bool) -> bool {
        if self.opts.contains(SearchOptions::WANT_END_POS) && self.first_match {
            found.lines == 1 && found.end.col < start.col + self.extra_col + 1
        } else {
            found.start.col < start.col + self.extra_col + usize::from(at_eol)
        }
    }

    /// Backward test: does `found` start (or end) before the start position?
    fn precedes(&self, found: &LineMatch, start: Position) -> bool {
        let (at, slack) = if self.opts.contains(SearchOptions::WANT_END_POS) {
            (found.end, 1)
        } else {
            (found.start, 0)
        };
        at.line < start.line || (at.line == start.line && at.col < start.col + self.extra_col + slack)
    }

    /// The next match on `line` after `found`. An empty match advances one
    /// char so the scan always makes progress.
    fn next_on_line(&self, found: &LineMatch, line: usize, content: usize) -> Option<LineMatch> {
        let mut col = found.end.col;
        if col == found.start.col && col < content {
            col += 1;
        }
        if col >= content {
            return None;
        }
        self.pattern.execute(self.hay, line, col)
    }
}

// ---------------------------------------------------------------------------
// find_all
// ---------------------------------------------------------------------------

/// Every match of `pattern` starting on lines `start_line..=end_line`, in
/// document order. `None` for `end_line` scans to the end of the buffer.
///
/// Matches never overlap. After an empty match the scan resumes on the next
/// line.
#[must_use]
pub fn find_all(
    buf: &Buffer,
    pattern: &str,
    start_line: usize,
    end_line: Option<usize>,
    ignore_case: bool,
) -> Vec<Range> {
    let compiled = match Pattern::compile(pattern, ignore_case) {
        Ok(compiled) => compiled,
        Err(err) => {
            tracing::debug!(%pattern, %err, "find_all: pattern rejected");
            return Vec::new();
        }
    };
    let hay = Haystack::new(buf);
    let last = end_line
        .unwrap_or(usize::MAX)
        .min(buf.line_count().saturating_sub(1));

    let mut results = Vec::new();
    let mut line = start_line;
    let mut col = 0;
    while line <= last {
        let Some(found) = compiled.execute(&hay, line, col) else {
            line += 1;
            col = 0;
            continue;
        };
        let range = Range::new(
            buf.position_to_offset(found.start),
            buf.position_to_offset(found.end),
        );
        results.push(range);
        if range.is_empty() {
            line += found.lines;
            col = 0;
        } else {
            line += found.lines - 1;
            col = found.end.col;
        }
    }
    results
}

// ---------------------------------------------------------------------------
// Character search
// ---------------------------------------------------------------------------

/// Offset of the `|count|`-th `ch` on the caret's line, searching forward
/// for a positive count and backward for a negative one (`f` / `F`). The
/// char under the caret is never a candidate.
#[must_use]
pub fn find_next_character_on_line(buf: &Buffer, offset: usize, count: isize, ch: char) -> Option<usize> {
    let wanted = count.unsigned_abs();
    if wanted == 0 {
        return None;
    }
    let line = buf.line_of_offset(offset);
    let start = buf.line_start_offset(line) as isize;
    let end = buf.line_end_offset(line, true) as isize;
    let step = Direction::of_count(count).step();
    let chars = buf.chars();

    let mut found = 0;
    let mut pos = offset as isize + step;
    while pos >= start && pos < end {
        if chars.char(pos as usize) == ch {
            found += 1;
            if found == wanted {
                return Some(pos as usize);
            }
        }
        pos += step;
    }
    None
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

    fn everywhere() -> SearchOptions {
        SearchOptions::WHOLE_FILE | SearchOptions::WRAP_SCAN
    }

    // -- Forward ------------------------------------------------------------

    #[test]
    fn forward_skips_match_under_cursor() {
        let buf = Buffer::from_text("foo bar foo\n");
        assert_eq!(find_pattern(&buf, "foo", 0, 1, everywhere()), Some(r(8, 11)));
    }

    #[test]
    fn forward_wraps_to_top() {
        let buf = Buffer::from_text("foo\nbar\n");
        assert_eq!(find_pattern(&buf, "foo", 1, 1, everywhere()), Some(r(0, 3)));
    }

    #[test]
    fn forward_without_wrap_hits_bottom() {
        let buf = Buffer::from_text("foo\nbar\n");
        let opts = SearchOptions::WHOLE_FILE | SearchOptions::SHOW_MESSAGES;
        let err = search(&buf, "foo", 1, 1, opts).unwrap_err();
        assert_eq!(err.message(), Some(&SearchMessage::HitBottom("foo".into())));
    }

    #[test]
    fn count_repeats_from_each_match() {
        let buf = Buffer::from_text("a a a a");
        let opts = SearchOptions::WHOLE_FILE;
        assert_eq!(find_pattern(&buf, "a", 0, 2, opts), Some(r(4, 5)));
        assert_eq!(find_pattern(&buf, "a", 0, 9, opts), None);
    }

    #[test]
    fn current_line_only_without_whole_file() {
        let buf = Buffer::from_text("foo\nfoo");
        let err = search(&buf, "foo", 0, 1, SearchOptions::empty()).unwrap_err();
        assert!(matches!(err, SearchError::NotFound { message: None }));
    }

    #[test]
    fn end_of_line_match_does_not_stick() {
        let buf = Buffer::from_text("abc\ndef");
        let opts = SearchOptions::WHOLE_FILE;
        assert_eq!(find_pattern(&buf, "$", 2, 1, opts), Some(r(7, 7)));
    }

    #[test]
    fn want_end_pos_compares_match_end() {
        let buf = Buffer::from_text("foo foo");
        let opts = SearchOptions::WHOLE_FILE;
        assert_eq!(find_pattern(&buf, "foo", 1, 1, opts), Some(r(4, 7)));
        let opts = opts | SearchOptions::WANT_END_POS;
        assert_eq!(find_pattern(&buf, "foo", 1, 1, opts), Some(r(0, 3)));
    }

    // -- Backward -----------------------------------------------------------

    #[test]
    fn backward_takes_last_match_before_cursor() {
        let buf = Buffer::from_text("foo bar foo");
        let opts = everywhere() | SearchOptions::BACKWARDS;
        assert_eq!(find_pattern(&buf, "foo", 8, 1, opts), Some(r(0, 3)));
    }

    #[test]
    fn backward_wraps_to_bottom() {
        let buf = Buffer::from_text("bar\nfoo");
        let opts = everywhere() | SearchOptions::BACKWARDS;
        assert_eq!(find_pattern(&buf, "foo", 0, 1, opts), Some(r(4, 7)));
    }

    #[test]
    fn backward_without_wrap_hits_top() {
        let buf = Buffer::from_text("foo");
        let opts = SearchOptions::BACKWARDS | SearchOptions::WHOLE_FILE | SearchOptions::SHOW_MESSAGES;
        let err = search(&buf, "foo", 0, 1, opts).unwrap_err();
        assert_eq!(err.message(), Some(&SearchMessage::HitTop("foo".into())));
    }

    // -- Pattern handling ---------------------------------------------------

    #[test]
    fn empty_and_invalid_patterns() {
        let buf = Buffer::from_text("abc");
        assert!(matches!(
            search(&buf, "", 0, 1, everywhere()),
            Err(SearchError::EmptyPattern)
        ));
        assert!(matches!(
            search(&buf, "(", 0, 1, everywhere()),
            Err(SearchError::InvalidPattern(_))
        ));
    }

    #[test]
    fn smart_case_follows_pattern_case() {
        let buf = Buffer::from_text("xx foo Foo");
        let ic = SearchOptions::WHOLE_FILE | SearchOptions::IGNORE_CASE;
        assert_eq!(find_pattern(&buf, "Foo", 0, 1, ic), Some(r(3, 6)));
        let scs = ic | SearchOptions::SMART_CASE;
        assert_eq!(find_pattern(&buf, "Foo", 0, 1, scs), Some(r(7, 10)));
    }

    #[test]
    fn wrapped_failure_message() {
        let buf = Buffer::from_text("abc");
        let opts = everywhere() | SearchOptions::SHOW_MESSAGES;
        let err = search(&buf, "zzz", 0, 1, opts).unwrap_err();
        let msg = err.message().unwrap();
        assert_eq!(msg.to_string(), "E486: Pattern not found: zzz");
    }

    // -- find_all -----------------------------------------------------------

    #[test]
    fn find_all_in_document_order() {
        let buf = Buffer::from_text("foo foo\nfoo");
        assert_eq!(
            find_all(&buf, "foo", 0, None, false),
            vec![r(0, 3), r(4, 7), r(8, 11)]
        );
        assert_eq!(find_all(&buf, "foo", 1, Some(1), false), vec![r(8, 11)]);
    }

    #[test]
    fn find_all_empty_match_moves_to_next_line() {
        let buf = Buffer::from_text("ab\ncd");
        assert_eq!(find_all(&buf, "x*", 0, None, false), vec![r(0, 0), r(3, 3)]);
    }

    #[test]
    fn find_all_bad_pattern_is_empty() {
        let buf = Buffer::from_text("abc");
        assert!(find_all(&buf, "(", 0, None, false).is_empty());
    }

    // -- Character search ---------------------------------------------------

    #[test]
    fn character_search_on_line() {
        let buf = Buffer::from_text("a,b,c\nx,");
        assert_eq!(find_next_character_on_line(&buf, 0, 2, ','), Some(3));
        assert_eq!(find_next_character_on_line(&buf, 4, -1, ','), Some(3));
        assert_eq!(find_next_character_on_line(&buf, 0, 3, ','), None);
        assert_eq!(find_next_character_on_line(&buf, 0, 0, ','), None);
    }
}
