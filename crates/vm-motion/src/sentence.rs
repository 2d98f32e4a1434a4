//! Sentences: `(`, `)`, `is`, `as`.
//!
//! A sentence ends at `.`, `!` or `?`, optionally followed by any number of
//! `)`, `]`, `"` or `'`, and then by whitespace or the end of the buffer.
//! Empty lines and form feeds end sentences too, and a paragraph boundary is
//! always a sentence boundary: every scan also looks up the nearest
//! paragraph in its direction and returns whichever is closer.
//!
//! Start and end search call into each other, each time on a narrower
//! window. Offsets are signed inside the scans since they step one past
//! either end; `-1` means "nothing found" there.

#![allow(clippy::cast_possible_wrap, clippy::cast_sign_loss)]

use ropey::RopeSlice;
use vm_text::{Buffer, Caret, Range, is_space_char};

use crate::paragraph::next_paragraph_offset;

/// Outcome of a counted sentence motion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reach {
    /// The motion landed here.
    At(usize),
    /// The buffer ran out with this many repetitions outstanding.
    Short(usize),
}

impl Reach {
    /// The landing offset, if the motion completed.
    #[must_use]
    pub const fn offset(self) -> Option<usize> {
        match self {
            Self::At(offset) => Some(offset),
            Self::Short(_) => None,
        }
    }
}

/// Scan state shared by the sentence searches.
struct Text<'a> {
    buf: &'a Buffer,
    chars: RopeSlice<'a>,
    max: isize,
}

impl<'a> Text<'a> {
    fn new(buf: &'a Buffer) -> Self {
        Self {
            buf,
            chars: buf.chars(),
            max: buf.file_size() as isize,
        }
    }

    /// The char at `i`, or NUL outside the buffer.
    fn at(&self, i: isize) -> char {
        if i >= 0 && i < self.max {
            self.chars.char(i as usize)
        } else {
            '\0'
        }
    }

    fn paragraph(&self, offset: isize, dir: isize) -> isize {
        let line = self.buf.line_of_offset(offset.max(0) as usize);
        next_paragraph_offset(self.buf, line, dir, false)
    }

    /// First non-whitespace offset at or after `offset`, or `max`.
    fn skip_whitespace(&self, mut offset: isize) -> isize {
        while offset < self.max && self.at(offset).is_whitespace() {
            offset += 1;
        }
        offset
    }

    /// Closer of a sentence result and a paragraph boundary.
    const fn closer(res: isize, np: isize, start: isize, dir: isize, count_current: bool) -> isize {
        if res < 0 || np < 0 {
            return res;
        }
        let take_paragraph = if dir > 0 {
            np < res || res < start
        } else {
            np > res || (res >= start && !count_current)
        };
        if take_paragraph { np } else { res }
    }

    // -----------------------------------------------------------------------
    // Single step
    // -----------------------------------------------------------------------

    fn sentence_start(&self, start: isize, dir: isize, count_current: bool) -> isize {
        let np = self.paragraph(start, dir);

        let end = if start < self.max && self.at(start) == '\n' && !count_current {
            self.sentence_end(start, -1, false)
        } else {
            self.sentence_end(start, -1, true)
        };
        if end == start && count_current && self.at(end) == '\n' {
            return end;
        }

        let pos = end - 1;
        if end >= 0 {
            let offset = self.skip_whitespace(end + 1);
            let ahead = if dir > 0 { offset > start } else { offset < start };
            if (offset == start && count_current) || ahead {
                return offset;
            }
        }

        let end = if dir > 0 {
            self.sentence_end(start, dir, true)
        } else {
            self.sentence_end(pos, dir, count_current)
        };

        let mut res = end + 1;
        if end != -1 && (self.at(end) != '\n' || !count_current) {
            res = self.skip_whitespace(res);
        }

        if res >= 0 && np >= 0 {
            Self::closer(res, np, start, dir, count_current)
        } else if res == -1 && np >= 0 {
            np
        } else {
            res
        }
    }

    fn sentence_end(&self, start: isize, dir: isize, count_current: bool) -> isize {
        if (dir > 0 && start >= self.max - 1) || (dir < 0 && start <= 0) {
            return -1;
        }

        let mut np = self.paragraph(start, dir);
        let mut res = -1;
        let mut offset = start;
        let mut found = false;

        while offset >= 0 && offset < self.max && !found {
            let ch = self.at(offset);
            if matches!(ch, '.' | '!' | '?') {
                let end = offset;
                offset += 1;
                while offset < self.max && matches!(self.at(offset), ')' | ']' | '"' | '\'') {
                    offset += 1;
                }
                if offset >= self.max || self.at(offset).is_whitespace() {
                    if offset - 1 == start && !count_current {
                        // Already on this end; search on from the punctuation.
                        offset = end;
                    } else {
                        res = offset - 1;
                        found = true;
                    }
                } else {
                    offset = end;
                }
            } else if ch == '\n' {
                let end = offset;
                if dir > 0 {
                    let stop_at_paragraph = end - 1 != start || count_current;
                    offset += 1;
                    while offset < self.max {
                        if self.at(offset) != '\n' {
                            offset -= 1;
                            break;
                        }
                        if offset == np && stop_at_paragraph {
                            break;
                        }
                        offset += 1;
                    }

                    if offset == np && stop_at_paragraph {
                        res = end - 1;
                        found = true;
                    } else if offset > end {
                        res = offset;
                        np = res;
                        found = true;
                    } else if offset == end && offset > 0 && self.at(offset - 1) == '\n' && count_current {
                        res = end;
                        np = res;
                        found = true;
                    }
                } else {
                    if offset > 0 {
                        offset -= 1;
                        while offset > 0 {
                            if self.at(offset) != '\n' {
                                offset += 1;
                                break;
                            }
                            offset -= 1;
                        }
                    }
                    if offset < end {
                        res = if end == start && count_current { end } else { offset - 1 };
                        found = true;
                    }
                }
                offset = end;
            } else if ch == '\u{c}' {
                res = offset;
                found = true;
            }
            offset += dir;
        }

        Self::closer(res, np, start, dir, count_current)
    }

    // -----------------------------------------------------------------------
    // Text object edge
    // -----------------------------------------------------------------------

    /// One edge of `is`/`as`. A negative `count` searches backward.
    /// `one_way` is set when an existing selection is being extended.
    fn range_end(&self, start: isize, count: isize, is_outer: bool, one_way: bool) -> isize {
        let dir: isize = if count > 0 { 1 } else { -1 };
        let total = count.abs();
        let mut count = total;
        let toggle = !is_outer;
        let mut find_end = dir < 0;

        let class = CaretClass::classify(self, start);
        tracing::trace!(start, ?class, count, is_outer, one_way, "sentence edge");

        // Even steps look for starts, odd for ends.
        let mut which: usize = match class {
            CaretClass::OnBlankLine => {
                if dir < 0 && !one_way {
                    return start;
                }
                if one_way {
                    find_end = dir > 0;
                } else if dir > 0 && start < self.max - 1 && !is_space_char(self.at(start + 1)) {
                    find_end = true;
                }
                0
            }
            CaretClass::OnStart => {
                if dir < 0 {
                    if !one_way {
                        return start;
                    }
                    // Growing a selection backward: the gap before this
                    // sentence is the first unit, so the first step looks
                    // for the previous end.
                    find_end = false;
                }
                1
            }
            CaretClass::OnEnd => {
                if dir > 0 && !one_way {
                    return start;
                }
                if dir > 0 && one_way {
                    find_end = true;
                }
                0
            }
            CaretClass::MidSentence => usize::from(dir > 0),
            CaretClass::Between { prev_end, next_start } => {
                if !one_way {
                    find_end = true;
                } else if dir > 0 {
                    if start < next_start - 1 {
                        find_end = true;
                    } else if start == next_start - 1 {
                        count += 1;
                    }
                } else if start > prev_end + 1 {
                    find_end = false;
                } else if start == prev_end + 1 {
                    count += 1;
                }
                usize::from(dir < 0)
            }
        };

        let mut res = start;
        while count > 0 && res >= 0 && res <= self.max - 1 {
            let odd = which % 2 == 1;
            res = if (toggle && odd) || (is_outer && find_end) {
                self.sentence_end(res, dir, false)
            } else {
                self.sentence_start(res, dir, false)
            };
            if res == 0 || res == self.max - 1 {
                count -= 1;
                break;
            }
            if toggle {
                if odd && dir < 0 {
                    res += 1;
                } else if !odd && dir > 0 {
                    res -= 1;
                }
            }
            which += 1;
            count -= 1;
        }

        if res < 0 || count > 0 {
            res = if dir > 0 { (self.max - 1).max(0) } else { 0 };
        } else if is_outer && ((dir < 0 && find_end) || (dir > 0 && !find_end)) && res != 0 && res != self.max - 1 {
            res -= dir;
        }

        if self.at(res) == '\n' && res > 0 && self.at(res - 1) != '\n' {
            res -= 1;
        }
        res
    }
}

/// Where the caret sits relative to the sentences around it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CaretClass {
    OnBlankLine,
    OnStart,
    OnEnd,
    MidSentence,
    Between { prev_end: isize, next_start: isize },
}

impl CaretClass {
    fn classify(text: &Text<'_>, start: isize) -> Self {
        let prev_end = text.sentence_end(start, -1, true);
        let next_end = text.sentence_end(start, 1, true);
        let prev_start = text.sentence_start(start, -1, true);
        let next_start = text.sentence_start(start, 1, true);

        if next_start == prev_end {
            Self::OnBlankLine
        } else if start == next_start {
            Self::OnStart
        } else if start == next_end {
            Self::OnEnd
        } else if start >= prev_start && start <= next_end && next_end < next_start {
            Self::MidSentence
        } else {
            Self::Between { prev_end, next_start }
        }
    }
}

// ---------------------------------------------------------------------------
// Public motions
// ---------------------------------------------------------------------------

/// Shared repeat-and-clamp loop of the counted motions.
fn repeat(buf: &Buffer, offset: usize, count: isize, require_all: bool, step: impl Fn(&Text<'_>, isize, isize, bool) -> isize) -> Reach {
    let text = Text::new(buf);
    let dir: isize = if count > 0 { 1 } else { -1 };
    let total = count.abs();
    let mut count = total;
    let mut res = offset as isize;

    while count > 0 && res >= 0 && res <= text.max - 1 {
        res = step(&text, res, dir, count == total);
        if res == 0 || res == text.max - 1 {
            count -= 1;
            break;
        }
        count -= 1;
    }

    let edge = if dir > 0 { (text.max - 1).max(0) } else { 0 };
    if res < 0 && (!require_all || total == 1) {
        res = edge;
    } else if count > 0 && total > 1 {
        if require_all {
            return Reach::Short(count as usize);
        }
        res = edge;
    }

    if res < 0 {
        Reach::Short(res.unsigned_abs())
    } else {
        Reach::At(res as usize)
    }
}

/// `)` / `(`: start of the `|count|`-th sentence from `offset`, backward for
/// a negative count.
///
/// With `count_current` a sentence starting at `offset` counts. When the
/// buffer runs out early the result is clamped to its edge, or, with
/// `require_all` and a count above one, reported as [`Reach::Short`].
#[must_use]
pub fn find_next_sentence_start(buf: &Buffer, offset: usize, count: isize, count_current: bool, require_all: bool) -> Reach {
    repeat(buf, offset, count, require_all, |text, res, dir, _| {
        text.sentence_start(res, dir, count_current)
    })
}

/// End of the `|count|`-th sentence from `offset`. `count_current` applies
/// to the first repetition only.
#[must_use]
pub fn find_next_sentence_end(buf: &Buffer, offset: usize, count: isize, count_current: bool, require_all: bool) -> Reach {
    repeat(buf, offset, count, require_all, |text, res, dir, first| {
        text.sentence_end(res, dir, count_current && first)
    })
}

/// `is` / `as`: range of `count` sentences around the caret.
///
/// Inner counts the whitespace between sentences as a sentence of its own.
/// Outer takes trailing whitespace, or leading whitespace when the range
/// already ends on some. With a selection the range grows from the end the
/// caret is on.
#[must_use]
pub fn find_sentence_range(buf: &Buffer, caret: Caret, count: usize, is_outer: bool) -> Range {
    if buf.is_empty() {
        return Range::point(0);
    }
    let text = Text::new(buf);
    let offset = caret.offset() as isize;
    let count = count as isize;

    if caret.has_selection() {
        let sel_start = caret.selection_start();
        let sel_end = caret.selection_end();
        if caret.offset() + 1 == sel_end {
            let end = text.range_end(offset, count, is_outer, true);
            return Range::new(sel_start, (end as usize + 1).max(sel_start));
        }
        let start = text.range_end(offset, -count, is_outer, true);
        return Range::new((start as usize).min(sel_end), sel_end);
    }

    let end = text.range_end(offset, count, is_outer, false);
    let space = is_outer && !is_space_char(text.at(end));
    let start = text.range_end(offset, -1, space, false);
    tracing::debug!(start, end, is_outer, "sentence bounds");
    let end = end as usize + 1;
    Range::new((start as usize).min(end), end)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
