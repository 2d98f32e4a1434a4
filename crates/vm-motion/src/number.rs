//! Number recognition for `CTRL-A` / `CTRL-X`.
//!
//! Which literals are recognized is the `nrformats` choice, passed in as
//! three flags:
//!
//! | Flag | Recognizes | Kind |
//! |------|------------|------|
//! | `hex` | `0x1f`, `0X1F` | [`NumberKind::Hex`] |
//! | `octal` | `017` (leading zero, digits `0-7`) | [`NumberKind::Octal`] |
//! | `alpha` | a single letter | [`NumberKind::AlphaDigit`] |
//!
//! Decimal numbers are always recognized and take one leading `-`.

use vm_text::{Buffer, Range};

/// The kind of a recognized numeric token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NumberKind {
    Decimal,
    Hex,
    Octal,
    AlphaDigit,
}

/// Char classes a scan accepts.
#[derive(Debug, Clone, Copy, Default)]
struct Classes {
    alpha: bool,
    hex: bool,
    octal: bool,
    decimal: bool,
}

impl Classes {
    const fn accepts(self, ch: char) -> bool {
        (self.alpha && ch.is_ascii_alphabetic())
            || (self.octal && matches!(ch, '0'..='7'))
            || (self.hex && ch.is_ascii_hexdigit())
            || (self.decimal && ch.is_ascii_digit())
    }
}

const fn is_hex_letter(ch: char) -> bool {
    matches!(ch, 'a'..='f' | 'A'..='F')
}

/// A line of text indexed by char.
struct Line {
    chars: Vec<char>,
}

impl Line {
    fn new(text: &str) -> Self {
        Self {
            chars: text.chars().collect(),
        }
    }

    const fn len(&self) -> usize {
        self.chars.len()
    }

    fn at(&self, i: usize) -> Option<char> {
        self.chars.get(i).copied()
    }

    fn accepts(&self, i: usize, classes: Classes) -> bool {
        self.at(i).is_some_and(|ch| classes.accepts(ch))
    }

    /// The run of `classes` chars around `pos`. An octal run holding an `8`
    /// or `9` yields `(0, 0)`.
    fn run(&self, pos: usize, mut classes: Classes) -> (usize, usize) {
        classes.decimal |= classes.octal;
        let mut end = pos;
        while end < self.len() && self.accepts(end, classes) {
            end += 1;
        }
        let mut start = pos;
        while self.accepts(start, classes) {
            if start == 0 {
                break;
            }
            start -= 1;
        }
        if start < end && !self.accepts(start, classes) {
            start += 1;
        }

        let octal_only = Classes {
            octal: true,
            ..Classes::default()
        };
        if classes.octal && (start..end).any(|i| !self.accepts(i, octal_only)) {
            return (0, 0);
        }
        (start, end)
    }
}

/// Find the number at or after `start_col` in `text`.
///
/// Hex is tried first, then octal, then a single alpha char, then decimal.
/// A hex prefix is found both with the column on its `0` and on its `x`.
#[must_use]
pub fn find_number_in_text(text: &str, start_col: usize, alpha: bool, hex: bool, octal: bool) -> Option<(Range, NumberKind)> {
    tracing::trace!(text, start_col, alpha, hex, octal, "number scan");
    let line = Line::new(text);
    let len = line.len();
    let any = Classes {
        alpha,
        hex,
        octal,
        decimal: true,
    };

    let mut pos = start_col;
    loop {
        while pos < len && !line.accepts(pos, any) {
            pos += 1;
        }
        if pos >= len {
            tracing::trace!("no number char on line");
            return None;
        }
        if !hex {
            break;
        }

        let here = line.at(pos);
        let on_hex_letter = here.is_some_and(is_hex_letter);
        if here == Some('0') && matches!(line.at(pos + 1), Some('x' | 'X')) {
            pos += 2;
        } else if matches!(here, Some('x' | 'X')) && pos > 0 && line.at(pos - 1) == Some('0') {
            pos += 1;
        }

        let hex_digits = Classes {
            hex: true,
            ..Classes::default()
        };
        let (start, end) = line.run(pos, hex_digits);
        if start >= 2 && line.at(start - 2) == Some('0') && matches!(line.at(start - 1), Some('x' | 'X')) {
            tracing::debug!(start = start - 2, end, "hex number");
            return Some((Range::new(start - 2, end), NumberKind::Hex));
        }

        // A bare hex letter is not a number; look further along.
        if !on_hex_letter || alpha {
            break;
        }
        pos += 1;
    }

    if octal {
        let (start, end) = line.run(
            pos,
            Classes {
                octal: true,
                ..Classes::default()
            },
        );
        if end - start == 1 && line.at(start) == Some('0') {
            return Some((Range::new(start, end), NumberKind::Decimal));
        }
        let digits = Classes {
            decimal: true,
            ..Classes::default()
        };
        let after_digit = start > 0 && line.accepts(start - 1, digits);
        if line.at(start) == Some('0') && end > start && !after_digit {
            tracing::debug!(start, end, "octal number");
            return Some((Range::new(start, end), NumberKind::Octal));
        }
    }

    if alpha && line.at(pos).is_some_and(|ch| ch.is_ascii_alphabetic()) {
        return Some((Range::new(pos, pos + 1), NumberKind::AlphaDigit));
    }

    let (mut start, end) = line.run(
        pos,
        Classes {
            decimal: true,
            ..Classes::default()
        },
    );
    if start > 0 && line.at(start - 1) == Some('-') {
        start -= 1;
    }
    Some((Range::new(start, end), NumberKind::Decimal))
}

/// The number at or after `offset` on its line, as buffer offsets.
///
/// Matching is case-insensitive: the line is lowercased before scanning.
#[must_use]
pub fn find_number_under_cursor(buf: &Buffer, offset: usize, alpha: bool, hex: bool, octal: bool) -> Option<(Range, NumberKind)> {
    let line = buf.line_of_offset(offset);
    let line_start = buf.line_start_offset(line);
    let text: String = buf.line_text(line).chars().map(|ch| ch.to_ascii_lowercase()).collect();
    let col = offset.saturating_sub(line_start);

    let (range, kind) = find_number_in_text(&text, col, alpha, hex, octal)?;
    Some((Range::new(range.start + line_start, range.end + line_start), kind))
}

/// The first number of every line of every range, for visual `g CTRL-A`.
#[must_use]
pub fn find_numbers_in_range(buf: &Buffer, ranges: &[Range], alpha: bool, hex: bool, octal: bool) -> Vec<(Range, NumberKind)> {
    let mut found = Vec::new();
    for range in ranges {
        let text = buf.rope().slice(range.start..range.end).to_string();
        let mut chunk_start = range.start;
        for chunk in text.split('\n') {
            if let Some((number, kind)) = find_number_in_text(chunk, 0, alpha, hex, octal) {
                found.push((
                    Range::new(number.start + chunk_start, number.end + chunk_start),
                    kind,
                ));
            }
            chunk_start += chunk.chars().count() + 1;
        }
    }
    found
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn num(text: &str, col: usize, alpha: bool, hex: bool, octal: bool) -> Option<(Range, NumberKind)> {
        find_number_in_text(text, col, alpha, hex, octal)
    }

    fn r(start: usize, end: usize) -> Range {
        Range::new(start, end)
    }

    // -- Hex ----------------------------------------------------------------

    #[test]
    fn hex_literal() {
        assert_eq!(num("0x1A + 7", 0, false, true, false), Some((r(0, 4), NumberKind::Hex)));
    }

    #[test]
    fn hex_found_from_the_x() {
        assert_eq!(num("0x1A + 7", 1, false, true, false), Some((r(0, 4), NumberKind::Hex)));
    }

    #[test]
    fn hex_skips_bare_hex_words() {
        assert_eq!(num("cafe 0x1f", 0, false, true, false), Some((r(5, 9), NumberKind::Hex)));
    }

    #[test]
    fn hex_prefix_without_digits() {
        assert_eq!(num("0x", 0, false, true, false), Some((r(0, 2), NumberKind::Hex)));
    }

    #[test]
    fn hex_off_reads_decimal() {
        assert_eq!(num("0x1A", 0, false, false, false), Some((r(0, 1), NumberKind::Decimal)));
    }

    // -- Octal --------------------------------------------------------------

    #[test]
    fn octal_literal() {
        assert_eq!(num("x 017 y", 0, false, false, true), Some((r(2, 5), NumberKind::Octal)));
    }

    #[test]
    fn lone_zero_is_decimal() {
        assert_eq!(num("0", 0, false, false, true), Some((r(0, 1), NumberKind::Decimal)));
    }

    #[test]
    fn eight_or_nine_is_not_octal() {
        assert_eq!(num("089", 0, false, false, true), Some((r(0, 3), NumberKind::Decimal)));
    }

    // -- Decimal and alpha --------------------------------------------------

    #[test]
    fn decimal_takes_minus() {
        assert_eq!(num("abc -12 x", 0, false, false, false), Some((r(4, 7), NumberKind::Decimal)));
    }

    #[test]
    fn decimal_from_inside() {
        assert_eq!(num("n = 12345", 7, false, false, false), Some((r(4, 9), NumberKind::Decimal)));
    }

    #[test]
    fn alpha_is_one_char() {
        assert_eq!(num("  b1", 0, true, false, false), Some((r(2, 3), NumberKind::AlphaDigit)));
    }

    #[test]
    fn no_number() {
        assert_eq!(num("no digits", 0, false, false, false), None);
        assert_eq!(num("12 ab", 3, false, false, false), None);
    }

    // -- Buffer forms -------------------------------------------------------

    #[test]
    fn under_cursor_uses_buffer_offsets() {
        let buf = Buffer::from_text("first\nx = 0X1F;");
        assert_eq!(
            find_number_under_cursor(&buf, 6, false, true, false),
            Some((r(10, 14), NumberKind::Hex))
        );
    }

    #[test]
    fn numbers_in_ranges_per_line() {
        let buf = Buffer::from_text("a 1\nb 22\nc\nd 3");
        let found = find_numbers_in_range(&buf, &[r(0, 14)], false, false, false);
        assert_eq!(
            found,
            vec![
                (r(2, 3), NumberKind::Decimal),
                (r(6, 8), NumberKind::Decimal),
                (r(13, 14), NumberKind::Decimal),
            ]
        );
    }
}
