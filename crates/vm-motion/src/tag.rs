//! Tag blocks: `it` / `at` over HTML and XML.
//!
//! Two passes locate the element around the caret. The forward pass walks
//! tags from the caret and finds the closing tag that nothing after the
//! caret opened. The backward pass then walks tags of that one name up to
//! the closing tag and pairs it with the innermost unclosed opening tag.
//!
//! Tags are recognized by regex, not parsed: a tag name is any run of chars
//! other than `/`, whitespace and `>`.

use std::sync::LazyLock;

use regex::{Regex, RegexBuilder};
use ropey::RopeSlice;
use vm_pattern::Haystack;
use vm_text::{Buffer, Caret, Range};

/// Any opening tag (name in group 1) or closing tag (name in group 2).
static TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:<([^/\s>]+)(?:\s[^>]*)?>)|(?:</([^/\s>]+)>)").expect("tag pattern should compile")
});

/// Range of the tag block around the caret.
///
/// The outer range spans the opening tag's `<` through the closing tag's
/// `>`; the inner range is the content between them. `count` selects the
/// `count`-th enclosing element.
///
/// With a multi-char selection the search starts at the selection end and
/// moves outward until the result would grow the selection. In visual mode
/// an already selected inner block, or an empty element, is promoted to the
/// outer range so repeating `it` makes progress.
#[must_use]
pub fn find_block_tag_range(buf: &Buffer, caret: Caret, count: usize, is_outer: bool) -> Option<Range> {
    let chars = buf.chars();
    let len = chars.len_chars();
    let sel_start = caret.selection_start();
    let sel_end = caret.selection_end();
    let is_range = caret.has_selection();

    let mut from = if is_range {
        sel_end
    } else {
        let offset = caret.offset();
        skip_indent(chars, buf.line_start_for_offset(offset), offset)
    };

    if in_tag(chars, from, false) {
        while from < len && chars.char(from) != '>' {
            from += 1;
        }
    } else if in_tag(chars, from, true) {
        while from > 0 && chars.char(from) != '<' {
            from -= 1;
        }
    }

    let hay = Haystack::new(buf);
    let mut count = count;
    loop {
        let (closing, name) = find_unmatched_closing_tag(&hay, from, count)?;
        let opening = find_unmatched_opening_tag(&hay, closing.start, &name)?;

        if is_range && opening.end > sel_start {
            // Would not extend the selection; try the next element out.
            from = closing.end;
            count = 1;
            continue;
        }

        let mut outer = is_outer;
        if caret.is_visual() {
            // The selection loses its trailing newlines between invocations.
            let mut sel_end = sel_end;
            while sel_end < len && chars.char(sel_end) == '\n' {
                sel_end += 1;
            }
            let inner_selected = closing.start == sel_end && opening.end == sel_start;
            let empty_element = opening.end == closing.start && sel_start == opening.end;
            outer |= inner_selected || empty_element;
        }

        let range = if outer {
            Range::new(opening.start, closing.end)
        } else {
            Range::new(opening.end, closing.start)
        };
        tracing::debug!(?range, %name, outer, "tag block");
        return Some(range);
    }
}

/// Skip leading indentation when `pos` sits inside it.
fn skip_indent(chars: RopeSlice<'_>, line_start: usize, mut pos: usize) -> usize {
    if (line_start..pos).all(|i| chars.char(i).is_whitespace()) {
        while pos < chars.len_chars() && chars.char(pos) != '\n' && chars.char(pos).is_whitespace() {
            pos += 1;
        }
    }
    pos
}

/// True when `pos` is inside an opening tag (or a closing tag, with
/// `end_tag`). A self-closing `<x/>` counts as neither.
fn in_tag(chars: RopeSlice<'_>, pos: usize, end_tag: bool) -> bool {
    let len = chars.len_chars();
    if pos >= len {
        return false;
    }
    let mut opening = None;
    for i in (0..=pos).rev() {
        match chars.char(i) {
            '<' => {
                opening = Some(i);
                break;
            }
            '>' if i != pos => return false,
            _ => {}
        }
    }
    let Some(opening) = opening else {
        return false;
    };

    let slash = opening + 1 < len && chars.char(opening + 1) == '/';
    if slash != end_tag {
        return false;
    }
    (opening..len)
        .find(|&i| chars.char(i) == '>')
        .is_some_and(|closing| chars.char(closing - 1) != '/')
}

/// The `count`-th closing tag after `from` with no opening tag between.
/// Opening tags that are never closed (`<br>`) are dropped from the stack.
fn find_unmatched_closing_tag(hay: &Haystack<'_>, from: usize, mut count: usize) -> Option<(Range, String)> {
    let base = hay.char_to_byte(from);
    let mut open: Vec<&str> = Vec::new();
    for caps in TAG.captures_iter(&hay.text()[base..]) {
        if let Some(name) = caps.get(2) {
            let name = name.as_str();
            while open.last().is_some_and(|tag| !same_name(tag, name)) {
                open.pop();
            }
            if open.pop().is_some() {
                continue;
            }
            if count <= 1 {
                let whole = caps.get(0)?;
                let range = Range::new(
                    hay.byte_to_char(base + whole.start()),
                    hay.byte_to_char(base + whole.end()),
                );
                return Some((range, name.to_string()));
            }
            count -= 1;
        } else if let Some(name) = caps.get(1) {
            open.push(name.as_str());
        }
    }
    None
}

/// The opening tag named `name` that the closing tag at `closing_start`
/// closes.
fn find_unmatched_opening_tag(hay: &Haystack<'_>, closing_start: usize, name: &str) -> Option<Range> {
    let name = regex::escape(name);
    // A trailing slash would make the tag self-closing.
    let pattern = format!(r"(</{name}>)|(<{name}(\s([^>]*[^/])?)?>)");
    let regex = match RegexBuilder::new(&pattern).case_insensitive(true).build() {
        Ok(regex) => regex,
        Err(err) => {
            tracing::debug!(%err, "opening tag pattern rejected");
            return None;
        }
    };

    let text = &hay.text()[..hay.char_to_byte(closing_start + 1)];
    let mut open = Vec::new();
    for found in regex.find_iter(text) {
        if found.as_str().starts_with("</") {
            open.pop();
        } else {
            open.push(found.range());
        }
    }
    open.pop()
        .map(|bytes| Range::new(hay.byte_to_char(bytes.start), hay.byte_to_char(bytes.end)))
}

fn same_name(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
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

    fn tag(text: &str, offset: usize, count: usize, outer: bool) -> Option<Range> {
        find_block_tag_range(&Buffer::from_text(text), Caret::at(offset), count, outer)
    }

    #[test]
    fn inner_and_outer_tag() {
        assert_eq!(tag("<a><b>x</b></a>", 6, 1, false), Some(r(6, 7)));
        assert_eq!(tag("<a><b>x</b></a>", 6, 1, true), Some(r(3, 11)));
    }

    #[test]
    fn count_selects_enclosing_element() {
        assert_eq!(tag("<a><b>x</b></a>", 6, 2, false), Some(r(3, 11)));
        assert_eq!(tag("<a><b>x</b></a>", 6, 3, false), None);
    }

    #[test]
    fn caret_inside_opening_tag() {
        let text = "<div class=\"x\">hi</div>";
        assert_eq!(tag(text, 3, 1, false), Some(r(15, 17)));
        assert_eq!(tag(text, 3, 1, true), Some(r(0, 23)));
    }

    #[test]
    fn caret_inside_closing_tag() {
        assert_eq!(tag("<p>x</p>", 6, 1, false), Some(r(3, 4)));
    }

    #[test]
    fn leading_indent_is_skipped() {
        assert_eq!(tag("  <p>x</p>", 0, 1, false), Some(r(5, 6)));
    }

    #[test]
    fn self_closing_tag_is_not_an_opener() {
        assert_eq!(tag("<a><a/>t</a>", 7, 1, false), Some(r(3, 8)));
    }

    #[test]
    fn names_match_case_insensitively() {
        assert_eq!(tag("<B>x</b>", 3, 1, false), Some(r(3, 4)));
    }

    #[test]
    fn unclosed_opener_is_dropped() {
        assert_eq!(tag("<p>a<br>b</p>", 4, 1, true), Some(r(0, 13)));
    }

    #[test]
    fn no_enclosing_element() {
        assert_eq!(tag("plain text", 2, 1, false), None);
    }

    #[test]
    fn visual_inner_selection_grows_to_outer() {
        let buf = Buffer::from_text("<a>xy</a>");
        let caret = Caret::visual(3, 4);
        assert_eq!(find_block_tag_range(&buf, caret, 1, false), Some(r(0, 9)));
    }

    #[test]
    fn tag_detection() {
        let buf = Buffer::from_text("<a href=x>t</a><b/>");
        let chars = buf.chars();
        assert!(in_tag(chars, 3, false));
        assert!(!in_tag(chars, 3, true));
        assert!(in_tag(chars, 13, true));
        assert!(!in_tag(chars, 17, false));
        assert!(!in_tag(chars, 10, false));
    }
}
