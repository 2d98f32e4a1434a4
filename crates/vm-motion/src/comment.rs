//! Block-comment jumps for `%`.
//!
//! On a block comment's opening delimiter `%` jumps to its closing one and
//! back. Which text is a comment, and what its delimiters are, is a property
//! of the source language, so the motion asks a [`CommentMetadata`]
//! implementation instead of guessing.
//!
//! [`SyntaxComments`] is the bundled implementation: it parses Rust source
//! with tree-sitter and answers from the syntax tree.

use ropey::Rope;
use tree_sitter::{Parser, Tree};
use vm_text::{Buffer, Range};

// ---------------------------------------------------------------------------
// Metadata interface
// ---------------------------------------------------------------------------

/// A comment node located in the buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentSpan {
    /// Char offsets of the whole comment, delimiters included.
    pub range: Range,
    /// The comment's text.
    pub text: String,
}

/// Language knowledge the comment jump needs.
pub trait CommentMetadata {
    /// The comment at or enclosing `offset`.
    fn comment_at(&self, offset: usize) -> Option<CommentSpan>;

    /// Block comment prefix and suffix of the language at `offset`.
    fn block_comment_delimiters_at(&self, offset: usize) -> Option<(&str, &str)>;

    /// Documentation comment prefix and suffix at `offset`, if the language
    /// has them.
    fn doc_comment_delimiters_at(&self, _offset: usize) -> Option<(&str, &str)> {
        None
    }
}

/// The other end of the block comment whose delimiter `offset` sits on.
///
/// From the prefix this is the last char of the suffix; from the suffix it
/// is the comment's first char. Block delimiters are tried before
/// documentation delimiters.
#[must_use]
pub fn find_matching_comment(meta: &dyn CommentMetadata, offset: usize) -> Option<usize> {
    let comment = meta.comment_at(offset)?;
    let block = meta
        .block_comment_delimiters_at(offset)
        .and_then(|(prefix, suffix)| jump_between(&comment, offset, prefix, suffix));
    if block.is_some() {
        return block;
    }
    let (prefix, suffix) = meta.doc_comment_delimiters_at(offset)?;
    jump_between(&comment, offset, prefix, suffix)
}

fn jump_between(comment: &CommentSpan, offset: usize, prefix: &str, suffix: &str) -> Option<usize> {
    if !comment.text.starts_with(prefix) || !comment.text.ends_with(suffix) {
        return None;
    }
    let Range { start, end } = comment.range;
    if offset < start + prefix.chars().count() {
        Some(end.saturating_sub(1))
    } else if offset >= end.saturating_sub(suffix.chars().count()) {
        Some(start)
    } else {
        None
    }
}

// ---------------------------------------------------------------------------
// Tree-sitter backed metadata
// ---------------------------------------------------------------------------

/// Comment metadata for Rust source, read from a tree-sitter parse.
///
/// The parse is a snapshot: build a new value after the buffer changes.
pub struct SyntaxComments {
    rope: Rope,
    source: String,
    tree: Tree,
}

impl SyntaxComments {
    /// Parse `buf` as Rust. Returns `None` if the grammar cannot be loaded
    /// or the parse is abandoned.
    #[must_use]
    pub fn rust(buf: &Buffer) -> Option<Self> {
        let language: tree_sitter::Language = tree_sitter_rust::LANGUAGE.into();
        let mut parser = Parser::new();
        if let Err(err) = parser.set_language(&language) {
            tracing::debug!(%err, "rust grammar rejected by parser");
            return None;
        }
        let source = buf.rope().to_string();
        let tree = parser.parse(&source, None)?;
        Some(Self {
            rope: buf.rope().clone(),
            source,
            tree,
        })
    }
}

impl CommentMetadata for SyntaxComments {
    fn comment_at(&self, offset: usize) -> Option<CommentSpan> {
        if offset >= self.rope.len_chars() {
            return None;
        }
        let byte = self.rope.char_to_byte(offset);
        let width = self.rope.char(offset).len_utf8();
        let mut node = self
            .tree
            .root_node()
            .descendant_for_byte_range(byte, byte + width)?;
        while !matches!(node.kind(), "block_comment" | "line_comment") {
            node = node.parent()?;
        }
        let bytes = node.byte_range();
        Some(CommentSpan {
            range: Range::new(
                self.rope.byte_to_char(bytes.start),
                self.rope.byte_to_char(bytes.end),
            ),
            text: self.source[bytes].to_string(),
        })
    }

    fn block_comment_delimiters_at(&self, _offset: usize) -> Option<(&str, &str)> {
        Some(("/*", "*/"))
    }

    fn doc_comment_delimiters_at(&self, _offset: usize) -> Option<(&str, &str)> {
        Some(("/**", "*/"))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::find_matching_pair_on_current_line;

    /// Metadata with one fixed comment, independent of any parser.
    struct Fixed {
        span: CommentSpan,
        block: Option<(&'static str, &'static str)>,
        doc: Option<(&'static str, &'static str)>,
    }

    impl CommentMetadata for Fixed {
        fn comment_at(&self, offset: usize) -> Option<CommentSpan> {
            let Range { start, end } = self.span.range;
            (start..end).contains(&offset).then(|| self.span.clone())
        }

        fn block_comment_delimiters_at(&self, _offset: usize) -> Option<(&str, &str)> {
            self.block
        }

        fn doc_comment_delimiters_at(&self, _offset: usize) -> Option<(&str, &str)> {
            self.doc
        }
    }

    fn fixed(start: usize, text: &str) -> Fixed {
        Fixed {
            span: CommentSpan {
                range: Range::new(start, start + text.chars().count()),
                text: text.to_string(),
            },
            block: Some(("/*", "*/")),
            doc: None,
        }
    }

    // -- Jump logic ---------------------------------------------------------

    #[test]
    fn prefix_jumps_to_suffix_and_back() {
        let meta = fixed(4, "/* hi */");
        assert_eq!(find_matching_comment(&meta, 4), Some(11));
        assert_eq!(find_matching_comment(&meta, 5), Some(11));
        assert_eq!(find_matching_comment(&meta, 10), Some(4));
        assert_eq!(find_matching_comment(&meta, 11), Some(4));
    }

    #[test]
    fn comment_body_does_not_jump() {
        let meta = fixed(0, "/* hi */");
        assert_eq!(find_matching_comment(&meta, 3), None);
    }

    #[test]
    fn outside_comment_does_not_jump() {
        let meta = fixed(4, "/* hi */");
        assert_eq!(find_matching_comment(&meta, 1), None);
    }

    #[test]
    fn doc_delimiters_are_the_fallback() {
        let mut meta = fixed(0, "{- x -}");
        meta.block = Some(("/*", "*/"));
        meta.doc = Some(("{-", "-}"));
        assert_eq!(find_matching_comment(&meta, 0), Some(6));
    }

    #[test]
    fn line_comment_does_not_jump() {
        let meta = fixed(0, "// hi");
        assert_eq!(find_matching_comment(&meta, 0), None);
    }

    // -- Tree-sitter metadata -----------------------------------------------

    #[test]
    fn syntax_comments_find_block_comment() {
        let buf = Buffer::from_text("let a = 1; /* note */ let b = 2;");
        let meta = SyntaxComments::rust(&buf).unwrap();
        let span = meta.comment_at(15).unwrap();
        assert_eq!(span.range, Range::new(11, 21));
        assert_eq!(span.text, "/* note */");
        assert_eq!(meta.comment_at(2), None);
    }

    #[test]
    fn percent_prefers_comment_jump() {
        let buf = Buffer::from_text("let a = (1); /* (x) */");
        let meta = SyntaxComments::rust(&buf).unwrap();
        assert_eq!(find_matching_pair_on_current_line(&buf, 13, Some(&meta)), Some(21));
        assert_eq!(find_matching_pair_on_current_line(&buf, 21, Some(&meta)), Some(13));
        // Off the comment, the delimiter scan takes over.
        assert_eq!(find_matching_pair_on_current_line(&buf, 0, Some(&meta)), Some(10));
    }
}
