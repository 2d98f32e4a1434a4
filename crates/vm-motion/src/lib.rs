//! # vm-motion: Motions and text objects for vmotion
//!
//! Every function here is a query: it takes a [`Buffer`](vm_text::Buffer)
//! snapshot and a caret or offset and returns an offset or a range. Nothing
//! is retained between calls except the delimiter table.
//!
//! - **[`search`]**: `/` and `?` with count, wrap-around and messages, plus
//!   `find_all` for highlighting and `f`/`t` char search
//! - **[`block`]**: `%`, `[(`, `])` and the `i(`/`a(` and quote objects
//! - **[`comment`]**: `%` between block-comment delimiters, via tree-sitter
//! - **[`tag`]**: `it` / `at`
//! - **[`word`]**: `w`/`e` primitives, `iw`/`aw`, `*` and word counts
//! - **[`sentence`]**: `(`, `)`, `is`, `as`
//! - **[`paragraph`]**: `{`, `}`, `ip`, `ap` and sections
//! - **[`number`]**: numbers under the cursor for `CTRL-A` / `CTRL-X`
//! - **[`delimiters`]**: the `matchpairs` table behind an atomic snapshot
//! - **[`options`]**: the `:set` options the motions read

pub mod block;
pub mod comment;
pub mod delimiters;
pub mod number;
pub mod options;
pub mod paragraph;
pub mod search;
pub mod sentence;
pub mod tag;
pub mod word;

pub use block::{
    find_block_location, find_block_quote_in_line_range, find_block_range, find_matching_pair_on_current_line,
    find_unmatched_block, is_quote_without_escape,
};
pub use comment::{CommentMetadata, CommentSpan, SyntaxComments, find_matching_comment};
pub use delimiters::{DelimiterCache, DelimiterTable, delimiter_table, matchpairs_changed};
pub use number::{NumberKind, find_number_in_text, find_number_under_cursor, find_numbers_in_range};
pub use options::{OptionError, Options, SetDirective, parse_set};
pub use paragraph::{find_next_paragraph, find_next_paragraph_line, find_paragraph_range, find_section};
pub use search::{SearchError, SearchMessage, SearchOptions, find_all, find_next_character_on_line, find_pattern, search};
pub use sentence::{Reach, find_next_sentence_end, find_next_sentence_start, find_sentence_range};
pub use tag::find_block_tag_range;
pub use word::{
    CharType, WordCount, char_type, count_words, count_words_in_buffer, find_next_word, find_next_word_end,
    find_word_text_object, find_word_under_cursor,
};
