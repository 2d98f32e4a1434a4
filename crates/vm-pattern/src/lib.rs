//! # vm-pattern: Pattern engine for vmotion
//!
//! - **[`pattern`]**: `Pattern` compiled over the `regex` crate, executed one
//!   line at a time, plus the smart-case policy
//! - **[`haystack`]**: `Haystack`, the per-scan contiguous snapshot of a buffer

pub mod haystack;
pub mod pattern;

pub use haystack::Haystack;
pub use pattern::{LineMatch, Pattern, PatternError, make_search_pattern, should_ignore_case};
