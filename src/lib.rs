//! # vmotion: a Vim-compatible motion and text-object engine
//!
//! Given a buffer snapshot and a caret, vmotion answers where a Vim motion
//! lands or which range a text object covers. The positioning rules follow
//! Vim's, quirks included.
//!
//! The engine is split across three crates, re-exported here:
//!
//! - **[`text`]** (`vm-text`): `Buffer`, `Caret`, `Range`, `Position`
//! - **[`pattern`]** (`vm-pattern`): Vim search patterns over the `regex`
//!   crate
//! - **[`motion`]** (`vm-motion`): search, blocks, tags, words, sentences,
//!   paragraphs, numbers and the `:set` options they read
//!
//! ```
//! use vmotion::{Buffer, Caret, find_block_range};
//!
//! let buf = Buffer::from_text("f(a, (b))");
//! let inner = find_block_range(&buf, Caret::at(3), '(', 1, false).unwrap();
//! assert_eq!((inner.start, inner.end), (2, 8));
//! ```

pub use vm_motion as motion;
pub use vm_pattern as pattern;
pub use vm_text as text;

pub use vm_motion::*;
pub use vm_text::{Buffer, Caret, Direction, Position, Range};
