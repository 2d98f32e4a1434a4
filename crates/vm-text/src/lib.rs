//! # vm-text: Buffer access for vmotion
//!
//! The types every motion is written against:
//!
//! - **[`position`]**: char-offset `Range`, `Position` (line, col), `Direction`
//! - **[`buffer`]**: `Buffer` wrapping a rope with line geometry and clamping
//! - **[`caret`]**: `Caret` head offset with an optional visual anchor

pub mod buffer;
pub mod caret;
pub mod position;

pub use buffer::{Buffer, is_space_char};
pub use caret::Caret;
pub use position::{Direction, Position, Range};
