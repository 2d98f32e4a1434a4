//! Caret: a head offset plus an optional visual-selection anchor.
//!
//! Motions read the caret but never move it. The host editor owns caret
//! state and applies whatever offset or range a motion returns.
//!
//! # Selection
//!
//! With an anchor set, the caret is in a visual selection that includes both
//! the anchor and the head, as in Vim's characterwise visual mode. The
//! selection is reported as the half-open `[min, max + 1)`. Without an
//! anchor, both selection ends collapse onto the head.

use crate::position::Range;

/// Caret position with an optional selection anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Caret {
    head: usize,
    anchor: Option<usize>,
}

impl Caret {
    /// A caret at `offset` with no selection.
    #[inline]
    #[must_use]
    pub const fn at(offset: usize) -> Self {
        Self {
            head: offset,
            anchor: None,
        }
    }

    /// A visual selection from `anchor` to `head`, both inclusive.
    #[inline]
    #[must_use]
    pub const fn visual(anchor: usize, head: usize) -> Self {
        Self {
            head,
            anchor: Some(anchor),
        }
    }

    /// The offset the caret sits on.
    #[inline]
    #[must_use]
    pub const fn offset(self) -> usize {
        self.head
    }

    /// True while a visual selection is active.
    #[inline]
    #[must_use]
    pub const fn is_visual(self) -> bool {
        self.anchor.is_some()
    }

    /// First selected offset, or the head without a selection.
    #[inline]
    #[must_use]
    pub fn selection_start(self) -> usize {
        self.anchor.map_or(self.head, |a| a.min(self.head))
    }

    /// One past the last selected offset, or the head without a selection.
    #[inline]
    #[must_use]
    pub fn selection_end(self) -> usize {
        self.anchor.map_or(self.head, |a| a.max(self.head) + 1)
    }

    /// The selection as a range. Empty at the head without a selection.
    #[inline]
    #[must_use]
    pub fn selection(self) -> Range {
        Range::new(self.selection_start(), self.selection_end())
    }

    /// True when more than one char is selected.
    #[inline]
    #[must_use]
    pub fn has_selection(self) -> bool {
        self.selection_end() - self.selection_start() > 1
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_caret_has_empty_selection() {
        let c = Caret::at(5);
        assert!(!c.is_visual());
        assert_eq!(c.selection(), Range::point(5));
        assert!(!c.has_selection());
    }

    #[test]
    fn visual_selection_is_inclusive() {
        let c = Caret::visual(2, 6);
        assert!(c.is_visual());
        assert_eq!(c.selection(), Range::new(2, 7));
        assert!(c.has_selection());
    }

    #[test]
    fn backward_visual_selection() {
        let c = Caret::visual(6, 2);
        assert_eq!(c.offset(), 2);
        assert_eq!(c.selection(), Range::new(2, 7));
    }

    #[test]
    fn single_char_visual_is_not_a_selection() {
        let c = Caret::visual(4, 4);
        assert_eq!(c.selection(), Range::new(4, 5));
        assert!(!c.has_selection());
    }
}
