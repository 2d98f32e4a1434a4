//! Contiguous view of a buffer for regex execution.
//!
//! The `regex` crate searches `&str`, so a scan snapshots the rope into one
//! `String` up front and keeps the buffer alongside it for line geometry.
//! The snapshot's bytes line up with the rope's, which lets byte offsets
//! from a match convert back to char offsets through the rope's own index.

use vm_text::Buffer;

/// A buffer plus its text as a single string, built once per scan.
pub struct Haystack<'a> {
    buffer: &'a Buffer,
    text: String,
}

impl<'a> Haystack<'a> {
    #[must_use]
    pub fn new(buffer: &'a Buffer) -> Self {
        Self {
            text: buffer.rope().to_string(),
            buffer,
        }
    }

    #[inline]
    #[must_use]
    pub const fn buffer(&self) -> &'a Buffer {
        self.buffer
    }

    /// The whole buffer as one string.
    #[inline]
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Byte offset of char offset `offset` in [`text`](Self::text).
    #[inline]
    #[must_use]
    pub fn char_to_byte(&self, offset: usize) -> usize {
        let rope = self.buffer.rope();
        rope.char_to_byte(offset.min(rope.len_chars()))
    }

    /// Char offset of byte offset `byte`. Bytes inside a multi-byte char map
    /// to that char.
    #[inline]
    #[must_use]
    pub fn byte_to_char(&self, byte: usize) -> usize {
        let rope = self.buffer.rope();
        rope.byte_to_char(byte.min(rope.len_bytes()))
    }
}
