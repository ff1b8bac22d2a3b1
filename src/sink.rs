//! `Sink` is the target the block decoder appends decoded bytes into.
//!
//! It is always backed by a plain `&mut [u8]` slice. The bytes already written to it
//! (`output[..pos]`) double as the match window: a back-reference of `offset` reads from
//! `output[pos - offset..]`. For a standalone block decode the slice starts empty (`pos ==
//! 0`); for a linked frame block the slice is primed with up to 64 KiB of carried-over
//! history and `pos` starts after it, exactly as in the teacher crate this was grounded on.

use crate::block::DecompressError;

/// A bounds-checked, `forbid(unsafe_code)` decode target.
///
/// # Invariants
/// Bytes `output[..pos]` are always initialized and available as the match window.
pub struct Sink<'a> {
    output: &'a mut [u8],
    pos: usize,
}

impl<'a> Sink<'a> {
    /// Creates a `Sink` over `output`, with `pos` bytes already initialized (the carried-over
    /// window, if any).
    ///
    /// # Panics
    /// Panics if `pos > output.len()`.
    #[inline]
    pub fn new(output: &'a mut [u8], pos: usize) -> Self {
        assert!(pos <= output.len());
        Sink { output, pos }
    }

    #[inline]
    pub fn pos(&self) -> usize {
        self.pos
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.output.len()
    }

    #[inline]
    pub fn filled(&self) -> &[u8] {
        &self.output[..self.pos]
    }

    /// Appends `data` verbatim. Used for literal copies.
    #[inline]
    pub fn extend_from_slice(&mut self, data: &[u8]) -> Result<(), DecompressError> {
        let end = self
            .pos
            .checked_add(data.len())
            .ok_or(DecompressError::LengthOverflow)?;
        let dst = self
            .output
            .get_mut(self.pos..end)
            .ok_or(DecompressError::OutputTooSmall {
                expected_size: end,
                actual_size: self.output.len(),
            })?;
        dst.copy_from_slice(data);
        self.pos = end;
        Ok(())
    }

    /// Appends a match of `length` bytes copied from `offset` bytes before the current
    /// position. Implements the LZ4 self-referential match copy, including the overlapping
    /// case where `offset < length`.
    #[inline]
    pub fn copy_match(&mut self, offset: usize, length: usize) -> Result<(), DecompressError> {
        if offset == 0 || offset > self.pos {
            return Err(DecompressError::OffsetOutOfBounds);
        }
        let end = self
            .pos
            .checked_add(length)
            .ok_or(DecompressError::LengthOverflow)?;
        if end > self.output.len() {
            return Err(DecompressError::OutputTooSmall {
                expected_size: end,
                actual_size: self.output.len(),
            });
        }

        let start = self.pos - offset;
        if offset >= length {
            // Source and destination ranges don't overlap: a plain copy suffices.
            self.output.copy_within(start..start + length, self.pos);
        } else {
            // Overlapping match: every `offset` bytes written become source bytes for the
            // next `offset`-sized run. Must proceed forward, one source byte at a time -
            // `copy_within`/`memmove` with overlap does not reproduce this. See the LZ4
            // block format note on "RLE-like" matches.
            for i in 0..length {
                self.output[self.pos + i] = self.output[start + i];
            }
        }
        self.pos = end;
        Ok(())
    }
}
