/*!

<https://github.com/lz4/lz4/blob/dev/doc/lz4_Block_format.md>

LZ4 block format, decode side only:

```text
Token 1 byte [Literal Length, Match Length (Neg Offset)]   -- 0-15, 0-15
[Optional Literal Length bytes] [Literal] [Optional Match Length bytes]
```

This module interprets one block's worth of `token, literals, match` sequences
and appends the reconstructed bytes to a [`Sink`](crate::sink::Sink). It never encodes.
*/

#[forbid(unsafe_code)]
pub mod decompress;

pub use decompress::{decompress, decompress_into};

use core::fmt;

/// Bytes of look-back a linked block may keep from the previous block.
pub(crate) const WINDOW_SIZE: usize = 64 * 1024;

/// The minimum length of a match (offset, length) pair.
pub(crate) const MINMATCH: usize = 4;

/// An error produced while interpreting a single block's sequence stream.
///
/// This is the block-level half of the error taxonomy; [`crate::frame::Error`] wraps it for
/// frame-level callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecompressError {
    /// The literal length read from a sequence runs past the end of the input.
    LiteralOutOfBounds,
    /// A variable-length integer extension ran off the end of the input.
    ExpectedAnotherByte,
    /// The 2-byte match offset could not be read (fewer than 2 bytes remained).
    TruncatedOffset,
    /// A match offset of 0, or larger than the bytes produced so far, was read.
    OffsetOutOfBounds,
    /// The caller-provided output buffer is too small for the decompressed data.
    OutputTooSmall {
        expected_size: usize,
        actual_size: usize,
    },
    /// A literal or match length, once fully decoded, does not fit `usize` without
    /// overflowing.
    LengthOverflow,
    /// `decompress` finished but produced a different number of bytes than the caller
    /// declared via `min_uncompressed_size`.
    UncompressedSizeDiffers { expected: usize, actual: usize },
}

impl fmt::Display for DecompressError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DecompressError::LiteralOutOfBounds => {
                f.write_str("literal is out of bounds of the input")
            }
            DecompressError::ExpectedAnotherByte => {
                f.write_str("expected another byte, found none")
            }
            DecompressError::TruncatedOffset => {
                f.write_str("match offset is truncated, fewer than 2 bytes remained")
            }
            DecompressError::OffsetOutOfBounds => {
                f.write_str("the offset to copy is not contained in the decompressed buffer")
            }
            DecompressError::OutputTooSmall {
                expected_size,
                actual_size,
            } => write!(
                f,
                "output ({actual_size:?}) is too small for the decompressed data, need {expected_size:?}"
            ),
            DecompressError::LengthOverflow => {
                f.write_str("a literal or match length extension overflowed")
            }
            DecompressError::UncompressedSizeDiffers { expected, actual } => write!(
                f,
                "the expected decompressed output size is {expected}, actual {actual}",
            ),
        }
    }
}

impl std::error::Error for DecompressError {}
