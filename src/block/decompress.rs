//! The block decompression algorithm: turns one block's sequence stream into bytes.

use crate::block::{DecompressError, MINMATCH};
use crate::sink::Sink;

/// Reads a 0xFF-chained variable-length integer extension, starting from `n`.
///
/// In LZ4, a length field that hits its nibble's maximum (15) is extended by repeatedly
/// reading a byte and adding it to the running total; the extension stops at the first byte
/// that isn't 255.
///
/// # Example
///
/// `255, 255, 255, 4, ...` decodes to `255 + 255 + 255 + 4 = 769`; the bytes after the `4`
/// are not consumed, since `4` is the first byte less than 255.
#[inline]
fn read_variable_length(
    input: &[u8],
    input_pos: &mut usize,
    mut n: usize,
) -> Result<usize, DecompressError> {
    loop {
        let byte = *input
            .get(*input_pos)
            .ok_or(DecompressError::ExpectedAnotherByte)?;
        *input_pos += 1;
        n = n
            .checked_add(byte as usize)
            .ok_or(DecompressError::LengthOverflow)?;
        if byte != 0xFF {
            return Ok(n);
        }
    }
}

#[inline]
fn read_u16_le(input: &[u8], input_pos: &mut usize) -> Result<u16, DecompressError> {
    let bytes = input
        .get(*input_pos..*input_pos + 2)
        .ok_or(DecompressError::TruncatedOffset)?;
    *input_pos += 2;
    Ok(u16::from_le_bytes([bytes[0], bytes[1]]))
}

/// Decompresses the sequence stream `input` into `sink`, appending at `sink`'s current
/// position.
///
/// `sink` may already hold a carried-over window of previously decoded bytes (for linked
/// frame blocks); matches are free to reach back into it. Returns the number of bytes
/// appended by this call.
pub fn decompress_internal(input: &[u8], sink: &mut Sink<'_>) -> Result<usize, DecompressError> {
    let initial_pos = sink.pos();
    let mut input_pos = 0;

    loop {
        let token = *input
            .get(input_pos)
            .ok_or(DecompressError::ExpectedAnotherByte)?;
        input_pos += 1;

        let mut literal_length = (token >> 4) as usize;
        if literal_length == 15 {
            literal_length = read_variable_length(input, &mut input_pos, literal_length)?;
        }

        if literal_length > 0 {
            let literals = input
                .get(input_pos..input_pos + literal_length)
                .ok_or(DecompressError::LiteralOutOfBounds)?;
            sink.extend_from_slice(literals)?;
            input_pos += literal_length;
        }

        // The last sequence of a block is literals-only: no offset, no match.
        if input_pos == input.len() {
            return Ok(sink.pos() - initial_pos);
        }

        let offset = read_u16_le(input, &mut input_pos)? as usize;

        let mut match_length = MINMATCH + (token & 0x0F) as usize;
        if match_length == MINMATCH + 15 {
            match_length = read_variable_length(input, &mut input_pos, match_length)?;
        }

        sink.copy_match(offset, match_length)?;
    }
}

/// Decompresses `input` into `output`, which must be preallocated to the exact decompressed
/// size (or larger; see [`decompress`] for returning a right-sized `Vec`).
///
/// Returns the number of bytes written.
#[inline]
pub fn decompress_into(input: &[u8], output: &mut [u8]) -> Result<usize, DecompressError> {
    let mut sink = Sink::new(output, 0);
    decompress_internal(input, &mut sink)
}

/// Decompresses `input` into a new `Vec` of exactly `min_uncompressed_size` bytes.
///
/// # Errors
/// Returns [`DecompressError::UncompressedSizeDiffers`] if the block decodes to a different
/// number of bytes than declared.
#[inline]
pub fn decompress(input: &[u8], min_uncompressed_size: usize) -> Result<Vec<u8>, DecompressError> {
    let mut output = vec![0u8; min_uncompressed_size];
    let decomp_len = decompress_into(input, &mut output)?;
    if decomp_len != min_uncompressed_size {
        return Err(DecompressError::UncompressedSizeDiffers {
            expected: min_uncompressed_size,
            actual: decomp_len,
        });
    }
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_terminal_sequence() {
        // token 0x10: 1 literal, no match (last sequence is literal-only)
        assert_eq!(decompress(&[0x10, 0x01], 1).unwrap(), vec![0x01]);
    }

    #[test]
    fn all_literal() {
        assert_eq!(decompress(&[0x30, b'a', b'4', b'9'], 3).unwrap(), b"a49");
    }

    #[test]
    fn overlapping_match_rle_like() {
        // token 0x42: 4 literals, match length 2+4=6
        let payload = [0x42, 1, 2, 3, 4, 4, 0];
        let out = decompress(&payload, 10).unwrap();
        assert_eq!(out, vec![1, 2, 3, 4, 1, 2, 3, 4, 1, 2]);
    }

    #[test]
    fn non_overlapping_match() {
        // token 0x40: 4 literals, match length 0+4=4
        let payload = [0x40, 1, 2, 3, 4, 4, 0];
        let out = decompress(&payload, 8).unwrap();
        assert_eq!(out, vec![1, 2, 3, 4, 1, 2, 3, 4]);
    }

    #[test]
    fn malformed_zero_offset() {
        let payload = [0x40, 1, 2, 3, 4, 0, 0];
        assert_eq!(decompress(&payload, 8), Err(DecompressError::OffsetOutOfBounds));
    }

    #[test]
    fn malformed_offset_beyond_window() {
        let payload = [0x40, 1, 2, 3, 4, 8, 0];
        assert_eq!(decompress(&payload, 8), Err(DecompressError::OffsetOutOfBounds));
    }

    #[test]
    fn offset_one_is_maximal_overlap_rle() {
        // token 0x15 (ll=1, ml=4+1=5) one literal 'a', then offset 1 fills with 'a'.
        let payload = [0x15, b'a', 0x01, 0x00];
        let out = decompress(&payload, 6).unwrap();
        assert_eq!(out, b"aaaaaa");
    }

    #[test]
    fn literal_length_extension_boundary_at_15() {
        let mut payload = vec![0xF0]; // ll nibble 15, ml nibble 0 (unused, last sequence)
        payload.push(0); // extension byte: +0 => total ll = 15
        payload.extend(std::iter::repeat(b'x').take(15));
        let out = decompress(&payload, 15).unwrap();
        assert_eq!(out, vec![b'x'; 15]);
    }

    #[test]
    fn literal_length_extension_past_255() {
        // ll = 15 (nibble) + 255 + 0 = 270
        let mut payload = vec![0xF0, 0xFF, 0];
        payload.extend(std::iter::repeat(b'y').take(270));
        let out = decompress(&payload, 270).unwrap();
        assert_eq!(out, vec![b'y'; 270]);
    }

    #[test]
    fn truncated_literal_is_rejected() {
        let payload = [0x50, b'a', b'b']; // claims 5 literals, only 2 present
        assert_eq!(decompress(&payload, 5), Err(DecompressError::LiteralOutOfBounds));
    }

    #[test]
    fn truncated_offset_is_rejected() {
        let payload = [0x40, 1, 2, 3, 4, 1]; // only 1 of 2 offset bytes
        assert_eq!(decompress(&payload, 8), Err(DecompressError::TruncatedOffset));
    }

    #[test]
    fn empty_input_is_rejected() {
        assert_eq!(decompress(&[], 0), Err(DecompressError::ExpectedAnotherByte));
    }

    #[test]
    fn output_too_small_is_reported() {
        let payload = [0x50, b'a', b'b', b'c', b'd', b'e'];
        let mut out = [0u8; 3];
        assert!(matches!(
            decompress_into(&payload, &mut out),
            Err(DecompressError::OutputTooSmall { .. })
        ));
    }
}
