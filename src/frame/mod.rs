//! LZ4 Frame Format
//!
//! As defined in <https://github.com/lz4/lz4/blob/dev/doc/lz4_Frame_format.md>
//!
//! This module only decodes frames; there is no encoder in this crate.

use std::{
    fmt,
    io::{self, Read},
};

pub(crate) mod decompress;
pub(crate) mod header;

pub use decompress::FrameDecoder;
pub use header::{BlockMode, BlockSize, FrameInfo};

/// Errors that can occur while parsing or decoding an LZ4 frame.
#[derive(Debug)]
#[non_exhaustive]
pub enum Error {
    /// A block's sequence stream was malformed.
    MalformedSequence(crate::block::DecompressError),
    /// An io error was encountered reading the underlying stream.
    IoError(io::Error),
    /// The frame descriptor names a block size value this decoder does not recognize.
    BadBlockMaxSize(u8),
    /// The frame descriptor's version bits are not the one version this format defines.
    BadVersion(u8),
    /// The first 4 bytes of the stream are not the LZ4 frame magic number.
    BadMagic,
    /// A reserved bit in the frame descriptor is set.
    ReservedBitsSet,
    /// A block's declared size does not fit within the frame's maximum block size.
    BlockTooBig,
    /// The frame descriptor's header checksum does not match its contents.
    HeaderChecksumMismatch,
    /// A block's checksum does not match its decoded contents.
    BlockChecksumMismatch,
    /// The content checksum does not match the full decoded stream.
    ContentChecksumMismatch,
    /// The frame declared a content size that the decoded output did not match.
    ContentLengthMismatch { expected: u64, actual: u64 },
    /// The frame descriptor declares a dictionary ID; external dictionaries are not supported.
    UnsupportedDictId,
}

impl From<Error> for io::Error {
    fn from(e: Error) -> Self {
        io::Error::new(io::ErrorKind::Other, e)
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Error::IoError(e)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::MalformedSequence(e) => write!(f, "malformed block sequence: {e}"),
            Error::IoError(e) => write!(f, "io error: {e}"),
            Error::BadBlockMaxSize(b) => write!(f, "unrecognized block max size bits: {b:#04x}"),
            Error::BadVersion(b) => write!(f, "unsupported frame version bits: {b:#04x}"),
            Error::BadMagic => f.write_str("input does not start with the LZ4 frame magic number"),
            Error::ReservedBitsSet => f.write_str("a reserved bit in the frame descriptor is set"),
            Error::BlockTooBig => f.write_str("block is larger than the frame's maximum block size"),
            Error::HeaderChecksumMismatch => f.write_str("frame header checksum mismatch"),
            Error::BlockChecksumMismatch => f.write_str("block checksum mismatch"),
            Error::ContentChecksumMismatch => f.write_str("content checksum mismatch"),
            Error::ContentLengthMismatch { expected, actual } => write!(
                f,
                "declared content size {expected} does not match decoded size {actual}"
            ),
            Error::UnsupportedDictId => f.write_str("frames with a dictionary ID are not supported"),
        }
    }
}

impl std::error::Error for Error {}

/// Decompresses all bytes of `input` into a new `Vec`.
pub fn decompress(input: &[u8]) -> Result<Vec<u8>, Error> {
    let mut de = FrameDecoder::new(input);
    let mut out = Vec::with_capacity(input.len() * 2);
    de.read_to_end(&mut out)?;
    Ok(out)
}

/// Decompresses `input` into `output`, an arbitrary `io::Write`.
pub fn decompress_into(input: &mut impl Read, output: &mut impl std::io::Write) -> Result<(), Error> {
    let mut de = FrameDecoder::new(input);
    io::copy(&mut de, output)?;
    Ok(())
}
