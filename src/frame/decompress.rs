use std::{fmt, hash::Hasher, io, mem::size_of};
use twox_hash::XxHash32;

use super::header::{
    BlockInfo, BlockMode, FrameInfo, BLOCK_INFO_SIZE, MAGIC_NUMBER, MAX_FRAME_INFO_SIZE,
    MIN_FRAME_INFO_SIZE,
};
use super::Error;
use crate::{block::WINDOW_SIZE, sink::Sink};

/// A reader that decompresses the LZ4 frame format.
///
/// Wraps any other reader implementing `io::Read`; bytes read from a `FrameDecoder` are the
/// decompressed content of the [LZ4 frame](
/// https://github.com/lz4/lz4/blob/dev/doc/lz4_Frame_format.md) read from the inner reader.
///
/// # Example
/// ```no_run
/// use std::io::Read;
/// let compressed = std::fs::File::open("datafile.lz4").unwrap();
/// let mut decoder = lz4_frame_decoder::frame::FrameDecoder::new(compressed);
/// let mut out = Vec::new();
/// decoder.read_to_end(&mut out).unwrap();
/// ```
pub struct FrameDecoder<R: io::Read> {
    /// The underlying reader.
    r: R,
    /// The descriptor of the frame currently being decoded. `None` before the first frame's
    /// descriptor has been read, and again once its end-mark has been consumed.
    current_frame_info: Option<FrameInfo>,
    /// Hasher for the content checksum, when the frame declares one.
    content_hasher: XxHash32,
    /// Total decompressed length seen so far for the current frame.
    content_len: u64,
    /// Buffer for a block's still-compressed bytes.
    src: Vec<u8>,
    /// Buffer for decompressed bytes. In linked mode the trailing `WINDOW_SIZE` bytes of
    /// previously produced output are kept here as the lookback window for later blocks.
    dst: Vec<u8>,
    /// Index into `dst`: start of bytes not yet handed to the caller.
    dst_start: usize,
    /// Index into `dst`: end of bytes not yet handed to the caller.
    dst_end: usize,
}

impl<R: io::Read> FrameDecoder<R> {
    /// Creates a new decoder wrapping `rdr`.
    pub fn new(rdr: R) -> FrameDecoder<R> {
        FrameDecoder {
            r: rdr,
            src: Vec::new(),
            dst: Vec::new(),
            dst_start: 0,
            dst_end: 0,
            current_frame_info: None,
            content_hasher: XxHash32::with_seed(0),
            content_len: 0,
        }
    }

    /// The descriptor of the frame currently being read, if any.
    pub fn frame_info(&self) -> Option<&FrameInfo> {
        self.current_frame_info.as_ref()
    }

    /// Gets a reference to the underlying reader.
    pub fn get_ref(&self) -> &R {
        &self.r
    }

    /// Gets a mutable reference to the underlying reader.
    ///
    /// Mutating the stream out from under the decoder may produce surprising results if the
    /// decoder continues to be used afterwards.
    pub fn get_mut(&mut self) -> &mut R {
        &mut self.r
    }

    fn read_frame_info(&mut self) -> Result<usize, Error> {
        let mut magic_buf = [0u8; size_of::<u32>()];
        match read_or_eof(&mut self.r, &mut magic_buf)? {
            0 => return Ok(0),
            n if n < magic_buf.len() => return Err(io::Error::from(io::ErrorKind::UnexpectedEof).into()),
            _ => {}
        }
        if u32::from_le_bytes(magic_buf) != MAGIC_NUMBER {
            return Err(Error::BadMagic);
        }

        let mut buffer = [0u8; MAX_FRAME_INFO_SIZE];
        self.r.read_exact(&mut buffer[..MIN_FRAME_INFO_SIZE])?;
        let required = FrameInfo::read_size(&buffer[..MIN_FRAME_INFO_SIZE])?;
        if required != MIN_FRAME_INFO_SIZE {
            self.r
                .read_exact(&mut buffer[MIN_FRAME_INFO_SIZE..required])?;
        }
        let frame_info = FrameInfo::read(&buffer[..required])?;

        let max_block_size = frame_info.block_size.get_size();
        let dst_size = if frame_info.block_mode == BlockMode::Linked {
            max_block_size + WINDOW_SIZE
        } else {
            max_block_size
        };
        self.src.clear();
        self.dst.clear();
        self.src.reserve_exact(max_block_size);
        self.dst.reserve_exact(dst_size);
        self.dst.resize(dst_size, 0);
        self.current_frame_info = Some(frame_info);
        self.content_hasher = XxHash32::with_seed(0);
        self.content_len = 0;
        self.dst_start = 0;
        self.dst_end = 0;
        Ok(required + magic_buf.len())
    }

    #[inline]
    fn read_checksum(r: &mut R) -> Result<u32, io::Error> {
        let mut checksum_buffer = [0u8; size_of::<u32>()];
        r.read_exact(&mut checksum_buffer)?;
        Ok(u32::from_le_bytes(checksum_buffer))
    }

    #[inline]
    fn check_block_checksum(data: &[u8], expected_checksum: u32) -> Result<(), Error> {
        let mut hasher = XxHash32::with_seed(0);
        hasher.write(data);
        if hasher.finish() as u32 != expected_checksum {
            return Err(Error::BlockChecksumMismatch);
        }
        Ok(())
    }

    fn read_block(&mut self) -> Result<usize, Error> {
        debug_assert_eq!(self.dst_start, self.dst_end);
        let frame_info = self.current_frame_info.as_ref().unwrap();
        let max_block_size = frame_info.block_size.get_size();
        let linked = frame_info.block_mode == BlockMode::Linked;

        if linked {
            if self.dst_end + max_block_size > self.dst.len() {
                let carry = self.dst_end.min(WINDOW_SIZE);
                let start = self.dst_end - carry;
                self.dst.copy_within(start..self.dst_end, 0);
                self.dst_end = carry;
                self.dst_start = carry;
            }
        } else {
            self.dst_start = 0;
            self.dst_end = 0;
        }

        let mut size_buffer = [0u8; BLOCK_INFO_SIZE];
        self.r.read_exact(&mut size_buffer)?;
        let block_info = BlockInfo::read(&size_buffer);

        match block_info {
            BlockInfo::Uncompressed(len) => {
                if len > max_block_size {
                    return Err(Error::BlockTooBig);
                }
                let start = self.dst_end;
                let end = start + len;
                self.r.read_exact(&mut self.dst[start..end])?;
                if frame_info.block_checksums {
                    let expected = Self::read_checksum(&mut self.r)?;
                    Self::check_block_checksum(&self.dst[start..end], expected)?;
                }
                self.dst_end = end;
                self.content_len += len as u64;
            }
            BlockInfo::Compressed(len) => {
                if len > max_block_size {
                    return Err(Error::BlockTooBig);
                }
                if self.src.len() < len {
                    self.src.resize(len, 0);
                }
                self.r.read_exact(&mut self.src[..len])?;
                if frame_info.block_checksums {
                    let expected = Self::read_checksum(&mut self.r)?;
                    Self::check_block_checksum(&self.src[..len], expected)?;
                }

                let start = self.dst_end;
                let mut sink = Sink::new(&mut self.dst, start);
                let decomp_size = crate::block::decompress::decompress_internal(
                    &self.src[..len],
                    &mut sink,
                )
                .map_err(Error::MalformedSequence)?;

                self.dst_end = start + decomp_size;
                self.content_len += decomp_size as u64;
            }
            BlockInfo::EndMark => {
                if let Some(expected) = frame_info.content_size {
                    if self.content_len != expected {
                        return Err(Error::ContentLengthMismatch {
                            expected,
                            actual: self.content_len,
                        });
                    }
                }
                if frame_info.content_checksum {
                    let expected = Self::read_checksum(&mut self.r)?;
                    if self.content_hasher.finish() as u32 != expected {
                        return Err(Error::ContentChecksumMismatch);
                    }
                }
                self.current_frame_info = None;
                return Ok(0);
            }
        }

        if frame_info.content_checksum {
            self.content_hasher
                .write(&self.dst[self.dst_start..self.dst_end]);
        }

        Ok(self.dst_end - self.dst_start)
    }

    fn read_more(&mut self) -> Result<usize, Error> {
        if self.current_frame_info.is_none() && self.read_frame_info()? == 0 {
            return Ok(0);
        }
        self.read_block()
    }
}

/// Like `read`, but treats a zero-byte first read as a clean EOF rather than requiring the
/// caller to distinguish "no bytes available yet" from "stream is over".
fn read_or_eof(r: &mut impl io::Read, buf: &mut [u8]) -> io::Result<usize> {
    let mut total = 0;
    while total < buf.len() {
        match r.read(&mut buf[total..])? {
            0 => break,
            n => total += n,
        }
    }
    Ok(total)
}

impl<R: io::Read> io::Read for FrameDecoder<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        loop {
            if self.dst_start < self.dst_end {
                let read_len = std::cmp::min(self.dst_end - self.dst_start, buf.len());
                let dst_read_end = self.dst_start + read_len;
                buf[..read_len].copy_from_slice(&self.dst[self.dst_start..dst_read_end]);
                self.dst_start = dst_read_end;
                return Ok(read_len);
            }
            match self.read_more() {
                Ok(0) => return Ok(0),
                Ok(_) => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }
}

impl<R: io::Read> io::BufRead for FrameDecoder<R> {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        if self.dst_start == self.dst_end {
            self.read_more().map_err(io::Error::from)?;
        }
        Ok(&self.dst[self.dst_start..self.dst_end])
    }

    fn consume(&mut self, amt: usize) {
        assert!(amt <= self.dst_end - self.dst_start);
        self.dst_start += amt;
    }
}

impl<R: fmt::Debug + io::Read> fmt::Debug for FrameDecoder<R> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("FrameDecoder")
            .field("r", &self.r)
            .field("content_hasher", &self.content_hasher)
            .field("content_len", &self.content_len)
            .field("dst_start", &self.dst_start)
            .field("dst_end", &self.dst_end)
            .field("current_frame_info", &self.current_frame_info)
            .finish()
    }
}
