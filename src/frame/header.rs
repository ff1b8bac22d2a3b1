use std::{convert::TryInto, hash::Hasher, mem::size_of};

use twox_hash::XxHash32;

use super::Error;

mod flags {
    pub const VERSION_MASK: u8 = 0b1100_0000;
    pub const SUPPORTED_VERSION: u8 = 0b0100_0000;
    pub const RESERVED_FLG: u8 = 0b0000_0010;
    pub const BLOCK_SIZE_MASK: u8 = 0b0111_0000;
    pub const BLOCK_SIZE_MASK_RSHIFT: u8 = 4;
    pub const RESERVED_BD: u8 = 0b1000_1111;

    pub const INDEPENDENT_BLOCKS: u8 = 0b0010_0000;
    pub const BLOCK_CHECKSUMS: u8 = 0b0001_0000;
    pub const CONTENT_SIZE: u8 = 0b0000_1000;
    pub const CONTENT_CHECKSUM: u8 = 0b0000_0100;
    pub const DICTIONARY_ID: u8 = 0b0000_0001;

    pub const UNCOMPRESSED_SIZE: u32 = 0xF000_0000;
}

/// Magic number every LZ4 frame begins with.
pub(crate) const MAGIC_NUMBER: u32 = 0x184D_2204;

/// FLG + BD + HC, with no optional fields present.
pub(crate) const MIN_FRAME_INFO_SIZE: usize = 3;
/// FLG + BD + ContentSize(8) + DictID(4) + HC, the largest the descriptor can be.
pub(crate) const MAX_FRAME_INFO_SIZE: usize = 3 + 8 + 4;

/// How many bytes make up a block's length prefix.
pub(crate) const BLOCK_INFO_SIZE: usize = size_of::<u32>();

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum BlockSize {
    Max64KB = 4,
    Max256KB = 5,
    Max1MB = 6,
    Max4MB = 7,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum BlockMode {
    Independent,
    Linked,
}

impl BlockSize {
    pub fn get_size(&self) -> usize {
        match self {
            BlockSize::Max64KB => 64 * 1024,
            BlockSize::Max256KB => 256 * 1024,
            BlockSize::Max1MB => 1024 * 1024,
            BlockSize::Max4MB => 4 * 1024 * 1024,
        }
    }
}

/// Frame Descriptor
///
/// ```text
/// FLG     BD      (Content Size)  (Dictionary ID)     HC
/// 1 byte  1 byte  0 - 8 bytes     0 - 4 bytes         1 byte
/// ```
#[derive(Debug, Clone)]
pub struct FrameInfo {
    pub content_size: Option<u64>,
    pub dict_id: Option<u32>,
    pub block_size: BlockSize,
    pub block_mode: BlockMode,
    pub block_checksums: bool,
    pub content_checksum: bool,
}

impl FrameInfo {
    /// Computes the full size of the descriptor (including the trailing checksum byte) from
    /// its first (FLG) byte alone.
    pub(crate) fn read_size(buf: &[u8]) -> Result<usize, Error> {
        let flg = buf[0];
        let mut required = 2 + 1; // FLG + BD + HC
        if flg & flags::CONTENT_SIZE != 0 {
            required += 8;
        }
        if flg & flags::DICTIONARY_ID != 0 {
            required += 4;
        }
        Ok(required)
    }

    /// Parses a complete descriptor, `buffer` being exactly the bytes `read_size` reported,
    /// including the trailing header checksum byte, and verifies that checksum.
    pub(crate) fn read(buffer: &[u8]) -> Result<FrameInfo, Error> {
        let (body, checksum_byte) = buffer.split_at(buffer.len() - 1);
        let flag_byte = body[0];
        let bd_byte = body[1];

        // Validate the descriptor's own fields before trusting its checksum: a corrupt
        // version/reserved/block-size byte should be reported as such even when the header
        // checksum also happens to be wrong, matching the reference decoder's check order.
        if flag_byte & flags::VERSION_MASK != flags::SUPPORTED_VERSION {
            return Err(Error::BadVersion(flag_byte & flags::VERSION_MASK));
        }
        if flag_byte & flags::RESERVED_FLG != 0 {
            return Err(Error::ReservedBitsSet);
        }
        if bd_byte & flags::RESERVED_BD != 0 {
            return Err(Error::ReservedBitsSet);
        }
        let block_size = match (bd_byte & flags::BLOCK_SIZE_MASK) >> flags::BLOCK_SIZE_MASK_RSHIFT {
            i @ 0..=3 => return Err(Error::BadBlockMaxSize(i)),
            4 => BlockSize::Max64KB,
            5 => BlockSize::Max256KB,
            6 => BlockSize::Max1MB,
            7 => BlockSize::Max4MB,
            _ => unreachable!(),
        };

        let expected = checksum_byte[0];
        let mut hasher = XxHash32::with_seed(0);
        hasher.write(body);
        let actual = ((hasher.finish() as u32) >> 8) as u8;
        if actual != expected {
            return Err(Error::HeaderChecksumMismatch);
        }

        let block_mode = if flag_byte & flags::INDEPENDENT_BLOCKS != 0 {
            BlockMode::Independent
        } else {
            BlockMode::Linked
        };
        let content_checksum = flag_byte & flags::CONTENT_CHECKSUM != 0;
        let block_checksums = flag_byte & flags::BLOCK_CHECKSUMS != 0;

        let mut rest = &body[2..];
        let mut content_size = None;
        if flag_byte & flags::CONTENT_SIZE != 0 {
            let (bytes, tail) = rest.split_at(size_of::<u64>());
            content_size = Some(u64::from_le_bytes(bytes.try_into().unwrap()));
            rest = tail;
        }

        let mut dict_id = None;
        if flag_byte & flags::DICTIONARY_ID != 0 {
            let (bytes, _tail) = rest.split_at(size_of::<u32>());
            dict_id = Some(u32::from_le_bytes(bytes.try_into().unwrap()));
        }
        if dict_id.is_some() {
            return Err(Error::UnsupportedDictId);
        }

        Ok(FrameInfo {
            block_mode,
            block_size,
            content_size,
            dict_id,
            block_checksums,
            content_checksum,
        })
    }
}

pub(crate) enum BlockInfo {
    Compressed(usize),
    Uncompressed(usize),
    EndMark,
}

impl BlockInfo {
    pub(crate) fn read(input: &[u8; BLOCK_INFO_SIZE]) -> Self {
        let size = u32::from_le_bytes(*input);
        if size == 0 {
            BlockInfo::EndMark
        } else if size & flags::UNCOMPRESSED_SIZE != 0 {
            BlockInfo::Uncompressed((size & !flags::UNCOMPRESSED_SIZE) as usize)
        } else {
            BlockInfo::Compressed(size as usize)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::hash::Hasher;

    fn descriptor(flg: u8, bd: u8, content_size: Option<u64>) -> Vec<u8> {
        let mut body = vec![flg, bd];
        if let Some(cs) = content_size {
            body.extend_from_slice(&cs.to_le_bytes());
        }
        let mut hasher = XxHash32::with_seed(0);
        hasher.write(&body);
        let hc = ((hasher.finish() as u32) >> 8) as u8;
        body.push(hc);
        body
    }

    #[test]
    fn minimal_descriptor_round_trips() {
        // version 01, independent blocks, block size 64KB, no optional fields.
        let flg = 0b0100_0000 | 0b0010_0000;
        let bd = 4 << 4;
        let buf = descriptor(flg, bd, None);
        let info = FrameInfo::read(&buf).unwrap();
        assert_eq!(info.block_mode, BlockMode::Independent);
        assert_eq!(info.block_size, BlockSize::Max64KB);
        assert!(!info.content_checksum);
        assert!(info.content_size.is_none());
    }

    #[test]
    fn content_size_is_parsed() {
        let flg = 0b0100_0000 | 0b0010_0000 | flags::CONTENT_SIZE;
        let bd = 6 << 4;
        let buf = descriptor(flg, bd, Some(12345));
        let info = FrameInfo::read(&buf).unwrap();
        assert_eq!(info.content_size, Some(12345));
        assert_eq!(info.block_size, BlockSize::Max1MB);
    }

    #[test]
    fn corrupted_checksum_is_rejected() {
        let flg = 0b0100_0000 | 0b0010_0000;
        let bd = 4 << 4;
        let mut buf = descriptor(flg, bd, None);
        let last = buf.len() - 1;
        buf[last] ^= 0xFF;
        assert!(matches!(
            FrameInfo::read(&buf),
            Err(Error::HeaderChecksumMismatch)
        ));
    }

    #[test]
    fn bad_version_is_rejected() {
        let flg = 0b1000_0000 | 0b0010_0000;
        let bd = 4 << 4;
        let buf = descriptor(flg, bd, None);
        assert!(matches!(FrameInfo::read(&buf), Err(Error::BadVersion(_))));
    }

    #[test]
    fn bad_version_wins_over_wrong_checksum() {
        // All-zero descriptor: version bits are 0 (unsupported) and the HC byte (0x00) does
        // not match the real checksum of `[0x00, 0x00]` (0x6A). Version must be reported.
        let buf = [0x00, 0x00, 0x00];
        assert!(matches!(FrameInfo::read(&buf), Err(Error::BadVersion(_))));
    }

    #[test]
    fn wrong_checksum_is_reported_when_fields_are_valid() {
        // Valid version/reserved/block-size bits, but a deliberately wrong HC byte.
        let buf = [0x40, 0x40, 0xFF];
        assert!(matches!(
            FrameInfo::read(&buf),
            Err(Error::HeaderChecksumMismatch)
        ));
    }

    #[test]
    fn reserved_flg_bit_is_rejected() {
        let flg = 0b0100_0000 | 0b0010_0000 | flags::RESERVED_FLG;
        let bd = 4 << 4;
        let buf = descriptor(flg, bd, None);
        assert!(matches!(FrameInfo::read(&buf), Err(Error::ReservedBitsSet)));
    }

    #[test]
    fn reserved_bd_bit_is_rejected() {
        let flg = 0b0100_0000 | 0b0010_0000;
        let bd = (4 << 4) | 0x01;
        let buf = descriptor(flg, bd, None);
        assert!(matches!(FrameInfo::read(&buf), Err(Error::ReservedBitsSet)));
    }

    #[test]
    fn unrecognized_block_size_is_rejected() {
        let flg = 0b0100_0000 | 0b0010_0000;
        let bd = 2 << 4;
        let buf = descriptor(flg, bd, None);
        assert!(matches!(
            FrameInfo::read(&buf),
            Err(Error::BadBlockMaxSize(2))
        ));
    }

    #[test]
    fn dict_id_is_unsupported() {
        let flg = 0b0100_0000 | 0b0010_0000 | flags::DICTIONARY_ID;
        let bd = 4 << 4;
        let mut body = vec![flg, bd];
        body.extend_from_slice(&42u32.to_le_bytes());
        let mut hasher = XxHash32::with_seed(0);
        hasher.write(&body);
        let hc = ((hasher.finish() as u32) >> 8) as u8;
        body.push(hc);
        assert!(matches!(
            FrameInfo::read(&body),
            Err(Error::UnsupportedDictId)
        ));
    }

    #[test]
    fn block_info_end_mark() {
        assert!(matches!(BlockInfo::read(&0u32.to_le_bytes()), BlockInfo::EndMark));
    }

    #[test]
    fn block_info_uncompressed_flag() {
        let raw = (0x1000u32 | flags::UNCOMPRESSED_SIZE).to_le_bytes();
        match BlockInfo::read(&raw) {
            BlockInfo::Uncompressed(len) => assert_eq!(len, 0x1000),
            _ => panic!("expected Uncompressed"),
        }
    }

    #[test]
    fn block_info_compressed() {
        let raw = 0x2000u32.to_le_bytes();
        match BlockInfo::read(&raw) {
            BlockInfo::Compressed(len) => assert_eq!(len, 0x2000),
            _ => panic!("expected Compressed"),
        }
    }
}
