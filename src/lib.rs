/*! A pure Rust, `forbid(unsafe_code)` decoder for the [LZ4 frame format](
https://github.com/lz4/lz4/blob/dev/doc/lz4_Frame_format.md).

This crate only decodes; it does not compress. It exposes two layers:

- [`block`] decodes a single LZ4 block's sequence stream (the raw, headerless format).
- [`frame`] decodes the full frame container: magic number, frame descriptor, one or more
  blocks, and the optional checksums, via [`frame::decompress`] or the streaming
  [`frame::FrameDecoder`].

# Examples
```no_run
use std::io::Read;

let compressed = std::fs::read("datafile.lz4").unwrap();
let decompressed = lz4_frame_decoder::frame::decompress(&compressed).unwrap();
```

```no_run
use std::io::Read;

let compressed = std::fs::File::open("datafile.lz4").unwrap();
let mut decoder = lz4_frame_decoder::frame::FrameDecoder::new(compressed);
let mut out = Vec::new();
decoder.read_to_end(&mut out).unwrap();
```
*/
#![forbid(unsafe_code)]

pub mod block;
pub mod frame;
mod sink;

pub use frame::{decompress, decompress_into, Error};
