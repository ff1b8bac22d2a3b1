//! Command-line decoder: `lz4d [-o OUTPUT] [INPUT]`.
//!
//! Reads an LZ4-framed file (or stdin) and writes the decompressed bytes to a file (or
//! stdout), streaming through [`FrameDecoder`](lz4_frame_decoder::frame::FrameDecoder) so
//! large inputs don't need to be buffered whole.

use std::fs::File;
use std::io::{self, Read, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use argh::FromArgs;

use lz4_frame_decoder::frame::FrameDecoder;

#[derive(FromArgs)]
/// Decompress an LZ4 frame.
struct Options {
    /// input file; reads stdin if omitted
    #[argh(positional)]
    input_file: Option<PathBuf>,

    /// output file; writes stdout if omitted
    #[argh(option, short = 'o')]
    output_file: Option<PathBuf>,

    /// overwrite the output file if it already exists
    #[argh(switch, short = 'f')]
    force: bool,
}

fn main() -> Result<()> {
    let options: Options = argh::from_env();

    let mut input: Box<dyn Read> = match &options.input_file {
        Some(path) => Box::new(
            File::open(path).with_context(|| format!("opening input {}", path.display()))?,
        ),
        None => Box::new(io::stdin()),
    };

    let mut output: Box<dyn Write> = match &options.output_file {
        Some(path) => {
            if path.exists() && !options.force {
                anyhow::bail!("{} already exists, pass -f to overwrite", path.display());
            }
            Box::new(
                File::create(path)
                    .with_context(|| format!("creating output {}", path.display()))?,
            )
        }
        None => Box::new(io::stdout()),
    };

    let mut decoder = FrameDecoder::new(&mut input);
    let written = io::copy(&mut decoder, &mut output).context("decompressing frame")?;
    output.flush()?;
    eprintln!("decompressed {written} bytes");
    Ok(())
}
