//! Stateless compression codec for chunk bodies, backed by the zlib format.
//! Each chunk is a standalone zlib stream, so any chunk can be decompressed
//! without state from its neighbors.

use std::io::{self, Read, Write};

use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;

use crate::{Error, Result};

/// Compression level applied to every chunk of a stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Level {
    /// No compression; chunks are still zlib-framed so the read path stays
    /// uniform.
    None,
    #[default]
    Default,
    /// Favor speed over ratio.
    Fastest,
    /// Favor ratio over speed.
    Smallest,
}

impl Level {
    fn to_flate2(self) -> Compression {
        match self {
            Level::None => Compression::none(),
            Level::Default => Compression::default(),
            Level::Fastest => Compression::fast(),
            Level::Smallest => Compression::best(),
        }
    }
}

/// Compress `data` as one standalone zlib stream.
pub fn compress(level: Level, data: &[u8]) -> Result<Vec<u8>> {
    let out = Vec::with_capacity(data.len() / 2 + 64);
    let mut encoder = ZlibEncoder::new(out, level.to_flate2());
    encoder.write_all(data)?;
    encoder.finish().map_err(Error::Io)
}

/// Decompress exactly `len` compressed bytes from `src`, appending the
/// decompressed output to `out`. The source is bounded to `len` bytes so
/// decompression cannot read past its chunk.
pub fn decompress_into<R: Read>(src: &mut R, len: u64, out: &mut Vec<u8>) -> Result<()> {
    let mut bounded = src.take(len);
    let mut decoder = ZlibDecoder::new(&mut bounded);
    decoder.read_to_end(out).map_err(|err| match err.kind() {
        io::ErrorKind::UnexpectedEof => Error::UnexpectedEof,
        _ => Error::Io(err),
    })?;
    drop(decoder);
    // The decoder may stop short of the declared chunk length; drain the
    // remainder so the store cursor stays aligned with the tracked offset.
    if bounded.limit() > 0 {
        io::copy(&mut bounded, &mut io::sink())?;
    }
    Ok(())
}
