//! Wire chunk format: an 8-byte little-endian length prefix followed by
//! exactly that many codec-compressed bytes. Chunks are laid out
//! back-to-back with no padding, magic number, or trailer.

use std::io::{self, Read, Write};

use crate::{Error, Result};

/// Size of the length prefix preceding every chunk body.
pub const LEN_PREFIX_SIZE: u64 = 8;

/// Outcome of reading a chunk's length prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prefix {
    /// Compressed length of the chunk body that follows.
    Len(u64),
    /// End of input before the first prefix byte. Whether this is a clean
    /// end of stream or corruption depends on the caller's position.
    EndOfInput,
}

/// Read one length prefix from the store's current position. End of input
/// mid-prefix is corruption; the caller decides what a zero-byte end means.
pub fn read_prefix<R: Read>(store: &mut R) -> Result<Prefix> {
    let mut buf = [0u8; LEN_PREFIX_SIZE as usize];
    let mut filled = 0;
    while filled < buf.len() {
        match store.read(&mut buf[filled..]) {
            Ok(0) if filled == 0 => return Ok(Prefix::EndOfInput),
            Ok(0) => return Err(Error::UnexpectedEof),
            Ok(n) => filled += n,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(Error::Io(err)),
        }
    }
    Ok(Prefix::Len(u64::from_le_bytes(buf)))
}

/// Write one chunk (prefix plus compressed body) at the store's current
/// position. Returns the physical bytes consumed on success.
pub fn write_chunk<W: Write>(store: &mut W, compressed: &[u8]) -> Result<u64> {
    let prefix = (compressed.len() as u64).to_le_bytes();
    write_all(store, &prefix)?;
    write_all(store, compressed)?;
    Ok(LEN_PREFIX_SIZE + compressed.len() as u64)
}

// Like io::Write::write_all, but a store that stops accepting bytes is
// reported as ShortWrite rather than a generic WriteZero.
fn write_all<W: Write>(store: &mut W, mut buf: &[u8]) -> Result<()> {
    while !buf.is_empty() {
        match store.write(buf) {
            Ok(0) => return Err(Error::ShortWrite),
            Ok(n) => buf = &buf[n..],
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(Error::Io(err)),
        }
    }
    Ok(())
}
