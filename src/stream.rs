//! The chunking/indexing/seek-resolution engine.
//!
//! A [`SeekStream`] tracks one live cursor in two coordinate systems at
//! once: the physical offset within the store and the virtual offset within
//! the decompressed stream. Reading fills a one-chunk decompression buffer
//! on demand and records a checkpoint per chunk start; writing accumulates
//! bytes and commits them as a new chunk once the auto-flush threshold is
//! reached. Seeks resolve through the checkpoint index, so a within-chunk
//! seek costs one chunk of decompression rather than a scan from the start.

use std::io::{self, Read, Seek, SeekFrom, Write};

use log::{debug, trace};

use crate::chunk::{self, Prefix, LEN_PREFIX_SIZE};
use crate::codec::{self, Level};
use crate::position::{CheckpointIndex, Position};
use crate::{Error, Result};

/// Auto-flush threshold applied when none is configured.
pub const DEFAULT_FLUSH_THRESHOLD: usize = 32 * 1024;

/// Construction-time configuration for a [`SeekStream`].
#[derive(Debug, Clone, Copy)]
pub struct StreamConfig {
    pub level: Level,
    /// Pending write bytes that trigger an automatic flush. Zero selects
    /// [`DEFAULT_FLUSH_THRESHOLD`].
    pub flush_threshold: usize,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            level: Level::Default,
            flush_threshold: DEFAULT_FLUSH_THRESHOLD,
        }
    }
}

// Live mode, derived from buffer occupancy so it can never drift from the
// buffers themselves. The poisoned state is the separate sticky fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// No buffered data in either direction.
    Fresh,
    /// The read buffer holds undelivered chunk bytes.
    Reading,
    /// The write buffer holds uncommitted bytes.
    Writing,
}

/// Seekable compressed stream over a random-access byte store.
///
/// The stream does not own the store: construction borrows an already-open
/// store positioned anywhere, and [`SeekStream::into_inner`] hands it back.
/// While a stream is live it must be the sole user of the store's cursor.
pub struct SeekStream<S> {
    store: S,
    level: Level,
    flush_threshold: usize,
    idx: CheckpointIndex,
    pos: Position,
    end_phys: u64,
    // Unknown until a forward scan reaches end_phys or is seeded at
    // construction for an empty store; memoized afterward.
    end_virt: Option<u64>,
    read_buf: Vec<u8>,
    read_off: usize,
    write_buf: Vec<u8>,
    fault: Option<Error>,
}

impl<S: Read + Write + Seek> SeekStream<S> {
    /// Open a stream with the default level and auto-flush threshold.
    pub fn new(store: S) -> Result<Self> {
        Self::with_config(store, StreamConfig::default())
    }

    /// Open a stream with a specific compression level.
    pub fn with_level(store: S, level: Level) -> Result<Self> {
        Self::with_config(
            store,
            StreamConfig {
                level,
                ..StreamConfig::default()
            },
        )
    }

    /// Open a stream over an already-open store. The store's length seeds
    /// the physical end marker, after which the store is rewound to its
    /// start.
    pub fn with_config(mut store: S, config: StreamConfig) -> Result<Self> {
        let flush_threshold = if config.flush_threshold == 0 {
            DEFAULT_FLUSH_THRESHOLD
        } else {
            config.flush_threshold
        };

        let end_phys = store.seek(SeekFrom::End(0))?;
        store.seek(SeekFrom::Start(0))?;

        Ok(Self {
            store,
            level: config.level,
            flush_threshold,
            idx: CheckpointIndex::new(),
            pos: Position::ORIGIN,
            end_phys,
            // An empty store trivially has logical length zero.
            end_virt: if end_phys == 0 { Some(0) } else { None },
            read_buf: Vec::new(),
            read_off: 0,
            write_buf: Vec::new(),
            fault: None,
        })
    }

    /// Current virtual offset as seen by the caller, including any pending
    /// unflushed writes.
    pub fn position(&self) -> u64 {
        self.pos.virt
    }

    /// Consume the stream and hand the store back. Pending unflushed writes
    /// are discarded; call [`SeekStream::flush`] or [`SeekStream::close`]
    /// first to commit them.
    pub fn into_inner(self) -> S {
        self.store
    }

    /// Read up to `buf.len()` bytes at the current virtual offset.
    ///
    /// A single call never spans more than one chunk, so it may deliver
    /// fewer bytes than requested even when more data exists; loop or use
    /// `read_exact` for an exact count. Clean end of stream is `Ok(0)`.
    /// A zero-length request performs no I/O.
    pub fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        self.check_fault()?;
        if buf.is_empty() {
            return Ok(0);
        }
        if self.read_remaining() == 0 && !self.fill()? {
            return Ok(0);
        }
        let n = buf.len().min(self.read_remaining());
        buf[..n].copy_from_slice(&self.read_buf[self.read_off..self.read_off + n]);
        self.read_off += n;
        self.pos.virt += n as u64;
        Ok(n)
    }

    /// Append bytes at the logical end of the stream.
    ///
    /// Writing is only permitted when no unread buffered data exists and the
    /// cursor is at the committed end (or a previous write already left
    /// pending bytes); otherwise the call fails with [`Error::EarlyWrite`]
    /// and consumes nothing. Accepted bytes become visible to relative seeks
    /// immediately, before any flush.
    ///
    /// If an automatic flush fails after some bytes were already accepted,
    /// the accepted count is returned and the sticky fault surfaces on the
    /// next operation.
    pub fn write(&mut self, buf: &[u8]) -> Result<usize> {
        self.check_fault()?;
        match self.mode() {
            Mode::Reading => return Err(Error::EarlyWrite),
            Mode::Fresh if self.pos.phys != self.end_phys => return Err(Error::EarlyWrite),
            Mode::Fresh | Mode::Writing => {}
        }

        let mut accepted = 0;
        while accepted < buf.len() {
            let room = self
                .flush_threshold
                .saturating_sub(self.write_buf.len())
                .max(1);
            let take = room.min(buf.len() - accepted);
            self.write_buf
                .extend_from_slice(&buf[accepted..accepted + take]);
            self.pos.virt += take as u64;
            accepted += take;

            if self.write_buf.len() >= self.flush_threshold && self.flush().is_err() {
                // The fault is sticky; report what was accepted and let the
                // next call surface the error.
                return Ok(accepted);
            }
        }
        Ok(accepted)
    }

    /// Commit pending written bytes as one compressed chunk appended at the
    /// physical end of the stream. A no-op when nothing is pending.
    pub fn flush(&mut self) -> Result<()> {
        self.check_fault()?;
        if self.write_buf.is_empty() {
            return Ok(());
        }

        let decompressed = self.write_buf.len() as u64;
        let compressed = match codec::compress(self.level, &self.write_buf) {
            Ok(bytes) => bytes,
            Err(err) => return Err(self.poison(err)),
        };
        let advance = match chunk::write_chunk(&mut self.store, &compressed) {
            Ok(advance) => advance,
            Err(err) => return Err(self.poison(err)),
        };

        // The chunk's decompressed content begins where the pending bytes
        // started, not at the current (already advanced) virtual cursor.
        self.idx.record(Position {
            phys: self.pos.phys,
            virt: self.pos.virt - decompressed,
        });
        self.pos.phys += advance;
        self.end_phys += advance;
        if let Some(end_virt) = self.end_virt {
            self.end_virt = Some(end_virt + decompressed);
        }
        self.write_buf.clear();
        trace!("committed chunk: {decompressed} bytes as {} compressed", compressed.len());
        Ok(())
    }

    /// Seek to a virtual offset. Pending writes are flushed first, so the
    /// resolved offset accounts for them. Returns the absolute virtual
    /// offset on success.
    ///
    /// `SeekFrom::End` triggers a one-time forward scan when the logical
    /// length is not yet known. [`Error::InvalidSeek`] (negative target, or
    /// past a known end) leaves the cursor unchanged.
    pub fn seek(&mut self, target: SeekFrom) -> Result<u64> {
        self.check_fault()?;
        self.flush()?;

        let resolved = match target {
            SeekFrom::Start(offset) => i128::from(offset),
            SeekFrom::Current(delta) => i128::from(self.pos.virt) + i128::from(delta),
            SeekFrom::End(delta) => {
                let end_virt = match self.end_virt {
                    Some(virt) => virt,
                    None => self.scan_to_end()?,
                };
                i128::from(end_virt) + i128::from(delta)
            }
        };
        let target_virt = match u64::try_from(resolved) {
            Ok(virt) if self.end_virt.map_or(true, |end| virt <= end) => virt,
            _ => return Err(Error::InvalidSeek),
        };

        let checkpoint = self.idx.resolve(target_virt);
        debug!(
            "seek to virt {target_virt} via checkpoint phys {} virt {}",
            checkpoint.phys, checkpoint.virt
        );
        if let Err(err) = self.store.seek(SeekFrom::Start(checkpoint.phys)) {
            return Err(self.poison(err.into()));
        }
        self.pos = checkpoint;
        self.read_buf.clear();
        self.read_off = 0;

        self.skip(target_virt - checkpoint.virt)?;
        Ok(target_virt)
    }

    /// Flush pending writes, then poison the stream so every later call
    /// fails with [`Error::Closed`]. The store itself is not closed.
    pub fn close(&mut self) -> Result<()> {
        let result = self.flush();
        self.fault = Some(Error::Closed);
        result
    }

    fn check_fault(&self) -> Result<()> {
        match &self.fault {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    fn poison(&mut self, err: Error) -> Error {
        self.fault = Some(err.clone());
        err
    }

    fn mode(&self) -> Mode {
        if self.read_remaining() > 0 {
            Mode::Reading
        } else if !self.write_buf.is_empty() {
            Mode::Writing
        } else {
            Mode::Fresh
        }
    }

    fn read_remaining(&self) -> usize {
        self.read_buf.len() - self.read_off
    }

    /// Load the next chunk into the read buffer. Returns `false` on clean
    /// end of stream, which is also the moment the logical length becomes
    /// known. End of input anywhere else is corruption and poisons the
    /// stream.
    fn fill(&mut self) -> Result<bool> {
        let prefix = match chunk::read_prefix(&mut self.store) {
            Ok(prefix) => prefix,
            Err(err) => return Err(self.poison(err)),
        };
        let len = match prefix {
            Prefix::EndOfInput if self.pos.phys == self.end_phys => {
                // Lazy end-of-stream discovery completes here. Pending
                // writes are not committed yet and do not count.
                self.end_virt = Some(self.pos.virt - self.write_buf.len() as u64);
                return Ok(false);
            }
            Prefix::EndOfInput => return Err(self.poison(Error::UnexpectedEof)),
            Prefix::Len(len) => len,
        };

        // A body extending past the committed physical end can never be
        // satisfied; fail before decompressing anything.
        let body_end = self
            .pos
            .phys
            .checked_add(LEN_PREFIX_SIZE)
            .and_then(|p| p.checked_add(len))
            .filter(|&end| end <= self.end_phys);
        let body_end = match body_end {
            Some(end) => end,
            None => return Err(self.poison(Error::UnexpectedEof)),
        };

        self.idx.record(self.pos);
        self.read_buf.clear();
        self.read_off = 0;
        if let Err(err) = codec::decompress_into(&mut self.store, len, &mut self.read_buf) {
            return Err(self.poison(err));
        }
        self.pos.phys = body_end;
        Ok(true)
    }

    /// Discover the logical length by scanning forward chunk by chunk from
    /// the current position. Only called with no pending writes, so the
    /// virtual cursor at clean end of input is the logical length itself.
    fn scan_to_end(&mut self) -> Result<u64> {
        loop {
            self.pos.virt += self.read_remaining() as u64;
            self.read_buf.clear();
            self.read_off = 0;
            if !self.fill()? {
                return Ok(self.pos.virt);
            }
        }
    }

    /// Read and discard exactly `remaining` bytes through the normal read
    /// path. Running out of data means the seek target does not exist.
    fn skip(&mut self, mut remaining: u64) -> Result<()> {
        let mut scratch = [0u8; 4096];
        while remaining > 0 {
            let want = remaining.min(scratch.len() as u64) as usize;
            let n = self.read(&mut scratch[..want])?;
            if n == 0 {
                return Err(self.poison(Error::UnexpectedEof));
            }
            remaining -= n as u64;
        }
        Ok(())
    }
}

impl<S: Read + Write + Seek> Read for SeekStream<S> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        SeekStream::read(self, buf).map_err(io::Error::from)
    }
}

impl<S: Read + Write + Seek> Write for SeekStream<S> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        SeekStream::write(self, buf).map_err(io::Error::from)
    }

    fn flush(&mut self) -> io::Result<()> {
        SeekStream::flush(self).map_err(io::Error::from)
    }
}

impl<S: Read + Write + Seek> Seek for SeekStream<S> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        SeekStream::seek(self, pos).map_err(io::Error::from)
    }
}
