//! Seekable compressed stream container.
//!
//! A [`SeekStream`] layers random-access read/write/seek semantics over a
//! byte store that only supports raw linear I/O. The logical (decompressed)
//! byte stream is split into independently-compressed, length-prefixed
//! chunks, and a sparse checkpoint index maps logical offsets to physical
//! chunk boundaries so a seek never decompresses more than one chunk.
//!
//! The store is anything that implements `Read + Write + Seek`; the stream
//! borrows it for its lifetime and never closes it.

pub mod chunk;
pub mod codec;
pub mod error;
pub mod position;
pub mod stream;

pub use codec::Level;
pub use error::{Error, Result};
pub use position::{CheckpointIndex, Position};
pub use stream::{SeekStream, StreamConfig, DEFAULT_FLUSH_THRESHOLD};
