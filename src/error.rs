use std::fmt;
use std::io;

#[derive(Debug)]
pub enum Error {
    /// Store or codec failure, surfaced unchanged and never retried.
    Io(io::Error),
    /// Seek target resolves to a negative offset or past the known logical end.
    InvalidSeek,
    /// Write attempted while unread buffered data exists, or while the cursor
    /// is not at the committed logical end.
    EarlyWrite,
    /// The store accepted fewer bytes than a flush attempted to write.
    ShortWrite,
    /// End of input inside a chunk's length prefix or compressed body.
    UnexpectedEof,
    /// The stream was closed; every later operation fails with this.
    Closed,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(err) => write!(f, "io error: {err}"),
            Error::InvalidSeek => write!(f, "seek target outside of stream"),
            Error::EarlyWrite => write!(f, "cannot write before end of stream"),
            Error::ShortWrite => write!(f, "store accepted a short write"),
            Error::UnexpectedEof => write!(f, "unexpected end of chunk data"),
            Error::Closed => write!(f, "stream is closed"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            _ => None,
        }
    }
}

// The sticky fault is replayed on every call after the first failure, so the
// error must be reproducible. An io::Error is cloned by kind and message.
impl Clone for Error {
    fn clone(&self) -> Self {
        match self {
            Error::Io(err) => Error::Io(io::Error::new(err.kind(), err.to_string())),
            Error::InvalidSeek => Error::InvalidSeek,
            Error::EarlyWrite => Error::EarlyWrite,
            Error::ShortWrite => Error::ShortWrite,
            Error::UnexpectedEof => Error::UnexpectedEof,
            Error::Closed => Error::Closed,
        }
    }
}

impl From<io::Error> for Error {
    fn from(value: io::Error) -> Self {
        Error::Io(value)
    }
}

impl From<Error> for io::Error {
    fn from(value: Error) -> Self {
        match value {
            Error::Io(err) => err,
            Error::InvalidSeek => io::Error::new(io::ErrorKind::InvalidInput, value),
            Error::ShortWrite => io::Error::new(io::ErrorKind::WriteZero, value),
            Error::UnexpectedEof => io::Error::new(io::ErrorKind::UnexpectedEof, value),
            other => io::Error::new(io::ErrorKind::Other, other),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
