use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// A single register operation that did not produce a usable word.
///
/// These are recovered locally: the poll loop treats them as an absent
/// reading for that field and carries on. Nothing here aborts the loop.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("response timeout")]
    Timeout,

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("CRC checksum mismatch")]
    Crc,

    #[error("link busy: another register operation is in flight")]
    Busy,

    #[error("IO error: {0}")]
    Io(String),
}

impl From<io::Error> for TransportError {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => TransportError::Timeout,
            _ => TransportError::Io(err.to_string()),
        }
    }
}

#[derive(Error, Debug)]
pub enum VfdError {
    /// The serial link could not be opened. Fatal at startup, no retry.
    #[error("connection error: {0}")]
    Connection(String),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("failed to write {path}: {source}")]
    Storage {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

impl From<serialport::Error> for VfdError {
    fn from(err: serialport::Error) -> Self {
        VfdError::Connection(err.to_string())
    }
}
