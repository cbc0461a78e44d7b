use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while configuring the tuner, streaming IQ data or writing audio
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid address '{addr}': {source}")]
    Address {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to connect to {addr}: {source}")]
    Connection {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("short write for command 0x{opcode:02x}: sent {written} of 5 bytes")]
    ProtocolWrite { opcode: u8, written: usize },

    #[error("stream integrity error: expected {expected} bytes, received {received}")]
    StreamIntegrity { expected: usize, received: usize },

    #[error("stream integrity error: odd IQ buffer of {len} bytes leaves an unpaired byte")]
    OddLength { len: usize },

    #[error("failed to write audio to {}: {source}", path.display())]
    OutputWrite {
        path: PathBuf,
        #[source]
        source: hound::Error,
    },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Error::Config(msg.into())
    }
}
