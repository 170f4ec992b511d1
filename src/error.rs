use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    // I/O errors
    #[error("error reading input: {0}")]
    InputRead(#[source] std::io::Error),

    #[error("error writing output: {0}")]
    OutputWrite(#[source] std::io::Error),

    // Configuration errors
    #[error("Invalid compression level: {0} (expected 0-9)")]
    InvalidCompressionLevel(u8),

    #[error("Invalid memory level: {0} (expected 1-9)")]
    InvalidMemoryLevel(u8),

    #[error("Invalid block size: {0} (must be at least 1 byte)")]
    InvalidBlockSize(usize),

    // Stream state errors
    #[error("Stream already finished: no further input or flushes accepted")]
    StreamFinished,

    #[error("Stream aborted after an output error: no further input or flushes accepted")]
    StreamAborted,

    // Internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Whether this error came from the input or output side rather than the configuration
    pub fn is_io(&self) -> bool {
        matches!(self, Error::InputRead(_) | Error::OutputWrite(_))
    }
}

impl From<Error> for std::io::Error {
    fn from(err: Error) -> Self {
        match err {
            Error::InputRead(e) | Error::OutputWrite(e) => e,
            Error::InvalidCompressionLevel(_)
            | Error::InvalidMemoryLevel(_)
            | Error::InvalidBlockSize(_) => {
                std::io::Error::new(std::io::ErrorKind::InvalidInput, err)
            }
            other => std::io::Error::new(std::io::ErrorKind::Other, other),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
