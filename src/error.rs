use std::io;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("config error: {0}")]
    Config(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("buffer overflow: need {needed} bytes, {available} available")]
    BufferOverflow { needed: usize, available: usize },

    #[error("buffer underflow: need {needed} bytes, {available} available")]
    Underflow { needed: usize, available: usize },

    #[error("malformed packet: {0}")]
    MalformedPacket(String),

    #[error("invalid prefix length {0} (must be 0-128)")]
    InvalidPrefixLength(u8),

    #[error("invalid address string: {0}")]
    InvalidAddressString(String),
}

pub type Result<T> = std::result::Result<T, Error>;
