use thiserror::Error;

/// Protocol-level errors for packet encoding/decoding
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("Malformed packet: expected at least {expected} bytes, got {actual}")]
    MalformedPacket { expected: usize, actual: usize },
}

pub type Result<T> = std::result::Result<T, ProtocolError>;
