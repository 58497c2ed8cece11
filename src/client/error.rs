use crate::protocol::ProtocolError;
use std::io::ErrorKind;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Network I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to connect to {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to send probe: {0}")]
    Write(#[source] std::io::Error),

    #[error("Statistics error: {0}")]
    Statistics(String),

    #[error("Worker thread failed: {0}")]
    Thread(String),
}

impl ClientError {
    /// True for a read that hit its deadline without data.
    ///
    /// Unix reports an expired `SO_RCVTIMEO` as `WouldBlock`, Windows as
    /// `TimedOut`.
    pub fn is_timeout(&self) -> bool {
        match self {
            ClientError::Io(e) => matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_classification() {
        assert!(ClientError::Io(ErrorKind::WouldBlock.into()).is_timeout());
        assert!(ClientError::Io(ErrorKind::TimedOut.into()).is_timeout());
        assert!(!ClientError::Io(ErrorKind::ConnectionRefused.into()).is_timeout());
        assert!(!ClientError::Write(ErrorKind::TimedOut.into()).is_timeout());
    }
}
