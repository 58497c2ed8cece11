//! Probe packet wire format.
//!
//! ```text
//!  0       4                      12
//!  +-------+-----------------------+
//!  |  seq  |        sent_at        |
//!  +-------+-----------------------+
//! ```
//!
//! `seq` is an `i32` and `sent_at` an `i64` holding milliseconds since the Unix
//! epoch, both little-endian. There is no header, version or checksum: the
//! whole datagram payload is the packet.

use crate::protocol::error::{ProtocolError, Result};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::debug;

/// Size of an encoded probe packet in bytes
pub const PACKET_SIZE: usize = 12;

/// Largest datagram either side reads; longer payloads are truncated by the OS
pub const MAX_DATAGRAM_SIZE: usize = 4096;

const SEQ_LEN: usize = 4;

/// Current wall-clock time in milliseconds since the Unix epoch.
pub fn epoch_millis() -> i64 {
    match SystemTime::now().duration_since(UNIX_EPOCH) {
        Ok(d) => d.as_millis() as i64,
        // Clock set before 1970
        Err(e) => -(e.duration().as_millis() as i64),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbePacket {
    pub sequence: i32,
    pub sent_at: i64,
}

impl ProbePacket {
    /// Build a packet stamped with the current time
    pub fn new(sequence: i32) -> Self {
        Self::with_timestamp(sequence, epoch_millis())
    }

    pub fn with_timestamp(sequence: i32, sent_at: i64) -> Self {
        Self { sequence, sent_at }
    }

    pub fn encode(&self) -> [u8; PACKET_SIZE] {
        let mut buf = [0u8; PACKET_SIZE];
        buf[..SEQ_LEN].copy_from_slice(&self.sequence.to_le_bytes());
        buf[SEQ_LEN..].copy_from_slice(&self.sent_at.to_le_bytes());
        buf
    }

    /// Decode the first [`PACKET_SIZE`] bytes of `bytes`, ignoring the rest.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < PACKET_SIZE {
            debug!(
                expected = PACKET_SIZE,
                actual = bytes.len(),
                "Invalid packet size"
            );
            return Err(ProtocolError::MalformedPacket {
                expected: PACKET_SIZE,
                actual: bytes.len(),
            });
        }

        let mut seq = [0u8; SEQ_LEN];
        seq.copy_from_slice(&bytes[..SEQ_LEN]);
        let mut ts = [0u8; PACKET_SIZE - SEQ_LEN];
        ts.copy_from_slice(&bytes[SEQ_LEN..PACKET_SIZE]);

        Ok(ProbePacket {
            sequence: i32::from_le_bytes(seq),
            sent_at: i64::from_le_bytes(ts),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_packet_encode_decode() {
        let original = ProbePacket::with_timestamp(12345, 1_700_000_000_123);
        let encoded = original.encode();
        let decoded = ProbePacket::decode(&encoded).unwrap();
        assert_eq!(original, decoded);
    }

    #[test]
    fn test_packet_layout_is_little_endian() {
        let packet = ProbePacket::with_timestamp(1, 0x0102_0304_0506_0708);
        let encoded = packet.encode();
        assert_eq!(
            encoded,
            [1, 0, 0, 0, 0x08, 0x07, 0x06, 0x05, 0x04, 0x03, 0x02, 0x01]
        );
    }

    #[test]
    fn test_packet_invalid_size() {
        let buf = [0u8; 4];
        assert_eq!(
            ProbePacket::decode(&buf),
            Err(ProtocolError::MalformedPacket {
                expected: PACKET_SIZE,
                actual: 4
            })
        );
        assert!(ProbePacket::decode(&[]).is_err());
        assert!(ProbePacket::decode(&[0u8; PACKET_SIZE - 1]).is_err());
    }

    #[test]
    fn test_packet_trailing_bytes_ignored() {
        let packet = ProbePacket::with_timestamp(7, 42);
        let mut buf = packet.encode().to_vec();
        buf.extend_from_slice(&[0xff; 20]);
        assert_eq!(ProbePacket::decode(&buf).unwrap(), packet);
    }

    #[test]
    fn test_new_captures_current_time() {
        let before = epoch_millis();
        let packet = ProbePacket::new(1);
        let after = epoch_millis();
        assert!(packet.sent_at >= before && packet.sent_at <= after);
    }
}
