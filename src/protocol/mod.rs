//! Protocol module for udping

pub mod error;
pub mod message;

pub use error::ProtocolError;
pub use message::{epoch_millis, ProbePacket, MAX_DATAGRAM_SIZE, PACKET_SIZE};
