//! udping - UDP round-trip latency probe
//!
//! This library provides an echo responder that bounces every datagram back to
//! its sender, and a probe client that sends sequenced, timestamped packets and
//! aggregates loss, RTT and jitter from the echoed replies.

pub mod client;
pub mod protocol;
pub mod server;
pub mod shutdown;

pub use shutdown::ShutdownSignal;
