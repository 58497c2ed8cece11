//! Server module for the udping echo responder

pub mod config;
pub mod error;
pub mod monitor;
pub mod responder;

pub use config::ServerConfig;
pub use error::{Result, ServerError};
pub use monitor::{ServerCounters, ServerMonitor, ServerStats};
pub use responder::EchoResponder;
