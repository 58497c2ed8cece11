//! Client module for the udping probe

pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod prober;
pub mod reporter;
pub mod socket;
pub mod statistics;

pub use config::Config;
pub use constants::*;
pub use error::{ClientError, Result};
pub use logging::init_logging_with_config;
pub use prober::{run_receiver, run_sender, ProbeClient, ProbeHandle, ProbeOptions, ProbeOutcome};
pub use reporter::Reporter;
pub use socket::{ProbeSocket, UdpProbeSocket};
pub use statistics::{Statistics, Summary};
