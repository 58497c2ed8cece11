use crate::client::constants::*;
use crate::client::error::{ClientError, Result};
use crate::client::logging::validate_log_level;
use crate::client::prober::ProbeOptions;
use clap::Parser;
use std::time::Duration;
use tracing::debug;

#[derive(Parser, Debug, Clone)]
#[command(name = "udping-client")]
#[command(about = "Send timestamped UDP probes and report loss and round-trip time")]
pub struct Config {
    /// Echo server as host:port, or a bare host when --port is given
    #[arg(long, default_value = "127.0.0.1:9000")]
    pub server: String,

    /// Echo server port (overrides any port in --server)
    #[arg(long)]
    pub port: Option<u16>,

    /// Delay between probes in milliseconds
    #[arg(long, default_value_t = DEFAULT_SEND_INTERVAL_MS)]
    pub interval_ms: u64,

    /// Socket read timeout in milliseconds
    #[arg(long, default_value_t = DEFAULT_READ_TIMEOUT_MS)]
    pub timeout_ms: u64,

    /// Minimum time between summaries in milliseconds
    #[arg(long, default_value_t = DEFAULT_REPORT_INTERVAL_MS)]
    pub report_interval_ms: u64,

    /// Stop after sending this many probes (runs forever when omitted)
    #[arg(long)]
    pub count: Option<u32>,

    /// Reset statistics after every summary instead of accumulating
    #[arg(long)]
    pub reset_window: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Log format (text or json)
    #[arg(long, default_value = "text", value_parser = ["text", "json"])]
    pub log_format: String,
}

impl Config {
    /// Returns the remote address as `host:port`
    pub fn address(&self) -> Result<String> {
        match self.port {
            Some(port) => {
                let host = self.server.trim_start_matches('[').trim_end_matches(']');
                if host.contains(':') {
                    Ok(format!("[{}]:{}", host, port))
                } else {
                    Ok(format!("{}:{}", host, port))
                }
            }
            None => {
                let port_ok = self
                    .server
                    .rsplit_once(':')
                    .map(|(host, port)| !host.is_empty() && port.parse::<u16>().is_ok())
                    .unwrap_or(false);
                if port_ok {
                    Ok(self.server.clone())
                } else {
                    Err(ClientError::Config(format!(
                        "server '{}' needs a port (host:port or --port)",
                        self.server
                    )))
                }
            }
        }
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    /// Returns the configured timeout as a Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn report_interval(&self) -> Duration {
        Duration::from_millis(self.report_interval_ms)
    }

    /// Returns true if JSON format logging is enabled
    pub fn is_json_format(&self) -> bool {
        self.log_format.to_lowercase() == "json"
    }

    pub fn probe_options(&self) -> ProbeOptions {
        ProbeOptions {
            send_interval: self.interval(),
            read_timeout: self.timeout(),
            report_interval: self.report_interval(),
            count: self.count,
            reset_window: self.reset_window,
        }
    }

    /// Validates the configuration values
    pub fn validate(&self) -> Result<()> {
        debug!("Validating configuration");
        if self.port == Some(0) {
            return Err(ClientError::Config("port must be > 0".into()));
        }
        self.address()?;
        if self.interval_ms == 0 {
            return Err(ClientError::Config("interval must be > 0".into()));
        }
        if self.timeout_ms == 0 {
            return Err(ClientError::Config("timeout must be > 0".into()));
        }
        if self.count == Some(0) {
            return Err(ClientError::Config("count must be > 0".into()));
        }
        validate_log_level(&self.log_level).map_err(ClientError::Config)?;
        debug!("Configuration validated successfully");
        Ok(())
    }
}
