use anyhow::Result;
use clap::Parser;
use tracing::{error, info};
use udping::client::init_logging_with_config;
use udping::server::{EchoResponder, ServerConfig, ServerMonitor};
use udping::ShutdownSignal;

fn main() {
    // Parse CLI arguments
    let config = ServerConfig::parse();

    // Initialize structured logging with config options
    init_logging_with_config(&config.log_level, config.is_json_format());

    // Validate configuration
    if let Err(e) = config.validate() {
        error!(error = %e, "Invalid configuration");
        eprintln!("Configuration error: {}", e);
        std::process::exit(1);
    }

    if let Err(e) = run(config) {
        error!(error = %e, "Server failed");
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(config: ServerConfig) -> Result<()> {
    let monitor = ServerMonitor::new(config.update_interval);
    let responder = EchoResponder::bind(&config.address())?.with_counters(monitor.counters());

    // Nothing triggers this; the process runs until killed or a fatal echo error
    let shutdown = ShutdownSignal::new();

    let display = if config.quiet {
        info!("Running in quiet mode (status line disabled)");
        None
    } else {
        Some(monitor.start_display(shutdown.clone())?)
    };

    let result = responder.run(&shutdown);

    shutdown.trigger();
    if let Some(display) = display {
        display.join().ok();
    }

    let stats = monitor.stats();
    info!(
        received = stats.packets_received,
        echoed = stats.packets_echoed,
        read_errors = stats.read_errors,
        bytes = stats.bytes_echoed,
        elapsed_secs = stats.elapsed.as_secs(),
        "Echo responder finished"
    );

    Ok(result?)
}
