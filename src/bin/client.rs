use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};
use udping::client::{init_logging_with_config, Config, ProbeClient, Reporter};

fn main() {
    let config = Config::parse();

    init_logging_with_config(&config.log_level, config.is_json_format());

    if let Err(e) = config.validate() {
        error!(error = %e, "Invalid configuration");
        eprintln!("Configuration error: {}", e);
        std::process::exit(1);
    }

    if let Err(e) = run(config) {
        error!(error = %e, "Client failed");
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(config: Config) -> Result<()> {
    let addr = config.address()?;
    let client = ProbeClient::connect(&addr, config.probe_options())
        .with_context(|| format!("Cannot probe {}", addr))?;

    let reporter = Reporter::new(client.peer_addr());
    let peer = client.peer_addr();
    let handle = client.spawn(move |summary| reporter.report(summary))?;

    info!(peer = %peer, count = ?config.count, "Probing");
    let outcome = handle.join()?;

    Reporter::new(peer).report_final(outcome.probes_sent, outcome.summary.as_ref());
    Ok(())
}
