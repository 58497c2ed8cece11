use crate::client::constants::{ACCEPTABLE_LOSS_PCT, EXCELLENT_LOSS_PCT};
use crate::client::statistics::Summary;
use colored::*;
use std::net::SocketAddr;
use tracing::info;

/// Reporter for printing probe summaries
pub struct Reporter {
    peer: SocketAddr,
}

impl Reporter {
    pub fn new(peer: SocketAddr) -> Self {
        Self { peer }
    }

    /// Colors the loss percentage by severity
    fn color_loss(loss_pct: i64) -> ColoredString {
        let text = format!("{}%", loss_pct);
        if loss_pct <= EXCELLENT_LOSS_PCT {
            text.green()
        } else if loss_pct <= ACCEPTABLE_LOSS_PCT {
            text.yellow()
        } else {
            text.red().bold()
        }
    }

    /// One-line, uncolored rendering of a summary
    pub fn format_summary(&self, summary: &Summary) -> String {
        format!(
            "{} seq {}..{} recv {}/{} loss {}% rtt {}ms (min {} / p50 {} / p99 {} / max {}) jitter {}ms",
            self.peer,
            summary.min_sequence,
            summary.max_sequence,
            summary.packet_count,
            summary.expected(),
            summary.loss_pct,
            summary.smoothed_rtt_ms,
            summary.rtt_min_ms,
            summary.rtt_p50_ms,
            summary.rtt_p99_ms,
            summary.rtt_max_ms,
            summary.jitter_ms,
        )
    }

    /// Print a periodic summary to stdout and log it
    pub fn report(&self, summary: &Summary) {
        info!(
            peer = %self.peer,
            loss_pct = summary.loss_pct,
            packets = summary.packet_count,
            smoothed_rtt_ms = summary.smoothed_rtt_ms,
            jitter_ms = summary.jitter_ms,
            "Probe summary"
        );
        println!(
            "{} {} seq {}..{} recv {}/{} loss {} rtt {} jitter {}",
            "ping".cyan().bold(),
            self.peer,
            summary.min_sequence,
            summary.max_sequence,
            summary.packet_count,
            summary.expected(),
            Self::color_loss(summary.loss_pct),
            format!("{}ms", summary.smoothed_rtt_ms).bold(),
            format!("{}ms", summary.jitter_ms).dimmed(),
        );
    }

    /// Print the final totals when a bounded run ends
    pub fn report_final(&self, probes_sent: u32, summary: Option<&Summary>) {
        println!();
        println!("{}", "=== udping results ===".bold());
        println!("Probes sent: {}", probes_sent);
        match summary {
            Some(summary) => println!("{}", self.format_summary(summary)),
            None => println!("{}", "No replies received".red().bold()),
        }
    }
}
