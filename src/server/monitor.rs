//! Echo traffic counters and the optional status line

use crate::shutdown::ShutdownSignal;
use colored::*;
use std::io::Write;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

#[derive(Debug, Default)]
struct Counters {
    received: AtomicU64,
    echoed: AtomicU64,
    read_errors: AtomicU64,
    bytes: AtomicU64,
}

/// Tracks responder traffic with lock-free counters.
///
/// The echo loop only increments atomics; rendering happens on a separate
/// thread started by [`start_display`](Self::start_display).
pub struct ServerMonitor {
    counters: Arc<Counters>,
    start_time: Instant,
    update_interval: Duration,
}

impl ServerMonitor {
    pub fn new(update_interval_ms: u64) -> Self {
        Self {
            counters: Arc::new(Counters::default()),
            start_time: Instant::now(),
            update_interval: Duration::from_millis(update_interval_ms),
        }
    }

    /// Handle for the echo loop
    pub fn counters(&self) -> ServerCounters {
        ServerCounters {
            inner: Arc::clone(&self.counters),
        }
    }

    /// Redraw a one-line status every update interval until `shutdown`.
    pub fn start_display(&self, shutdown: ShutdownSignal) -> std::io::Result<JoinHandle<()>> {
        let counters = Arc::clone(&self.counters);
        let update_interval = self.update_interval;

        thread::Builder::new()
            .name("udping-monitor".into())
            .spawn(move || {
                let mut last_received = 0u64;
                while !shutdown.wait_timeout(update_interval) {
                    let received = counters.received.load(Ordering::Relaxed);
                    let active = received > last_received;
                    last_received = received;

                    let indicator = if active {
                        "█".green().bold()
                    } else {
                        "░".normal()
                    };
                    print!(
                        "\r{} [{}] Received: {} | Echoed: {} | Read errors: {} | Bytes: {}",
                        indicator,
                        if active { "ACTIVE" } else { "IDLE" },
                        received,
                        counters.echoed.load(Ordering::Relaxed),
                        counters.read_errors.load(Ordering::Relaxed),
                        counters.bytes.load(Ordering::Relaxed),
                    );
                    std::io::stdout().flush().ok();
                }
                println!();
            })
    }

    pub fn stats(&self) -> ServerStats {
        ServerStats {
            packets_received: self.counters.received.load(Ordering::Relaxed),
            packets_echoed: self.counters.echoed.load(Ordering::Relaxed),
            read_errors: self.counters.read_errors.load(Ordering::Relaxed),
            bytes_echoed: self.counters.bytes.load(Ordering::Relaxed),
            elapsed: self.start_time.elapsed(),
        }
    }
}

impl Default for ServerMonitor {
    fn default() -> Self {
        Self::new(1000)
    }
}

/// Cloneable counter handle used by the echo loop
#[derive(Debug, Clone)]
pub struct ServerCounters {
    inner: Arc<Counters>,
}

impl ServerCounters {
    #[inline]
    pub fn increment_received(&self) {
        self.inner.received.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_echo(&self, bytes: usize) {
        self.inner.echoed.fetch_add(1, Ordering::Relaxed);
        self.inner.bytes.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    #[inline]
    pub fn increment_read_error(&self) {
        self.inner.read_errors.fetch_add(1, Ordering::Relaxed);
    }
}

/// Final server statistics.
#[derive(Debug, Clone)]
pub struct ServerStats {
    pub packets_received: u64,
    pub packets_echoed: u64,
    pub read_errors: u64,
    pub bytes_echoed: u64,
    pub elapsed: Duration,
}
