//! Constants used throughout the client application

/// Default delay between probes in milliseconds
pub const DEFAULT_SEND_INTERVAL_MS: u64 = 1000;

/// Receiver read deadline in milliseconds
pub const DEFAULT_READ_TIMEOUT_MS: u64 = 1000;

/// Minimum time between two printed summaries in milliseconds
pub const DEFAULT_REPORT_INTERVAL_MS: u64 = 1000;

/// Smoothed RTT weights: new = (old * PREVIOUS + sample * SAMPLE) / TOTAL
pub const RTT_WEIGHT_PREVIOUS: i64 = 8;
pub const RTT_WEIGHT_SAMPLE: i64 = 2;
pub const RTT_WEIGHT_TOTAL: i64 = 10;

/// Jitter gain divisor (RFC 3550 style interarrival jitter)
pub const JITTER_GAIN: i64 = 16;

/// Histogram lower bound in milliseconds
pub const HISTOGRAM_LOW_BOUND_MS: u64 = 1;

/// Histogram upper bound in milliseconds; larger samples saturate
pub const HISTOGRAM_HIGH_BOUND_MS: u64 = 60_000;

/// Histogram significant digits for precision
pub const HISTOGRAM_SIGNIFICANT_DIGITS: u8 = 3;

/// Loss at or below this percentage is shown as healthy
pub const EXCELLENT_LOSS_PCT: i64 = 0;

/// Loss at or below this percentage is shown as degraded, above as bad
pub const ACCEPTABLE_LOSS_PCT: i64 = 5;
