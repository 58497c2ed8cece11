use crate::client::constants::*;
use crate::client::error::{ClientError, Result};
use crate::protocol::{epoch_millis, ProbePacket};
use hdrhistogram::Histogram;
use tracing::debug;

/// Point-in-time view of the accumulator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    pub loss_pct: i64,
    pub min_sequence: i32,
    pub max_sequence: i32,
    pub packet_count: u64,
    pub smoothed_rtt_ms: i64,
    pub jitter_ms: i64,
    pub rtt_min_ms: i64,
    pub rtt_max_ms: i64,
    pub rtt_p50_ms: u64,
    pub rtt_p99_ms: u64,
}

impl Summary {
    /// Number of sequence numbers spanned by the observed replies
    pub fn expected(&self) -> i64 {
        i64::from(self.max_sequence) - i64::from(self.min_sequence) + 1
    }
}

/// Running loss, RTT and jitter statistics over the replies seen so far.
///
/// Owned by the receiver loop; mutated through `&mut self` only, so there is
/// exactly one writer.
pub struct Statistics {
    min_sequence: i32,
    max_sequence: i32,
    packet_count: u64,
    smoothed_rtt: i64,
    jitter: i64,
    last_rtt: Option<i64>,
    rtt_min: i64,
    rtt_max: i64,
    hist: Histogram<u64>,
}

impl Statistics {
    pub fn new() -> Result<Self> {
        let hist = Histogram::<u64>::new_with_bounds(
            HISTOGRAM_LOW_BOUND_MS,
            HISTOGRAM_HIGH_BOUND_MS,
            HISTOGRAM_SIGNIFICANT_DIGITS,
        )
        .map_err(|e| ClientError::Statistics(format!("Failed to create histogram: {}", e)))?;

        Ok(Self {
            min_sequence: 0,
            max_sequence: 0,
            packet_count: 0,
            smoothed_rtt: 0,
            jitter: 0,
            last_rtt: None,
            rtt_min: 0,
            rtt_max: 0,
            hist,
        })
    }

    /// Record a reply received now. Returns the RTT sample in milliseconds.
    pub fn on_reply(&mut self, packet: &ProbePacket) -> i64 {
        self.on_reply_at(packet, epoch_millis())
    }

    /// Record a reply received at `now_ms`.
    pub fn on_reply_at(&mut self, packet: &ProbePacket, now_ms: i64) -> i64 {
        let seq = packet.sequence;
        if self.packet_count == 0 {
            self.min_sequence = seq;
            self.max_sequence = seq;
        } else {
            self.min_sequence = self.min_sequence.min(seq);
            self.max_sequence = self.max_sequence.max(seq);
        }
        self.packet_count += 1;

        // sent_at comes off the wire; the clock may also step backwards
        let sample = now_ms
            .saturating_sub(packet.sent_at)
            .clamp(0, HISTOGRAM_HIGH_BOUND_MS as i64);

        self.smoothed_rtt = (self.smoothed_rtt * RTT_WEIGHT_PREVIOUS
            + sample * RTT_WEIGHT_SAMPLE)
            / RTT_WEIGHT_TOTAL;

        match self.last_rtt {
            Some(prev) => {
                let delta = (sample - prev).abs();
                self.jitter += (delta - self.jitter) / JITTER_GAIN;
                self.rtt_min = self.rtt_min.min(sample);
                self.rtt_max = self.rtt_max.max(sample);
            }
            None => {
                self.rtt_min = sample;
                self.rtt_max = sample;
            }
        }
        self.last_rtt = Some(sample);
        self.hist.saturating_record(sample as u64);

        debug!(
            sequence = seq,
            rtt_ms = sample,
            smoothed_rtt_ms = self.smoothed_rtt,
            "Reply recorded"
        );
        sample
    }

    /// Snapshot of the current window, or `None` before the first reply.
    pub fn summarize(&self) -> Option<Summary> {
        if self.packet_count == 0 {
            return None;
        }

        let expected = i64::from(self.max_sequence) - i64::from(self.min_sequence) + 1;
        // Duplicated replies can push the count past the span
        let lost = (expected - self.packet_count as i64).max(0);

        Some(Summary {
            loss_pct: lost * 100 / expected,
            min_sequence: self.min_sequence,
            max_sequence: self.max_sequence,
            packet_count: self.packet_count,
            smoothed_rtt_ms: self.smoothed_rtt,
            jitter_ms: self.jitter,
            rtt_min_ms: self.rtt_min,
            rtt_max_ms: self.rtt_max,
            rtt_p50_ms: self.hist.value_at_quantile(0.50),
            rtt_p99_ms: self.hist.value_at_quantile(0.99),
        })
    }

    /// Forget every observation and start a fresh window
    pub fn reset(&mut self) {
        self.min_sequence = 0;
        self.max_sequence = 0;
        self.packet_count = 0;
        self.smoothed_rtt = 0;
        self.jitter = 0;
        self.last_rtt = None;
        self.rtt_min = 0;
        self.rtt_max = 0;
        self.hist.reset();
    }

    pub fn packet_count(&self) -> u64 {
        self.packet_count
    }

    pub fn smoothed_rtt(&self) -> i64 {
        self.smoothed_rtt
    }
}
