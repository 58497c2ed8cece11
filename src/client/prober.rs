//! Probe client: a sender thread and a receiver thread sharing one socket.
//!
//! The sender emits one packet per interval. The receiver decodes replies,
//! feeds [`Statistics`] and decides when a summary is due. The accumulator is
//! moved into the receiver thread, so it has a single writer and needs no
//! lock. Either loop stopping on a fatal error triggers the shared
//! [`ShutdownSignal`], which stops the other one.

use crate::client::constants::*;
use crate::client::error::{ClientError, Result};
use crate::client::socket::{ProbeSocket, UdpProbeSocket};
use crate::client::statistics::{Statistics, Summary};
use crate::protocol::ProbePacket;
use crate::shutdown::ShutdownSignal;
use std::net::SocketAddr;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeOptions {
    pub send_interval: Duration,
    pub read_timeout: Duration,
    pub report_interval: Duration,
    /// Stop after this many probes; `None` runs until shut down
    pub count: Option<u32>,
    /// Clear the accumulator after each summary
    pub reset_window: bool,
}

impl Default for ProbeOptions {
    fn default() -> Self {
        Self {
            send_interval: Duration::from_millis(DEFAULT_SEND_INTERVAL_MS),
            read_timeout: Duration::from_millis(DEFAULT_READ_TIMEOUT_MS),
            report_interval: Duration::from_millis(DEFAULT_REPORT_INTERVAL_MS),
            count: None,
            reset_window: false,
        }
    }
}

/// Send probes `1, 2, 3, ...` every `options.send_interval`.
///
/// Returns the number of probes sent. A failed write is returned immediately.
/// With `options.count` set, the loop waits one read timeout after the last
/// probe so late replies can still arrive, then triggers `shutdown`.
pub fn run_sender<S: ProbeSocket + ?Sized>(
    socket: &S,
    options: &ProbeOptions,
    shutdown: &ShutdownSignal,
) -> Result<u32> {
    let mut sequence: i32 = 1;
    let mut sent: u32 = 0;

    while !shutdown.is_triggered() {
        let packet = ProbePacket::new(sequence);
        socket.send_packet(&packet)?;
        sent += 1;
        sequence = sequence.wrapping_add(1);

        if options.count.is_some_and(|count| sent >= count) {
            debug!(sent = sent, "Probe count reached, draining replies");
            shutdown.wait_timeout(options.read_timeout);
            shutdown.trigger();
            break;
        }

        if shutdown.wait_timeout(options.send_interval) {
            break;
        }
    }

    Ok(sent)
}

/// Read replies until shutdown, reporting at most once per
/// `options.report_interval`.
///
/// Read timeouts and other socket read errors are retried. A malformed reply
/// ends the loop with that error. On a clean stop the final summary is
/// returned, or `None` if no reply ever arrived.
pub fn run_receiver<S, F>(
    socket: &S,
    mut stats: Statistics,
    options: &ProbeOptions,
    shutdown: &ShutdownSignal,
    mut on_report: F,
) -> Result<Option<Summary>>
where
    S: ProbeSocket + ?Sized,
    F: FnMut(&Summary),
{
    socket.set_timeout(options.read_timeout)?;
    let mut last_report = Instant::now();

    while !shutdown.is_triggered() {
        let packet = match socket.recv_packet() {
            Ok(packet) => packet,
            Err(e) if e.is_timeout() => continue,
            // ICMP errors from an unreachable peer surface here
            Err(ClientError::Io(e)) => {
                debug!(error = %e, "Receive failed, retrying");
                continue;
            }
            Err(e) => return Err(e),
        };

        stats.on_reply(&packet);

        if last_report.elapsed() >= options.report_interval {
            if let Some(summary) = stats.summarize() {
                on_report(&summary);
            }
            if options.reset_window {
                stats.reset();
            }
            last_report = Instant::now();
        }
    }

    Ok(stats.summarize())
}

/// A client connected to one echo server, not yet running
pub struct ProbeClient<S: ProbeSocket + 'static = UdpProbeSocket> {
    socket: Arc<S>,
    options: ProbeOptions,
}

impl ProbeClient<UdpProbeSocket> {
    /// Connect a UDP socket to `addr`
    pub fn connect(addr: &str, options: ProbeOptions) -> Result<Self> {
        let socket = UdpProbeSocket::connect(addr)?;
        info!(
            peer = %socket.peer_addr(),
            interval_ms = options.send_interval.as_millis() as u64,
            "Probe client connected"
        );
        Ok(Self::with_socket(socket, options))
    }

    pub fn peer_addr(&self) -> SocketAddr {
        self.socket.peer_addr()
    }
}

impl<S: ProbeSocket + 'static> ProbeClient<S> {
    pub fn with_socket(socket: S, options: ProbeOptions) -> Self {
        Self {
            socket: Arc::new(socket),
            options,
        }
    }

    /// Start the sender and receiver threads.
    ///
    /// `on_report` runs on the receiver thread each time a summary is due.
    pub fn spawn<F>(self, on_report: F) -> Result<ProbeHandle>
    where
        F: FnMut(&Summary) + Send + 'static,
    {
        let shutdown = ShutdownSignal::new();
        let stats = Statistics::new()?;

        let receiver = {
            let socket = Arc::clone(&self.socket);
            let options = self.options.clone();
            let stop = shutdown.clone();
            thread::Builder::new()
                .name("udping-recv".into())
                .spawn(move || {
                    let result = run_receiver(&*socket, stats, &options, &stop, on_report);
                    if let Err(e) = &result {
                        error!(error = %e, "Receiver stopped");
                    }
                    stop.trigger();
                    result
                })?
        };

        let sender = {
            let socket = Arc::clone(&self.socket);
            let options = self.options.clone();
            let stop = shutdown.clone();
            let spawned = thread::Builder::new()
                .name("udping-send".into())
                .spawn(move || {
                    let result = run_sender(&*socket, &options, &stop);
                    if let Err(e) = &result {
                        error!(error = %e, "Sender stopped");
                    }
                    stop.trigger();
                    result
                });
            match spawned {
                Ok(handle) => handle,
                Err(e) => {
                    shutdown.trigger();
                    let _ = receiver.join();
                    return Err(e.into());
                }
            }
        };

        Ok(ProbeHandle {
            shutdown,
            sender,
            receiver,
        })
    }
}

/// Handle to a running client
pub struct ProbeHandle {
    shutdown: ShutdownSignal,
    sender: JoinHandle<Result<u32>>,
    receiver: JoinHandle<Result<Option<Summary>>>,
}

/// What a finished client did
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeOutcome {
    pub probes_sent: u32,
    pub summary: Option<Summary>,
}

impl ProbeHandle {
    /// Ask both loops to stop. The receiver notices within one read timeout.
    pub fn shutdown(&self) {
        self.shutdown.trigger();
    }

    /// Wait for both threads. The sender's error wins if both failed.
    pub fn join(self) -> Result<ProbeOutcome> {
        let sent = join_thread(self.sender, "sender");
        let summary = join_thread(self.receiver, "receiver");
        Ok(ProbeOutcome {
            probes_sent: sent?,
            summary: summary?,
        })
    }
}

fn join_thread<T>(handle: JoinHandle<Result<T>>, name: &str) -> Result<T> {
    handle
        .join()
        .map_err(|_| ClientError::Thread(format!("{} thread panicked", name)))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::socket::MockProbeSocket;
    use crate::protocol::{epoch_millis, ProtocolError, PACKET_SIZE};
    use std::io::ErrorKind;
    use std::sync::Mutex;

    fn fast_options() -> ProbeOptions {
        ProbeOptions {
            send_interval: Duration::from_millis(1),
            read_timeout: Duration::from_millis(1),
            report_interval: Duration::ZERO,
            count: None,
            reset_window: false,
        }
    }

    fn timeout() -> ClientError {
        ClientError::Io(std::io::Error::from(ErrorKind::WouldBlock))
    }

    #[test]
    fn test_sender_emits_consecutive_sequences() -> Result<()> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut socket = MockProbeSocket::new();
        let record = Arc::clone(&seen);
        socket.expect_send_packet().times(5).returning(move |packet| {
            record.lock().unwrap().push(packet.sequence);
            Ok(PACKET_SIZE)
        });

        let options = ProbeOptions {
            count: Some(5),
            ..fast_options()
        };
        let shutdown = ShutdownSignal::new();
        let sent = run_sender(&socket, &options, &shutdown)?;

        assert_eq!(sent, 5);
        assert_eq!(*seen.lock().unwrap(), vec![1, 2, 3, 4, 5]);
        assert!(shutdown.is_triggered());
        Ok(())
    }

    #[test]
    fn test_sender_write_failure_is_fatal() {
        let mut socket = MockProbeSocket::new();
        let mut calls = 0;
        socket.expect_send_packet().times(3).returning(move |_| {
            calls += 1;
            if calls < 3 {
                Ok(PACKET_SIZE)
            } else {
                Err(ClientError::Write(ErrorKind::ConnectionRefused.into()))
            }
        });

        let result = run_sender(&socket, &fast_options(), &ShutdownSignal::new());
        assert!(matches!(result, Err(ClientError::Write(_))));
    }

    #[test]
    fn test_sender_stops_on_shutdown() -> Result<()> {
        let socket = MockProbeSocket::new();
        let shutdown = ShutdownSignal::new();
        shutdown.trigger();
        assert_eq!(run_sender(&socket, &fast_options(), &shutdown)?, 0);
        Ok(())
    }

    #[test]
    fn test_receiver_retries_timeouts_and_reports() -> Result<()> {
        let shutdown = ShutdownSignal::new();
        let stop = shutdown.clone();
        let mut socket = MockProbeSocket::new();
        socket.expect_set_timeout().times(1).returning(|_| Ok(()));

        let mut calls = 0;
        socket.expect_recv_packet().returning(move || {
            calls += 1;
            match calls {
                1 | 3 => Err(timeout()),
                2 => Ok(ProbePacket::with_timestamp(1, epoch_millis())),
                4 => Ok(ProbePacket::with_timestamp(3, epoch_millis())),
                _ => {
                    stop.trigger();
                    Err(timeout())
                }
            }
        });

        let mut reports = Vec::new();
        let summary = run_receiver(
            &socket,
            Statistics::new()?,
            &fast_options(),
            &shutdown,
            |s| reports.push(s.clone()),
        )?
        .unwrap();

        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].packet_count, 1);
        assert_eq!(summary.packet_count, 2);
        assert_eq!(summary.min_sequence, 1);
        assert_eq!(summary.max_sequence, 3);
        assert_eq!(summary.loss_pct, 33);
        Ok(())
    }

    #[test]
    fn test_receiver_malformed_reply_is_fatal() -> Result<()> {
        let mut socket = MockProbeSocket::new();
        socket.expect_set_timeout().returning(|_| Ok(()));
        socket.expect_recv_packet().times(1).returning(|| {
            Err(ClientError::Protocol(ProtocolError::MalformedPacket {
                expected: PACKET_SIZE,
                actual: 3,
            }))
        });

        let result = run_receiver(
            &socket,
            Statistics::new()?,
            &fast_options(),
            &ShutdownSignal::new(),
            |_| {},
        );
        assert!(matches!(result, Err(ClientError::Protocol(_))));
        Ok(())
    }

    #[test]
    fn test_receiver_survives_read_errors() -> Result<()> {
        let shutdown = ShutdownSignal::new();
        let stop = shutdown.clone();
        let mut socket = MockProbeSocket::new();
        socket.expect_set_timeout().returning(|_| Ok(()));

        let mut calls = 0;
        socket.expect_recv_packet().returning(move || {
            calls += 1;
            match calls {
                1 => Err(ClientError::Io(ErrorKind::ConnectionRefused.into())),
                2 => Ok(ProbePacket::with_timestamp(1, epoch_millis())),
                _ => {
                    stop.trigger();
                    Err(timeout())
                }
            }
        });

        let summary = run_receiver(
            &socket,
            Statistics::new()?,
            &fast_options(),
            &shutdown,
            |_| {},
        )?;
        assert_eq!(summary.unwrap().packet_count, 1);
        Ok(())
    }

    #[test]
    fn test_receiver_respects_report_interval() -> Result<()> {
        let shutdown = ShutdownSignal::new();
        let stop = shutdown.clone();
        let mut socket = MockProbeSocket::new();
        socket.expect_set_timeout().returning(|_| Ok(()));

        let mut seq = 0;
        socket.expect_recv_packet().returning(move || {
            seq += 1;
            if seq > 10 {
                stop.trigger();
                return Err(timeout());
            }
            Ok(ProbePacket::with_timestamp(seq, epoch_millis()))
        });

        let options = ProbeOptions {
            report_interval: Duration::from_secs(3600),
            ..fast_options()
        };
        let mut reports = 0;
        let summary = run_receiver(&socket, Statistics::new()?, &options, &shutdown, |_| {
            reports += 1
        })?;

        assert_eq!(reports, 0);
        assert_eq!(summary.unwrap().packet_count, 10);
        Ok(())
    }

    #[test]
    fn test_receiver_reset_window() -> Result<()> {
        let shutdown = ShutdownSignal::new();
        let stop = shutdown.clone();
        let mut socket = MockProbeSocket::new();
        socket.expect_set_timeout().returning(|_| Ok(()));

        let mut seq = 0;
        socket.expect_recv_packet().returning(move || {
            seq += 1;
            if seq > 3 {
                stop.trigger();
                return Err(timeout());
            }
            Ok(ProbePacket::with_timestamp(seq, epoch_millis()))
        });

        let options = ProbeOptions {
            reset_window: true,
            ..fast_options()
        };
        let mut reports = Vec::new();
        let summary = run_receiver(&socket, Statistics::new()?, &options, &shutdown, |s| {
            reports.push(s.packet_count)
        })?;

        assert_eq!(reports, vec![1, 1, 1]);
        assert_eq!(summary, None);
        Ok(())
    }

    #[test]
    fn test_client_handle_shutdown_joins_cleanly() -> Result<()> {
        let mut socket = MockProbeSocket::new();
        socket.expect_send_packet().returning(|_| Ok(PACKET_SIZE));
        socket.expect_set_timeout().returning(|_| Ok(()));
        socket.expect_recv_packet().returning(|| Err(timeout()));

        let handle = ProbeClient::with_socket(socket, fast_options()).spawn(|_| {})?;
        thread::sleep(Duration::from_millis(20));
        handle.shutdown();

        let outcome = handle.join()?;
        assert!(outcome.probes_sent >= 1);
        assert_eq!(outcome.summary, None);
        Ok(())
    }

    #[test]
    fn test_client_handle_stops_on_sender_failure() -> Result<()> {
        let mut socket = MockProbeSocket::new();
        socket
            .expect_send_packet()
            .returning(|_| Err(ClientError::Write(ErrorKind::ConnectionRefused.into())));
        socket.expect_set_timeout().returning(|_| Ok(()));
        socket.expect_recv_packet().returning(|| Err(timeout()));

        let handle = ProbeClient::with_socket(socket, fast_options()).spawn(|_| {})?;
        let result = handle.join();
        assert!(matches!(result, Err(ClientError::Write(_))));
        Ok(())
    }
}
