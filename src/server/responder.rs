use crate::protocol::MAX_DATAGRAM_SIZE;
use crate::server::error::{Result, ServerError};
use crate::server::monitor::ServerCounters;
use crate::shutdown::ShutdownSignal;
use std::io::ErrorKind;
use std::net::{SocketAddr, UdpSocket};
use std::time::Duration;
use tracing::{debug, info, warn};

/// How often a blocked receive wakes up to check for shutdown
const SHUTDOWN_POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Stateless UDP echo: every datagram goes back, unchanged, to its sender.
#[derive(Debug)]
pub struct EchoResponder {
    socket: UdpSocket,
    counters: Option<ServerCounters>,
}

impl EchoResponder {
    pub fn bind(addr: &str) -> Result<Self> {
        debug!(addr = addr, "Binding UDP socket");
        let socket = UdpSocket::bind(addr).map_err(|source| ServerError::Bind {
            addr: addr.to_string(),
            source,
        })?;
        socket.set_read_timeout(Some(SHUTDOWN_POLL_INTERVAL))?;
        info!(address = %socket.local_addr()?, "Echo responder listening");
        Ok(Self {
            socket,
            counters: None,
        })
    }

    /// Count traffic into `counters`
    pub fn with_counters(mut self, counters: ServerCounters) -> Self {
        self.counters = Some(counters);
        self
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }

    /// Echo datagrams until `shutdown` is triggered.
    ///
    /// Receive errors are logged and skipped. A failed echo ends the loop
    /// with [`ServerError::Write`].
    pub fn run(&self, shutdown: &ShutdownSignal) -> Result<()> {
        let mut buf = [0u8; MAX_DATAGRAM_SIZE];

        while !shutdown.is_triggered() {
            let (len, peer) = match self.socket.recv_from(&mut buf) {
                Ok(received) => received,
                Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {
                    continue
                }
                Err(e) => {
                    warn!(error = %e, "Failed to receive datagram");
                    if let Some(counters) = &self.counters {
                        counters.increment_read_error();
                    }
                    continue;
                }
            };
            debug!(bytes = len, peer = %peer, "Datagram received");
            if let Some(counters) = &self.counters {
                counters.increment_received();
            }

            self.socket
                .send_to(&buf[..len], peer)
                .map_err(|source| ServerError::Write { peer, source })?;
            if let Some(counters) = &self.counters {
                counters.record_echo(len);
            }
        }

        debug!("Echo responder stopped");
        Ok(())
    }
}
