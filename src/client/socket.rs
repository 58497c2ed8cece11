use crate::client::error::{ClientError, Result};
use crate::protocol::{ProbePacket, MAX_DATAGRAM_SIZE};
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr, ToSocketAddrs, UdpSocket};
use std::time::Duration;
use tracing::{debug, warn};

/// Trait for network socket operations with packet abstraction.
///
/// Methods take `&self` so one socket can be shared by the sender and
/// receiver threads without a lock.
pub trait ProbeSocket: Send + Sync {
    /// Send a packet to the connected peer
    fn send_packet(&self, packet: &ProbePacket) -> Result<usize>;

    /// Receive and decode one reply
    fn recv_packet(&self) -> Result<ProbePacket>;

    /// Set the read timeout for the socket
    fn set_timeout(&self, timeout: Duration) -> Result<()>;
}

/// UDP socket connected to a single echo server
#[derive(Debug)]
pub struct UdpProbeSocket {
    socket: UdpSocket,
    peer: SocketAddr,
}

impl UdpProbeSocket {
    /// Resolve `addr`, bind an ephemeral local port of the same family and
    /// connect to the first resolved address.
    pub fn connect(addr: &str) -> Result<Self> {
        debug!(addr = addr, "Connecting UDP socket");
        let connect_err = |source: std::io::Error| {
            warn!(error = %source, addr = addr, "Failed to connect socket");
            ClientError::Connect {
                addr: addr.to_string(),
                source,
            }
        };

        let peer = addr
            .to_socket_addrs()
            .map_err(connect_err)?
            .next()
            .ok_or_else(|| {
                connect_err(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "address resolved to nothing",
                ))
            })?;

        let local: SocketAddr = if peer.is_ipv4() {
            (Ipv4Addr::UNSPECIFIED, 0).into()
        } else {
            (Ipv6Addr::UNSPECIFIED, 0).into()
        };
        let socket = UdpSocket::bind(local).map_err(connect_err)?;
        socket.connect(peer).map_err(connect_err)?;

        debug!(peer = %peer, "Socket connected successfully");
        Ok(Self { socket, peer })
    }

    pub fn peer_addr(&self) -> SocketAddr {
        self.peer
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }
}

impl ProbeSocket for UdpProbeSocket {
    fn send_packet(&self, packet: &ProbePacket) -> Result<usize> {
        let buf = packet.encode();
        let bytes_sent = self.socket.send(&buf).map_err(|e| {
            warn!(error = %e, "Failed to send packet");
            ClientError::Write(e)
        })?;
        debug!(bytes_sent = bytes_sent, sequence = packet.sequence, "Packet sent");
        Ok(bytes_sent)
    }

    fn recv_packet(&self) -> Result<ProbePacket> {
        let mut buf = [0u8; MAX_DATAGRAM_SIZE];
        let len = self.socket.recv(&mut buf)?;
        let packet = ProbePacket::decode(&buf[..len])?;
        debug!(
            sequence = packet.sequence,
            bytes_received = len,
            "Packet received"
        );
        Ok(packet)
    }

    fn set_timeout(&self, timeout: Duration) -> Result<()> {
        debug!(timeout_ms = timeout.as_millis() as u64, "Setting socket timeout");
        self.socket.set_read_timeout(Some(timeout)).map_err(|e| {
            warn!(error = %e, "Failed to set timeout");
            ClientError::Io(e)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::mock;

    mock! {
        pub ProbeSocket {}

        impl ProbeSocket for ProbeSocket {
            fn send_packet(&self, packet: &ProbePacket) -> Result<usize>;
            fn recv_packet(&self) -> Result<ProbePacket>;
            fn set_timeout(&self, timeout: Duration) -> Result<()>;
        }
    }

    #[test]
    fn test_udp_socket_connect() {
        let socket = UdpProbeSocket::connect("127.0.0.1:9").unwrap();
        assert_eq!(socket.peer_addr(), "127.0.0.1:9".parse::<SocketAddr>().unwrap());
        assert!(socket.local_addr().unwrap().port() > 0);
    }

    #[test]
    fn test_connect_rejects_unresolvable() {
        let err = UdpProbeSocket::connect("not an address").unwrap_err();
        assert!(matches!(err, ClientError::Connect { .. }));
    }

    #[test]
    fn test_recv_times_out() {
        let peer = UdpSocket::bind("127.0.0.1:0").unwrap();
        let socket = UdpProbeSocket::connect(&peer.local_addr().unwrap().to_string()).unwrap();
        socket.set_timeout(Duration::from_millis(20)).unwrap();
        assert!(socket.recv_packet().unwrap_err().is_timeout());
    }

    #[test]
    fn test_recv_rejects_short_datagram() {
        let peer = UdpSocket::bind("127.0.0.1:0").unwrap();
        let socket = UdpProbeSocket::connect(&peer.local_addr().unwrap().to_string()).unwrap();
        socket.set_timeout(Duration::from_secs(2)).unwrap();

        let local_port = socket.local_addr().unwrap().port();
        peer.send_to(&[1, 2, 3], (Ipv4Addr::LOCALHOST, local_port)).unwrap();
        let err = socket.recv_packet().unwrap_err();
        assert!(matches!(err, ClientError::Protocol(_)));
    }
}

#[cfg(test)]
pub use tests::MockProbeSocket;
