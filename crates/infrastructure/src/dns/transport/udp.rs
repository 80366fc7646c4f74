//! UDP transport towards a backend (RFC 1035 §4.2.1).
//!
//! The client's datagram is forwarded as is. A truncated reply is relayed
//! unmodified too: the client retries over TCP and the retry follows it.

use super::{upstream_io_error, upstream_timeout, DnsTransport, TransportResponse};
use async_trait::async_trait;
use ferrous_rproxy_domain::DomainError;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::Duration;
use tokio::net::UdpSocket;
use tracing::debug;

/// Largest datagram accepted from a backend.
const MAX_UDP_RESPONSE_SIZE: usize = 65535;

pub struct UdpTransport {
    server_addr: SocketAddr,
}

impl UdpTransport {
    pub fn new(server_addr: SocketAddr) -> Self {
        Self { server_addr }
    }
}

#[async_trait]
impl DnsTransport for UdpTransport {
    async fn send(
        &self,
        message_bytes: &[u8],
        timeout: Duration,
    ) -> Result<TransportResponse, DomainError> {
        let server_addr = self.server_addr;
        let bind_addr: SocketAddr = if server_addr.is_ipv4() {
            (Ipv4Addr::UNSPECIFIED, 0).into()
        } else {
            (Ipv6Addr::UNSPECIFIED, 0).into()
        };

        let socket = UdpSocket::bind(bind_addr)
            .await
            .map_err(|e| upstream_io_error(server_addr, "bind", e))?;

        // A connected socket only accepts datagrams from the backend and
        // surfaces ICMP port unreachable as ConnectionRefused.
        socket
            .connect(server_addr)
            .await
            .map_err(|e| upstream_io_error(server_addr, "connect", e))?;

        let bytes_sent = tokio::time::timeout(timeout, socket.send(message_bytes))
            .await
            .map_err(|_| upstream_timeout(server_addr))?
            .map_err(|e| upstream_io_error(server_addr, "send", e))?;

        debug!(server = %server_addr, bytes_sent, "UDP query sent");

        let mut recv_buf = vec![0u8; MAX_UDP_RESPONSE_SIZE];
        let bytes_received = tokio::time::timeout(timeout, socket.recv(&mut recv_buf))
            .await
            .map_err(|_| upstream_timeout(server_addr))?
            .map_err(|e| upstream_io_error(server_addr, "receive", e))?;

        recv_buf.truncate(bytes_received);

        debug!(server = %server_addr, bytes_received, "UDP response received");

        Ok(TransportResponse {
            bytes: recv_buf,
            protocol_used: "UDP",
        })
    }
}
