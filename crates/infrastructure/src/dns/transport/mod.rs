pub mod tcp;
pub mod udp;

use async_trait::async_trait;
use ferrous_rproxy_domain::{BackendAddr, ClientTransport, DomainError};
use std::io;
use std::net::SocketAddr;
use std::time::Duration;

#[derive(Debug)]
pub struct TransportResponse {
    pub bytes: Vec<u8>,

    pub protocol_used: &'static str,
}

#[async_trait]
pub trait DnsTransport: Send + Sync {
    async fn send(
        &self,
        message_bytes: &[u8],
        timeout: Duration,
    ) -> Result<TransportResponse, DomainError>;
}

pub enum Transport {
    Udp(udp::UdpTransport),
    Tcp(tcp::TcpTransport),
}

impl Transport {
    pub async fn send(
        &self,
        message_bytes: &[u8],
        timeout: Duration,
    ) -> Result<TransportResponse, DomainError> {
        match self {
            Self::Udp(t) => DnsTransport::send(t, message_bytes, timeout).await,
            Self::Tcp(t) => DnsTransport::send(t, message_bytes, timeout).await,
        }
    }
}

/// Transport towards a backend mirrors the one the client used.
pub fn create_transport(server_addr: SocketAddr, transport: ClientTransport) -> Transport {
    match transport {
        ClientTransport::Udp => Transport::Udp(udp::UdpTransport::new(server_addr)),
        ClientTransport::Tcp => Transport::Tcp(tcp::TcpTransport::new(server_addr)),
    }
}

/// Literal addresses are used as is; hostnames go through the system
/// resolver and the first address wins.
pub async fn resolve_backend(
    backend: &BackendAddr,
    timeout: Duration,
) -> Result<SocketAddr, DomainError> {
    if let Some(addr) = backend.socket_addr() {
        return Ok(addr);
    }

    let (hostname, port) = backend
        .unresolved_parts()
        .ok_or_else(|| DomainError::InvalidBackendAddress(backend.to_string()))?;

    let mut addrs = tokio::time::timeout(timeout, tokio::net::lookup_host((hostname, port)))
        .await
        .map_err(|_| DomainError::UpstreamTimeout {
            server: backend.to_string(),
        })?
        .map_err(|e| DomainError::UpstreamUnreachable {
            server: backend.to_string(),
            reason: format!("cannot resolve {}: {}", hostname, e),
        })?;

    addrs.next().ok_or_else(|| DomainError::UpstreamUnreachable {
        server: backend.to_string(),
        reason: format!("{} has no address", hostname),
    })
}

/// Maps an I/O failure on a backend socket to the matching upstream error.
pub(crate) fn upstream_io_error(server: SocketAddr, action: &str, e: io::Error) -> DomainError {
    match e.kind() {
        io::ErrorKind::ConnectionRefused => DomainError::UpstreamConnectionRefused {
            server: server.to_string(),
        },
        io::ErrorKind::TimedOut => DomainError::UpstreamTimeout {
            server: server.to_string(),
        },
        _ => DomainError::UpstreamUnreachable {
            server: server.to_string(),
            reason: format!("{}: {}", action, e),
        },
    }
}

pub(crate) fn upstream_timeout(server: SocketAddr) -> DomainError {
    DomainError::UpstreamTimeout {
        server: server.to_string(),
    }
}
