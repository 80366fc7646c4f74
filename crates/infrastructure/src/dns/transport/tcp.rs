use super::{upstream_io_error, upstream_timeout, DnsTransport, TransportResponse};
use async_trait::async_trait;
use ferrous_rproxy_domain::DomainError;
use std::io;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::debug;

pub const MAX_TCP_MESSAGE_SIZE: usize = 65535;

/// One query per connection. Connections are not pooled: a backend is
/// reached over TCP only when the client itself used TCP.
pub struct TcpTransport {
    server_addr: SocketAddr,
}

impl TcpTransport {
    pub fn new(server_addr: SocketAddr) -> Self {
        Self { server_addr }
    }
}

#[async_trait]
impl DnsTransport for TcpTransport {
    async fn send(
        &self,
        message_bytes: &[u8],
        timeout: Duration,
    ) -> Result<TransportResponse, DomainError> {
        let server_addr = self.server_addr;
        let mut stream = connect(server_addr, timeout).await?;

        tokio::time::timeout(timeout, send_with_length_prefix(&mut stream, message_bytes))
            .await
            .map_err(|_| upstream_timeout(server_addr))?
            .map_err(|e| upstream_io_error(server_addr, "send", e))?;

        debug!(
            server = %server_addr,
            message_len = message_bytes.len(),
            "TCP query sent"
        );

        let response_bytes = tokio::time::timeout(timeout, read_with_length_prefix(&mut stream))
            .await
            .map_err(|_| upstream_timeout(server_addr))?
            .map_err(|e| upstream_io_error(server_addr, "receive", e))?;

        debug!(
            server = %server_addr,
            response_len = response_bytes.len(),
            "TCP response received"
        );

        Ok(TransportResponse {
            bytes: response_bytes,
            protocol_used: "TCP",
        })
    }
}

pub async fn connect(server_addr: SocketAddr, timeout: Duration) -> Result<TcpStream, DomainError> {
    let stream = tokio::time::timeout(timeout, TcpStream::connect(server_addr))
        .await
        .map_err(|_| upstream_timeout(server_addr))?
        .map_err(|e| upstream_io_error(server_addr, "connect", e))?;

    stream
        .set_nodelay(true)
        .map_err(|e| upstream_io_error(server_addr, "set TCP_NODELAY", e))?;

    Ok(stream)
}

/// Writes one DNS message with its 2-byte big-endian length prefix.
pub async fn send_with_length_prefix<S>(stream: &mut S, message_bytes: &[u8]) -> io::Result<()>
where
    S: AsyncWriteExt + Unpin,
{
    if message_bytes.len() > MAX_TCP_MESSAGE_SIZE {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!(
                "message too large: {} bytes (max {})",
                message_bytes.len(),
                MAX_TCP_MESSAGE_SIZE
            ),
        ));
    }

    let length_bytes = (message_bytes.len() as u16).to_be_bytes();
    let mut framed = Vec::with_capacity(2 + message_bytes.len());
    framed.extend_from_slice(&length_bytes);
    framed.extend_from_slice(message_bytes);

    stream.write_all(&framed).await?;
    stream.flush().await
}

/// Reads one length-prefixed DNS message. A clean close before the prefix
/// surfaces as `UnexpectedEof`.
pub async fn read_with_length_prefix<S>(stream: &mut S) -> io::Result<Vec<u8>>
where
    S: AsyncReadExt + Unpin,
{
    let mut len_buf = [0u8; 2];
    stream.read_exact(&mut len_buf).await?;

    let message_len = u16::from_be_bytes(len_buf) as usize;
    let mut message = vec![0u8; message_len];
    stream.read_exact(&mut message).await?;

    Ok(message)
}
