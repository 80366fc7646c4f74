use crate::dns::transport::tcp::{read_with_length_prefix, send_with_length_prefix};
use crate::dns::wire::{decode_query, servfail_for_bytes, servfail_response, DecodedQuery};
use async_trait::async_trait;
use ferrous_rproxy_application::ports::TransferSink;
use ferrous_rproxy_application::use_cases::{DispatchOutcome, DispatchQueryUseCase, ProxyRequest};
use ferrous_rproxy_domain::{ClientTransport, DomainError};
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio::task::JoinSet;
use tracing::{debug, warn};

/// Turns raw client messages into dispatcher calls and dispatcher results
/// into response bytes. Failures become SERVFAIL; nothing about routing is
/// exposed to the client.
#[derive(Clone)]
pub struct DnsServerHandler {
    use_case: Arc<DispatchQueryUseCase>,
    tcp_idle_timeout: Duration,
}

impl DnsServerHandler {
    pub fn new(use_case: Arc<DispatchQueryUseCase>, tcp_idle_timeout: Duration) -> Self {
        Self {
            use_case,
            tcp_idle_timeout,
        }
    }

    /// Response datagram for one UDP query, if one should be sent.
    pub async fn handle_udp(&self, buf: &[u8], client: SocketAddr) -> Option<Vec<u8>> {
        let decoded = match decode_query(buf) {
            Ok(decoded) => decoded,
            Err(e) => {
                debug!(client = %client, error = %e, "Undecodable UDP query");
                return servfail_for_bytes(buf);
            }
        };

        let request = ProxyRequest {
            query: &decoded.query,
            wire: buf,
            transport: ClientTransport::Udp,
            client_ip: client.ip(),
        };

        match self.use_case.execute(&request, None).await {
            Ok(DispatchOutcome::Answer(bytes)) | Ok(DispatchOutcome::Synthesized(bytes)) => {
                Some(bytes)
            }
            Ok(DispatchOutcome::Streamed { .. }) => None,
            Err(e) => {
                log_failure(&e, client, ClientTransport::Udp);
                servfail_response(&decoded.message)
            }
        }
    }

    /// Serves queries on one TCP connection until the client closes it, the
    /// idle timeout expires, or a write fails.
    ///
    /// Pipelined queries are dispatched concurrently and answered in
    /// completion order (RFC 7766 §6.2.1.1). A zone transfer holds the writer
    /// for its whole stream, and no further query is read until it ends.
    pub async fn handle_tcp_connection(&self, stream: TcpStream, client: SocketAddr) {
        let _ = stream.set_nodelay(true);
        let (mut reader, writer) = stream.into_split();
        let writer: SharedWriter = Arc::new(Mutex::new(writer));
        let mut in_flight: JoinSet<Result<(), DomainError>> = JoinSet::new();

        loop {
            if let Err(e) = reap_finished(&mut in_flight) {
                debug!(client = %client, error = %e, "Closing TCP connection");
                in_flight.abort_all();
                return;
            }

            let buf = match tokio::time::timeout(
                self.tcp_idle_timeout,
                read_with_length_prefix(&mut reader),
            )
            .await
            {
                Ok(Ok(buf)) => buf,
                Ok(Err(e)) if e.kind() == io::ErrorKind::UnexpectedEof => break,
                Ok(Err(e)) => {
                    debug!(client = %client, error = %e, "TCP read failed");
                    break;
                }
                Err(_) => {
                    debug!(client = %client, "TCP connection idle, closing");
                    break;
                }
            };

            let decoded = match decode_query(&buf) {
                Ok(decoded) => decoded,
                Err(e) => {
                    debug!(client = %client, error = %e, "Undecodable TCP query");
                    let written = match servfail_for_bytes(&buf) {
                        Some(response) => write_shared(&writer, &response).await,
                        None => Err(e),
                    };
                    if written.is_err() {
                        break;
                    }
                    continue;
                }
            };

            if decoded.query.is_transfer() {
                let mut guard = writer.lock().await;
                if let Err(e) = self.handle_transfer(&buf, &decoded, client, &mut guard).await {
                    debug!(client = %client, error = %e, "Closing TCP connection");
                    break;
                }
                continue;
            }

            let handler = self.clone();
            let writer = Arc::clone(&writer);
            in_flight.spawn(async move {
                let response = handler.tcp_response(&buf, &decoded, client).await?;
                write_shared(&writer, &response).await
            });
        }

        // Queries already read are still answered after the client half-closes.
        while let Some(done) = in_flight.join_next().await {
            if let Ok(Err(e)) = done {
                debug!(client = %client, error = %e, "TCP response not delivered");
            }
        }
    }

    /// Response for one non-transfer TCP query.
    async fn tcp_response(
        &self,
        buf: &[u8],
        decoded: &DecodedQuery,
        client: SocketAddr,
    ) -> Result<Vec<u8>, DomainError> {
        let request = ProxyRequest {
            query: &decoded.query,
            wire: buf,
            transport: ClientTransport::Tcp,
            client_ip: client.ip(),
        };

        match self.use_case.execute(&request, None).await {
            Ok(DispatchOutcome::Answer(bytes)) | Ok(DispatchOutcome::Synthesized(bytes)) => {
                Ok(bytes)
            }
            Ok(DispatchOutcome::Streamed { .. }) => Err(DomainError::ClientWrite(
                "transfer streamed without a sink".to_string(),
            )),
            Err(e) => {
                log_failure(&e, client, ClientTransport::Tcp);
                servfail_response(&decoded.message).ok_or(e)
            }
        }
    }

    async fn handle_transfer(
        &self,
        buf: &[u8],
        decoded: &DecodedQuery,
        client: SocketAddr,
        writer: &mut OwnedWriteHalf,
    ) -> Result<(), DomainError> {
        let request = ProxyRequest {
            query: &decoded.query,
            wire: buf,
            transport: ClientTransport::Tcp,
            client_ip: client.ip(),
        };

        let mut sink = TcpResponseSink::new(writer);
        let result = self.use_case.execute(&request, Some(&mut sink)).await;
        let streamed = sink.sent;

        match result {
            Ok(DispatchOutcome::Answer(bytes)) | Ok(DispatchOutcome::Synthesized(bytes)) => {
                write_message(writer, &bytes).await
            }
            Ok(DispatchOutcome::Streamed { .. }) => Ok(()),
            // A half-relayed transfer cannot be turned into an error
            // response; the connection is dropped instead.
            Err(e) if streamed > 0 => {
                warn!(client = %client, error = %e, messages = streamed, "Transfer aborted");
                Err(e)
            }
            Err(e) => {
                log_failure(&e, client, ClientTransport::Tcp);
                match servfail_response(&decoded.message) {
                    Some(response) => write_message(writer, &response).await,
                    None => Err(e),
                }
            }
        }
    }
}

type SharedWriter = Arc<Mutex<OwnedWriteHalf>>;

/// Surfaces the first failed write among completed pipelined responses.
fn reap_finished(in_flight: &mut JoinSet<Result<(), DomainError>>) -> Result<(), DomainError> {
    while let Some(done) = in_flight.try_join_next() {
        match done {
            Ok(result) => result?,
            Err(e) => return Err(DomainError::ClientWrite(e.to_string())),
        }
    }
    Ok(())
}

/// Writes relayed transfer messages straight to the client connection.
pub struct TcpResponseSink<'a> {
    writer: &'a mut OwnedWriteHalf,
    pub sent: usize,
}

impl<'a> TcpResponseSink<'a> {
    pub fn new(writer: &'a mut OwnedWriteHalf) -> Self {
        Self { writer, sent: 0 }
    }
}

#[async_trait]
impl<'a> TransferSink for TcpResponseSink<'a> {
    async fn send(&mut self, message: &[u8]) -> Result<(), DomainError> {
        write_message(&mut *self.writer, message).await?;
        self.sent += 1;
        Ok(())
    }
}

async fn write_shared(writer: &SharedWriter, message: &[u8]) -> Result<(), DomainError> {
    let mut guard = writer.lock().await;
    write_message(&mut guard, message).await
}

async fn write_message(writer: &mut OwnedWriteHalf, message: &[u8]) -> Result<(), DomainError> {
    send_with_length_prefix(writer, message)
        .await
        .map_err(|e| DomainError::ClientWrite(e.to_string()))
}

fn log_failure(error: &DomainError, client: SocketAddr, transport: ClientTransport) {
    if error.is_refusal() {
        debug!(client = %client, transport = %transport, error = %error, "Query refused");
    } else {
        warn!(client = %client, transport = %transport, error = %error, "Query failed");
    }
}
