use super::tracker::{TransferKind, TransferTracker};
use crate::dns::transport::tcp::{connect, read_with_length_prefix, send_with_length_prefix};
use crate::dns::transport::resolve_backend;
use async_trait::async_trait;
use ferrous_rproxy_application::ports::{TransferRelay, TransferSink};
use ferrous_rproxy_domain::{BackendAddr, DnsQuery, DomainError, RecordType};
use hickory_proto::op::Message;
use std::time::Duration;
use tracing::{debug, info};

/// Relays AXFR/IXFR streams over TCP, one message at a time, in order.
pub struct TcpTransferRelay {
    timeout: Duration,
}

impl TcpTransferRelay {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl TransferRelay for TcpTransferRelay {
    async fn relay(
        &self,
        backend: &BackendAddr,
        query: &DnsQuery,
        request: &[u8],
        sink: &mut dyn TransferSink,
    ) -> Result<usize, DomainError> {
        let kind = if query.has_type(RecordType::IXFR) {
            TransferKind::Ixfr
        } else {
            TransferKind::Axfr
        };
        let failed = |reason: String| DomainError::TransferFailed {
            server: backend.to_string(),
            reason,
        };

        let server_addr = resolve_backend(backend, self.timeout).await?;
        let mut stream = connect(server_addr, self.timeout).await?;

        tokio::time::timeout(self.timeout, send_with_length_prefix(&mut stream, request))
            .await
            .map_err(|_| failed("timeout sending request".to_string()))?
            .map_err(|e| failed(format!("send: {}", e)))?;

        let mut tracker = TransferTracker::new(kind);
        let mut messages = 0usize;

        while !tracker.is_complete() {
            let bytes = tokio::time::timeout(self.timeout, read_with_length_prefix(&mut stream))
                .await
                .map_err(|_| failed(format!("timeout after {} messages", messages)))?
                .map_err(|e| failed(format!("receive after {} messages: {}", messages, e)))?;

            let message = Message::from_vec(&bytes)
                .map_err(|e| failed(format!("undecodable message: {}", e)))?;

            if message.id() != query.id {
                return Err(failed(format!(
                    "id mismatch: expected {}, got {}",
                    query.id,
                    message.id()
                )));
            }

            tracker.observe(&message).map_err(failed)?;
            sink.send(&bytes).await?;
            messages += 1;

            debug!(
                backend = %backend,
                messages,
                records = tracker.records_seen(),
                "Transfer message relayed"
            );
        }

        info!(
            backend = %backend,
            kind = ?kind,
            messages,
            records = tracker.records_seen(),
            "Zone transfer relayed"
        );

        Ok(messages)
    }
}
