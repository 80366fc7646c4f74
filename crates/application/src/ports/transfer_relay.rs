use async_trait::async_trait;
use ferrous_rproxy_domain::{BackendAddr, DnsQuery, DomainError};

/// Where relayed transfer messages go, in order. Implemented by the client
/// connection.
#[async_trait]
pub trait TransferSink: Send {
    async fn send(&mut self, message: &[u8]) -> Result<(), DomainError>;
}

#[async_trait]
pub trait TransferRelay: Send + Sync {
    /// Streams a zone transfer from `backend` into `sink`. Returns the number
    /// of messages relayed.
    async fn relay(
        &self,
        backend: &BackendAddr,
        query: &DnsQuery,
        request: &[u8],
        sink: &mut dyn TransferSink,
    ) -> Result<usize, DomainError>;
}
