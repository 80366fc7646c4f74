use async_trait::async_trait;
use ferrous_rproxy_domain::{BackendAddr, ClientTransport, DomainError};

/// One request/response round trip with a backend, over the transport the
/// client used.
#[async_trait]
pub trait UpstreamExchange: Send + Sync {
    async fn exchange(
        &self,
        backend: &BackendAddr,
        transport: ClientTransport,
        request: &[u8],
    ) -> Result<Vec<u8>, DomainError>;
}
