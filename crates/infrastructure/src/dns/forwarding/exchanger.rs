use crate::dns::transport::{create_transport, resolve_backend};
use crate::dns::wire::message_id;
use async_trait::async_trait;
use ferrous_rproxy_application::ports::UpstreamExchange;
use ferrous_rproxy_domain::{BackendAddr, ClientTransport, DomainError};
use hickory_proto::op::{Message, MessageType};
use std::time::Duration;
use tracing::debug;

/// Single request/response exchange with a backend. The response is
/// checked (it parses, it is a response, its id matches) and then relayed
/// byte for byte.
pub struct BackendExchanger {
    timeout: Duration,
}

impl BackendExchanger {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl UpstreamExchange for BackendExchanger {
    async fn exchange(
        &self,
        backend: &BackendAddr,
        transport: ClientTransport,
        request: &[u8],
    ) -> Result<Vec<u8>, DomainError> {
        let server_addr = resolve_backend(backend, self.timeout).await?;
        let transport = create_transport(server_addr, transport);

        let response = transport.send(request, self.timeout).await?;
        validate_response(backend, request, &response.bytes)?;

        debug!(
            backend = %backend,
            protocol = response.protocol_used,
            bytes = response.bytes.len(),
            "Backend answered"
        );

        Ok(response.bytes)
    }
}

fn validate_response(
    backend: &BackendAddr,
    request: &[u8],
    response: &[u8],
) -> Result<(), DomainError> {
    let invalid = |reason: String| DomainError::InvalidUpstreamResponse {
        server: backend.to_string(),
        reason,
    };

    let message =
        Message::from_vec(response).map_err(|e| invalid(format!("undecodable: {}", e)))?;

    if message.message_type() != MessageType::Response {
        return Err(invalid("not a response".to_string()));
    }

    let expected = message_id(request).ok_or_else(|| invalid("request has no id".to_string()))?;
    if message.id() != expected {
        return Err(invalid(format!(
            "id mismatch: expected {}, got {}",
            expected,
            message.id()
        )));
    }

    Ok(())
}
