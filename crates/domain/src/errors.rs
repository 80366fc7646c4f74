use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Malformed query: {0}")]
    MalformedQuery(String),

    #[error("Operation not allowed: {0}")]
    DisallowedOperation(String),

    #[error("No route available for {0}")]
    NoRouteAvailable(String),

    #[error("Invalid domain name: {0}")]
    InvalidDomainName(String),

    #[error("Invalid backend address: {0}")]
    InvalidBackendAddress(String),

    #[error("Upstream timeout talking to {server}")]
    UpstreamTimeout { server: String },

    #[error("Upstream connection refused by {server}")]
    UpstreamConnectionRefused { server: String },

    #[error("Upstream {server} unreachable: {reason}")]
    UpstreamUnreachable { server: String, reason: String },

    #[error("Invalid response from upstream {server}: {reason}")]
    InvalidUpstreamResponse { server: String, reason: String },

    #[error("Zone transfer from {server} failed: {reason}")]
    TransferFailed { server: String, reason: String },

    #[error("Client connection error: {0}")]
    ClientWrite(String),

    #[error("Signing unavailable for zone {0}")]
    SigningUnavailable(String),

    #[error("Signing failed: {0}")]
    SigningFailed(String),

    #[error("Failed to load key {path}: {reason}")]
    KeyLoad { path: String, reason: String },
}

impl DomainError {
    /// Errors caused by the backend side of a proxied exchange.
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            Self::UpstreamTimeout { .. }
                | Self::UpstreamConnectionRefused { .. }
                | Self::UpstreamUnreachable { .. }
                | Self::InvalidUpstreamResponse { .. }
                | Self::TransferFailed { .. }
        )
    }

    /// Refusals decided locally, before any backend is contacted.
    pub fn is_refusal(&self) -> bool {
        matches!(
            self,
            Self::MalformedQuery(_) | Self::DisallowedOperation(_) | Self::NoRouteAvailable(_)
        )
    }
}
