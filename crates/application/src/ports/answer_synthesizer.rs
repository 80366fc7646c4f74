use ferrous_rproxy_domain::DomainError;

/// Builds a complete, signed response for a mail zone from the client's
/// request bytes.
pub trait AnswerSynthesizer: Send + Sync {
    fn synthesize(&self, zone: &str, request: &[u8]) -> Result<Vec<u8>, DomainError>;
}
