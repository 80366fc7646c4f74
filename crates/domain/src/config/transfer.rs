use serde::{Deserialize, Serialize};
use std::net::IpAddr;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TransferConfig {
    /// Clients allowed to run AXFR/IXFR through the proxy. Empty allows any
    /// client connecting over TCP.
    #[serde(default)]
    pub allow_transfer: Vec<IpAddr>,
}

impl TransferConfig {
    pub fn is_allowed(&self, client: IpAddr) -> bool {
        self.allow_transfer.is_empty()
            || self
                .allow_transfer
                .iter()
                .any(|allowed| *allowed == client || mapped_eq(*allowed, client))
    }
}

// IPv4 clients reach a dual-stack listener as ::ffff:a.b.c.d.
fn mapped_eq(allowed: IpAddr, client: IpAddr) -> bool {
    match (allowed, client) {
        (IpAddr::V4(v4), IpAddr::V6(v6)) | (IpAddr::V6(v6), IpAddr::V4(v4)) => {
            v6.to_ipv4_mapped() == Some(v4)
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_list_allows_everyone() {
        let config = TransferConfig::default();
        assert!(config.is_allowed("203.0.113.9".parse().unwrap()));
    }

    #[test]
    fn test_list_restricts_clients() {
        let config = TransferConfig {
            allow_transfer: vec!["192.0.2.10".parse().unwrap(), "::1".parse().unwrap()],
        };
        assert!(config.is_allowed("192.0.2.10".parse().unwrap()));
        assert!(config.is_allowed("::1".parse().unwrap()));
        assert!(config.is_allowed("::ffff:192.0.2.10".parse().unwrap()));
        assert!(!config.is_allowed("192.0.2.11".parse().unwrap()));
    }
}
