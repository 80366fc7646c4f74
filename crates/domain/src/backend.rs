use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;

use crate::DomainError;

/// Address of a backend authoritative server.
///
/// Literal socket addresses are kept resolved; hostnames are resolved at
/// exchange time.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BackendAddr {
    Resolved(SocketAddr),
    Unresolved { hostname: Arc<str>, port: u16 },
}

impl BackendAddr {
    pub fn socket_addr(&self) -> Option<SocketAddr> {
        match self {
            BackendAddr::Resolved(addr) => Some(*addr),
            BackendAddr::Unresolved { .. } => None,
        }
    }

    pub fn port(&self) -> u16 {
        match self {
            BackendAddr::Resolved(addr) => addr.port(),
            BackendAddr::Unresolved { port, .. } => *port,
        }
    }

    /// Returns (hostname, port) if this address still needs resolution.
    pub fn unresolved_parts(&self) -> Option<(&str, u16)> {
        match self {
            BackendAddr::Unresolved { hostname, port } => Some((hostname, *port)),
            BackendAddr::Resolved(_) => None,
        }
    }
}

impl fmt::Display for BackendAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendAddr::Resolved(addr) => write!(f, "{}", addr),
            BackendAddr::Unresolved { hostname, port } => write!(f, "{}:{}", hostname, port),
        }
    }
}

fn parse_host_port(s: &str) -> Option<(&str, u16)> {
    if s.starts_with('[') {
        let end = s.find(']')?;
        let host = &s[1..end];
        let port = s[end + 1..].strip_prefix(':')?.parse::<u16>().ok()?;
        Some((host, port))
    } else {
        let (host, port_str) = s.rsplit_once(':')?;
        if host.contains(':') {
            return None;
        }
        let port = port_str.parse::<u16>().ok()?;
        Some((host, port))
    }
}

impl FromStr for BackendAddr {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(addr) = s.parse::<SocketAddr>() {
            return Ok(BackendAddr::Resolved(addr));
        }
        match parse_host_port(s) {
            Some((host, port)) if !host.is_empty() && !host.contains(char::is_whitespace) => {
                Ok(BackendAddr::Unresolved {
                    hostname: host.into(),
                    port,
                })
            }
            _ => Err(DomainError::InvalidBackendAddress(format!(
                "'{}' is not host:port",
                s
            ))),
        }
    }
}

impl From<SocketAddr> for BackendAddr {
    fn from(addr: SocketAddr) -> Self {
        BackendAddr::Resolved(addr)
    }
}

impl Serialize for BackendAddr {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for BackendAddr {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
