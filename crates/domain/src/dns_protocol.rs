use std::fmt;

/// Transport the client used to reach the proxy. The same transport is used
/// towards the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClientTransport {
    Udp,
    Tcp,
}

impl ClientTransport {
    pub fn protocol_name(&self) -> &'static str {
        match self {
            ClientTransport::Udp => "UDP",
            ClientTransport::Tcp => "TCP",
        }
    }

    pub fn is_stream(&self) -> bool {
        matches!(self, ClientTransport::Tcp)
    }
}

impl fmt::Display for ClientTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.protocol_name())
    }
}
