use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Number of SO_REUSEPORT UDP sockets bound to the same address.
    #[serde(default = "default_udp_workers")]
    pub udp_workers: usize,

    /// Seconds an idle client TCP connection is kept open.
    #[serde(default = "default_tcp_idle_timeout")]
    pub tcp_idle_timeout: u64,
}

impl ServerConfig {
    pub fn listen_address(&self) -> String {
        if self.bind_address.contains(':') && !self.bind_address.starts_with('[') {
            format!("[{}]:{}", self.bind_address, self.port)
        } else {
            format!("{}:{}", self.bind_address, self.port)
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
            udp_workers: default_udp_workers(),
            tcp_idle_timeout: default_tcp_idle_timeout(),
        }
    }
}

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    53
}

fn default_udp_workers() -> usize {
    2
}

fn default_tcp_idle_timeout() -> u64 {
    10
}
