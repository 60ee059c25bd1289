use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use serde::{Deserialize, Serialize};

fn default_bind() -> String {
    "127.0.0.1".into()
}

fn default_port() -> u16 {
    5000
}

fn default_rate_limit() -> u32 {
    60
}

fn default_max_body_size() -> usize {
    65_536
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Tutor requests per client IP per minute. 0 disables the limit.
    #[serde(default = "default_rate_limit")]
    pub rate_limit: u32,
    #[serde(default = "default_max_body_size")]
    pub max_body_size: usize,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
            rate_limit: default_rate_limit(),
            max_body_size: default_max_body_size(),
        }
    }
}

impl GatewayConfig {
    /// Listen address. An unparsable `bind` falls back to loopback on the same port.
    #[must_use]
    pub fn socket_addr(&self) -> SocketAddr {
        let ip = self.bind.parse::<IpAddr>().unwrap_or_else(|e| {
            tracing::warn!("invalid gateway bind '{}': {e}, using 127.0.0.1", self.bind);
            IpAddr::V4(Ipv4Addr::LOCALHOST)
        });
        if ip.is_unspecified() {
            tracing::warn!("gateway listening on {ip}, reachable from other hosts");
        }
        SocketAddr::new(ip, self.port)
    }
}
