//! Server configuration.

use taskdeck_core::realtime::{ConnectionConfig, HubConfig};

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub hub: HubConfig,
    pub connection: ConnectionConfig,
    /// Requests per minute per client; zero disables the limit.
    pub rate_limit_per_minute: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3030,
            hub: HubConfig::default(),
            connection: ConnectionConfig::default(),
            rate_limit_per_minute: 100,
        }
    }
}

impl ServerConfig {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
