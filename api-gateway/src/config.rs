//! Application configuration

use std::env;

/// Default listening port
pub const DEFAULT_PORT: u16 = 8080;

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// API port
    pub port: u16,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self { port: DEFAULT_PORT }
    }
}

impl AppConfig {
    /// Create a new configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_PORT),
        }
    }

    pub fn new(port: u16) -> Self {
        Self { port }
    }

    /// Address to listen on when none is given on the command line
    pub fn listen_addr(&self) -> String {
        format!("127.0.0.1:{}", self.port)
    }
}
