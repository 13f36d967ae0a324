use std::net::SocketAddr;
use thiserror::Error;

use crate::event::DEFAULT_SESSION;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:5000";
const DEFAULT_DATABASE_URL: &str = "sqlite://strokes.db";

/// `DATABASE_URL` value that selects the non-durable in-memory store
pub const IN_MEMORY_DATABASE: &str = "memory";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Runtime configuration, read from the environment
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub database_url: String,
    pub default_session: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build a config from any variable source; missing variables take defaults
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let bind_addr = lookup("LIVEBOARD_BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.into());
        let bind_addr = bind_addr.parse::<SocketAddr>().map_err(|e| ConfigError::Invalid {
            name: "LIVEBOARD_BIND_ADDR",
            reason: format!("{}: {}", bind_addr, e),
        })?;

        let database_url = lookup("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.into());
        if database_url.trim().is_empty() {
            return Err(ConfigError::Invalid {
                name: "DATABASE_URL",
                reason: "must not be empty".to_string(),
            });
        }

        let default_session =
            lookup("LIVEBOARD_DEFAULT_SESSION").unwrap_or_else(|| DEFAULT_SESSION.into());
        if default_session.trim().is_empty() {
            return Err(ConfigError::Invalid {
                name: "LIVEBOARD_DEFAULT_SESSION",
                reason: "must not be empty".to_string(),
            });
        }

        Ok(Self {
            bind_addr,
            database_url,
            default_session,
        })
    }

    pub fn uses_in_memory_store(&self) -> bool {
        self.database_url == IN_MEMORY_DATABASE
    }
}
