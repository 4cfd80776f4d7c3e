//! Configuration for the logs service.

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Top-level logs service configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogsConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub identity: ServiceIdentity,
    pub stream: StreamConfig,
    pub monitoring: MonitoringConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub timeout_seconds: u64,
    pub max_body_size: usize,
    pub compression: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

/// Boot-time identity enrichment attached to every correlation context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceIdentity {
    pub service_name: String,
    pub service_version: String,
    pub environment: String,
    pub hostname: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamConfig {
    /// Per-subscriber mailbox capacity before the hub drops the subscriber.
    pub mailbox_capacity: usize,
    pub ping_interval_seconds: u64,
    pub max_connections: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    pub metrics_enabled: bool,
    pub metrics_path: String,
    pub health_path: String,
}

impl Default for LogsConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8082,
                timeout_seconds: 10,
                max_body_size: 2 * 1024 * 1024,
                compression: true,
            },
            database: DatabaseConfig {
                url: "postgres://localhost/observability".to_string(),
                max_connections: 20,
                min_connections: 2,
            },
            identity: ServiceIdentity {
                service_name: "logs-service".to_string(),
                service_version: env!("CARGO_PKG_VERSION").to_string(),
                environment: "development".to_string(),
                hostname: whoami_hostname(),
            },
            stream: StreamConfig {
                mailbox_capacity: 256,
                ping_interval_seconds: 30,
                max_connections: 100,
            },
            monitoring: MonitoringConfig {
                metrics_enabled: true,
                metrics_path: "/metrics".to_string(),
                health_path: "/health".to_string(),
            },
        }
    }
}

fn whoami_hostname() -> String {
    std::env::var("HOSTNAME").unwrap_or_else(|_| "localhost".to_string())
}

impl LogsConfig {
    /// Loads configuration from an optional TOML file, then applies the
    /// documented environment-variable overrides on top.
    pub fn load(path: &str) -> Result<Self> {
        let mut config = match config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .build()
        {
            Ok(settings) => settings.try_deserialize().unwrap_or_default(),
            Err(_) => Self::default(),
        };
        config.apply_env_overrides();
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("DATABASE_URL") {
            self.database.url = url;
        }
        if let Ok(port) = std::env::var("PORT") {
            if let Ok(port) = port.parse() {
                self.server.port = port;
            }
        }
        if let Ok(name) = std::env::var("SERVICE_NAME") {
            self.identity.service_name = name;
        }
        if let Ok(version) = std::env::var("SERVICE_VERSION") {
            self.identity.service_version = version;
        }
        if let Ok(env_name) = std::env::var("ENVIRONMENT") {
            self.identity.environment = env_name;
        }
        if let Ok(interval) = std::env::var("WEBSOCKET_PING_INTERVAL") {
            if let Ok(interval) = interval.parse() {
                self.stream.ping_interval_seconds = interval;
            }
        }
        if let Ok(max_conn) = std::env::var("WEBSOCKET_MAX_CONNECTIONS") {
            if let Ok(max_conn) = max_conn.parse() {
                self.stream.max_connections = max_conn;
            }
        }
    }

    #[must_use]
    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_sane_bind_address() {
        let config = LogsConfig::default();
        assert_eq!(config.server_address(), "0.0.0.0:8082");
    }
}
