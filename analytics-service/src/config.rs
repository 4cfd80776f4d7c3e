//! Configuration for the analytics service.

use anyhow::Result;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub identity: ServiceIdentity,
    pub aggregator: AggregatorConfig,
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

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceIdentity {
    pub service_name: String,
    pub service_version: String,
    pub environment: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregatorConfig {
    pub tick_interval_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    pub metrics_enabled: bool,
    pub metrics_path: String,
    pub health_path: String,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8083,
                timeout_seconds: 30,
                max_body_size: 1024 * 1024,
                compression: true,
            },
            database: DatabaseConfig {
                url: "postgres://localhost/observability".to_string(),
                max_connections: 15,
                min_connections: 2,
            },
            identity: ServiceIdentity {
                service_name: "analytics-service".to_string(),
                service_version: env!("CARGO_PKG_VERSION").to_string(),
                environment: "development".to_string(),
            },
            aggregator: AggregatorConfig {
                tick_interval_seconds: 3600,
            },
            monitoring: MonitoringConfig {
                metrics_enabled: true,
                metrics_path: "/metrics".to_string(),
                health_path: "/health".to_string(),
            },
        }
    }
}

impl AnalyticsConfig {
    pub fn load(path: &str) -> Result<Self> {
        let mut config: Self = match config::Config::builder()
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
    fn default_binds_to_8083() {
        assert_eq!(AnalyticsConfig::default().server_address(), "0.0.0.0:8083");
    }
}
