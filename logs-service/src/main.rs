//! Logs service entry point.

use anyhow::Result;
use clap::{Arg, Command};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use logs_service::{start_server, LogsConfig};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "logs_service=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let matches = Command::new("logs-service")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Log ingestion, live tail, and query API")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file path")
                .default_value("logs.toml"),
        )
        .get_matches();

    let config_path = matches.get_one::<String>("config").unwrap();
    let config = match LogsConfig::load(config_path) {
        Ok(config) => {
            info!("loaded configuration from {config_path}");
            config
        }
        Err(e) => {
            error!("failed to load config from {config_path}: {e}, using defaults");
            LogsConfig::default()
        }
    };

    info!("starting logs-service v{}", env!("CARGO_PKG_VERSION"));
    info!("bind address: {}", config.server_address());
    info!("service identity: {}", config.identity.service_name);
    info!("environment: {}", config.identity.environment);

    if let Err(e) = start_server(config).await {
        error!("server error: {e}");
        std::process::exit(1);
    }

    Ok(())
}
