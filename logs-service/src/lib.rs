//! Ingest, Context Middleware, Stream Hub, and Query API for raw log entries.

pub mod config;
pub mod errors;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod models;
pub mod server;
pub mod stream_hub;

pub use config::LogsConfig;
pub use server::LogsServer;

pub async fn start_server(config: LogsConfig) -> anyhow::Result<()> {
    let server = LogsServer::new(config).await?;
    server.start().await
}
