//! Aggregator, Trend, Anomaly, Top-Issues, and Export for log-derived
//! analytics.

pub mod aggregator;
pub mod analysis;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod metrics;
pub mod models;
pub mod server;

pub use config::AnalyticsConfig;
pub use server::AnalyticsServer;

pub async fn start_server(config: AnalyticsConfig) -> anyhow::Result<()> {
    let server = AnalyticsServer::new(config).await?;
    server.start().await
}
