//! Analytics service server: wires config, storage, and the aggregator loop
//! to the axum router.

use anyhow::Result;
use axum::{
    extract::DefaultBodyLimit,
    routing::get,
    Router,
};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use observability_common::storage::{AggregateStore, LogStore};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{compression::CompressionLayer, cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};
use tracing::{error, info};

use crate::aggregator::Aggregator;
use crate::config::{AnalyticsConfig, ServiceIdentity};
use crate::handlers::{anomaly, export, health, top_issues, trend};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AnalyticsConfig>,
    pub log_store: Arc<dyn LogStore>,
    pub aggregate_store: Arc<dyn AggregateStore>,
    pub identity: Arc<ServiceIdentity>,
    pub pool: Option<PgPool>,
    pub metrics_handle: Option<PrometheusHandle>,
}

pub struct AnalyticsServer {
    config: AnalyticsConfig,
    log_store: Arc<dyn LogStore>,
    aggregate_store: Arc<dyn AggregateStore>,
    pool: Option<PgPool>,
}

impl AnalyticsServer {
    pub async fn new(config: AnalyticsConfig) -> Result<Self> {
        info!("connecting to postgres");
        match PgPoolOptions::new()
            .max_connections(config.database.max_connections)
            .min_connections(config.database.min_connections)
            .connect(&config.database.url)
            .await
        {
            Ok(pool) => {
                if let Err(e) = sqlx::migrate!("../observability-common/migrations")
                    .run(&pool)
                    .await
                {
                    error!("migration failed: {e}");
                    return Err(e.into());
                }
                info!("connected to postgres and ran migrations");
                let log_store: Arc<dyn LogStore> =
                    Arc::new(observability_common::storage::PgLogStore::new(pool.clone()));
                let aggregate_store: Arc<dyn AggregateStore> =
                    Arc::new(observability_common::storage::PgAggregateStore::new(pool.clone()));
                Ok(Self {
                    config,
                    log_store,
                    aggregate_store,
                    pool: Some(pool),
                })
            }
            Err(e) => {
                error!("failed to connect to postgres: {e}, falling back to in-memory storage");
                let (mem_log, mem_aggregate) = observability_common::storage::new_memory_stores();
                let log_store: Arc<dyn LogStore> = mem_log;
                let aggregate_store: Arc<dyn AggregateStore> = mem_aggregate;
                Ok(Self {
                    config,
                    log_store,
                    aggregate_store,
                    pool: None,
                })
            }
        }
    }

    pub async fn start(self) -> Result<()> {
        let addr: std::net::SocketAddr = self.config.server_address().parse()?;
        let (app, shutdown_tx) = self.create_app();
        info!("analytics-service listening on {addr}");
        let listener = tokio::net::TcpListener::bind(addr).await?;
        let result = axum::serve(listener, app).await;
        let _ = shutdown_tx.send(());
        result?;
        Ok(())
    }

    fn create_app(self) -> (Router, tokio::sync::watch::Sender<()>) {
        crate::metrics::register_metrics();
        crate::metrics::init_metrics();
        let metrics_handle = PrometheusBuilder::new().install_recorder().ok();

        let identity = Arc::new(self.config.identity.clone());
        let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(());
        let aggregator = Aggregator::new(
            Arc::clone(&self.log_store),
            Arc::clone(&self.aggregate_store),
            Duration::from_secs(self.config.aggregator.tick_interval_seconds),
        );
        aggregator.spawn(shutdown_rx);

        let state = AppState {
            config: Arc::new(self.config.clone()),
            log_store: self.log_store,
            aggregate_store: self.aggregate_store,
            identity,
            pool: self.pool,
            metrics_handle,
        };

        let router = Router::new()
            .route("/api/analytics/trends", get(trend::get_trend))
            .route("/api/analytics/anomalies", get(anomaly::get_anomalies))
            .route("/api/analytics/top-issues", get(top_issues::get_top_issues))
            .route("/api/analytics/export/trends", get(export::export_trends))
            .route(&self.config.monitoring.health_path, get(health::health_check))
            .route(&self.config.monitoring.metrics_path, get(health::metrics_endpoint))
            .with_state(state)
            .layer(DefaultBodyLimit::max(self.config.server.max_body_size))
            .layer(TimeoutLayer::new(Duration::from_secs(
                self.config.server.timeout_seconds,
            )))
            .layer(TraceLayer::new_for_http())
            .layer(CompressionLayer::new())
            .layer(CorsLayer::permissive());

        (router, shutdown_tx)
    }
}
