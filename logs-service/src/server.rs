//! Logs service server: wires config, storage, the Stream Hub, and the
//! axum router together.

use anyhow::Result;
use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use observability_common::storage::LogStore;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{compression::CompressionLayer, cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};
use tracing::{error, info};

use crate::config::{LogsConfig, ServiceIdentity};
use crate::handlers::{health, ingest, query, websocket};
use crate::middleware::{context_middleware, logging_middleware, ContextState};
use crate::stream_hub::{StreamHub, StreamHubHandle};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<LogsConfig>,
    pub log_store: Arc<dyn LogStore>,
    pub stream_hub: StreamHubHandle,
    pub identity: Arc<ServiceIdentity>,
    pub pool: Option<PgPool>,
    pub metrics_handle: Option<PrometheusHandle>,
}

pub struct LogsServer {
    config: LogsConfig,
    log_store: Arc<dyn LogStore>,
    pool: Option<PgPool>,
}

impl LogsServer {
    pub async fn new(config: LogsConfig) -> Result<Self> {
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
                Ok(Self {
                    config,
                    log_store,
                    pool: Some(pool),
                })
            }
            Err(e) => {
                error!("failed to connect to postgres: {e}, falling back to in-memory storage");
                Ok(Self {
                    config,
                    log_store: Arc::new(observability_common::storage::InMemoryLogStore::new()),
                    pool: None,
                })
            }
        }
    }

    pub async fn start(self) -> Result<()> {
        let addr: std::net::SocketAddr = self.config.server_address().parse()?;
        let app = self.create_app();
        info!("logs-service listening on {addr}");
        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
        )
        .await?;
        Ok(())
    }

    fn create_app(self) -> Router {
        crate::metrics::register_metrics();
        crate::metrics::init_metrics();
        let metrics_handle = PrometheusBuilder::new().install_recorder().ok();

        let identity = Arc::new(self.config.identity.clone());
        let stream_hub = StreamHub::spawn();

        let state = AppState {
            config: Arc::new(self.config.clone()),
            log_store: self.log_store,
            stream_hub,
            identity: Arc::clone(&identity),
            pool: self.pool,
            metrics_handle,
        };

        let context_state = ContextState { identity };

        Router::new()
            .route("/api/logs", post(ingest::ingest_log).get(query::list_logs))
            .route("/api/logs/batch", post(ingest::ingest_batch))
            .route("/api/logs/correlation/:id", get(query::get_by_correlation))
            .route(
                "/api/logs/trace/:id/timeline",
                get(query::get_trace_timeline),
            )
            .route("/ws/logs", get(websocket::upgrade))
            .route(&self.config.monitoring.health_path, get(health::health_check))
            .route(&self.config.monitoring.metrics_path, get(health::metrics_endpoint))
            .with_state(state)
            .layer(DefaultBodyLimit::max(self.config.server.max_body_size))
            .layer(TimeoutLayer::new(Duration::from_secs(
                self.config.server.timeout_seconds,
            )))
            .layer(middleware::from_fn_with_state(
                context_state,
                context_middleware,
            ))
            .layer(middleware::from_fn(logging_middleware))
            .layer(TraceLayer::new_for_http())
            .layer(CompressionLayer::new())
            .layer(CorsLayer::permissive())
    }
}
