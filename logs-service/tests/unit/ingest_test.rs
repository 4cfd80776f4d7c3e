use axum::extract::State;
use axum::{Extension, Json};
use chrono::Utc;
use logs_service::config::{LogsConfig, ServiceIdentity};
use logs_service::handlers::{ingest, query};
use logs_service::models::{IngestBatchRequest, IngestLogRequest, LogQueryParams};
use logs_service::server::AppState;
use logs_service::stream_hub::StreamHub;
use observability_common::storage::InMemoryLogStore;
use observability_common::{CorrelationContext, LogLevel};
use rstest::{fixture, rstest};
use std::sync::Arc;

fn identity() -> ServiceIdentity {
    ServiceIdentity {
        service_name: "logs-service".to_string(),
        service_version: "0.1.0".to_string(),
        environment: "test".to_string(),
        hostname: "localhost".to_string(),
    }
}

fn context() -> CorrelationContext {
    CorrelationContext {
        correlation_id: "b".repeat(32),
        trace_id: None,
        span_id: None,
        request_id: None,
        user_id: None,
        session_id: None,
        service: "logs-service".to_string(),
        hostname: "localhost".to_string(),
        environment: "test".to_string(),
        version: "0.1.0".to_string(),
        method: Some("POST".to_string()),
        path: Some("/api/logs".to_string()),
        remote_addr: None,
        timestamp: Utc::now(),
    }
}

#[fixture]
fn app_state() -> AppState {
    AppState {
        config: Arc::new(LogsConfig::default()),
        log_store: Arc::new(InMemoryLogStore::new()),
        stream_hub: StreamHub::spawn(),
        identity: Arc::new(identity()),
        pool: None,
        metrics_handle: None,
    }
}

#[rstest]
#[tokio::test]
async fn ingest_then_query_round_trips(app_state: AppState) {
    let body = IngestLogRequest {
        service: "billing".to_string(),
        level: LogLevel::Error,
        message: "payment declined".to_string(),
        user_id: Some(42),
        tags: vec!["payments".to_string()],
        metadata: None,
        correlation_id: None,
        timestamp: None,
    };

    let (status, Json(response)) =
        ingest::ingest_log(State(app_state.clone()), Extension(context()), Json(body))
            .await
            .expect("ingest should succeed");
    assert_eq!(status, axum::http::StatusCode::CREATED);
    assert_eq!(response.correlation_id, "b".repeat(32));

    let Json(list) = query::list_logs(
        State(app_state),
        axum::extract::Query(LogQueryParams {
            service: Some("billing".to_string()),
            level: None,
            correlation_id: None,
            limit: None,
            offset: None,
        }),
    )
    .await
    .expect("query should succeed");
    assert_eq!(list.entries.len(), 1);
    assert_eq!(list.entries[0].message, "payment declined");
}

#[rstest]
#[tokio::test]
async fn ingest_rejects_empty_message(app_state: AppState) {
    let body = IngestLogRequest {
        service: "billing".to_string(),
        level: LogLevel::Info,
        message: String::new(),
        user_id: None,
        tags: vec![],
        metadata: None,
        correlation_id: None,
        timestamp: None,
    };
    let result = ingest::ingest_log(State(app_state), Extension(context()), Json(body)).await;
    assert!(result.is_err());
}

#[rstest]
#[tokio::test]
async fn ingest_honors_caller_timestamp_within_skew(app_state: AppState) {
    let requested = Utc::now() - chrono::Duration::hours(2);
    let body = IngestLogRequest {
        service: "billing".to_string(),
        level: LogLevel::Info,
        message: "queued".to_string(),
        user_id: None,
        tags: vec![],
        metadata: None,
        correlation_id: None,
        timestamp: Some(requested),
    };
    let (_, Json(_)) = ingest::ingest_log(State(app_state.clone()), Extension(context()), Json(body))
        .await
        .expect("ingest should succeed");

    let Json(list) = query::list_logs(
        State(app_state),
        axum::extract::Query(LogQueryParams {
            service: Some("billing".to_string()),
            level: None,
            correlation_id: None,
            limit: None,
            offset: None,
        }),
    )
    .await
    .expect("query should succeed");
    assert_eq!(list.entries[0].created_at, requested);
}

#[rstest]
#[tokio::test]
async fn ingest_replaces_timestamp_outside_skew(app_state: AppState) {
    let requested = Utc::now() - chrono::Duration::hours(48);
    let body = IngestLogRequest {
        service: "billing".to_string(),
        level: LogLevel::Info,
        message: "queued".to_string(),
        user_id: None,
        tags: vec![],
        metadata: None,
        correlation_id: None,
        timestamp: Some(requested),
    };
    let before = Utc::now();
    ingest::ingest_log(State(app_state.clone()), Extension(context()), Json(body))
        .await
        .expect("ingest should succeed");

    let Json(list) = query::list_logs(
        State(app_state),
        axum::extract::Query(LogQueryParams {
            service: Some("billing".to_string()),
            level: None,
            correlation_id: None,
            limit: None,
            offset: None,
        }),
    )
    .await
    .expect("query should succeed");
    assert!(list.entries[0].created_at >= before);
    assert!(list.entries[0].metadata["rejected_timestamp"].is_string());
}

#[rstest]
#[tokio::test]
async fn batch_ingest_rejects_oversized_batch(app_state: AppState) {
    let entries = (0..1001)
        .map(|i| IngestLogRequest {
            service: "billing".to_string(),
            level: LogLevel::Info,
            message: format!("entry {i}"),
            user_id: None,
            tags: vec![],
            metadata: None,
            correlation_id: None,
            timestamp: None,
        })
        .collect();
    let result = ingest::ingest_batch(
        State(app_state),
        Extension(context()),
        Json(IngestBatchRequest { entries }),
    )
    .await;
    assert!(result.is_err());
}
