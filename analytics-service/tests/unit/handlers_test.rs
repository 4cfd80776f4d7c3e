use analytics_service::analysis::Severity;
use analytics_service::config::{AnalyticsConfig, ServiceIdentity};
use analytics_service::handlers::{anomaly, export, top_issues, trend};
use analytics_service::models::{AnomalyParams, ExportParams, TopIssuesParams, TrendParams};
use analytics_service::server::AppState;
use chrono::{Duration, Utc};
use observability_common::storage::{AggregateStore, InMemoryAggregateStore, InMemoryLogStore, LogStore};
use observability_common::{Aggregate, CorrelationContext, LogEntry, LogLevel, MetricType};
use rstest::{fixture, rstest};
use std::sync::Arc;

fn identity() -> ServiceIdentity {
    ServiceIdentity {
        service_name: "analytics-service".to_string(),
        service_version: "0.1.0".to_string(),
        environment: "test".to_string(),
    }
}

#[fixture]
fn app_state() -> AppState {
    AppState {
        config: Arc::new(AnalyticsConfig::default()),
        log_store: Arc::new(InMemoryLogStore::new()),
        aggregate_store: Arc::new(InMemoryAggregateStore::new()),
        identity: Arc::new(identity()),
        pool: None,
        metrics_handle: None,
    }
}

fn log_entry(service: &str, level: LogLevel, message: &str, created_at: chrono::DateTime<Utc>) -> LogEntry {
    LogEntry {
        id: None,
        created_at,
        service: service.to_string(),
        level,
        message: message.to_string(),
        user_id: None,
        tags: vec![],
        metadata: serde_json::json!({}),
        context: CorrelationContext {
            correlation_id: "c".repeat(32),
            trace_id: None,
            span_id: None,
            request_id: None,
            user_id: None,
            session_id: None,
            service: service.to_string(),
            hostname: "localhost".to_string(),
            environment: "test".to_string(),
            version: "0.1.0".to_string(),
            method: None,
            path: None,
            remote_addr: None,
            timestamp: created_at,
        },
        correlation_id: "c".repeat(32),
    }
}

#[rstest]
#[tokio::test]
async fn trend_endpoint_reports_decreasing_direction(app_state: AppState) {
    let now = Utc::now();
    for (i, value) in [100.0, 90.0, 80.0].into_iter().enumerate() {
        app_state
            .aggregate_store
            .upsert_aggregate(Aggregate {
                metric_type: MetricType::ServiceActivity,
                service: "billing".to_string(),
                time_bucket: now - Duration::hours(3 - i as i64),
                value,
                metadata: None,
            })
            .await
            .unwrap();
    }

    let axum::response::Json(response) = trend::get_trend(
        axum::extract::State(app_state),
        axum::extract::Query(TrendParams {
            metric_type: MetricType::ServiceActivity,
            service: "billing".to_string(),
            hours: 24,
        }),
    )
    .await
    .expect("trend handler should succeed");

    assert_eq!(response.series, vec![100.0, 90.0, 80.0]);
    assert_eq!(
        response.direction,
        Some(analytics_service::analysis::TrendDirection::Decreasing)
    );
}

#[rstest]
#[tokio::test]
async fn anomaly_endpoint_flags_single_spike_as_low(app_state: AppState) {
    let now = Utc::now();
    for (i, value) in [10.0, 10.0, 10.0, 10.0, 50.0].into_iter().enumerate() {
        app_state
            .aggregate_store
            .upsert_aggregate(Aggregate {
                metric_type: MetricType::ErrorFrequency,
                service: "auth".to_string(),
                time_bucket: now - Duration::hours(5 - i as i64),
                value,
                metadata: None,
            })
            .await
            .unwrap();
    }

    let axum::response::Json(response) = anomaly::get_anomalies(
        axum::extract::State(app_state),
        axum::extract::Query(AnomalyParams {
            metric_type: MetricType::ErrorFrequency,
            service: "auth".to_string(),
            hours: 24,
        }),
    )
    .await
    .expect("anomaly handler should succeed");

    assert_eq!(response.anomalies.len(), 1);
    assert_eq!(response.anomalies[0].severity, Severity::Low);
}

#[rstest]
#[tokio::test]
async fn anomaly_endpoint_rejects_non_positive_hours(app_state: AppState) {
    let result = anomaly::get_anomalies(
        axum::extract::State(app_state),
        axum::extract::Query(AnomalyParams {
            metric_type: MetricType::ErrorFrequency,
            service: "auth".to_string(),
            hours: 0,
        }),
    )
    .await;
    assert!(result.is_err());
}

#[rstest]
#[tokio::test]
async fn top_issues_endpoint_orders_by_count(app_state: AppState) {
    let now = Utc::now();
    for _ in 0..5 {
        app_state
            .log_store
            .insert(log_entry("billing", LogLevel::Error, "timeout", now))
            .await
            .unwrap();
    }
    for _ in 0..2 {
        app_state
            .log_store
            .insert(log_entry("billing", LogLevel::Error, "rare", now))
            .await
            .unwrap();
    }

    let axum::response::Json(response) = top_issues::get_top_issues(
        axum::extract::State(app_state),
        axum::extract::Query(TopIssuesParams { hours: 1, limit: 10 }),
    )
    .await
    .expect("top issues handler should succeed");

    assert_eq!(response.issues[0].message, "timeout");
    assert_eq!(response.issues[0].count, 5);
}

#[rstest]
#[tokio::test]
async fn export_trends_streams_json_array(app_state: AppState) {
    let now = Utc::now();
    app_state
        .aggregate_store
        .upsert_aggregate(Aggregate {
            metric_type: MetricType::ServiceActivity,
            service: "billing".to_string(),
            time_bucket: now,
            value: 42.0,
            metadata: None,
        })
        .await
        .unwrap();

    let response = export::export_trends(
        axum::extract::State(app_state),
        axum::extract::Query(ExportParams {
            metric_type: None,
            service: None,
            hours: 24,
            format: "json".to_string(),
        }),
    )
    .await
    .expect("export handler should succeed");

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body should collect");
    let rows: Vec<Aggregate> = serde_json::from_slice(&body).expect("export body should be a JSON array");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].service, "billing");
}

#[rstest]
#[tokio::test]
async fn export_trends_rejects_unknown_format(app_state: AppState) {
    let result = export::export_trends(
        axum::extract::State(app_state),
        axum::extract::Query(ExportParams {
            metric_type: None,
            service: None,
            hours: 24,
            format: "xml".to_string(),
        }),
    )
    .await;
    assert!(result.is_err());
}
