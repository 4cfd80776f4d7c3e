use chrono::Utc;
use logs_service::stream_hub::{StreamHub, SubscriberFilter};
use observability_common::{CorrelationContext, LogEntry, LogLevel};

fn entry(service: &str, level: LogLevel) -> LogEntry {
    LogEntry {
        id: None,
        created_at: Utc::now(),
        service: service.to_string(),
        level,
        message: "hi".to_string(),
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
            hostname: "h".to_string(),
            environment: "test".to_string(),
            version: "0.1.0".to_string(),
            method: None,
            path: None,
            remote_addr: None,
            timestamp: Utc::now(),
        },
        correlation_id: "c".repeat(32),
    }
}

#[tokio::test]
async fn set_filter_changes_what_a_subscriber_receives() {
    let hub = StreamHub::spawn();
    let (id, mut rx) = hub.register(SubscriberFilter::default(), 8).await;

    hub.set_filter(
        id,
        SubscriberFilter {
            service: Some("auth".to_string()),
            ..Default::default()
        },
    )
    .await;

    hub.publish(entry("billing", LogLevel::Info)).await;
    hub.publish(entry("auth", LogLevel::Warn)).await;

    let received = tokio::time::timeout(std::time::Duration::from_secs(1), rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(received.service, "auth");
}

#[tokio::test]
async fn level_filter_excludes_non_matching_entries() {
    let hub = StreamHub::spawn();
    let (_id, mut rx) = hub
        .register(
            SubscriberFilter {
                level: Some(LogLevel::Error),
                ..Default::default()
            },
            8,
        )
        .await;

    hub.publish(entry("svc", LogLevel::Info)).await;
    hub.publish(entry("svc", LogLevel::Error)).await;

    let received = tokio::time::timeout(std::time::Duration::from_secs(1), rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(received.level, LogLevel::Error);
}
