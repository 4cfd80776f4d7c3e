//! Prometheus metrics for the logs service, registered once at startup and
//! updated from the ingest handlers and the Stream Hub.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::OnceLock;
use std::time::Instant;

static METRICS: OnceLock<LogsMetrics> = OnceLock::new();

pub struct LogsMetrics {
    start_time: Instant,
    active_subscribers: AtomicU64,
}

/// Registers metric descriptions; call once during startup.
pub fn register_metrics() {
    metrics::describe_counter!("logs_ingested_total", "Total log entries accepted");
    metrics::describe_counter!(
        "logs_ingest_rejected_total",
        "Total log entries rejected by validation"
    );
    metrics::describe_counter!(
        "logs_ingest_storage_errors_total",
        "Total ingest requests that failed to persist"
    );
    metrics::describe_histogram!(
        "logs_ingest_duration_seconds",
        "Ingest request handler latency"
    );
    metrics::describe_histogram!("logs_query_duration_seconds", "Query handler latency");
    metrics::describe_counter!(
        "stream_hub_published_total",
        "Total entries handed to the stream hub"
    );
    metrics::describe_counter!(
        "stream_hub_subscriber_dropped_total",
        "Total subscribers evicted for a full mailbox"
    );
    metrics::describe_gauge!(
        "stream_hub_active_subscribers",
        "Current number of websocket subscribers"
    );
}

pub fn init_metrics() {
    let _ = METRICS.set(LogsMetrics {
        start_time: Instant::now(),
        active_subscribers: AtomicU64::new(0),
    });
}

fn get() -> Option<&'static LogsMetrics> {
    METRICS.get()
}

#[must_use]
pub fn uptime_seconds() -> u64 {
    get().map_or(0, |m| m.start_time.elapsed().as_secs())
}

pub fn record_ingest(entries: usize, duration_secs: f64) {
    metrics::counter!("logs_ingested_total").increment(entries as u64);
    metrics::histogram!("logs_ingest_duration_seconds").record(duration_secs);
}

pub fn record_ingest_rejected() {
    metrics::counter!("logs_ingest_rejected_total").increment(1);
}

pub fn record_ingest_storage_error() {
    metrics::counter!("logs_ingest_storage_errors_total").increment(1);
}

pub fn record_query(duration_secs: f64) {
    metrics::histogram!("logs_query_duration_seconds").record(duration_secs);
}

pub fn record_stream_publish() {
    metrics::counter!("stream_hub_published_total").increment(1);
}

pub fn record_subscriber_connected() {
    if let Some(m) = get() {
        let n = m.active_subscribers.fetch_add(1, Ordering::Relaxed) + 1;
        metrics::gauge!("stream_hub_active_subscribers").set(n as f64);
    }
}

pub fn record_subscriber_disconnected() {
    if let Some(m) = get() {
        let n = m.active_subscribers.fetch_sub(1, Ordering::Relaxed) - 1;
        metrics::gauge!("stream_hub_active_subscribers").set(n as f64);
    }
}
