//! Prometheus metrics for the analytics service, registered once at startup
//! and updated from the aggregator loop and the analysis handlers.

use std::sync::OnceLock;
use std::time::Instant;

static METRICS: OnceLock<AnalyticsMetrics> = OnceLock::new();

pub struct AnalyticsMetrics {
    start_time: Instant,
}

/// Registers metric descriptions; call once during startup.
pub fn register_metrics() {
    metrics::describe_counter!(
        "aggregator_runs_total",
        "Total aggregator tick executions"
    );
    metrics::describe_counter!(
        "aggregator_run_failures_total",
        "Total aggregator tick executions that failed"
    );
    metrics::describe_histogram!(
        "aggregator_run_duration_seconds",
        "Aggregator tick wall-clock duration"
    );
    metrics::describe_histogram!(
        "analytics_query_duration_seconds",
        "Trend/anomaly/top-issues handler latency"
    );
    metrics::describe_counter!(
        "analytics_export_rows_total",
        "Total rows streamed by the export endpoint"
    );
}

pub fn init_metrics() {
    let _ = METRICS.set(AnalyticsMetrics {
        start_time: Instant::now(),
    });
}

fn get() -> Option<&'static AnalyticsMetrics> {
    METRICS.get()
}

#[must_use]
pub fn uptime_seconds() -> u64 {
    get().map_or(0, |m| m.start_time.elapsed().as_secs())
}

pub fn record_aggregator_run(duration_secs: f64, failed: bool) {
    metrics::counter!("aggregator_runs_total").increment(1);
    if failed {
        metrics::counter!("aggregator_run_failures_total").increment(1);
    }
    metrics::histogram!("aggregator_run_duration_seconds").record(duration_secs);
}

pub fn record_query(duration_secs: f64) {
    metrics::histogram!("analytics_query_duration_seconds").record(duration_secs);
}

pub fn record_export_rows(rows: u64) {
    metrics::counter!("analytics_export_rows_total").increment(rows);
}
