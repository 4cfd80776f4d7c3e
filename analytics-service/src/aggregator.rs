//! Hourly rollup of `logs.entries` into `analytics.aggregations`.
//!
//! Runs a single in-process tick loop rather than a cron job: the window
//! being aggregated is always "the hour that just closed," so the trigger
//! only needs wall-clock time, not an external scheduler.

use chrono::{DateTime, Datelike, Duration as ChronoDuration, TimeZone, Timelike, Utc};
use observability_common::storage::{AggregateQuery, AggregateStore, LogQuery, LogStore};
use observability_common::{Aggregate, LogLevel, MetricType};
use rustc_hash::FxHashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

pub struct Aggregator {
    log_store: Arc<dyn LogStore>,
    aggregate_store: Arc<dyn AggregateStore>,
    tick_interval: Duration,
}

impl Aggregator {
    #[must_use]
    pub fn new(
        log_store: Arc<dyn LogStore>,
        aggregate_store: Arc<dyn AggregateStore>,
        tick_interval: Duration,
    ) -> Self {
        Self {
            log_store,
            aggregate_store,
            tick_interval,
        }
    }

    /// Spawns the aggregator loop; it stops when `shutdown` changes.
    pub fn spawn(self, mut shutdown: watch::Receiver<()>) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.tick_interval);
            loop {
                tokio::select! {
                    _ = shutdown.changed() => {
                        tracing::info!("aggregator received shutdown signal");
                        break;
                    }
                    _ = ticker.tick() => {
                        let start = std::time::Instant::now();
                        let result = self.run_once(previous_closed_hour(Utc::now())).await;
                        let failed = result.is_err();
                        if let Err(e) = result {
                            tracing::warn!(error = %e, "aggregator run failed, will retry next tick");
                        }
                        crate::metrics::record_aggregator_run(start.elapsed().as_secs_f64(), failed);
                    }
                }
            }
        })
    }

    /// Computes and upserts the three metric families for the half-open
    /// window `[hour, hour + 1h)`. Idempotent: safe to call again for the
    /// same hour after a prior failure.
    pub async fn run_once(&self, hour: DateTime<Utc>) -> observability_common::Result<()> {
        let window_end = hour + ChronoDuration::hours(1);
        tracing::info!(hour = %hour, "aggregator run starting");

        let entries = self
            .log_store
            .query(LogQuery {
                service: None,
                level: None,
                correlation_id: None,
                since: Some(hour),
                until: Some(window_end),
                limit: i64::MAX,
                offset: 0,
            })
            .await?;

        let mut per_service_total: FxHashMap<String, i64> = FxHashMap::default();
        let mut per_service_errors: FxHashMap<String, i64> = FxHashMap::default();
        let mut per_service_warns: FxHashMap<String, i64> = FxHashMap::default();

        for entry in &entries {
            match entry.level {
                LogLevel::Info | LogLevel::Debug => {
                    *per_service_total.entry(entry.service.clone()).or_insert(0) += 1;
                }
                LogLevel::Error => {
                    *per_service_errors.entry(entry.service.clone()).or_insert(0) += 1;
                }
                LogLevel::Warn => {
                    *per_service_warns.entry(entry.service.clone()).or_insert(0) += 1;
                }
                LogLevel::Fatal => {}
            }
        }

        for (service, count) in &per_service_total {
            self.upsert(MetricType::ServiceActivity, service, hour, *count as f64)
                .await?;
        }
        for (service, count) in &per_service_errors {
            self.upsert(MetricType::ErrorFrequency, service, hour, *count as f64)
                .await?;
        }
        for (service, count) in &per_service_warns {
            self.upsert(MetricType::WarnFrequency, service, hour, *count as f64)
                .await?;
        }

        tracing::info!(hour = %hour, services = per_service_total.len(), "aggregator run completed");
        Ok(())
    }

    async fn upsert(
        &self,
        metric_type: MetricType,
        service: &str,
        hour: DateTime<Utc>,
        value: f64,
    ) -> observability_common::Result<()> {
        self.aggregate_store
            .upsert_aggregate(Aggregate {
                metric_type,
                service: service.to_string(),
                time_bucket: hour,
                value,
                metadata: None,
            })
            .await
    }

    pub async fn query_series(
        &self,
        metric_type: MetricType,
        service: &str,
        since: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> observability_common::Result<Vec<Aggregate>> {
        self.aggregate_store
            .query_aggregates(AggregateQuery {
                metric_type: Some(metric_type),
                service: Some(service.to_string()),
                since,
                until,
            })
            .await
    }
}

/// The most recently completed UTC hour boundary strictly before `now`.
/// Aggregates never cover the open (still-accumulating) hour.
fn previous_closed_hour(now: DateTime<Utc>) -> DateTime<Utc> {
    let truncated = Utc
        .with_ymd_and_hms(now.year(), now.month(), now.day(), now.hour(), 0, 0)
        .single()
        .unwrap_or(now);
    truncated - ChronoDuration::hours(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use observability_common::storage::{InMemoryAggregateStore, InMemoryLogStore};
    use observability_common::{CorrelationContext, LogEntry};

    fn entry(service: &str, level: LogLevel, created_at: DateTime<Utc>) -> LogEntry {
        LogEntry {
            id: None,
            created_at,
            service: service.to_string(),
            level,
            message: "x".to_string(),
            user_id: None,
            tags: vec![],
            metadata: serde_json::json!({}),
            context: CorrelationContext {
                correlation_id: "d".repeat(32),
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
                timestamp: created_at,
            },
            correlation_id: "d".repeat(32),
        }
    }

    #[tokio::test]
    async fn run_once_upserts_error_and_activity_counts() {
        let log_store = Arc::new(InMemoryLogStore::new());
        let aggregate_store = Arc::new(InMemoryAggregateStore::new());
        let hour = Utc.with_ymd_and_hms(2026, 1, 1, 10, 0, 0).unwrap();

        log_store.insert(entry("billing", LogLevel::Error, hour + ChronoDuration::minutes(5))).await.unwrap();
        log_store.insert(entry("billing", LogLevel::Info, hour + ChronoDuration::minutes(10))).await.unwrap();
        // outside the window, must not count
        log_store.insert(entry("billing", LogLevel::Error, hour + ChronoDuration::hours(2))).await.unwrap();

        let aggregator = Aggregator::new(log_store, aggregate_store.clone(), Duration::from_secs(3600));
        aggregator.run_once(hour).await.unwrap();

        let series = aggregator
            .query_series(MetricType::ErrorFrequency, "billing", hour, hour + ChronoDuration::hours(1))
            .await
            .unwrap();
        assert_eq!(series.len(), 1);
        assert_eq!(series[0].value, 1.0);

        let activity = aggregator
            .query_series(MetricType::ServiceActivity, "billing", hour, hour + ChronoDuration::hours(1))
            .await
            .unwrap();
        assert_eq!(activity[0].value, 1.0);
    }

    #[test]
    fn previous_closed_hour_truncates_and_steps_back() {
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 10, 45, 30).unwrap();
        let hour = previous_closed_hour(now);
        assert_eq!(hour, Utc.with_ymd_and_hms(2026, 1, 1, 9, 0, 0).unwrap());
    }
}
