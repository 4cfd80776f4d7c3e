//! Request/response shapes for the analytics HTTP API.

use observability_common::MetricType;
use serde::{Deserialize, Serialize};

fn default_hours() -> i64 {
    24
}

#[derive(Debug, Deserialize)]
pub struct TrendParams {
    pub metric_type: MetricType,
    pub service: String,
    #[serde(default = "default_hours")]
    pub hours: i64,
}

#[derive(Debug, Serialize)]
pub struct TrendResponse {
    pub metric_type: MetricType,
    pub service: String,
    pub series: Vec<f64>,
    pub direction: Option<crate::analysis::TrendDirection>,
    pub percent_change: Option<f64>,
    pub rule: &'static str,
}

#[derive(Debug, Deserialize)]
pub struct AnomalyParams {
    pub metric_type: MetricType,
    pub service: String,
    #[serde(default = "default_hours")]
    pub hours: i64,
}

#[derive(Debug, Serialize)]
pub struct AnomalyResponse {
    pub metric_type: MetricType,
    pub service: String,
    pub anomalies: Vec<crate::analysis::Anomaly>,
}

fn default_top_issues_limit() -> usize {
    20
}

#[derive(Debug, Deserialize)]
pub struct TopIssuesParams {
    #[serde(default = "default_hours")]
    pub hours: i64,
    #[serde(default = "default_top_issues_limit")]
    pub limit: usize,
}

#[derive(Debug, Serialize)]
pub struct TopIssuesResponse {
    pub issues: Vec<observability_common::storage::TopIssue>,
}

#[derive(Debug, Deserialize)]
pub struct ExportParams {
    pub metric_type: Option<MetricType>,
    pub service: Option<String>,
    #[serde(default = "default_export_hours")]
    pub hours: i64,
    #[serde(default = "default_export_format")]
    pub format: String,
}

fn default_export_hours() -> i64 {
    24 * 7
}

fn default_export_format() -> String {
    "json".to_string()
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub database_connected: bool,
    pub uptime_seconds: u64,
    pub version: String,
}
