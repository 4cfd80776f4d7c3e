//! Wire and storage models shared by the ingest, query, and analytics paths.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Maximum message size, bytes.
pub const MAX_MESSAGE_BYTES: usize = 8 * 1024;
/// Maximum metadata size once serialized, bytes.
pub const MAX_METADATA_BYTES: usize = 16 * 1024;
/// Maximum number of tags on a single entry.
pub const MAX_TAGS: usize = 16;
/// Maximum length of a single tag.
pub const MAX_TAG_LEN: usize = 32;
/// Maximum entries accepted in one batch ingest request.
pub const MAX_BATCH_SIZE: usize = 1000;

/// Severity of a log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
    Fatal,
}

impl LogLevel {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
            Self::Fatal => "fatal",
        }
    }
}

impl std::str::FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" | "warning" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            "fatal" => Ok(Self::Fatal),
            other => Err(format!("unknown log level '{other}'")),
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Correlation and trace context carried with every log entry and request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorrelationContext {
    pub correlation_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub span_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    pub service: String,
    pub hostname: String,
    pub environment: String,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_addr: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// A single log line submitted by a client or internal service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub service: String,
    pub level: LogLevel,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default = "default_metadata")]
    pub metadata: serde_json::Value,
    pub context: CorrelationContext,
    pub correlation_id: String,
}

fn default_metadata() -> serde_json::Value {
    serde_json::json!({})
}

/// The metric families an `Aggregate` row can represent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricType {
    ErrorFrequency,
    WarnFrequency,
    ServiceActivity,
}

impl MetricType {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ErrorFrequency => "error_frequency",
            Self::WarnFrequency => "warn_frequency",
            Self::ServiceActivity => "service_activity",
        }
    }
}

impl std::fmt::Display for MetricType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An hourly rollup of one metric family for one service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Aggregate {
    pub metric_type: MetricType,
    pub service: String,
    pub time_bucket: DateTime<Utc>,
    pub value: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

/// Validation failures produced by [`validate_entry`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub reason: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.reason)
    }
}

/// Validates a single entry against the size and shape rules of the ingest API.
pub fn validate_entry(entry: &LogEntry) -> Result<(), ValidationError> {
    if entry.service.is_empty() || entry.service.len() > 64 {
        return Err(ValidationError {
            field: "service",
            reason: "must be 1..=64 characters".to_string(),
        });
    }
    if entry.message.is_empty() {
        return Err(ValidationError {
            field: "message",
            reason: "must not be empty".to_string(),
        });
    }
    if entry.message.len() > MAX_MESSAGE_BYTES {
        return Err(ValidationError {
            field: "message",
            reason: format!("exceeds {MAX_MESSAGE_BYTES} bytes"),
        });
    }
    if entry.tags.len() > MAX_TAGS {
        return Err(ValidationError {
            field: "tags",
            reason: format!("exceeds {MAX_TAGS} entries"),
        });
    }
    if entry.tags.iter().any(|t| t.len() > MAX_TAG_LEN) {
        return Err(ValidationError {
            field: "tags",
            reason: format!("each tag must be <= {MAX_TAG_LEN} characters"),
        });
    }
    let metadata_len = serde_json::to_vec(&entry.metadata)
        .map(|v| v.len())
        .unwrap_or(0);
    if metadata_len > MAX_METADATA_BYTES {
        return Err(ValidationError {
            field: "metadata",
            reason: format!("exceeds {MAX_METADATA_BYTES} bytes"),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> CorrelationContext {
        CorrelationContext {
            correlation_id: "a".repeat(32),
            trace_id: None,
            span_id: None,
            request_id: None,
            user_id: None,
            session_id: None,
            service: "logs-service".to_string(),
            hostname: "localhost".to_string(),
            environment: "test".to_string(),
            version: "0.1.0".to_string(),
            method: None,
            path: None,
            remote_addr: None,
            timestamp: Utc::now(),
        }
    }

    fn entry(message: &str) -> LogEntry {
        LogEntry {
            id: None,
            created_at: Utc::now(),
            service: "billing".to_string(),
            level: LogLevel::Info,
            message: message.to_string(),
            user_id: None,
            tags: vec![],
            metadata: serde_json::json!({}),
            context: ctx(),
            correlation_id: "a".repeat(32),
        }
    }

    #[test]
    fn rejects_empty_message() {
        assert!(validate_entry(&entry("")).is_err());
    }

    #[test]
    fn accepts_minimal_entry() {
        assert!(validate_entry(&entry("hello")).is_ok());
    }

    #[test]
    fn rejects_oversized_message() {
        let big = "x".repeat(MAX_MESSAGE_BYTES + 1);
        assert!(validate_entry(&entry(&big)).is_err());
    }

    #[test]
    fn level_round_trips_through_str() {
        for lvl in ["debug", "info", "warn", "error", "fatal"] {
            let parsed: LogLevel = lvl.parse().unwrap();
            assert_eq!(parsed.as_str(), lvl);
        }
    }

    #[test]
    fn unknown_level_is_rejected() {
        assert!("critical".parse::<LogLevel>().is_err());
    }
}
