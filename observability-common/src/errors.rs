//! Shared error type for the observability services

use thiserror::Error;

/// Error kinds surfaced across the ingest, query, and analytics boundaries.
///
/// Each variant maps to exactly one HTTP status at the axum boundary; see
/// `IntoResponse` impls in `logs-service`/`analytics-service`.
#[derive(Debug, Error)]
pub enum ObservabilityError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("not authorized: {0}")]
    Authorization(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("service temporarily unavailable: {0}")]
    Transient(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ObservabilityError {
    #[must_use]
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    #[must_use]
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    #[must_use]
    pub fn transient(msg: impl Into<String>) -> Self {
        Self::Transient(msg.into())
    }
}

impl From<sqlx::Error> for ObservabilityError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => Self::NotFound("row not found".to_string()),
            sqlx::Error::PoolTimedOut => Self::Transient("database pool exhausted".to_string()),
            other => Self::Internal(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, ObservabilityError>;
