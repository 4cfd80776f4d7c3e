//! Maps the shared error type onto HTTP responses at the axum boundary.

use axum::{http::StatusCode, response::IntoResponse, response::Json};
use observability_common::ObservabilityError;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

pub struct ApiError(pub ObservabilityError);

impl From<ObservabilityError> for ApiError {
    fn from(err: ObservabilityError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match &self.0 {
            ObservabilityError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ObservabilityError::Authorization(msg) => (StatusCode::FORBIDDEN, msg.clone()),
            ObservabilityError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            ObservabilityError::Transient(msg) => {
                tracing::warn!(error = %msg, "transient failure");
                (StatusCode::SERVICE_UNAVAILABLE, msg.clone())
            }
            ObservabilityError::Internal(msg) => {
                tracing::error!(error = %msg, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "an internal error occurred".to_string(),
                )
            }
        };
        (
            status,
            Json(ErrorBody {
                error: message,
                field: None,
            }),
        )
            .into_response()
    }
}
