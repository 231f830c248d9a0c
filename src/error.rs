//! Error handling module
//!
//! Centralized error types and HTTP response conversion.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::domain::{AmountError, DomainError};
use crate::store::StoreError;

/// Application-wide Result type
pub type AppResult<T> = Result<T, AppError>;

/// Application error types
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // Client errors (4xx)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Missing API key")]
    MissingApiKey,

    #[error("Invalid API key")]
    InvalidApiKey,

    // Domain errors
    #[error(transparent)]
    Domain(#[from] DomainError),

    // Server errors (5xx)
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),
}

impl From<AmountError> for AppError {
    fn from(err: AmountError) -> Self {
        AppError::Domain(err.into())
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::InvalidRequest(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::InvalidRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::InvalidRequest(rejection.body_text())
    }
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub error_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

fn domain_status(err: &DomainError) -> (StatusCode, &'static str, Option<String>) {
    match err {
        DomainError::InvalidInput(msg) => {
            (StatusCode::BAD_REQUEST, "invalid_input", Some(msg.clone()))
        }
        DomainError::ObservationsTooLong(len) => (
            StatusCode::BAD_REQUEST,
            "observations_too_long",
            Some(format!("{} characters", len)),
        ),
        DomainError::SecurityNotAcknowledged => {
            (StatusCode::BAD_REQUEST, "security_not_acknowledged", None)
        }
        DomainError::InvalidStageTransition { .. } => {
            (StatusCode::BAD_REQUEST, "invalid_stage_transition", Some(err.to_string()))
        }
        DomainError::ClosingAlreadyExists(date) => {
            (StatusCode::CONFLICT, "closing_already_exists", Some(date.to_string()))
        }
        DomainError::BusinessDateClosed(date) => {
            (StatusCode::CONFLICT, "business_date_closed", Some(date.to_string()))
        }
        DomainError::ClosingAlreadySubmitted => {
            (StatusCode::CONFLICT, "closing_already_submitted", None)
        }
        DomainError::ClosingNotFound(id) => {
            (StatusCode::NOT_FOUND, "closing_not_found", Some(id.clone()))
        }
        DomainError::InvalidThresholds(msg) => {
            tracing::error!("Invalid thresholds reached the engine: {}", msg);
            (StatusCode::INTERNAL_SERVER_ERROR, "invalid_thresholds", None)
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_code, details) = match &self {
            // 400 Bad Request
            AppError::InvalidRequest(msg) => {
                (StatusCode::BAD_REQUEST, "invalid_request", Some(msg.clone()))
            }

            // 401 Unauthorized
            AppError::MissingApiKey => (StatusCode::UNAUTHORIZED, "missing_api_key", None),
            AppError::InvalidApiKey => (StatusCode::UNAUTHORIZED, "invalid_api_key", None),

            AppError::Domain(domain_err) => domain_status(domain_err),

            // Stores report duplicates themselves when a race slips past the service check
            AppError::Store(StoreError::DuplicateClosing(date)) => {
                (StatusCode::CONFLICT, "closing_already_exists", Some(date.to_string()))
            }

            // 500 Internal Server Error
            AppError::Store(e) => {
                tracing::error!("Store error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "store_error", None)
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None)
            }
            AppError::Config(e) => {
                tracing::error!("Config error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "config_error", None)
            }
        };

        // Server-side failures never echo internals to the client
        let error = if status.is_server_error() {
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        let body = ErrorResponse {
            error,
            error_code: error_code.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}
