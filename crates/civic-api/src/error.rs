//! # API Error Types
//!
//! Structured error type implementing `axum::response::IntoResponse`.
//! Maps domain errors from civic-core, civic-state, and the issue store to
//! HTTP status codes with a JSON body carrying a code and a message.
//! Internal error details never reach the client.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use civic_core::ValidationError;
use civic_state::DeletionError;

use crate::store::StoreError;

/// Structured JSON error response body.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

/// Inner error detail.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "NOT_FOUND", "VALIDATION_ERROR").
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Additional details, present only for client errors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Application-level error type that implements [`IntoResponse`] for Axum.
#[derive(Error, Debug)]
pub enum AppError {
    /// Resource not found (404).
    #[error("not found: {0}")]
    NotFound(String),

    /// A field failed a business rule, e.g. rating outside 1..=5 (400).
    #[error("validation error: {0}")]
    Validation(String),

    /// Body or path could not be parsed (400).
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Missing or invalid credentials (401).
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Authenticated but not allowed (403).
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Conflict with current resource state (409).
    #[error("conflict: {0}")]
    Conflict(String),

    /// A dependency is unreachable (503).
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Internal server error (500). Message is logged but not returned to client.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Return the HTTP status code and machine-readable error code for this error.
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Self::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            Self::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            Self::Forbidden(_) => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            Self::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
            Self::ServiceUnavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, "SERVICE_UNAVAILABLE"),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }

    /// Short outcome label for the engine operations counter.
    pub fn outcome(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::Validation(_) | Self::BadRequest(_) => "invalid",
            Self::Unauthorized(_) | Self::Forbidden(_) => "denied",
            Self::Conflict(_) => "conflict",
            Self::ServiceUnavailable(_) | Self::Internal(_) => "error",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let message = match &self {
            Self::Internal(_) => "An internal error occurred".to_string(),
            other => other.to_string(),
        };

        match &self {
            Self::Internal(_) => tracing::error!(error = %self, "internal server error"),
            Self::ServiceUnavailable(_) => tracing::warn!(error = %self, "service unavailable"),
            _ => {}
        }

        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message,
                details: None,
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match &err {
            StoreError::ProblemNotFound(_)
            | StoreError::UserNotFound(_)
            | StoreError::FlagNotFound { .. } => Self::NotFound(err.to_string()),
            StoreError::DuplicateFlag { .. }
            | StoreError::DuplicateEmail(_)
            | StoreError::Transition(_) => Self::Conflict(err.to_string()),
            StoreError::Ban(_) => Self::Forbidden(err.to_string()),
            StoreError::Deletion(DeletionError::NotOwner { .. }) => Self::Forbidden(err.to_string()),
            StoreError::Deletion(DeletionError::NotReported { .. }) => {
                Self::Conflict(err.to_string())
            }
            StoreError::Database(_) => Self::Internal(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use civic_core::{ProblemId, UserId};
    use civic_state::{BanError, ProblemStatus, TransitionError};
    use http_body_util::BodyExt;

    #[test]
    fn not_found_status_code() {
        let err = AppError::NotFound("missing problem".to_string());
        let (status, code) = err.status_and_code();
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(code, "NOT_FOUND");
    }

    #[test]
    fn validation_is_bad_request() {
        let err = AppError::Validation("rating out of range".to_string());
        let (status, code) = err.status_and_code();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(code, "VALIDATION_ERROR");
    }

    #[test]
    fn conflict_status_code() {
        let err = AppError::Conflict("already flagged".to_string());
        assert_eq!(err.status_and_code(), (StatusCode::CONFLICT, "CONFLICT"));
    }

    #[test]
    fn rating_out_of_range_maps_to_validation() {
        let err: AppError = ValidationError::RatingOutOfRange(9).into();
        assert!(matches!(err, AppError::Validation(ref m) if m.contains('9')));
    }

    #[test]
    fn store_errors_map_to_expected_kinds() {
        let p = ProblemId::new(3);
        let u = UserId::new(7);
        let cases: Vec<(StoreError, StatusCode)> = vec![
            (StoreError::ProblemNotFound(p), StatusCode::NOT_FOUND),
            (StoreError::UserNotFound(u), StatusCode::NOT_FOUND),
            (
                StoreError::FlagNotFound { user: u, problem: p },
                StatusCode::NOT_FOUND,
            ),
            (
                StoreError::DuplicateFlag { user: u, problem: p },
                StatusCode::CONFLICT,
            ),
            (
                StoreError::Transition(TransitionError::InvalidTransition {
                    from: ProblemStatus::Rejected,
                    to: ProblemStatus::Completed,
                }),
                StatusCode::CONFLICT,
            ),
            (
                StoreError::Ban(BanError::ProtectedAccount(u)),
                StatusCode::FORBIDDEN,
            ),
            (
                StoreError::Deletion(DeletionError::NotOwner { requester: u }),
                StatusCode::FORBIDDEN,
            ),
            (
                StoreError::Deletion(DeletionError::NotReported {
                    status: ProblemStatus::InProgress,
                }),
                StatusCode::CONFLICT,
            ),
            (
                StoreError::Database("connection reset".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (store_err, expected) in cases {
            let app_err = AppError::from(store_err);
            assert_eq!(app_err.status_and_code().0, expected, "{app_err}");
        }
    }

    #[tokio::test]
    async fn internal_error_message_is_hidden() {
        let response = AppError::Internal("password=hunter2".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: ErrorBody = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body.error.code, "INTERNAL_ERROR");
        assert!(!body.error.message.contains("hunter2"));
        assert!(body.error.details.is_none());
    }

    #[tokio::test]
    async fn client_error_message_is_returned() {
        let response = AppError::Conflict("user 1 has already flagged problem 2".into())
            .into_response();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["error"]["code"], "CONFLICT");
        assert!(json["error"]["message"]
            .as_str()
            .unwrap()
            .contains("already flagged"));
        assert!(json["error"].get("details").is_none());
    }
}
