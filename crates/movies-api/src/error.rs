//! # API Error Types
//!
//! Structured error type implementing `axum::response::IntoResponse`.
//! Maps `movies-core` service errors to HTTP status codes and renders the
//! shared [`ErrorBody`] JSON shape. Internal error details are logged,
//! never returned.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use movies_contracts::{ErrorBody, ErrorDetail, ValidationFailureResponse, ValidationProblem};
use movies_core::{ServiceError, ValidationErrors};
use thiserror::Error;

/// Application-level error type that implements [`IntoResponse`] for Axum.
#[derive(Error, Debug)]
pub enum AppError {
    /// Resource not found (404).
    #[error("not found: {0}")]
    NotFound(String),

    /// One or more validation rules failed (400). Every failure is returned.
    #[error("validation failed: {0}")]
    Validation(ValidationErrors),

    /// Request body or query string could not be parsed (400).
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Missing or invalid credentials (401).
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Authenticated but lacking the required claim (403).
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Internal server error (500). Message is logged but not returned to client.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Self::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            Self::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            Self::Forbidden(_) => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }

    fn details(&self) -> Option<serde_json::Value> {
        let Self::Validation(errors) = self else {
            return None;
        };
        let problem = ValidationProblem {
            errors: errors
                .failures()
                .iter()
                .map(|f| ValidationFailureResponse {
                    property_name: f.property.clone(),
                    message: f.message.clone(),
                })
                .collect(),
        };
        serde_json::to_value(problem).ok()
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let message = match &self {
            Self::Internal(_) => "An internal error occurred".to_string(),
            other => other.to_string(),
        };

        if matches!(&self, Self::Internal(_)) {
            tracing::error!(error = %self, "internal server error");
        }

        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message,
                details: self.details(),
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Validation(errors) => Self::Validation(errors),
            ServiceError::Repository(e) => Self::Internal(e.to_string()),
        }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        Self::Validation(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use movies_core::RepositoryError;

    async fn response_parts(err: AppError) -> (StatusCode, ErrorBody) {
        let response = err.into_response();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: ErrorBody = serde_json::from_slice(&bytes).unwrap();
        (status, body)
    }

    #[test]
    fn status_codes() {
        let cases = [
            (AppError::NotFound("x".into()), StatusCode::NOT_FOUND, "NOT_FOUND"),
            (
                AppError::Validation(ValidationErrors::single("Title", "empty")),
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
            ),
            (AppError::BadRequest("x".into()), StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            (AppError::Unauthorized("x".into()), StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            (AppError::Forbidden("x".into()), StatusCode::FORBIDDEN, "FORBIDDEN"),
            (
                AppError::Internal("x".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
            ),
        ];
        for (err, status, code) in cases {
            assert_eq!(err.status_and_code(), (status, code));
        }
    }

    #[tokio::test]
    async fn validation_lists_every_failure() {
        let mut errors = ValidationErrors::single("Title", "'Title' must not be empty.");
        errors.push("Genres", "'Genres' must not be empty.");
        let (status, body) = response_parts(AppError::Validation(errors)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let failures = body.validation_failures();
        assert_eq!(failures.len(), 2);
        assert_eq!(failures[0].property_name, "Title");
        assert_eq!(failures[1].property_name, "Genres");
    }

    #[tokio::test]
    async fn not_found_has_no_details() {
        let (status, body) = response_parts(AppError::NotFound("movie".into())).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body.error.details.is_none());
        assert!(body.error.message.contains("movie"));
    }

    #[tokio::test]
    async fn internal_hides_details() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "pg refused");
        let err: AppError = ServiceError::Repository(RepositoryError::database(io)).into();
        let (status, body) = response_parts(err).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.error.message, "An internal error occurred");
        assert!(!body.error.message.contains("pg refused"));
    }
}
