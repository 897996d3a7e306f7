use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::use_cases::{CheckoutError, ReconcileError};
use crate::validation::ValidationError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),
}

impl AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(json!({
            "error": self.to_string(),
            "status": status.as_u16(),
        }));

        (status, body).into_response()
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::Validation(err.to_string())
    }
}

impl From<ReconcileError> for AppError {
    fn from(err: ReconcileError) -> Self {
        match err {
            // the caller learns nothing about why authentication failed
            ReconcileError::Authentication => AppError::BadRequest("Invalid signature".to_string()),
            ReconcileError::Decode(_) => AppError::BadRequest("Malformed payload".to_string()),
            ReconcileError::InvalidOrderFormat(e) => AppError::BadRequest(e.to_string()),
            ReconcileError::RegistrationNotFound(id) => {
                AppError::NotFound(format!("Registration {} not found", id))
            }
            ReconcileError::Persistence(detail) => {
                tracing::error!(error = %detail, "payment callback could not be persisted");
                AppError::Internal("payment storage unavailable".to_string())
            }
        }
    }
}

impl From<CheckoutError> for AppError {
    fn from(err: CheckoutError) -> Self {
        match err {
            CheckoutError::RegistrationNotFound(id) => {
                AppError::NotFound(format!("Registration {} not found", id))
            }
            CheckoutError::NotPayable { .. } => AppError::Conflict(err.to_string()),
            CheckoutError::InvalidIdentifier(e) => AppError::Validation(e.to_string()),
            CheckoutError::Encode(e) => AppError::Internal(e.to_string()),
            CheckoutError::Persistence(detail) => {
                tracing::error!(error = %detail, "checkout order could not be stored");
                AppError::Internal("payment storage unavailable".to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::OrderIdError;

    #[test]
    fn test_validation_error_status_code() {
        let error = AppError::Validation("Invalid input".to_string());
        assert_eq!(error.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_not_found_error_status_code() {
        let error = AppError::NotFound("Resource not found".to_string());
        assert_eq!(error.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_conflict_error_status_code() {
        let error = AppError::Conflict("already paid".to_string());
        assert_eq!(error.status_code(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_unauthorized_error_status_code() {
        let error = AppError::Unauthorized("Unauthorized access".to_string());
        assert_eq!(error.status_code(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_reconcile_errors_map_to_documented_codes() {
        let cases = [
            (ReconcileError::Authentication, StatusCode::BAD_REQUEST),
            (
                ReconcileError::InvalidOrderFormat(OrderIdError::InvalidOrderFormat("x".into())),
                StatusCode::BAD_REQUEST,
            ),
            (
                ReconcileError::RegistrationNotFound("reg".into()),
                StatusCode::NOT_FOUND,
            ),
            (
                ReconcileError::Persistence("pool timed out".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(AppError::from(err).status_code(), expected);
        }
    }

    #[test]
    fn test_authentication_error_leaks_nothing() {
        let error = AppError::from(ReconcileError::Authentication);
        assert_eq!(error.to_string(), "Bad request: Invalid signature");
    }

    #[test]
    fn test_persistence_detail_not_in_response() {
        let error = AppError::from(ReconcileError::Persistence("password authentication failed".into()));
        assert!(!error.to_string().contains("password"));
    }

    #[tokio::test]
    async fn test_not_found_error_response() {
        let error = AppError::NotFound("Registration not found".to_string());
        let response = error.into_response();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
