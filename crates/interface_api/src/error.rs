//! API error handling

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use validator::ValidationErrors;

use domain_admission::AssuranceError;

/// API error types
#[derive(Debug, Error)]
pub enum ApiError {
    /// Malformed request body
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// The settlement procedure refused to open an account
    #[error("Settlement failed: {0}")]
    SettlementFailed(String),

    /// Storage faults and timeouts; the message never carries the cause
    #[error("Internal server error: {0}")]
    Internal(String),
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub ok: bool,
    pub error: String,
    pub message: String,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) | ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::SettlementFailed(_) | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "bad_request",
            ApiError::Validation(_) => "validation_error",
            ApiError::NotFound(_) => "not_found",
            ApiError::SettlementFailed(_) => "settlement_failed",
            ApiError::Internal(_) => "internal_error",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error = self.kind().to_string();
        let message = match self {
            ApiError::BadRequest(msg)
            | ApiError::Validation(msg)
            | ApiError::NotFound(msg)
            | ApiError::SettlementFailed(msg)
            | ApiError::Internal(msg) => msg,
        };

        let body = ErrorResponse {
            ok: false,
            error,
            message,
        };

        (status, Json(body)).into_response()
    }
}

impl From<AssuranceError> for ApiError {
    fn from(err: AssuranceError) -> Self {
        match err {
            AssuranceError::Validation { field, message } => {
                ApiError::Validation(format!("{}: {}", field, message))
            }
            AssuranceError::EpisodeNotFound(episode_id) => {
                ApiError::NotFound(format!("Hospitalization episode {} not found", episode_id))
            }
            AssuranceError::OperationFailed { .. } => {
                ApiError::Internal("Account assurance failed".to_string())
            }
            AssuranceError::TimedOut(_) => {
                ApiError::Internal("Account assurance timed out".to_string())
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        ApiError::Validation(errors.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_kernel::{EpisodeId, PortError};

    #[test]
    fn test_assurance_errors_map_to_statuses() {
        let validation = ApiError::from(AssuranceError::validation("patient_id", "is required"));
        assert_eq!(validation.status(), StatusCode::BAD_REQUEST);
        assert!(validation.to_string().contains("patient_id"));

        let missing = ApiError::from(AssuranceError::EpisodeNotFound(
            EpisodeId::parse("H-404").unwrap(),
        ));
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);

        let storage = ApiError::from(AssuranceError::storage(PortError::connection(
            "password authentication failed for user admission",
        )));
        assert_eq!(storage.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!storage.to_string().contains("password"));
    }
}
