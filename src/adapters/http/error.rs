//! Error responses shared by the drafting and conversation endpoints.

use axum::extract::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::application::DraftingError;
use crate::domain::foundation::ValidationError;

/// JSON error body.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

impl ErrorResponse {
    fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new("BAD_REQUEST", message)
    }

    pub fn not_found(resource_type: &str, id: &str) -> Self {
        Self::new("NOT_FOUND", format!("{} not found: {}", resource_type, id))
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new("CONFLICT", message)
    }

    pub fn unprocessable(message: impl Into<String>) -> Self {
        Self::new("UNPROCESSABLE", message)
    }

    pub fn bad_gateway(message: impl Into<String>) -> Self {
        Self::new("GENERATION_FAILED", message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new("INTERNAL_ERROR", message)
    }
}

/// HTTP-facing wrapper around [`DraftingError`].
#[derive(Debug)]
pub struct DraftingApiError(pub DraftingError);

impl From<DraftingError> for DraftingApiError {
    fn from(err: DraftingError) -> Self {
        Self(err)
    }
}

impl From<ValidationError> for DraftingApiError {
    fn from(err: ValidationError) -> Self {
        Self(DraftingError::from(err))
    }
}

impl IntoResponse for DraftingApiError {
    fn into_response(self) -> Response {
        let message = self.0.to_string();
        let (status, error) = match self.0 {
            DraftingError::EmptyMessage | DraftingError::Validation(_) => {
                (StatusCode::BAD_REQUEST, ErrorResponse::bad_request(message))
            }
            DraftingError::SessionNotFound(id) => (
                StatusCode::NOT_FOUND,
                ErrorResponse::not_found("Drafting session", id.as_str()),
            ),
            DraftingError::SessionBusy(_) | DraftingError::ThreadMismatch { .. } => {
                (StatusCode::CONFLICT, ErrorResponse::conflict(message))
            }
            DraftingError::NoProposal | DraftingError::InvalidState { .. } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorResponse::unprocessable(message),
            ),
            DraftingError::Generation(e) => {
                tracing::warn!(error = %e, "reply generation failed");
                (
                    StatusCode::BAD_GATEWAY,
                    ErrorResponse::bad_gateway("Reply generation failed"),
                )
            }
            DraftingError::Storage(e) => {
                tracing::error!(error = %e, "storage failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::internal("An internal error occurred"),
                )
            }
            DraftingError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::internal("An internal error occurred"),
                )
            }
        };

        (status, Json(error)).into_response()
    }
}
