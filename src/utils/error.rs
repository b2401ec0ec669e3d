//! Error Handling Utilities
//!
//! Crate-wide error type and the JSON error body returned by every failing endpoint.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// A single field-level input violation
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct FieldViolation {
    /// Request field name as it appears in the JSON payload
    pub field: String,
    /// Human readable description of the problem
    pub message: String,
}

impl FieldViolation {
    pub fn new(field: &str, message: &str) -> Self {
        Self {
            field: field.to_string(),
            message: message.to_string(),
        }
    }
}

/// Main application error type that every service error converts into
#[derive(Error, Debug)]
pub enum AppError {
    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Request payload failed validation; violations are kept in field order
    #[error("Validation failed: {} field violation(s)", .0.len())]
    Validation(Vec<FieldViolation>),

    /// Request body could not be read as the expected JSON shape
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Credentials did not match
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// Resource not found errors
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Identity provider outcome already translated into a status and message
    #[error("Identity provider error ({error_code}): {message}")]
    IdentityProvider {
        status: StatusCode,
        message: String,
        error_code: String,
    },

    /// Generic internal server errors
    #[error("Internal server error: {0}")]
    Internal(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Password hashing errors
    #[error("Password hashing error: {0}")]
    HashingError(#[from] bcrypt::BcryptError),
}

/// Standard error response structure for API endpoints
#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<FieldViolation>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
}

impl ErrorResponse {
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
            errors: None,
            error_code: None,
        }
    }

    pub fn with_violations(message: &str, errors: Vec<FieldViolation>) -> Self {
        Self {
            message: message.to_string(),
            errors: Some(errors),
            error_code: None,
        }
    }

    pub fn with_error_code(message: &str, error_code: &str) -> Self {
        Self {
            message: message.to_string(),
            errors: None,
            error_code: Some(error_code.to_string()),
        }
    }
}

impl AppError {
    /// HTTP status this error is reported with
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Authentication(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::IdentityProvider { status, .. } => *status,
            AppError::Database(_)
            | AppError::Internal(_)
            | AppError::Configuration(_)
            | AppError::HashingError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let body = match self {
            AppError::Database(e) => {
                log::error!("Database error while handling request: {}", e);
                ErrorResponse::new("A database error occurred")
            }
            AppError::Validation(violations) => {
                ErrorResponse::with_violations("Validation failed.", violations)
            }
            AppError::BadRequest(msg) | AppError::Authentication(msg) | AppError::NotFound(msg) => {
                ErrorResponse::new(&msg)
            }
            AppError::IdentityProvider {
                message,
                error_code,
                ..
            } => ErrorResponse::with_error_code(&message, &error_code),
            AppError::Internal(msg) => {
                log::error!("Internal error while handling request: {}", msg);
                ErrorResponse::new("An internal server error occurred")
            }
            AppError::Configuration(msg) => {
                log::error!("Configuration error while handling request: {}", msg);
                ErrorResponse::new("Server configuration error")
            }
            AppError::HashingError(e) => {
                log::error!("Password hashing failed: {}", e);
                ErrorResponse::new("Password hashing error")
            }
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for operations that can return AppError
pub type AppResult<T> = Result<T, AppError>;
