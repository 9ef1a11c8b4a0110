// src/errors.rs
// DOCUMENTATION: Custom error types and HTTP responses
// PURPOSE: Centralized error handling for the map layer service

use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use serde_json::json;
use thiserror::Error;

/// Application-specific error types
/// DOCUMENTATION: Each variant maps to an HTTP status code and a stable error code
#[derive(Error, Debug)]
pub enum MapError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Invalid color format: {0}")]
    InvalidColorFormat(String),

    #[error("Backend API error: {0}")]
    BackendError(String),

    #[error("Municipality boundaries are not loaded")]
    BoundariesUnavailable,

    #[error("Unauthorized access")]
    Unauthorized,

    #[error("Forbidden access")]
    Forbidden,

    #[error("Internal server error: {0}")]
    InternalError(String),
}

impl MapError {
    fn code(&self) -> &'static str {
        match self {
            MapError::NotFound(_) => "NOT_FOUND",
            MapError::InvalidInput(_) => "INVALID_INPUT",
            MapError::ValidationError(_) => "VALIDATION_ERROR",
            MapError::InvalidColorFormat(_) => "INVALID_COLOR_FORMAT",
            MapError::BackendError(_) => "BACKEND_ERROR",
            MapError::BoundariesUnavailable => "BOUNDARIES_UNAVAILABLE",
            MapError::Unauthorized => "UNAUTHORIZED",
            MapError::Forbidden => "FORBIDDEN",
            MapError::InternalError(_) => "INTERNAL_ERROR",
        }
    }
}

impl From<validator::ValidationErrors> for MapError {
    fn from(errors: validator::ValidationErrors) -> Self {
        MapError::ValidationError(errors.to_string())
    }
}

/// Convert MapError to HTTP response
/// DOCUMENTATION: Maps error types to HTTP status codes and JSON responses
impl ResponseError for MapError {
    fn error_response(&self) -> HttpResponse {
        let body = json!({
            "error": {
                "code": self.code(),
                "message": self.to_string(),
                "timestamp": chrono::Utc::now().to_rfc3339()
            }
        });

        HttpResponse::build(self.status_code()).json(body)
    }

    fn status_code(&self) -> StatusCode {
        match self {
            MapError::NotFound(_) => StatusCode::NOT_FOUND,
            MapError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            MapError::ValidationError(_) => StatusCode::BAD_REQUEST,
            MapError::InvalidColorFormat(_) => StatusCode::BAD_REQUEST,
            MapError::BackendError(_) => StatusCode::BAD_GATEWAY,
            MapError::BoundariesUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            MapError::Unauthorized => StatusCode::UNAUTHORIZED,
            MapError::Forbidden => StatusCode::FORBIDDEN,
            MapError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
