use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::fmt;
use utoipa::ToSchema;

use crate::storage::StoreError;
use crate::validation::{FieldError, ValidationErrors};

/// Body of a 404 or 400 response.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorDetail {
    pub detail: String,
}

/// Body of a 422 response.
#[derive(Debug, Serialize, ToSchema)]
pub struct ValidationErrorBody {
    pub detail: Vec<FieldError>,
}

/// Application-specific error types.
#[derive(Debug)]
pub enum AppError {
    /// Request failed field validation.
    Validation(ValidationErrors),
    /// Resource not found error.
    NotFound(String),
    /// A reference to another document does not resolve.
    InvalidReference(String),
    /// Database-related errors.
    DatabaseError(StoreError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Validation(errors) => {
                write!(f, "Validation failed: {} error(s)", errors.errors().len())
            }
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::InvalidReference(msg) => write!(f, "Invalid reference: {}", msg),
            AppError::DatabaseError(e) => write!(f, "Database error: {}", e),
        }
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    /// Maps each error variant to an HTTP status code and a `detail` body.
    fn into_response(self) -> Response {
        match self {
            AppError::Validation(errors) => {
                tracing::debug!("Rejected request body: {:?}", errors);
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    Json(ValidationErrorBody { detail: errors.0 }),
                )
                    .into_response()
            }
            AppError::NotFound(msg) => {
                (StatusCode::NOT_FOUND, Json(ErrorDetail { detail: msg })).into_response()
            }
            AppError::InvalidReference(msg) => {
                (StatusCode::BAD_REQUEST, Json(ErrorDetail { detail: msg })).into_response()
            }
            AppError::DatabaseError(e) => {
                tracing::error!("Database error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorDetail {
                        detail: "Internal Server Error".to_string(),
                    }),
                )
                    .into_response()
            }
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        AppError::DatabaseError(err)
    }
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        AppError::Validation(errors)
    }
}
