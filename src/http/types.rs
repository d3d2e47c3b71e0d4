use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use crate::domain::{error::BookError, validation::{FieldError, ValidationErrors}};

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    pub status_code: u16,
    pub error: String,
    pub message: String,
    #[serde(default)]
    pub details: Vec<ApiFieldError>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApiFieldError { pub field: String, pub message: String }

impl From<FieldError> for ApiFieldError {
    fn from(e: FieldError) -> Self { Self { field: e.field, message: e.message } }
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status_code: status.as_u16(),
            error: status.canonical_reason().unwrap_or("Error").to_string(),
            message: message.into(),
            details: Vec::new(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self { Self::new(StatusCode::BAD_REQUEST, message) }

    pub fn validation(errors: ValidationErrors) -> Self {
        Self { details: errors.0.into_iter().map(Into::into).collect(), ..Self::bad_request("validation failed") }
    }

    pub fn status(&self) -> StatusCode { StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR) }
}

impl From<BookError> for ApiError {
    fn from(e: BookError) -> Self {
        match e {
            BookError::Validation(errors) => ApiError::validation(errors),
            BookError::NotFound { .. } => ApiError::new(StatusCode::NOT_FOUND, e.to_string()),
            BookError::Unhandled(err) => {
                tracing::error!(error = ?err, "unhandled store error");
                ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "internal server error")
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response { (self.status(), axum::Json(self)).into_response() }
}
