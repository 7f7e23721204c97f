//! Error taxonomy of the hospital service and its HTTP translation

use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use common::error::DatabaseError;
use serde_json::json;
use thiserror::Error;

use crate::validation::ValidationErrors;

/// Custom error type for the hospital service
#[derive(Error, Debug)]
pub enum HospitalError {
    /// One or more input fields were missing or malformed
    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    /// A path identifier was not a positive integer
    #[error("Invalid {entity} ID")]
    InvalidIdentifier { entity: &'static str },

    /// Another record already uses this email
    #[error("{entity} with this email already exists")]
    DuplicateEmail { entity: &'static str },

    /// The doctor already has a live booking at this date and time
    #[error("Doctor is not available at this time")]
    SchedulingConflict,

    /// The identifier does not resolve to a record
    #[error("{entity} not found")]
    NotFound { entity: &'static str },

    /// The datastore failed in a way the caller cannot act on
    #[error("Store failure: {0}")]
    Store(#[from] DatabaseError),
}

impl HospitalError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::InvalidIdentifier { .. } => StatusCode::BAD_REQUEST,
            Self::DuplicateEmail { .. } | Self::SchedulingConflict => StatusCode::CONFLICT,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ValidationErrors> for HospitalError {
    fn from(errors: ValidationErrors) -> Self {
        Self::Validation(errors)
    }
}

impl From<JsonRejection> for HospitalError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Validation(ValidationErrors::single("body", rejection.body_text()))
    }
}

impl From<QueryRejection> for HospitalError {
    fn from(rejection: QueryRejection) -> Self {
        Self::Validation(ValidationErrors::single("query", rejection.body_text()))
    }
}

impl IntoResponse for HospitalError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = match &self {
            Self::Validation(errors) => json!({
                "error": "Validation failed",
                "details": errors,
            }),
            Self::InvalidIdentifier { .. } | Self::NotFound { .. } => json!({
                "error": self.to_string(),
            }),
            Self::DuplicateEmail { .. } => json!({
                "error": "Email already exists",
                "message": self.to_string(),
            }),
            Self::SchedulingConflict => json!({
                "error": "Time conflict",
                "message": self.to_string(),
            }),
            Self::Store(_) => json!({
                "error": "Internal server error",
                "message": "An unexpected error occurred",
            }),
        };

        (status, Json(body)).into_response()
    }
}

/// Type alias for hospital service results
pub type HospitalResult<T> = Result<T, HospitalError>;
