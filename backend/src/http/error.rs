//! HTTP error handling and response types.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::db::repository::RepositoryError;
use crate::services::{LabGroupAssignmentError, SchedulingError};

/// API error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Structured payload: field errors, conflict report, write progress
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }
}

/// Application error type for HTTP handlers.
#[derive(Debug)]
pub enum AppError {
    /// Invalid path or query input
    BadRequest(String),
    Scheduling(SchedulingError),
    LabGroups(LabGroupAssignmentError),
}

fn repository_status(err: &RepositoryError) -> (StatusCode, &'static str) {
    if err.is_not_found() {
        (StatusCode::NOT_FOUND, "NOT_FOUND")
    } else {
        (StatusCode::INTERNAL_SERVER_ERROR, "REPOSITORY_ERROR")
    }
}

fn scheduling_error(err: &SchedulingError) -> (StatusCode, ApiError) {
    let message = err.to_string();
    match err {
        SchedulingError::Validation { errors } => (
            StatusCode::BAD_REQUEST,
            ApiError::new("VALIDATION_ERROR", message).with_details(json!({ "errors": errors })),
        ),
        SchedulingError::ReferenceNotFound { entity, id } => (
            StatusCode::NOT_FOUND,
            ApiError::new("REFERENCE_NOT_FOUND", message)
                .with_details(json!({ "entity": entity, "id": id })),
        ),
        SchedulingError::Conflict(report) => (
            StatusCode::CONFLICT,
            ApiError::new("CONFLICT", message).with_details(json!(report)),
        ),
        SchedulingError::StorageConstraint { .. } => {
            (StatusCode::CONFLICT, ApiError::new("CONFLICT", message))
        }
        SchedulingError::PartialWrite {
            written,
            rolled_back,
            ..
        } => (
            StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::new("PARTIAL_WRITE", message)
                .with_details(json!({ "written": written, "rolled_back": rolled_back })),
        ),
        SchedulingError::Repository(e) => {
            let (status, code) = repository_status(e);
            (status, ApiError::new(code, message))
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, ApiError::new("BAD_REQUEST", msg)),
            AppError::Scheduling(e) => scheduling_error(&e),
            AppError::LabGroups(e) => {
                let (status, mut error) = scheduling_error(&e.source);
                error.message = e.to_string();
                let details = json!({
                    "lab_group": e.group,
                    "completed_span_id": e.completed,
                    "cause": error.details.take(),
                });
                (status, error.with_details(details))
            }
        };

        (status, Json(error)).into_response()
    }
}

impl From<SchedulingError> for AppError {
    fn from(err: SchedulingError) -> Self {
        AppError::Scheduling(err)
    }
}

impl From<LabGroupAssignmentError> for AppError {
    fn from(err: LabGroupAssignmentError) -> Self {
        AppError::LabGroups(err)
    }
}

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        AppError::Scheduling(err.into())
    }
}
