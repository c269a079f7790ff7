//! Error types of the scheduling services.

use serde::{Deserialize, Serialize};

use crate::conflicts::ConflictReport;
use crate::db::repository::RepositoryError;
use crate::models::{LabGroup, SpanId};

pub type SchedulingResult<T> = Result<T, SchedulingError>;

/// One input field that failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for FieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

fn join_fields(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Failure of a scheduling operation.
///
/// Validation, reference and conflict failures leave no state behind.
/// `PartialWrite` is the only variant that can mean storage was touched.
#[derive(Debug, thiserror::Error)]
pub enum SchedulingError {
    #[error("Invalid request: {}", join_fields(.errors))]
    Validation { errors: Vec<FieldError> },

    #[error("{entity} {id} does not exist or is inactive")]
    ReferenceNotFound { entity: &'static str, id: String },

    #[error("Scheduling conflict: {0}")]
    Conflict(ConflictReport),

    /// The storage uniqueness constraint rejected a write that passed the
    /// in-process conflict check (concurrent writer).
    #[error("Storage constraint violated: {message}")]
    StorageConstraint { message: String },

    #[error("Partial write: {written} record(s) written before failure, rolled back: {rolled_back}; {message}")]
    PartialWrite {
        written: usize,
        rolled_back: bool,
        message: String,
    },

    #[error(transparent)]
    Repository(RepositoryError),
}

impl SchedulingError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            errors: vec![FieldError::new(field, message)],
        }
    }

    pub fn reference(entity: &'static str, id: impl ToString) -> Self {
        Self::ReferenceNotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Conflicts detected in-process and storage constraint violations look
    /// the same to callers.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_) | Self::StorageConstraint { .. })
    }

    pub fn conflict_report(&self) -> Option<&ConflictReport> {
        match self {
            Self::Conflict(report) => Some(report),
            _ => None,
        }
    }
}

impl From<RepositoryError> for SchedulingError {
    fn from(err: RepositoryError) -> Self {
        if err.is_constraint_violation() {
            SchedulingError::StorageConstraint {
                message: err.to_string(),
            }
        } else {
            SchedulingError::Repository(err)
        }
    }
}

/// One half of a both-lab-groups request failed.
///
/// `completed` holds the span of the group that was written before the
/// failure, if any. It is left in place for the caller to keep or clear.
#[derive(Debug, thiserror::Error)]
#[error("lab group {group} could not be scheduled: {source}")]
pub struct LabGroupAssignmentError {
    pub group: LabGroup,
    pub completed: Option<SpanId>,
    #[source]
    pub source: SchedulingError,
}
