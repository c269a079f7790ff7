//! Scheduling services.
//!
//! Every mutation follows the same flow: validate shape and references, check
//! for conflicts against storage, write (atomically for multi-record units),
//! then hand a notification to the dispatcher.
//!
//! - [`assigner`]: single-slot upsert
//! - [`spanned`]: multi-period classes and both-lab-groups requests
//! - [`elective`]: cross-section electives
//! - [`clear`]: removal of slots, spans and whole routines
//! - [`availability`]: teacher and room availability queries
//! - [`routine`]: read projections with resolved names
//! - [`engine`]: one facade over all of the above

pub mod assigner;
pub mod availability;
pub mod batch;
pub mod clear;
pub mod elective;
pub mod engine;
pub mod error;
pub mod requests;
pub mod routine;
pub mod spanned;
pub mod validation;

pub use assigner::Assigner;
pub use availability::{Availability, AvailabilityService};
pub use batch::BatchWriter;
pub use clear::Clearer;
pub use elective::ElectiveAssigner;
pub use engine::SchedulingEngine;
pub use error::{FieldError, LabGroupAssignmentError, SchedulingError, SchedulingResult};
pub use requests::*;
pub use routine::{RoutineEntry, RoutineService};
pub use spanned::SpannedAssigner;
pub use validation::Validator;

use std::sync::Arc;
use tracing::warn;

use crate::conflicts::{ConflictDetector, ConflictReport};
use crate::db::repository::FullRepository;
use crate::models::TeacherId;
use crate::notify::{ChangeReason, NotificationDispatcher, TeacherScheduleChanged};
use crate::reference::ReferenceDataProvider;

/// Collaborators shared by every service.
#[derive(Clone)]
pub struct SchedulingContext {
    pub repo: Arc<dyn FullRepository>,
    pub reference: Arc<dyn ReferenceDataProvider>,
    pub notifier: NotificationDispatcher,
}

impl SchedulingContext {
    pub fn new(
        repo: Arc<dyn FullRepository>,
        reference: Arc<dyn ReferenceDataProvider>,
        notifier: NotificationDispatcher,
    ) -> Self {
        Self {
            repo,
            reference,
            notifier,
        }
    }

    pub fn detector(&self) -> ConflictDetector {
        ConflictDetector::new(self.repo.clone(), self.reference.clone())
    }

    pub fn validator(&self) -> Validator {
        Validator::new(self.reference.clone())
    }

    pub fn batch_writer(&self) -> BatchWriter {
        BatchWriter::new(self.repo.clone())
    }

    /// Queue a schedule-change notification. Never fails.
    pub fn notify(&self, teachers: impl IntoIterator<Item = TeacherId>, reason: ChangeReason) {
        self.notifier
            .dispatch(TeacherScheduleChanged::new(teachers, reason));
    }
}

/// Refuse the request when the report blocks it.
pub(crate) fn ensure_no_conflicts(report: ConflictReport, strict: bool) -> SchedulingResult<()> {
    if report.is_blocking(strict) {
        warn!(
            conflicts = report.conflicts.len(),
            advisories = report.advisories.len(),
            strict,
            "assignment refused: {}",
            report
        );
        return Err(SchedulingError::Conflict(report));
    }
    Ok(())
}
