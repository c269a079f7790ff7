//! Read-only access to reference data.
//!
//! Programs, academic years, subjects, teachers, rooms and time-slot
//! definitions are maintained elsewhere. The scheduling engine only looks them
//! up by id and trusts their `is_active` flag.

mod local;

pub use local::{LocalReferenceData, ReferenceSeed};

use async_trait::async_trait;

use crate::models::{
    AcademicYear, AcademicYearId, Program, ProgramId, Room, RoomId, SlotIndex, Subject,
    SubjectId, Teacher, TeacherId, TimeSlotDefinition,
};

/// Lookup of reference entities by identifier.
///
/// Every method returns `None` for unknown ids. Inactive entities are still
/// returned so that callers can tell "missing" from "retired" in logs.
#[async_trait]
pub trait ReferenceDataProvider: Send + Sync {
    async fn program(&self, id: ProgramId) -> Option<Program>;

    async fn academic_year(&self, id: AcademicYearId) -> Option<AcademicYear>;

    async fn subject(&self, id: SubjectId) -> Option<Subject>;

    async fn teacher(&self, id: TeacherId) -> Option<Teacher>;

    async fn room(&self, id: RoomId) -> Option<Room>;

    async fn time_slot(&self, index: SlotIndex) -> Option<TimeSlotDefinition>;

    /// Every time-slot definition, ordered by index.
    async fn time_slots(&self) -> Vec<TimeSlotDefinition>;
}
