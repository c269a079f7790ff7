//! Occupancy lookups used by conflict detection and read projections.
//!
//! All methods return active records only.

use async_trait::async_trait;

use super::error::RepositoryResult;
use crate::models::{
    AcademicYearId, DayIndex, ElectiveGroupId, ProgramId, ScheduledSlot, Section,
    SectionSlotKey, Semester, SlotIndex, SpanId, TeacherId,
};

#[async_trait]
pub trait OccupancyRepository: Send + Sync {
    /// Every record of one section at one day/slot (all lab groups).
    async fn find_at_key(&self, key: &SectionSlotKey) -> RepositoryResult<Vec<ScheduledSlot>>;

    /// Every record, of any program or section, at one day/slot.
    async fn find_at_time(
        &self,
        day: DayIndex,
        slot: SlotIndex,
    ) -> RepositoryResult<Vec<ScheduledSlot>>;

    /// All sibling records of a span, ordered by slot.
    async fn find_span(&self, span_id: SpanId) -> RepositoryResult<Vec<ScheduledSlot>>;

    /// Every record on `day` that belongs to some span.
    async fn find_spans_on_day(&self, day: DayIndex) -> RepositoryResult<Vec<ScheduledSlot>>;

    /// All sibling records of one elective event across sections and periods.
    async fn find_elective_group(
        &self,
        group_id: ElectiveGroupId,
    ) -> RepositoryResult<Vec<ScheduledSlot>>;

    /// The routine of one program/semester/section, ordered by day then slot.
    async fn list_section(
        &self,
        program: ProgramId,
        semester: Semester,
        section: Section,
        academic_year: Option<AcademicYearId>,
    ) -> RepositoryResult<Vec<ScheduledSlot>>;

    /// Every record a teacher takes part in, ordered by day then slot.
    async fn list_for_teacher(&self, teacher: TeacherId) -> RepositoryResult<Vec<ScheduledSlot>>;
}
