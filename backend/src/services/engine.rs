//! One entry point over all scheduling services.

use std::sync::Arc;

use super::availability::{Availability, AvailabilityService};
use super::error::{LabGroupAssignmentError, SchedulingResult};
use super::requests::*;
use super::routine::{RoutineEntry, RoutineService};
use super::{Assigner, Clearer, ElectiveAssigner, SchedulingContext, SpannedAssigner};
use crate::db::repository::FullRepository;
use crate::models::{AcademicYearId, ElectiveGroupId, ProgramId, RoomId, Section, SpanId, TeacherId};
use crate::notify::NotificationDispatcher;
use crate::reference::ReferenceDataProvider;

/// Scheduling engine shared by clone between request handlers.
#[derive(Clone)]
pub struct SchedulingEngine {
    ctx: SchedulingContext,
    assigner: Assigner,
    spanned: SpannedAssigner,
    electives: ElectiveAssigner,
    clearer: Clearer,
    availability: AvailabilityService,
    routines: RoutineService,
}

impl SchedulingEngine {
    pub fn new(
        repo: Arc<dyn FullRepository>,
        reference: Arc<dyn ReferenceDataProvider>,
        notifier: NotificationDispatcher,
    ) -> Self {
        Self::with_context(SchedulingContext::new(repo, reference, notifier))
    }

    pub fn with_context(ctx: SchedulingContext) -> Self {
        Self {
            assigner: Assigner::new(ctx.clone()),
            spanned: SpannedAssigner::new(ctx.clone()),
            electives: ElectiveAssigner::new(ctx.clone()),
            clearer: Clearer::new(ctx.clone()),
            availability: AvailabilityService::new(ctx.clone()),
            routines: RoutineService::new(ctx.clone()),
            ctx,
        }
    }

    pub fn context(&self) -> &SchedulingContext {
        &self.ctx
    }

    pub fn repository(&self) -> Arc<dyn FullRepository> {
        self.ctx.repo.clone()
    }

    pub fn notifier(&self) -> &NotificationDispatcher {
        &self.ctx.notifier
    }

    // ==================== Assignment ====================

    pub async fn assign_slot(&self, request: AssignSlotRequest) -> SchedulingResult<AssignOutcome> {
        self.assigner.assign_slot(request).await
    }

    pub async fn assign_spanned(&self, request: AssignSpanRequest) -> SchedulingResult<SpanOutcome> {
        self.spanned.assign_spanned(request).await
    }

    pub async fn assign_both_lab_groups(
        &self,
        request: AssignLabGroupsRequest,
    ) -> Result<LabGroupsOutcome, LabGroupAssignmentError> {
        self.spanned.assign_both_lab_groups(request).await
    }

    // ==================== Electives ====================

    pub async fn schedule_elective(
        &self,
        request: ElectiveRequest,
    ) -> SchedulingResult<ElectiveOutcome> {
        self.electives.schedule_elective(request).await
    }

    pub async fn update_elective(
        &self,
        group_id: ElectiveGroupId,
        request: ElectiveRequest,
    ) -> SchedulingResult<ElectiveOutcome> {
        self.electives.update_elective(group_id, request).await
    }

    pub async fn clear_elective(&self, group_id: ElectiveGroupId) -> SchedulingResult<ClearOutcome> {
        self.electives.clear_elective(group_id).await
    }

    // ==================== Clearing ====================

    pub async fn clear_slot(&self, query: SlotKeyQuery) -> SchedulingResult<ClearOutcome> {
        self.clearer.clear_slot(query).await
    }

    pub async fn clear_span(&self, span_id: SpanId) -> SchedulingResult<ClearOutcome> {
        self.clearer.clear_span(span_id).await
    }

    pub async fn clear_section(
        &self,
        program: ProgramId,
        semester: u8,
        section: Section,
        academic_year: Option<AcademicYearId>,
    ) -> SchedulingResult<ClearOutcome> {
        self.clearer
            .clear_section(program, semester, section, academic_year)
            .await
    }

    // ==================== Queries ====================

    pub async fn check_teacher_availability(
        &self,
        teacher: TeacherId,
        day: u8,
        slot: u8,
        semester: u8,
    ) -> SchedulingResult<Availability> {
        self.availability
            .check_teacher_availability(teacher, day, slot, semester)
            .await
    }

    pub async fn check_room_availability(
        &self,
        room: RoomId,
        day: u8,
        slot: u8,
        semester: u8,
    ) -> SchedulingResult<Availability> {
        self.availability
            .check_room_availability(room, day, slot, semester)
            .await
    }

    pub async fn section_routine(
        &self,
        program: ProgramId,
        semester: u8,
        section: Section,
        academic_year: Option<AcademicYearId>,
    ) -> SchedulingResult<Vec<RoutineEntry>> {
        self.routines
            .section_routine(program, semester, section, academic_year)
            .await
    }

    pub async fn teacher_schedule(&self, teacher: TeacherId) -> SchedulingResult<Vec<RoutineEntry>> {
        self.routines.teacher_schedule(teacher).await
    }
}
