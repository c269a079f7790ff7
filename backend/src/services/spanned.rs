//! Multi-period classes.
//!
//! A span is one class occupying consecutive slots of one day. Its records
//! share a `SpanId`, the first one is the master, and they are written and
//! removed as a unit.

use std::collections::HashSet;
use tracing::{info, instrument};

use super::error::{LabGroupAssignmentError, SchedulingError, SchedulingResult};
use super::requests::{
    AssignLabGroupsRequest, AssignSpanRequest, ClassDetails, LabGroupClass, LabGroupsOutcome,
    SpanOutcome,
};
use super::validation::{PeriodShape, RawPosition, ValidatedClass};
use super::{ensure_no_conflicts, SchedulingContext};
use crate::conflicts::ConflictReport;
use crate::models::{AlternateGroupConfig, ClassCategory, ClassKind, LabGroup, Section, SpanId};
use crate::notify::ChangeReason;

#[derive(Clone)]
pub struct SpannedAssigner {
    ctx: SchedulingContext,
}

impl SpannedAssigner {
    pub fn new(ctx: SchedulingContext) -> Self {
        Self { ctx }
    }

    /// Assign one class over two or more consecutive slots.
    #[instrument(skip_all, fields(program = %request.program, semester = request.semester, day = request.day))]
    pub async fn assign_spanned(&self, request: AssignSpanRequest) -> SchedulingResult<SpanOutcome> {
        let validated = self
            .ctx
            .validator()
            .validate(
                RawPosition {
                    program: request.program,
                    academic_year: request.academic_year,
                    semester: request.semester,
                    section: request.section,
                    day: request.day,
                    slots: &request.slots,
                },
                request.class,
                PeriodShape::Span,
            )
            .await?;

        self.write_span(validated, request.section, request.strict)
            .await
    }

    /// Schedule two lab groups of one section side by side.
    ///
    /// Both halves are validated before anything is written. The groups are
    /// then written as two independent spans; when the second one fails the
    /// first stays in place and is reported through `completed`.
    #[instrument(skip_all, fields(program = %request.program, section = %request.section, day = request.day))]
    pub async fn assign_both_lab_groups(
        &self,
        request: AssignLabGroupsRequest,
    ) -> Result<LabGroupsOutcome, LabGroupAssignmentError> {
        let first_group = request.first.lab_group;
        let second_group = request.second.lab_group;
        let fail = |group: LabGroup, completed: Option<SpanId>| {
            move |source: SchedulingError| LabGroupAssignmentError {
                group,
                completed,
                source,
            }
        };

        if first_group == second_group || first_group == LabGroup::All || second_group == LabGroup::All
        {
            return Err(fail(first_group, None)(SchedulingError::validation(
                "lab_group",
                format!(
                    "two distinct lab groups are required, got {} and {}",
                    first_group, second_group
                ),
            )));
        }

        let first_class = lab_group_class(&request.first, &request.second, request.alternating);
        let second_class = lab_group_class(&request.second, &request.first, request.alternating);

        let first = self
            .validate_group(&request, first_class)
            .await
            .map_err(fail(first_group, None))?;
        let second = self
            .validate_group(&request, second_class)
            .await
            .map_err(fail(second_group, None))?;

        let first = self
            .write_span(first, request.section, request.strict)
            .await
            .map_err(fail(first_group, None))?;
        let second = self
            .write_span(second, request.section, request.strict)
            .await
            .map_err(fail(second_group, Some(first.span_id)))?;

        Ok(LabGroupsOutcome { first, second })
    }

    async fn validate_group(
        &self,
        request: &AssignLabGroupsRequest,
        class: ClassDetails,
    ) -> SchedulingResult<ValidatedClass> {
        self.ctx
            .validator()
            .validate(
                RawPosition {
                    program: request.program,
                    academic_year: request.academic_year,
                    semester: request.semester,
                    section: request.section,
                    day: request.day,
                    slots: &request.slots,
                },
                class,
                PeriodShape::Any,
            )
            .await
    }

    /// Conflict-check and atomically write one span.
    async fn write_span(
        &self,
        validated: ValidatedClass,
        section: Section,
        strict: bool,
    ) -> SchedulingResult<SpanOutcome> {
        let span_id = SpanId::generate();
        let candidates = validated.records_for(section, Some(span_id), ClassCategory::Core, None);

        let conflicts = self
            .ctx
            .detector()
            .detect_all(&candidates, &HashSet::new())
            .await?;
        let advisories = validated.advisories.clone();
        ensure_no_conflicts(ConflictReport::new(conflicts, validated.advisories), strict)?;

        let records = self.ctx.batch_writer().insert_all(&candidates).await?;
        info!(%span_id, periods = records.len(), "span assigned");

        self.ctx.notify(
            validated.class.teachers.iter().copied(),
            ChangeReason::Assigned,
        );
        Ok(SpanOutcome {
            span_id,
            records,
            advisories,
        })
    }
}

fn lab_group_class(own: &LabGroupClass, other: &LabGroupClass, alternating: bool) -> ClassDetails {
    ClassDetails {
        class_kind: ClassKind::Practical,
        subject: Some(own.subject),
        teachers: own.teachers.clone(),
        room: Some(own.room),
        lab_group: Some(own.lab_group),
        is_alternating_week: alternating,
        alternate_group_config: alternating.then(|| AlternateGroupConfig {
            paired_group: other.lab_group,
            paired_subject: Some(other.subject),
            paired_teachers: other.teachers.clone(),
            paired_room: Some(other.room),
        }),
    }
}
