//! Electives scheduled for several sections at once.
//!
//! One elective event fans out into one record per target section and
//! period. Every record carries the same elective group id, and multi-period
//! electives get one span per section. All records are written, replaced or
//! cleared together.

use std::collections::{BTreeSet, HashSet};
use tracing::{info, instrument};

use super::clear::Clearer;
use super::error::{FieldError, SchedulingError, SchedulingResult};
use super::requests::{ClassDetails, ClearOutcome, ElectiveOutcome, ElectiveRequest};
use super::validation::{PeriodShape, RawPosition, ValidatedClass};
use super::{ensure_no_conflicts, SchedulingContext};
use crate::conflicts::ConflictReport;
use crate::db::repository::{ErrorContext, RepositoryError};
use crate::models::{
    ClassCategory, ElectiveGroupId, ElectiveInfo, NewScheduledSlot, ScheduledSlot, Section,
    Semester, SpanId,
};
use crate::notify::ChangeReason;

#[derive(Clone)]
pub struct ElectiveAssigner {
    ctx: SchedulingContext,
}

impl ElectiveAssigner {
    pub fn new(ctx: SchedulingContext) -> Self {
        Self { ctx }
    }

    /// Schedule a new elective for every target section.
    #[instrument(skip_all, fields(program = %request.program, semester = request.semester, elective = request.elective_number))]
    pub async fn schedule_elective(
        &self,
        request: ElectiveRequest,
    ) -> SchedulingResult<ElectiveOutcome> {
        let validated = self.validate(&request).await?;
        let group_id = ElectiveGroupId::generate();
        let (candidates, span_ids) = fan_out(&validated, &request, group_id);

        let conflicts = self
            .ctx
            .detector()
            .detect_all(&candidates, &HashSet::new())
            .await?;
        let advisories = validated.advisories.clone();
        ensure_no_conflicts(
            ConflictReport::new(conflicts, validated.advisories),
            request.strict,
        )?;

        let records = self.ctx.batch_writer().insert_all(&candidates).await?;
        info!(%group_id, records = records.len(), "elective scheduled");
        self.ctx
            .notify(request.teachers.iter().copied(), ChangeReason::Assigned);

        Ok(ElectiveOutcome {
            group_id,
            span_ids,
            records,
            advisories,
        })
    }

    /// Replace every record of an elective with a new definition.
    ///
    /// The group id is kept. The old records are excluded from the conflict
    /// check and swapped for the new ones in one batch.
    #[instrument(skip_all, fields(group_id = %group_id))]
    pub async fn update_elective(
        &self,
        group_id: ElectiveGroupId,
        request: ElectiveRequest,
    ) -> SchedulingResult<ElectiveOutcome> {
        let existing = self.existing_group(group_id).await?;
        let validated = self.validate(&request).await?;
        let (candidates, span_ids) = fan_out(&validated, &request, group_id);

        let exclude: HashSet<_> = existing.iter().map(|r| r.id).collect();
        let conflicts = self
            .ctx
            .detector()
            .detect_all(&candidates, &exclude)
            .await?;
        let advisories = validated.advisories.clone();
        ensure_no_conflicts(
            ConflictReport::new(conflicts, validated.advisories),
            request.strict,
        )?;

        let records = self
            .ctx
            .batch_writer()
            .replace_all(&existing, &candidates)
            .await?;
        info!(
            replaced = existing.len(),
            records = records.len(),
            "elective updated"
        );

        let touched = existing
            .iter()
            .flat_map(|r| r.teachers.iter().copied())
            .chain(request.teachers.iter().copied());
        self.ctx.notify(touched, ChangeReason::Updated);

        Ok(ElectiveOutcome {
            group_id,
            span_ids,
            records,
            advisories,
        })
    }

    /// Remove every record of an elective.
    pub async fn clear_elective(&self, group_id: ElectiveGroupId) -> SchedulingResult<ClearOutcome> {
        let records = self.ctx.repo.find_elective_group(group_id).await?;
        Clearer::new(self.ctx.clone()).remove(records).await
    }

    async fn existing_group(&self, group_id: ElectiveGroupId) -> SchedulingResult<Vec<ScheduledSlot>> {
        let existing = self.ctx.repo.find_elective_group(group_id).await?;
        if existing.is_empty() {
            return Err(RepositoryError::not_found_with_context(
                format!("Elective group {} not found", group_id),
                ErrorContext::new("update_elective")
                    .with_entity("elective_group")
                    .with_entity_id(group_id),
            )
            .into());
        }
        Ok(existing)
    }

    /// Elective-specific checks merged with the common class validation.
    async fn validate(&self, request: &ElectiveRequest) -> SchedulingResult<ValidatedClass> {
        let mut errors = elective_errors(request);
        let class = ClassDetails {
            class_kind: request.class_kind,
            subject: Some(request.subject),
            teachers: request.teachers.clone(),
            room: Some(request.room),
            lab_group: None,
            is_alternating_week: false,
            alternate_group_config: None,
        };
        let section = request.target_sections.first().copied().unwrap_or(Section::AB);

        let result = self
            .ctx
            .validator()
            .validate(
                RawPosition {
                    program: request.program,
                    academic_year: request.academic_year,
                    semester: request.semester,
                    section,
                    day: request.day,
                    slots: &request.slots,
                },
                class,
                PeriodShape::Any,
            )
            .await;

        match result {
            Ok(validated) if errors.is_empty() => Ok(validated),
            Err(SchedulingError::Validation { errors: more }) => {
                errors.extend(more);
                Err(SchedulingError::Validation { errors })
            }
            Err(other) if errors.is_empty() => Err(other),
            _ => Err(SchedulingError::Validation { errors }),
        }
    }
}

fn elective_errors(request: &ElectiveRequest) -> Vec<FieldError> {
    let mut errors = Vec::new();
    if let Ok(semester) = Semester::new(request.semester) {
        if !semester.allows_electives() {
            errors.push(FieldError::new(
                "semester",
                format!("electives are not offered in semester {}", semester),
            ));
        }
    }
    if request.class_kind.is_break() {
        errors.push(FieldError::new("class_kind", "an elective cannot be a break"));
    }
    if request.target_sections.is_empty() {
        errors.push(FieldError::new(
            "target_sections",
            "at least one section is required",
        ));
    }
    let distinct: BTreeSet<_> = request.target_sections.iter().collect();
    if distinct.len() != request.target_sections.len() {
        errors.push(FieldError::new("target_sections", "sections must not repeat"));
    }
    if request.elective_number == 0 {
        errors.push(FieldError::new("elective_number", "must be at least 1"));
    }
    if request.elective_type.trim().is_empty() {
        errors.push(FieldError::new("elective_type", "must not be empty"));
    }
    errors
}

/// One record per target section and period.
fn fan_out(
    validated: &ValidatedClass,
    request: &ElectiveRequest,
    group_id: ElectiveGroupId,
) -> (Vec<NewScheduledSlot>, Vec<SpanId>) {
    let mut sections = request.target_sections.clone();
    sections.sort();
    let info = ElectiveInfo {
        group_id,
        elective_number: request.elective_number,
        elective_type: request.elective_type.trim().to_string(),
        target_sections: sections.clone(),
        student_composition: request.student_composition.clone(),
        is_cross_section: sections.len() > 1,
    };

    let mut records = Vec::new();
    let mut span_ids = Vec::new();
    for section in sections {
        let span_id = validated.is_span().then(SpanId::generate);
        span_ids.extend(span_id);
        records.extend(validated.records_for(
            section,
            span_id,
            ClassCategory::Elective,
            Some(&info),
        ));
    }
    (records, span_ids)
}
