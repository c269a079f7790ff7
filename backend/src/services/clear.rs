//! Removal of scheduled records.
//!
//! Linked records are never removed on their own: clearing any period of a
//! span removes the whole span, and clearing any record of an elective
//! removes the elective in every target section.

use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info, instrument};

use super::error::{SchedulingError, SchedulingResult};
use super::requests::{ClearOutcome, ClearStatus, SlotKeyQuery};
use super::validation::{parse_day, parse_semester};
use super::SchedulingContext;
use crate::models::{
    AcademicYearId, ProgramId, ScheduledSlot, Section, SectionSlotKey, SlotId, SlotIndex, SpanId,
    TeacherId,
};
use crate::notify::ChangeReason;

#[derive(Clone)]
pub struct Clearer {
    ctx: SchedulingContext,
}

impl Clearer {
    pub fn new(ctx: SchedulingContext) -> Self {
        Self { ctx }
    }

    /// Clear every record at one section slot, all lab groups included.
    #[instrument(skip_all, fields(program = %query.program, semester = query.semester, day = query.day, slot = query.slot))]
    pub async fn clear_slot(&self, query: SlotKeyQuery) -> SchedulingResult<ClearOutcome> {
        let mut errors = Vec::new();
        let semester = parse_semester(query.semester, &mut errors);
        let day = parse_day(query.day, &mut errors);
        let (Some(semester), Some(day)) = (semester, day) else {
            return Err(SchedulingError::Validation { errors });
        };

        let key = SectionSlotKey {
            program: query.program,
            semester,
            section: query.section,
            day,
            slot: SlotIndex::new(query.slot),
        };
        let records = self.ctx.repo.find_at_key(&key).await?;
        self.remove(records).await
    }

    /// Clear every period of one span.
    pub async fn clear_span(&self, span_id: SpanId) -> SchedulingResult<ClearOutcome> {
        let records = self.ctx.repo.find_span(span_id).await?;
        self.remove(records).await
    }

    /// Clear the whole routine of one section.
    #[instrument(skip_all, fields(program = %program, semester = semester, section = %section))]
    pub async fn clear_section(
        &self,
        program: ProgramId,
        semester: u8,
        section: Section,
        academic_year: Option<AcademicYearId>,
    ) -> SchedulingResult<ClearOutcome> {
        let mut errors = Vec::new();
        let Some(semester) = parse_semester(semester, &mut errors) else {
            return Err(SchedulingError::Validation { errors });
        };

        let records = self
            .ctx
            .repo
            .list_section(program, semester, section, academic_year)
            .await?;
        self.remove(records).await
    }

    /// Delete `records` together with all of their linked siblings.
    pub(crate) async fn remove(&self, records: Vec<ScheduledSlot>) -> SchedulingResult<ClearOutcome> {
        if records.is_empty() {
            debug!("nothing to clear");
            return Ok(ClearOutcome::not_found());
        }

        let records = self.with_siblings(records).await?;
        let ids: Vec<SlotId> = records.keys().copied().collect();
        let teachers: BTreeSet<TeacherId> = records
            .values()
            .flat_map(|r| r.teachers.iter().copied())
            .collect();

        let deleted_count = self.ctx.repo.delete_slots(&ids).await?;
        info!(deleted_count, "records cleared");
        self.ctx
            .notify(teachers.iter().copied(), ChangeReason::Cleared);

        Ok(ClearOutcome {
            status: ClearStatus::Cleared,
            deleted_count,
            deleted_ids: ids,
            cleared_teacher_ids: teachers.into_iter().collect(),
        })
    }

    async fn with_siblings(
        &self,
        records: Vec<ScheduledSlot>,
    ) -> SchedulingResult<BTreeMap<SlotId, ScheduledSlot>> {
        let spans: BTreeSet<SpanId> = records.iter().filter_map(|r| r.span_id).collect();
        let groups: BTreeSet<_> = records.iter().filter_map(|r| r.elective_group()).collect();

        let mut all: BTreeMap<SlotId, ScheduledSlot> =
            records.into_iter().map(|r| (r.id, r)).collect();
        for span in spans {
            for record in self.ctx.repo.find_span(span).await? {
                all.entry(record.id).or_insert(record);
            }
        }
        for group in groups {
            for record in self.ctx.repo.find_elective_group(group).await? {
                all.entry(record.id).or_insert(record);
            }
        }
        Ok(all)
    }
}
