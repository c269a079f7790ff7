//! Read projections of the stored schedule.
//!
//! Entries carry display names resolved from reference data at read time.
//! Names are never stored with the records.

use std::collections::HashMap;

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::error::{SchedulingError, SchedulingResult};
use super::validation::parse_semester;
use super::SchedulingContext;
use crate::models::{
    AcademicYearId, ClassCategory, ClassKind, DayIndex, ElectiveGroupId, LabGroup, ProgramId,
    ScheduledSlot, Section, Semester, SlotId, SlotIndex, SpanId, SubjectId, TeacherId,
};

/// One routine cell with resolved names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutineEntry {
    pub slot_id: SlotId,
    pub program_code: Option<String>,
    pub semester: Semester,
    pub section: Section,
    pub day: DayIndex,
    pub slot: SlotIndex,
    pub slot_label: Option<String>,
    pub start: Option<NaiveTime>,
    pub end: Option<NaiveTime>,
    pub class_kind: ClassKind,
    pub class_category: ClassCategory,
    pub subject_id: Option<SubjectId>,
    pub subject_code: Option<String>,
    /// Subject name with the lab-group label appended, e.g.
    /// `"Networks Lab (Group A - Alt Week)"`.
    pub display_name: String,
    pub teacher_ids: Vec<TeacherId>,
    pub teacher_names: Vec<String>,
    pub room_name: Option<String>,
    pub lab_group: Option<LabGroup>,
    pub is_alternating_week: bool,
    pub span_id: Option<SpanId>,
    pub is_span_master: bool,
    pub elective_group_id: Option<ElectiveGroupId>,
}

#[derive(Clone)]
pub struct RoutineService {
    ctx: SchedulingContext,
}

impl RoutineService {
    pub fn new(ctx: SchedulingContext) -> Self {
        Self { ctx }
    }

    /// The weekly routine of one section, ordered by day then slot.
    #[instrument(skip(self))]
    pub async fn section_routine(
        &self,
        program: ProgramId,
        semester: u8,
        section: Section,
        academic_year: Option<AcademicYearId>,
    ) -> SchedulingResult<Vec<RoutineEntry>> {
        let mut errors = Vec::new();
        let Some(semester) = parse_semester(semester, &mut errors) else {
            return Err(SchedulingError::Validation { errors });
        };
        let records = self
            .ctx
            .repo
            .list_section(program, semester, section, academic_year)
            .await?;
        Ok(self.project(records).await)
    }

    /// Every class a teacher takes part in, ordered by day then slot.
    #[instrument(skip(self))]
    pub async fn teacher_schedule(&self, teacher: TeacherId) -> SchedulingResult<Vec<RoutineEntry>> {
        if self.ctx.reference.teacher(teacher).await.is_none() {
            return Err(SchedulingError::reference("teacher", teacher));
        }
        let records = self.ctx.repo.list_for_teacher(teacher).await?;
        Ok(self.project(records).await)
    }

    async fn project(&self, records: Vec<ScheduledSlot>) -> Vec<RoutineEntry> {
        let mut names = NameCache::default();
        let mut entries = Vec::with_capacity(records.len());
        for record in records {
            entries.push(self.entry(record, &mut names).await);
        }
        entries
    }

    async fn entry(&self, record: ScheduledSlot, names: &mut NameCache) -> RoutineEntry {
        let reference = &self.ctx.reference;

        if !names.programs.contains_key(&record.program) {
            let code = reference.program(record.program).await.map(|p| p.code);
            names.programs.insert(record.program, code);
        }
        if !names.slots.contains_key(&record.slot) {
            let definition = reference
                .time_slot(record.slot)
                .await
                .map(|d| (d.label, d.start, d.end));
            names.slots.insert(record.slot, definition);
        }

        let subject = match record.subject {
            Some(id) => reference.subject(id).await,
            None => None,
        };
        let mut teacher_names = Vec::with_capacity(record.teachers.len());
        for id in &record.teachers {
            if !names.teachers.contains_key(id) {
                let name = reference.teacher(*id).await.map(|t| t.name);
                names.teachers.insert(*id, name);
            }
            if let Some(Some(name)) = names.teachers.get(id) {
                teacher_names.push(name.clone());
            }
        }
        let room_name = match record.room {
            Some(id) => reference.room(id).await.map(|r| r.name),
            None => None,
        };

        let base = match (&subject, record.class_kind) {
            (Some(s), _) => s.name.clone(),
            (None, ClassKind::Break) => "Break".to_string(),
            (None, kind) => kind.as_str().to_string(),
        };
        let slot_info = names.slots.get(&record.slot).cloned().flatten();

        RoutineEntry {
            slot_id: record.id,
            program_code: names.programs.get(&record.program).cloned().flatten(),
            semester: record.semester,
            section: record.section,
            day: record.day,
            slot: record.slot,
            slot_label: slot_info.as_ref().map(|(label, _, _)| label.clone()),
            start: slot_info.as_ref().map(|(_, start, _)| *start),
            end: slot_info.as_ref().map(|(_, _, end)| *end),
            class_kind: record.class_kind,
            class_category: record.class_category,
            subject_id: record.subject,
            subject_code: subject.map(|s| s.code),
            display_name: display_name(base, record.lab_group, record.is_alternating_week),
            teacher_ids: record.teachers.clone(),
            teacher_names,
            room_name,
            lab_group: record.lab_group,
            is_alternating_week: record.is_alternating_week,
            span_id: record.span_id,
            is_span_master: record.is_span_master,
            elective_group_id: record.elective_group(),
        }
    }
}

#[derive(Default)]
struct NameCache {
    programs: HashMap<ProgramId, Option<String>>,
    teachers: HashMap<TeacherId, Option<String>>,
    slots: HashMap<SlotIndex, Option<(String, NaiveTime, NaiveTime)>>,
}

/// Append the lab-group label to a subject name.
pub fn display_name(base: String, lab_group: Option<LabGroup>, alternating: bool) -> String {
    match lab_group {
        Some(LabGroup::All) | None => base,
        Some(group) if alternating => format!("{} (Group {} - Alt Week)", base, group),
        Some(group) => format!("{} (Group {})", base, group),
    }
}
