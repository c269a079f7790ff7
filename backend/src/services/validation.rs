//! Request validation.
//!
//! Validation runs in two stages. Shape checks are synchronous and collect
//! every failing field into one `Validation` error. Reference checks look the
//! referenced entities up and stop at the first missing or inactive one.

use std::collections::HashSet;
use std::sync::Arc;

use super::error::{FieldError, SchedulingError, SchedulingResult};
use super::requests::ClassDetails;
use crate::conflicts::Advisory;
use crate::models::{
    AcademicYearId, ClassCategory, ClassKind, DayIndex, ElectiveInfo, LabGroup,
    NewScheduledSlot, ProgramId, Section, Semester, SlotIndex, SpanId,
};
use crate::reference::ReferenceDataProvider;

/// How many periods a request covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeriodShape {
    Single,
    Span,
    /// One period or a span, decided by the number of slots.
    Any,
}

/// A request that passed shape and reference validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedClass {
    pub program: ProgramId,
    pub academic_year: AcademicYearId,
    pub semester: Semester,
    pub day: DayIndex,
    /// Ascending and consecutive.
    pub slots: Vec<SlotIndex>,
    pub class: ClassDetails,
    pub advisories: Vec<Advisory>,
}

impl ValidatedClass {
    pub fn is_span(&self) -> bool {
        self.slots.len() > 1
    }

    /// One insert record per slot for `section`.
    ///
    /// With `span_id` set the first record is the span master.
    pub fn records_for(
        &self,
        section: Section,
        span_id: Option<SpanId>,
        category: ClassCategory,
        elective_info: Option<&ElectiveInfo>,
    ) -> Vec<NewScheduledSlot> {
        self.slots
            .iter()
            .enumerate()
            .map(|(i, slot)| NewScheduledSlot {
                program: self.program,
                academic_year: self.academic_year,
                semester: self.semester,
                section,
                day: self.day,
                slot: *slot,
                class_kind: self.class.class_kind,
                subject: self.class.subject,
                teachers: self.class.teachers.clone(),
                room: self.class.room,
                lab_group: self.class.lab_group,
                is_alternating_week: self.class.is_alternating_week,
                alternate_group_config: self.class.alternate_group_config.clone(),
                span_id,
                is_span_master: span_id.is_some() && i == 0,
                class_category: category,
                elective_info: elective_info.cloned(),
            })
            .collect()
    }
}

/// Raw request coordinates handed to the validator.
#[derive(Debug, Clone, Copy)]
pub struct RawPosition<'a> {
    pub program: ProgramId,
    pub academic_year: AcademicYearId,
    pub semester: u8,
    pub section: Section,
    pub day: u8,
    pub slots: &'a [u8],
}

pub fn parse_semester(raw: u8, errors: &mut Vec<FieldError>) -> Option<Semester> {
    Semester::new(raw)
        .map_err(|e| errors.push(FieldError::new("semester", e.to_string())))
        .ok()
}

pub fn parse_day(raw: u8, errors: &mut Vec<FieldError>) -> Option<DayIndex> {
    DayIndex::new(raw)
        .map_err(|e| errors.push(FieldError::new("day", e.to_string())))
        .ok()
}

/// Sort the requested slots and require them to be consecutive.
pub fn parse_slots(raw: &[u8], shape: PeriodShape, errors: &mut Vec<FieldError>) -> Vec<SlotIndex> {
    let field = if shape == PeriodShape::Single { "slot" } else { "slots" };
    if raw.is_empty() {
        errors.push(FieldError::new(field, "at least one slot is required"));
        return Vec::new();
    }
    if shape == PeriodShape::Span && raw.len() < 2 {
        errors.push(FieldError::new(field, "a span needs at least two periods"));
        return Vec::new();
    }

    let mut slots: Vec<SlotIndex> = raw.iter().copied().map(SlotIndex::new).collect();
    slots.sort();
    let unique: HashSet<SlotIndex> = slots.iter().copied().collect();
    if unique.len() != slots.len() {
        errors.push(FieldError::new(field, "slots must not repeat"));
        return Vec::new();
    }
    if slots.windows(2).any(|w| !w[0].is_followed_by(w[1])) {
        errors.push(FieldError::new(field, "slots must be consecutive"));
        return Vec::new();
    }
    slots
}

/// Normalise and check the per-class fields.
///
/// Breaks drop every resource field. A Practical without a lab group claims
/// the whole slot.
pub fn check_class_shape(
    section: Section,
    mut class: ClassDetails,
    spanning: bool,
    errors: &mut Vec<FieldError>,
) -> ClassDetails {
    if class.class_kind.is_break() {
        if spanning {
            errors.push(FieldError::new("class_kind", "a break cannot span periods"));
        }
        class.subject = None;
        class.teachers.clear();
        class.room = None;
        class.lab_group = None;
        class.is_alternating_week = false;
        class.alternate_group_config = None;
        return class;
    }

    let kind = class.class_kind.as_str();
    if class.subject.is_none() {
        errors.push(FieldError::new("subject", format!("required for a {}", kind)));
    }
    if class.teachers.is_empty() {
        errors.push(FieldError::new(
            "teachers",
            format!("at least one teacher is required for a {}", kind),
        ));
    }
    let distinct: HashSet<_> = class.teachers.iter().collect();
    if distinct.len() != class.teachers.len() {
        errors.push(FieldError::new("teachers", "teachers must not repeat"));
    }
    if class.room.is_none() {
        errors.push(FieldError::new("room", format!("required for a {}", kind)));
    }

    match (class.class_kind, class.lab_group) {
        (ClassKind::Practical, None) => class.lab_group = Some(LabGroup::All),
        (ClassKind::Practical, Some(group)) if !group.belongs_to(section) => {
            errors.push(FieldError::new(
                "lab_group",
                format!("group {} does not belong to section {}", group, section),
            ));
        }
        (ClassKind::Practical, Some(_)) => {}
        (_, Some(_)) => {
            errors.push(FieldError::new(
                "lab_group",
                "only Practical classes have lab groups",
            ));
        }
        (_, None) => {}
    }

    check_alternation(section, &class, errors);
    class
}

fn check_alternation(section: Section, class: &ClassDetails, errors: &mut Vec<FieldError>) {
    if !class.is_alternating_week {
        if class.alternate_group_config.is_some() {
            errors.push(FieldError::new(
                "alternate_group_config",
                "only allowed on alternating-week classes",
            ));
        }
        return;
    }

    let group = match class.lab_group {
        Some(group) if class.class_kind == ClassKind::Practical && group != LabGroup::All => group,
        _ => {
            errors.push(FieldError::new(
                "is_alternating_week",
                "only a Practical for a single lab group can alternate weeks",
            ));
            return;
        }
    };

    match &class.alternate_group_config {
        None => errors.push(FieldError::new(
            "alternate_group_config",
            "required for alternating-week classes",
        )),
        Some(config) => {
            let paired = config.paired_group;
            if paired == group || paired == LabGroup::All || !paired.belongs_to(section) {
                errors.push(FieldError::new(
                    "alternate_group_config.paired_group",
                    format!(
                        "group {} cannot pair with group {} in section {}",
                        paired, group, section
                    ),
                ));
            }
        }
    }
}

/// Reference lookups and advisories.
#[derive(Clone)]
pub struct Validator {
    reference: Arc<dyn ReferenceDataProvider>,
}

impl Validator {
    pub fn new(reference: Arc<dyn ReferenceDataProvider>) -> Self {
        Self { reference }
    }

    /// Full validation of one class request.
    pub async fn validate(
        &self,
        position: RawPosition<'_>,
        class: ClassDetails,
        shape: PeriodShape,
    ) -> SchedulingResult<ValidatedClass> {
        let mut errors = Vec::new();
        let semester = parse_semester(position.semester, &mut errors);
        let day = parse_day(position.day, &mut errors);
        let slots = parse_slots(position.slots, shape, &mut errors);
        let class = check_class_shape(position.section, class, slots.len() > 1, &mut errors);
        let (semester, day) = match (semester, day) {
            (Some(semester), Some(day)) if errors.is_empty() => (semester, day),
            _ => return Err(SchedulingError::Validation { errors }),
        };

        self.check_program(position.program, position.academic_year)
            .await?;
        self.check_time_slots(&slots, class.class_kind).await?;
        let advisories = self.check_resources(&class).await?;

        Ok(ValidatedClass {
            program: position.program,
            academic_year: position.academic_year,
            semester,
            day,
            slots,
            class,
            advisories,
        })
    }

    pub async fn check_program(
        &self,
        program: ProgramId,
        academic_year: AcademicYearId,
    ) -> SchedulingResult<()> {
        match self.reference.program(program).await {
            Some(p) if p.is_active => {}
            _ => return Err(SchedulingError::reference("program", program)),
        }
        match self.reference.academic_year(academic_year).await {
            Some(y) if y.is_active => Ok(()),
            _ => Err(SchedulingError::reference("academic_year", academic_year)),
        }
    }

    async fn check_time_slots(&self, slots: &[SlotIndex], kind: ClassKind) -> SchedulingResult<()> {
        for slot in slots {
            let definition = match self.reference.time_slot(*slot).await {
                Some(def) if def.is_active => def,
                _ => return Err(SchedulingError::reference("time_slot", slot)),
            };
            if definition.is_break && !kind.is_break() {
                return Err(SchedulingError::validation(
                    if slots.len() > 1 { "slots" } else { "slot" },
                    format!("slot {} ({}) is a break period", slot, definition.label),
                ));
            }
        }
        Ok(())
    }

    /// Check subject, teachers and room, returning the advisories they raise.
    async fn check_resources(&self, class: &ClassDetails) -> SchedulingResult<Vec<Advisory>> {
        let mut advisories = Vec::new();
        if class.class_kind.is_break() {
            return Ok(advisories);
        }

        if let Some(subject) = class.subject {
            match self.reference.subject(subject).await {
                Some(s) if s.is_active => {}
                _ => return Err(SchedulingError::reference("subject", subject)),
            }
        }
        for teacher in &class.teachers {
            match self.reference.teacher(*teacher).await {
                Some(t) if t.is_active => {}
                _ => return Err(SchedulingError::reference("teacher", teacher)),
            }
        }
        if let Some(room_id) = class.room {
            let room = match self.reference.room(room_id).await {
                Some(r) if r.is_active => r,
                _ => return Err(SchedulingError::reference("room", room_id)),
            };
            if class.class_kind == ClassKind::Practical && !room.is_lab() {
                advisories.push(Advisory::NonLabRoom {
                    room_id,
                    room_name: room.name,
                });
            }
        }

        if class.class_kind != ClassKind::Practical && class.teachers.len() > 1 {
            advisories.push(Advisory::MultipleTeachers {
                class_kind: class.class_kind,
                teacher_count: class.teachers.len(),
            });
        }
        Ok(advisories)
    }
}
