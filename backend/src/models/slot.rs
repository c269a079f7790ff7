//! The scheduled-slot record.
//!
//! One `ScheduledSlot` is one teaching event occupying one day/slot for one
//! program-semester-section. Records of a multi-period class share a
//! [`SpanId`]; records of one elective fanned out across sections share an
//! [`ElectiveGroupId`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::calendar::{
    ClassCategory, ClassKind, DayIndex, LabGroup, Occupancy, Section, Semester, SlotIndex,
};
use super::reference::{AcademicYearId, ProgramId, RoomId, SubjectId, TeacherId};

crate::define_id_type!(i64, SlotId);
crate::define_uuid_type!(SpanId);
crate::define_uuid_type!(ElectiveGroupId);

/// (program, semester, section, day, slot): the per-section position of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SectionSlotKey {
    pub program: ProgramId,
    pub semester: Semester,
    pub section: Section,
    pub day: DayIndex,
    pub slot: SlotIndex,
}

impl fmt::Display for SectionSlotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "program={} semester={} section={} day={} slot={}",
            self.program, self.semester, self.section, self.day, self.slot
        )
    }
}

/// Which group occupies the slot on the opposite week.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlternateGroupConfig {
    pub paired_group: LabGroup,
    #[serde(default)]
    pub paired_subject: Option<SubjectId>,
    #[serde(default)]
    pub paired_teachers: Vec<TeacherId>,
    #[serde(default)]
    pub paired_room: Option<RoomId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionHeadcount {
    pub section: Section,
    pub students: u32,
}

/// Elective payload shared by every sibling record of one elective event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElectiveInfo {
    pub group_id: ElectiveGroupId,
    pub elective_number: u8,
    /// Free-form type label, e.g. "Technical" or "Management".
    pub elective_type: String,
    pub target_sections: Vec<Section>,
    #[serde(default)]
    pub student_composition: Vec<SectionHeadcount>,
    pub is_cross_section: bool,
}

/// Insert/update shape of a scheduled slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewScheduledSlot {
    pub program: ProgramId,
    pub academic_year: AcademicYearId,
    pub semester: Semester,
    pub section: Section,
    pub day: DayIndex,
    pub slot: SlotIndex,
    pub class_kind: ClassKind,
    pub subject: Option<SubjectId>,
    pub teachers: Vec<TeacherId>,
    pub room: Option<RoomId>,
    pub lab_group: Option<LabGroup>,
    pub is_alternating_week: bool,
    pub alternate_group_config: Option<AlternateGroupConfig>,
    pub span_id: Option<SpanId>,
    pub is_span_master: bool,
    pub class_category: ClassCategory,
    pub elective_info: Option<ElectiveInfo>,
}

impl NewScheduledSlot {
    pub fn key(&self) -> SectionSlotKey {
        SectionSlotKey {
            program: self.program,
            semester: self.semester,
            section: self.section,
            day: self.day,
            slot: self.slot,
        }
    }

    pub fn occupancy(&self) -> Occupancy {
        Occupancy::of(self.class_kind, self.lab_group)
    }
}

/// A persisted scheduled slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledSlot {
    pub id: SlotId,
    pub program: ProgramId,
    pub academic_year: AcademicYearId,
    pub semester: Semester,
    pub section: Section,
    pub day: DayIndex,
    pub slot: SlotIndex,
    pub class_kind: ClassKind,
    pub subject: Option<SubjectId>,
    pub teachers: Vec<TeacherId>,
    pub room: Option<RoomId>,
    pub lab_group: Option<LabGroup>,
    pub is_alternating_week: bool,
    pub alternate_group_config: Option<AlternateGroupConfig>,
    pub span_id: Option<SpanId>,
    pub is_span_master: bool,
    pub class_category: ClassCategory,
    pub elective_info: Option<ElectiveInfo>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ScheduledSlot {
    /// Materialise a new record from its insert shape.
    pub fn from_new(id: SlotId, new: NewScheduledSlot, now: DateTime<Utc>) -> Self {
        Self {
            id,
            program: new.program,
            academic_year: new.academic_year,
            semester: new.semester,
            section: new.section,
            day: new.day,
            slot: new.slot,
            class_kind: new.class_kind,
            subject: new.subject,
            teachers: new.teachers,
            room: new.room,
            lab_group: new.lab_group,
            is_alternating_week: new.is_alternating_week,
            alternate_group_config: new.alternate_group_config,
            span_id: new.span_id,
            is_span_master: new.is_span_master,
            class_category: new.class_category,
            elective_info: new.elective_info,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// Overwrite every assignable field, keeping identity and creation time.
    pub fn apply(&mut self, new: NewScheduledSlot, now: DateTime<Utc>) {
        let id = self.id;
        let created_at = self.created_at;
        *self = Self::from_new(id, new, created_at);
        self.updated_at = now;
    }

    pub fn key(&self) -> SectionSlotKey {
        SectionSlotKey {
            program: self.program,
            semester: self.semester,
            section: self.section,
            day: self.day,
            slot: self.slot,
        }
    }

    pub fn occupancy(&self) -> Occupancy {
        Occupancy::of(self.class_kind, self.lab_group)
    }

    /// Insert shape carrying the same assignable fields.
    pub fn to_new(&self) -> NewScheduledSlot {
        NewScheduledSlot {
            program: self.program,
            academic_year: self.academic_year,
            semester: self.semester,
            section: self.section,
            day: self.day,
            slot: self.slot,
            class_kind: self.class_kind,
            subject: self.subject,
            teachers: self.teachers.clone(),
            room: self.room,
            lab_group: self.lab_group,
            is_alternating_week: self.is_alternating_week,
            alternate_group_config: self.alternate_group_config.clone(),
            span_id: self.span_id,
            is_span_master: self.is_span_master,
            class_category: self.class_category,
            elective_info: self.elective_info.clone(),
        }
    }

    pub fn is_break(&self) -> bool {
        self.class_kind.is_break()
    }

    pub fn elective_group(&self) -> Option<ElectiveGroupId> {
        self.elective_info.as_ref().map(|info| info.group_id)
    }

    /// Part of a multi-record unit that must be edited as a whole.
    pub fn is_linked(&self) -> bool {
        self.span_id.is_some() || self.elective_info.is_some()
    }

    pub fn summary(&self) -> SlotSummary {
        SlotSummary {
            slot_id: self.id,
            program: self.program,
            semester: self.semester,
            section: self.section,
            day: self.day,
            slot: self.slot,
            class_kind: self.class_kind,
            subject: self.subject,
            lab_group: self.lab_group,
            span_id: self.span_id,
        }
    }
}

/// Compact description of an existing record, attached to conflicts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotSummary {
    pub slot_id: SlotId,
    pub program: ProgramId,
    pub semester: Semester,
    pub section: Section,
    pub day: DayIndex,
    pub slot: SlotIndex,
    pub class_kind: ClassKind,
    pub subject: Option<SubjectId>,
    pub lab_group: Option<LabGroup>,
    pub span_id: Option<SpanId>,
}

impl fmt::Display for SlotSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (record {}) for program {} semester {} section {}",
            self.class_kind.as_str(),
            self.slot_id,
            self.program,
            self.semester,
            self.section
        )?;
        if let Some(group) = self.lab_group {
            write!(f, " group {}", group)?;
        }
        write!(f, " at day {} slot {}", self.day, self.slot)
    }
}
