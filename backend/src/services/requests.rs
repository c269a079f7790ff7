//! Request and outcome shapes of the scheduling operations.
//!
//! Semester, day and slot arrive as raw integers so that out-of-range values
//! are reported as field-level validation errors rather than decode failures.

use serde::{Deserialize, Serialize};

use crate::conflicts::Advisory;
use crate::models::{
    AcademicYearId, AlternateGroupConfig, ClassKind, ElectiveGroupId, LabGroup, ProgramId,
    RoomId, ScheduledSlot, Section, SectionHeadcount, SlotId, SpanId, SubjectId, TeacherId,
};

/// The per-class fields shared by every assignment shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassDetails {
    pub class_kind: ClassKind,
    #[serde(default)]
    pub subject: Option<SubjectId>,
    #[serde(default)]
    pub teachers: Vec<TeacherId>,
    #[serde(default)]
    pub room: Option<RoomId>,
    /// Only meaningful for Practicals; a Practical without one claims the
    /// whole slot.
    #[serde(default)]
    pub lab_group: Option<LabGroup>,
    #[serde(default)]
    pub is_alternating_week: bool,
    #[serde(default)]
    pub alternate_group_config: Option<AlternateGroupConfig>,
}

/// Assign one class to one section slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignSlotRequest {
    pub program: ProgramId,
    pub academic_year: AcademicYearId,
    pub semester: u8,
    pub section: Section,
    pub day: u8,
    pub slot: u8,
    #[serde(flatten)]
    pub class: ClassDetails,
    /// Refuse the request when advisories are present.
    #[serde(default)]
    pub strict: bool,
}

/// Assign one class over several consecutive slots of one day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignSpanRequest {
    pub program: ProgramId,
    pub academic_year: AcademicYearId,
    pub semester: u8,
    pub section: Section,
    pub day: u8,
    pub slots: Vec<u8>,
    #[serde(flatten)]
    pub class: ClassDetails,
    #[serde(default)]
    pub strict: bool,
}

/// One lab group's part of a both-groups request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabGroupClass {
    pub lab_group: LabGroup,
    pub subject: SubjectId,
    pub teachers: Vec<TeacherId>,
    pub room: RoomId,
}

/// Schedule two lab groups of one section side by side over the same slots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignLabGroupsRequest {
    pub program: ProgramId,
    pub academic_year: AcademicYearId,
    pub semester: u8,
    pub section: Section,
    pub day: u8,
    pub slots: Vec<u8>,
    pub first: LabGroupClass,
    pub second: LabGroupClass,
    /// Mark both groups as alternating weeks, each paired with the other.
    #[serde(default)]
    pub alternating: bool,
    #[serde(default)]
    pub strict: bool,
}

/// Schedule one elective for several sections at once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElectiveRequest {
    pub program: ProgramId,
    pub academic_year: AcademicYearId,
    pub semester: u8,
    pub day: u8,
    /// One slot for a single-period elective, several consecutive slots for
    /// a spanned one.
    pub slots: Vec<u8>,
    pub target_sections: Vec<Section>,
    #[serde(default = "default_elective_kind")]
    pub class_kind: ClassKind,
    pub subject: SubjectId,
    pub teachers: Vec<TeacherId>,
    pub room: RoomId,
    pub elective_number: u8,
    pub elective_type: String,
    #[serde(default)]
    pub student_composition: Vec<SectionHeadcount>,
    #[serde(default)]
    pub strict: bool,
}

fn default_elective_kind() -> ClassKind {
    ClassKind::Lecture
}

/// Address of one section slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotKeyQuery {
    pub program: ProgramId,
    pub semester: u8,
    pub section: Section,
    pub day: u8,
    pub slot: u8,
}

/// Result of a single-slot assignment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignOutcome {
    pub record: ScheduledSlot,
    /// False when an existing record at the key was updated in place.
    pub created: bool,
    pub advisories: Vec<Advisory>,
}

/// Result of a spanned assignment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpanOutcome {
    pub span_id: SpanId,
    pub records: Vec<ScheduledSlot>,
    pub advisories: Vec<Advisory>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabGroupsOutcome {
    pub first: SpanOutcome,
    pub second: SpanOutcome,
}

/// Result of scheduling or replacing an elective.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElectiveOutcome {
    pub group_id: ElectiveGroupId,
    /// One span per target section for multi-period electives.
    pub span_ids: Vec<SpanId>,
    pub records: Vec<ScheduledSlot>,
    pub advisories: Vec<Advisory>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClearStatus {
    Cleared,
    NotFound,
}

/// Result of any clear operation. Clearing nothing is not an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClearOutcome {
    pub status: ClearStatus,
    pub deleted_count: usize,
    pub deleted_ids: Vec<SlotId>,
    pub cleared_teacher_ids: Vec<TeacherId>,
}

impl ClearOutcome {
    pub fn not_found() -> Self {
        Self {
            status: ClearStatus::NotFound,
            deleted_count: 0,
            deleted_ids: Vec::new(),
            cleared_teacher_ids: Vec::new(),
        }
    }
}
