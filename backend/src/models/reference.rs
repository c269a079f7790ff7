//! Reference entities owned by other parts of the system.
//!
//! The engine only reads these. Their `is_active` flag is trusted as-is.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use super::calendar::SlotIndex;

crate::define_id_type!(i64, ProgramId);
crate::define_id_type!(i64, AcademicYearId);
crate::define_id_type!(i64, SubjectId);
crate::define_id_type!(i64, TeacherId);
crate::define_id_type!(i64, RoomId);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Program {
    pub id: ProgramId,
    /// Short code such as "BCT".
    pub code: String,
    pub name: String,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcademicYear {
    pub id: AcademicYearId,
    /// Display label, e.g. "2081/82".
    pub label: String,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subject {
    pub id: SubjectId,
    pub code: String,
    pub name: String,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Teacher {
    pub id: TeacherId,
    pub name: String,
    /// Initials used on printed routines.
    #[serde(default)]
    pub short_name: Option<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoomType {
    Classroom,
    Lab,
    Hall,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Room {
    pub id: RoomId,
    pub name: String,
    pub room_type: RoomType,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

impl Room {
    pub fn is_lab(&self) -> bool {
        self.room_type == RoomType::Lab
    }
}

/// One fixed daily period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSlotDefinition {
    pub index: SlotIndex,
    pub label: String,
    pub start: NaiveTime,
    pub end: NaiveTime,
    #[serde(default)]
    pub is_break: bool,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}
