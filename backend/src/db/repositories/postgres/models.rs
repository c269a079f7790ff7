use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde_json::Value;
use uuid::Uuid;

use super::schema::scheduled_slots;
use crate::db::repository::{RepositoryError, RepositoryResult};
use crate::models::{
    AcademicYearId, ClassCategory, ClassKind, DayIndex, LabGroup,
    NewScheduledSlot, ProgramId, RoomId, ScheduledSlot, Semester, SlotId, SlotIndex, SpanId,
    SubjectId, TeacherId,
};

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = scheduled_slots)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[allow(dead_code)] // occupancy_key and elective_group_id are only used by queries
pub struct SlotRow {
    pub slot_id: i64,
    pub program_id: i64,
    pub academic_year_id: i64,
    pub semester: i16,
    pub section: String,
    pub day_index: i16,
    pub slot_index: i16,
    pub class_kind: String,
    pub subject_id: Option<i64>,
    pub teacher_ids: Vec<i64>,
    pub room_id: Option<i64>,
    pub lab_group: Option<String>,
    pub occupancy_key: String,
    pub is_alternating_week: bool,
    pub alternate_group_json: Option<Value>,
    pub span_id: Option<Uuid>,
    pub is_span_master: bool,
    pub class_category: String,
    pub elective_group_id: Option<Uuid>,
    pub elective_info_json: Option<Value>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable, AsChangeset)]
#[diesel(table_name = scheduled_slots)]
#[diesel(treat_none_as_null = true)]
pub struct NewSlotRow {
    pub program_id: i64,
    pub academic_year_id: i64,
    pub semester: i16,
    pub section: String,
    pub day_index: i16,
    pub slot_index: i16,
    pub class_kind: String,
    pub subject_id: Option<i64>,
    pub teacher_ids: Vec<i64>,
    pub room_id: Option<i64>,
    pub lab_group: Option<String>,
    pub occupancy_key: String,
    pub is_alternating_week: bool,
    pub alternate_group_json: Option<Value>,
    pub span_id: Option<Uuid>,
    pub is_span_master: bool,
    pub class_category: String,
    pub elective_group_id: Option<Uuid>,
    pub elective_info_json: Option<Value>,
}

fn decode<T: std::str::FromStr>(column: &str, raw: &str) -> RepositoryResult<T>
where
    T::Err: std::fmt::Display,
{
    raw.parse::<T>().map_err(|e| {
        RepositoryError::internal(format!("Invalid {} value '{}': {}", column, raw, e))
    })
}

fn small_to_u8(column: &str, value: i16) -> RepositoryResult<u8> {
    u8::try_from(value)
        .map_err(|_| RepositoryError::internal(format!("Invalid {} value {}", column, value)))
}

impl NewSlotRow {
    pub fn from_domain(slot: &NewScheduledSlot) -> RepositoryResult<Self> {
        let alternate_group_json = slot
            .alternate_group_config
            .as_ref()
            .map(serde_json::to_value)
            .transpose()
            .map_err(|e| RepositoryError::internal(format!("Serialization error: {}", e)))?;
        let elective_info_json = slot
            .elective_info
            .as_ref()
            .map(serde_json::to_value)
            .transpose()
            .map_err(|e| RepositoryError::internal(format!("Serialization error: {}", e)))?;

        Ok(Self {
            program_id: slot.program.value(),
            academic_year_id: slot.academic_year.value(),
            semester: i16::from(slot.semester.value()),
            section: slot.section.as_str().to_string(),
            day_index: i16::from(slot.day.value()),
            slot_index: i16::from(slot.slot.value()),
            class_kind: slot.class_kind.as_str().to_string(),
            subject_id: slot.subject.map(|s| s.value()),
            teacher_ids: slot.teachers.iter().map(|t| t.value()).collect(),
            room_id: slot.room.map(|r| r.value()),
            lab_group: slot.lab_group.map(|g| g.as_str().to_string()),
            occupancy_key: slot.occupancy().storage_key().to_string(),
            is_alternating_week: slot.is_alternating_week,
            alternate_group_json,
            span_id: slot.span_id.map(|s| s.value()),
            is_span_master: slot.is_span_master,
            class_category: slot.class_category.as_str().to_string(),
            elective_group_id: slot.elective_info.as_ref().map(|e| e.group_id.value()),
            elective_info_json,
        })
    }
}

impl TryFrom<SlotRow> for ScheduledSlot {
    type Error = RepositoryError;

    fn try_from(row: SlotRow) -> Result<Self, Self::Error> {
        let semester = Semester::new(small_to_u8("semester", row.semester)?)
            .map_err(|e| RepositoryError::internal(e.to_string()))?;
        let day = DayIndex::new(small_to_u8("day_index", row.day_index)?)
            .map_err(|e| RepositoryError::internal(e.to_string()))?;
        let lab_group = row
            .lab_group
            .as_deref()
            .map(|g| decode::<LabGroup>("lab_group", g))
            .transpose()?;
        let alternate_group_config = row
            .alternate_group_json
            .map(serde_json::from_value)
            .transpose()
            .map_err(|e| RepositoryError::internal(format!("Deserialization error: {}", e)))?;
        let elective_info = row
            .elective_info_json
            .map(serde_json::from_value)
            .transpose()
            .map_err(|e| RepositoryError::internal(format!("Deserialization error: {}", e)))?;

        Ok(ScheduledSlot {
            id: SlotId::new(row.slot_id),
            program: ProgramId::new(row.program_id),
            academic_year: AcademicYearId::new(row.academic_year_id),
            semester,
            section: decode("section", &row.section)?,
            day,
            slot: SlotIndex::new(small_to_u8("slot_index", row.slot_index)?),
            class_kind: decode::<ClassKind>("class_kind", &row.class_kind)?,
            subject: row.subject_id.map(SubjectId::new),
            teachers: row.teacher_ids.into_iter().map(TeacherId::new).collect(),
            room: row.room_id.map(RoomId::new),
            lab_group,
            is_alternating_week: row.is_alternating_week,
            alternate_group_config,
            span_id: row.span_id.map(SpanId),
            is_span_master: row.is_span_master,
            class_category: decode::<ClassCategory>("class_category", &row.class_category)?,
            elective_info,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
