//! In-memory reference data, optionally loaded from a JSON seed file.

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Arc;

use super::ReferenceDataProvider;
use crate::db::repository::RepositoryError;
use crate::models::{
    AcademicYear, AcademicYearId, Program, ProgramId, Room, RoomId, SlotIndex, Subject,
    SubjectId, Teacher, TeacherId, TimeSlotDefinition,
};

/// On-disk shape of a reference seed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReferenceSeed {
    #[serde(default)]
    pub programs: Vec<Program>,
    #[serde(default)]
    pub academic_years: Vec<AcademicYear>,
    #[serde(default)]
    pub subjects: Vec<Subject>,
    #[serde(default)]
    pub teachers: Vec<Teacher>,
    #[serde(default)]
    pub rooms: Vec<Room>,
    #[serde(default)]
    pub time_slots: Vec<TimeSlotDefinition>,
}

#[derive(Default)]
struct ReferenceTables {
    programs: HashMap<ProgramId, Program>,
    academic_years: HashMap<AcademicYearId, AcademicYear>,
    subjects: HashMap<SubjectId, Subject>,
    teachers: HashMap<TeacherId, Teacher>,
    rooms: HashMap<RoomId, Room>,
    time_slots: BTreeMap<SlotIndex, TimeSlotDefinition>,
}

/// Reference data held in memory.
///
/// Cloning shares the underlying tables, so a clone kept by a test can keep
/// mutating the data a running engine sees.
#[derive(Clone, Default)]
pub struct LocalReferenceData {
    tables: Arc<RwLock<ReferenceTables>>,
}

impl LocalReferenceData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_seed(seed: ReferenceSeed) -> Self {
        let data = Self::new();
        data.load(seed);
        data
    }

    /// Read a JSON seed file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, RepositoryError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            RepositoryError::configuration(format!(
                "Failed to read reference seed {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        Self::from_json_str(&content)
    }

    pub fn from_json_str(content: &str) -> Result<Self, RepositoryError> {
        let seed: ReferenceSeed = serde_json::from_str(content).map_err(|e| {
            RepositoryError::configuration(format!("Invalid reference seed: {}", e))
        })?;
        Ok(Self::from_seed(seed))
    }

    /// Merge a seed into the current tables, replacing entries with equal ids.
    pub fn load(&self, seed: ReferenceSeed) {
        let mut tables = self.tables.write();
        tables
            .programs
            .extend(seed.programs.into_iter().map(|p| (p.id, p)));
        tables
            .academic_years
            .extend(seed.academic_years.into_iter().map(|y| (y.id, y)));
        tables
            .subjects
            .extend(seed.subjects.into_iter().map(|s| (s.id, s)));
        tables
            .teachers
            .extend(seed.teachers.into_iter().map(|t| (t.id, t)));
        tables.rooms.extend(seed.rooms.into_iter().map(|r| (r.id, r)));
        tables
            .time_slots
            .extend(seed.time_slots.into_iter().map(|t| (t.index, t)));
    }

    pub fn upsert_program(&self, program: Program) {
        self.tables.write().programs.insert(program.id, program);
    }

    pub fn upsert_subject(&self, subject: Subject) {
        self.tables.write().subjects.insert(subject.id, subject);
    }

    pub fn upsert_teacher(&self, teacher: Teacher) {
        self.tables.write().teachers.insert(teacher.id, teacher);
    }

    pub fn upsert_room(&self, room: Room) {
        self.tables.write().rooms.insert(room.id, room);
    }

    pub fn upsert_time_slot(&self, slot: TimeSlotDefinition) {
        self.tables.write().time_slots.insert(slot.index, slot);
    }

    /// Flip the active flag of a teacher, if known.
    pub fn set_teacher_active(&self, id: TeacherId, active: bool) {
        if let Some(teacher) = self.tables.write().teachers.get_mut(&id) {
            teacher.is_active = active;
        }
    }
}

#[async_trait]
impl ReferenceDataProvider for LocalReferenceData {
    async fn program(&self, id: ProgramId) -> Option<Program> {
        self.tables.read().programs.get(&id).cloned()
    }

    async fn academic_year(&self, id: AcademicYearId) -> Option<AcademicYear> {
        self.tables.read().academic_years.get(&id).cloned()
    }

    async fn subject(&self, id: SubjectId) -> Option<Subject> {
        self.tables.read().subjects.get(&id).cloned()
    }

    async fn teacher(&self, id: TeacherId) -> Option<Teacher> {
        self.tables.read().teachers.get(&id).cloned()
    }

    async fn room(&self, id: RoomId) -> Option<Room> {
        self.tables.read().rooms.get(&id).cloned()
    }

    async fn time_slot(&self, index: SlotIndex) -> Option<TimeSlotDefinition> {
        self.tables.read().time_slots.get(&index).cloned()
    }

    async fn time_slots(&self) -> Vec<TimeSlotDefinition> {
        self.tables.read().time_slots.values().cloned().collect()
    }
}
