#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::NaiveTime;

use timetable_backend::db::LocalRepository;
use timetable_backend::models::{
    AcademicYear, AcademicYearId, ClassKind, LabGroup, Program, ProgramId, Room, RoomId, RoomType,
    Section, SlotIndex, Subject, SubjectId, Teacher, TeacherId, TimeSlotDefinition,
};
use timetable_backend::notify::{
    NotificationDispatcher, RecordingPublisher, RetryPolicy, TeacherScheduleChanged, DEFAULT_TOPIC,
};
use timetable_backend::reference::{LocalReferenceData, ReferenceSeed};
use timetable_backend::services::{AssignSlotRequest, AssignSpanRequest, ClassDetails};
use timetable_backend::SchedulingEngine;

static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Runs `f` with environment variables temporarily modified.
///
/// Restores the variables on unwind and serializes access to the
/// process-global environment across parallel tests.
///
/// `changes` is a list of `(key, value)` pairs:
/// - `Some(v)` sets the variable to `v`
/// - `None` removes the variable
pub fn with_scoped_env<F, R>(changes: &[(&str, Option<&str>)], f: F) -> R
where
    F: FnOnce() -> R,
{
    let _lock = ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    let _guard = ScopedEnv::new(changes);
    f()
}

struct ScopedEnv {
    snapshot: Vec<(String, Option<String>)>,
}

impl ScopedEnv {
    fn new(changes: &[(&str, Option<&str>)]) -> Self {
        let keys: HashSet<&str> = changes.iter().map(|(k, _)| *k).collect();
        let snapshot = keys
            .into_iter()
            .map(|k| (k.to_string(), std::env::var(k).ok()))
            .collect::<Vec<_>>();

        for (k, v) in changes {
            match v {
                Some(val) => std::env::set_var(k, val),
                None => std::env::remove_var(k),
            }
        }

        Self { snapshot }
    }
}

impl Drop for ScopedEnv {
    fn drop(&mut self) {
        for (k, v) in self.snapshot.drain(..) {
            match v {
                Some(val) => std::env::set_var(&k, val),
                None => std::env::remove_var(&k),
            }
        }
    }
}

// =============================================================================
// Reference data
// =============================================================================

pub const BCT: ProgramId = ProgramId(1);
pub const BEX: ProgramId = ProgramId(2);
pub const YEAR: AcademicYearId = AcademicYearId(1);

pub const ROOM_101: RoomId = RoomId(1);
pub const ROOM_102: RoomId = RoomId(2);
pub const LAB_1: RoomId = RoomId(10);
pub const LAB_2: RoomId = RoomId(11);

/// Slot 4 is the lunch break.
pub const BREAK_SLOT: u8 = 4;

pub fn teacher(id: i64) -> TeacherId {
    TeacherId::new(id)
}

pub fn subject(id: i64) -> SubjectId {
    SubjectId::new(id)
}

fn time(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

pub fn seed() -> ReferenceSeed {
    let names = [
        "Anil Shrestha",
        "Bina Karki",
        "Chandra Rai",
        "Deepa Thapa",
        "Eshan Gurung",
        "Farah Ansari",
    ];
    let subjects = [
        ("CT501", "Computer Networks"),
        ("CT502", "Networks Lab"),
        ("CT503", "Operating Systems"),
        ("CT701", "Machine Learning"),
        ("CT702", "Cloud Computing"),
        ("CT703", "Embedded Systems"),
    ];

    ReferenceSeed {
        programs: vec![
            Program {
                id: BCT,
                code: "BCT".into(),
                name: "Computer Engineering".into(),
                is_active: true,
            },
            Program {
                id: BEX,
                code: "BEX".into(),
                name: "Electronics Engineering".into(),
                is_active: true,
            },
        ],
        academic_years: vec![AcademicYear {
            id: YEAR,
            label: "2081/82".into(),
            is_active: true,
        }],
        subjects: subjects
            .iter()
            .enumerate()
            .map(|(i, (code, name))| Subject {
                id: SubjectId::new(i as i64 + 1),
                code: (*code).into(),
                name: (*name).into(),
                is_active: true,
            })
            .collect(),
        teachers: names
            .iter()
            .enumerate()
            .map(|(i, name)| Teacher {
                id: TeacherId::new(i as i64 + 1),
                name: (*name).into(),
                short_name: None,
                is_active: true,
            })
            .collect(),
        rooms: vec![
            room(ROOM_101, "Room 101", RoomType::Classroom),
            room(ROOM_102, "Room 102", RoomType::Classroom),
            room(LAB_1, "Lab 1", RoomType::Lab),
            room(LAB_2, "Lab 2", RoomType::Lab),
        ],
        time_slots: (1..=8u8)
            .map(|i| {
                let start = time(10 + (i as u32 - 1) * 45 / 60, ((i as u32 - 1) * 45) % 60);
                TimeSlotDefinition {
                    index: SlotIndex::new(i),
                    label: if i == BREAK_SLOT {
                        "Break".into()
                    } else {
                        format!("Period {}", i)
                    },
                    start,
                    end: start + chrono::Duration::minutes(45),
                    is_break: i == BREAK_SLOT,
                    is_active: true,
                }
            })
            .collect(),
    }
}

fn room(id: RoomId, name: &str, room_type: RoomType) -> Room {
    Room {
        id,
        name: name.into(),
        room_type,
        is_active: true,
    }
}

// =============================================================================
// Engine fixture
// =============================================================================

pub struct Fixture {
    pub engine: SchedulingEngine,
    pub repo: LocalRepository,
    pub reference: LocalReferenceData,
    pub publisher: RecordingPublisher,
    pub notifier: NotificationDispatcher,
}

impl Fixture {
    /// Engine over a transactional in-memory repository. Needs a tokio runtime.
    pub fn new() -> Self {
        Self::with_repository(LocalRepository::new())
    }

    pub fn non_transactional() -> Self {
        Self::with_repository(LocalRepository::non_transactional())
    }

    pub fn with_repository(repo: LocalRepository) -> Self {
        let reference = LocalReferenceData::from_seed(seed());
        let publisher = RecordingPublisher::new();
        let notifier = NotificationDispatcher::start(
            Arc::new(publisher.clone()),
            DEFAULT_TOPIC,
            RetryPolicy {
                max_attempts: 3,
                initial_backoff: Duration::from_millis(1),
            },
        );
        let engine = SchedulingEngine::new(
            Arc::new(repo.clone()),
            Arc::new(reference.clone()),
            notifier.clone(),
        );
        Self {
            engine,
            repo,
            reference,
            publisher,
            notifier,
        }
    }

    /// Wait for every queued notification and return the delivered events.
    pub async fn delivered(&self) -> Vec<TeacherScheduleChanged> {
        self.notifier.shutdown().await;
        self.publisher
            .messages()
            .into_iter()
            .map(|(_, payload)| serde_json::from_value(payload).unwrap())
            .collect()
    }
}

// =============================================================================
// Request builders
// =============================================================================

pub fn lecture(subject_id: i64, teacher_id: i64, room: RoomId) -> ClassDetails {
    ClassDetails {
        class_kind: ClassKind::Lecture,
        subject: Some(subject(subject_id)),
        teachers: vec![teacher(teacher_id)],
        room: Some(room),
        lab_group: None,
        is_alternating_week: false,
        alternate_group_config: None,
    }
}

pub fn practical(subject_id: i64, teacher_id: i64, room: RoomId, group: LabGroup) -> ClassDetails {
    ClassDetails {
        class_kind: ClassKind::Practical,
        lab_group: Some(group),
        ..lecture(subject_id, teacher_id, room)
    }
}

pub fn assign(
    program: ProgramId,
    semester: u8,
    section: Section,
    day: u8,
    slot: u8,
    class: ClassDetails,
) -> AssignSlotRequest {
    AssignSlotRequest {
        program,
        academic_year: YEAR,
        semester,
        section,
        day,
        slot,
        class,
        strict: false,
    }
}

pub fn span(
    program: ProgramId,
    semester: u8,
    section: Section,
    day: u8,
    slots: &[u8],
    class: ClassDetails,
) -> AssignSpanRequest {
    AssignSpanRequest {
        program,
        academic_year: YEAR,
        semester,
        section,
        day,
        slots: slots.to_vec(),
        class,
        strict: false,
    }
}
