//! Conflict detection.
//!
//! The rules live in [`rules`] as pure functions over already-loaded records;
//! [`ConflictDetector`] fetches the records from storage, applies the rules and
//! resolves resource names for reporting.
//!
//! Three kinds of hard conflict exist:
//!
//! - **Section**: the same program/semester/section already has an overlapping
//!   occupant at the day/slot. Applies to every class kind and ignores parity.
//! - **Teacher** / **Room**: the resource is already used at the day/slot by a
//!   record whose semester is in the same parity group. Break records never
//!   take part.
//!
//! Distinct lab sub-groups of one section meet in parallel and never conflict
//! with each other.

mod detector;
pub mod rules;

pub use detector::ConflictDetector;

use serde::{Deserialize, Serialize};

use crate::models::{ClassKind, RoomId, Section, SlotSummary, TeacherId};

/// One hard conflict between a candidate and an existing record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Conflict {
    Teacher {
        teacher_id: TeacherId,
        teacher_name: Option<String>,
        existing: SlotSummary,
    },
    Room {
        room_id: RoomId,
        room_name: Option<String>,
        existing: SlotSummary,
    },
    Section {
        section: Section,
        existing: SlotSummary,
    },
}

impl Conflict {
    /// The record the candidate collides with.
    pub fn existing(&self) -> &SlotSummary {
        match self {
            Conflict::Teacher { existing, .. }
            | Conflict::Room { existing, .. }
            | Conflict::Section { existing, .. } => existing,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Conflict::Teacher { .. } => "teacher",
            Conflict::Room { .. } => "room",
            Conflict::Section { .. } => "section",
        }
    }
}

impl std::fmt::Display for Conflict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Conflict::Teacher {
                teacher_id,
                teacher_name,
                existing,
            } => write!(
                f,
                "teacher {} is already teaching {}",
                teacher_name.as_deref().unwrap_or(&teacher_id.to_string()),
                existing
            ),
            Conflict::Room {
                room_id,
                room_name,
                existing,
            } => write!(
                f,
                "room {} is already used by {}",
                room_name.as_deref().unwrap_or(&room_id.to_string()),
                existing
            ),
            Conflict::Section { section, existing } => {
                write!(f, "section {} already has {}", section, existing)
            }
        }
    }
}

/// Non-blocking validation finding. Only strict requests are refused for these.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Advisory {
    /// A Practical is placed in a room that is not a lab.
    NonLabRoom { room_id: RoomId, room_name: String },
    /// More than one teacher on a class that is not a Practical.
    MultipleTeachers {
        class_kind: ClassKind,
        teacher_count: usize,
    },
}

impl std::fmt::Display for Advisory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Advisory::NonLabRoom { room_name, .. } => {
                write!(f, "practical scheduled in non-lab room {}", room_name)
            }
            Advisory::MultipleTeachers {
                class_kind,
                teacher_count,
            } => write!(
                f,
                "{} teachers assigned to a {}",
                teacher_count,
                class_kind.as_str()
            ),
        }
    }
}

/// Hard conflicts plus advisories for one request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictReport {
    pub conflicts: Vec<Conflict>,
    pub advisories: Vec<Advisory>,
}

impl ConflictReport {
    pub fn new(conflicts: Vec<Conflict>, advisories: Vec<Advisory>) -> Self {
        Self {
            conflicts,
            advisories,
        }
    }

    pub fn has_conflicts(&self) -> bool {
        !self.conflicts.is_empty()
    }

    /// Whether the request must be refused.
    pub fn is_blocking(&self, strict: bool) -> bool {
        self.has_conflicts() || (strict && !self.advisories.is_empty())
    }
}

impl std::fmt::Display for ConflictReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut parts: Vec<String> = self.conflicts.iter().map(|c| c.to_string()).collect();
        parts.extend(self.advisories.iter().map(|a| a.to_string()));
        write!(f, "{}", parts.join("; "))
    }
}
