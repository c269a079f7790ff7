//! Calendar coordinates of a scheduled slot.
//!
//! Semesters, days and slot indices are small bounded integers. They are
//! validated on construction so that a value of these types is always in range.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Highest semester of a programme.
pub const MAX_SEMESTER: u8 = 8;
/// Days are numbered 0..=6.
pub const DAYS_PER_WEEK: u8 = 7;

/// Out-of-range or unparseable calendar value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CalendarValueError {
    #[error("semester must be between 1 and 8, got {0}")]
    Semester(u8),
    #[error("day index must be between 0 and 6, got {0}")]
    Day(u8),
    #[error("unknown section '{0}'")]
    Section(String),
    #[error("unknown lab group '{0}'")]
    LabGroup(String),
    #[error("unknown class kind '{0}'")]
    ClassKind(String),
    #[error("unknown class category '{0}'")]
    ClassCategory(String),
}

/// Odd/even classification of a semester.
///
/// Odd semesters (1, 3, 5, 7) and even semesters (2, 4, 6, 8) are taught to
/// physically disjoint cohorts, so teachers and rooms are only contended
/// within one parity group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Parity {
    Odd,
    Even,
}

/// Academic semester, 1..=8.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Semester(u8);

impl Semester {
    pub fn new(value: u8) -> Result<Self, CalendarValueError> {
        if (1..=MAX_SEMESTER).contains(&value) {
            Ok(Self(value))
        } else {
            Err(CalendarValueError::Semester(value))
        }
    }

    pub fn value(&self) -> u8 {
        self.0
    }

    pub fn parity(&self) -> Parity {
        if self.0 % 2 == 1 {
            Parity::Odd
        } else {
            Parity::Even
        }
    }

    /// `a % 2 == b % 2`: the two semesters compete for the same teachers and rooms.
    pub fn same_parity_group(&self, other: Semester) -> bool {
        self.parity() == other.parity()
    }

    /// Electives are only offered in the final two semesters.
    pub fn allows_electives(&self) -> bool {
        self.0 >= MAX_SEMESTER - 1
    }
}

impl TryFrom<u8> for Semester {
    type Error = CalendarValueError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Semester::new(value)
    }
}

impl From<Semester> for u8 {
    fn from(s: Semester) -> Self {
        s.0
    }
}

impl fmt::Display for Semester {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Day of the week, 0..=6.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct DayIndex(u8);

impl DayIndex {
    pub fn new(value: u8) -> Result<Self, CalendarValueError> {
        if value < DAYS_PER_WEEK {
            Ok(Self(value))
        } else {
            Err(CalendarValueError::Day(value))
        }
    }

    pub fn value(&self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for DayIndex {
    type Error = CalendarValueError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        DayIndex::new(value)
    }
}

impl From<DayIndex> for u8 {
    fn from(d: DayIndex) -> Self {
        d.0
    }
}

impl fmt::Display for DayIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Index of a fixed daily time-slot definition, shared by all days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SlotIndex(pub u8);

impl SlotIndex {
    pub fn new(value: u8) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u8 {
        self.0
    }

    /// True when `next` immediately follows `self`.
    pub fn is_followed_by(&self, next: SlotIndex) -> bool {
        self.0.checked_add(1) == Some(next.0)
    }
}

impl fmt::Display for SlotIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Section group of a semester.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Section {
    AB,
    CD,
}

impl Section {
    pub const ALL: [Section; 2] = [Section::AB, Section::CD];

    pub fn as_str(&self) -> &'static str {
        match self {
            Section::AB => "AB",
            Section::CD => "CD",
        }
    }

    /// Lab sub-groups that split this section.
    pub fn lab_groups(&self) -> [LabGroup; 2] {
        match self {
            Section::AB => [LabGroup::A, LabGroup::B],
            Section::CD => [LabGroup::C, LabGroup::D],
        }
    }
}

impl FromStr for Section {
    type Err = CalendarValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "AB" => Ok(Section::AB),
            "CD" => Ok(Section::CD),
            other => Err(CalendarValueError::Section(other.to_string())),
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Practical sub-group. `All` claims the whole slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum LabGroup {
    A,
    B,
    C,
    D,
    #[serde(rename = "ALL")]
    All,
}

impl LabGroup {
    pub fn as_str(&self) -> &'static str {
        match self {
            LabGroup::A => "A",
            LabGroup::B => "B",
            LabGroup::C => "C",
            LabGroup::D => "D",
            LabGroup::All => "ALL",
        }
    }

    /// Whether this group may be used inside `section`.
    pub fn belongs_to(&self, section: Section) -> bool {
        match self {
            LabGroup::All => true,
            group => section.lab_groups().contains(group),
        }
    }
}

impl FromStr for LabGroup {
    type Err = CalendarValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "A" => Ok(LabGroup::A),
            "B" => Ok(LabGroup::B),
            "C" => Ok(LabGroup::C),
            "D" => Ok(LabGroup::D),
            "ALL" => Ok(LabGroup::All),
            other => Err(CalendarValueError::LabGroup(other.to_string())),
        }
    }
}

impl fmt::Display for LabGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClassKind {
    Lecture,
    Practical,
    Tutorial,
    Break,
}

impl ClassKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClassKind::Lecture => "Lecture",
            ClassKind::Practical => "Practical",
            ClassKind::Tutorial => "Tutorial",
            ClassKind::Break => "Break",
        }
    }

    pub fn is_break(&self) -> bool {
        matches!(self, ClassKind::Break)
    }
}

impl FromStr for ClassKind {
    type Err = CalendarValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "lecture" | "l" => Ok(ClassKind::Lecture),
            "practical" | "p" => Ok(ClassKind::Practical),
            "tutorial" | "t" => Ok(ClassKind::Tutorial),
            "break" => Ok(ClassKind::Break),
            other => Err(CalendarValueError::ClassKind(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ClassCategory {
    #[default]
    Core,
    Elective,
}

impl ClassCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClassCategory::Core => "Core",
            ClassCategory::Elective => "Elective",
        }
    }
}

impl FromStr for ClassCategory {
    type Err = CalendarValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "core" => Ok(ClassCategory::Core),
            "elective" => Ok(ClassCategory::Elective),
            other => Err(CalendarValueError::ClassCategory(other.to_string())),
        }
    }
}

/// The part of a section's slot a record occupies.
///
/// Everything except a Practical for a single lab sub-group occupies the
/// whole slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Occupancy {
    Whole,
    Group(LabGroup),
}

impl Occupancy {
    pub fn of(kind: ClassKind, lab_group: Option<LabGroup>) -> Self {
        match (kind, lab_group) {
            (ClassKind::Practical, Some(group)) if group != LabGroup::All => {
                Occupancy::Group(group)
            }
            _ => Occupancy::Whole,
        }
    }

    /// Two occupants of the same section slot overlap unless they are
    /// distinct lab sub-groups.
    pub fn overlaps(&self, other: Occupancy) -> bool {
        match (self, other) {
            (Occupancy::Group(a), Occupancy::Group(b)) => *a == b,
            _ => true,
        }
    }

    /// Storage key used by the uniqueness constraint.
    pub fn storage_key(&self) -> &'static str {
        match self {
            Occupancy::Whole => "WHOLE",
            Occupancy::Group(group) => group.as_str(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_semester_bounds() {
        assert!(Semester::new(0).is_err());
        assert!(Semester::new(9).is_err());
        assert_eq!(Semester::new(8).unwrap().value(), 8);
    }

    #[test]
    fn test_parity_groups() {
        let s3 = Semester::new(3).unwrap();
        assert!(s3.same_parity_group(Semester::new(5).unwrap()));
        assert!(!s3.same_parity_group(Semester::new(4).unwrap()));
        assert_eq!(Semester::new(8).unwrap().parity(), Parity::Even);
    }

    #[test]
    fn test_electives_only_final_semesters() {
        assert!(!Semester::new(6).unwrap().allows_electives());
        assert!(Semester::new(7).unwrap().allows_electives());
        assert!(Semester::new(8).unwrap().allows_electives());
    }

    #[test]
    fn test_day_bounds() {
        assert!(DayIndex::new(6).is_ok());
        assert_eq!(DayIndex::new(7), Err(CalendarValueError::Day(7)));
    }

    #[test]
    fn test_lab_group_membership() {
        assert!(LabGroup::A.belongs_to(Section::AB));
        assert!(!LabGroup::C.belongs_to(Section::AB));
        assert!(LabGroup::All.belongs_to(Section::CD));
    }

    #[test]
    fn test_occupancy_overlap() {
        let a = Occupancy::of(ClassKind::Practical, Some(LabGroup::A));
        let b = Occupancy::of(ClassKind::Practical, Some(LabGroup::B));
        let all = Occupancy::of(ClassKind::Practical, Some(LabGroup::All));
        let lecture = Occupancy::of(ClassKind::Lecture, None);

        assert!(!a.overlaps(b));
        assert!(a.overlaps(a));
        assert!(all.overlaps(a));
        assert_eq!(all, lecture);
    }

    #[test]
    fn test_serde_rejects_out_of_range_semester() {
        let parsed: Result<Semester, _> = serde_json::from_str("9");
        assert!(parsed.is_err());
        let parsed: LabGroup = serde_json::from_str("\"ALL\"").unwrap();
        assert_eq!(parsed, LabGroup::All);
    }
}
