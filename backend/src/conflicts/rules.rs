//! Pure conflict rules.

use std::collections::{BTreeMap, HashSet};

use super::Conflict;
use crate::models::{
    DayIndex, NewScheduledSlot, RoomId, ScheduledSlot, Semester, SlotId, SlotIndex, SpanId,
    TeacherId,
};

/// Distinct lab sub-groups of the same section at the same slot.
///
/// These share a section key on purpose and are exempt from every check.
pub fn are_sibling_lab_groups(candidate: &NewScheduledSlot, existing: &ScheduledSlot) -> bool {
    candidate.key() == existing.key() && !candidate.occupancy().overlaps(existing.occupancy())
}

/// Candidate and existing record occupy the same part of one section slot.
pub fn occupies_same_section_slot(candidate: &NewScheduledSlot, existing: &ScheduledSlot) -> bool {
    candidate.key() == existing.key() && candidate.occupancy().overlaps(existing.occupancy())
}

/// Teachers and rooms are only contended inside one parity group.
pub fn shares_resources(a: Semester, b: Semester) -> bool {
    a.same_parity_group(b)
}

/// Check one candidate against the active records at its day/slot.
///
/// `existing` may contain records at other times; they are ignored. Records
/// whose id is in `exclude` are skipped, which lets an update or a replace
/// check against everything except the records it is about to overwrite.
pub fn detect(
    candidate: &NewScheduledSlot,
    existing: &[ScheduledSlot],
    exclude: &HashSet<SlotId>,
) -> Vec<Conflict> {
    let mut conflicts = Vec::new();

    for record in existing {
        if !record.is_active
            || exclude.contains(&record.id)
            || record.day != candidate.day
            || record.slot != candidate.slot
        {
            continue;
        }

        if occupies_same_section_slot(candidate, record) {
            conflicts.push(Conflict::Section {
                section: candidate.section,
                existing: record.summary(),
            });
            continue;
        }

        if are_sibling_lab_groups(candidate, record)
            || candidate.class_kind.is_break()
            || record.is_break()
            || !shares_resources(candidate.semester, record.semester)
        {
            continue;
        }

        for teacher in &candidate.teachers {
            if record.teachers.contains(teacher) {
                conflicts.push(Conflict::Teacher {
                    teacher_id: *teacher,
                    teacher_name: None,
                    existing: record.summary(),
                });
            }
        }

        if let (Some(room), Some(existing_room)) = (candidate.room, record.room) {
            if room == existing_room {
                conflicts.push(Conflict::Room {
                    room_id: room,
                    room_name: None,
                    existing: record.summary(),
                });
            }
        }
    }

    conflicts
}

/// Inclusive slot range of every span present on `day`.
///
/// `records` must hold every sibling of each span of interest.
pub fn span_ranges(
    records: &[ScheduledSlot],
    day: DayIndex,
) -> BTreeMap<SpanId, (SlotIndex, SlotIndex)> {
    let mut ranges: BTreeMap<SpanId, (SlotIndex, SlotIndex)> = BTreeMap::new();
    for record in records.iter().filter(|r| r.is_active && r.day == day) {
        let Some(span) = record.span_id else { continue };
        ranges
            .entry(span)
            .and_modify(|(lo, hi)| {
                *lo = (*lo).min(record.slot);
                *hi = (*hi).max(record.slot);
            })
            .or_insert((record.slot, record.slot));
    }
    ranges
}

/// Resource an availability query is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Teacher(TeacherId),
    Room(RoomId),
}

impl Resource {
    pub fn is_used_by(&self, record: &ScheduledSlot) -> bool {
        match self {
            Resource::Teacher(id) => record.teachers.contains(id),
            Resource::Room(id) => record.room == Some(*id),
        }
    }

    fn conflict_with(&self, record: &ScheduledSlot) -> Conflict {
        match self {
            Resource::Teacher(id) => Conflict::Teacher {
                teacher_id: *id,
                teacher_name: None,
                existing: record.summary(),
            },
            Resource::Room(id) => Conflict::Room {
                room_id: *id,
                room_name: None,
                existing: record.summary(),
            },
        }
    }
}

/// Whether `resource` is busy at (day, slot) for a class of `semester`.
///
/// `at_time` holds the records at (day, slot); `span_records` holds every
/// sibling of every span active on `day`. A span occupies the whole range
/// between its first and last period, so a query that falls inside the range
/// reports the span even when no sibling sits exactly on `slot`.
pub fn resource_conflicts(
    resource: Resource,
    day: DayIndex,
    slot: SlotIndex,
    semester: Semester,
    at_time: &[ScheduledSlot],
    span_records: &[ScheduledSlot],
) -> Vec<Conflict> {
    let mut seen_records: HashSet<SlotId> = HashSet::new();
    let mut seen_spans: HashSet<SpanId> = HashSet::new();
    let mut conflicts = Vec::new();

    let relevant = |record: &ScheduledSlot| {
        record.is_active
            && !record.is_break()
            && shares_resources(semester, record.semester)
            && resource.is_used_by(record)
    };

    for record in at_time
        .iter()
        .filter(|r| r.day == day && r.slot == slot && relevant(*r))
    {
        if seen_records.insert(record.id) {
            if let Some(span) = record.span_id {
                seen_spans.insert(span);
            }
            conflicts.push(resource.conflict_with(record));
        }
    }

    let ranges = span_ranges(span_records, day);
    for (span, (lo, hi)) in ranges {
        if seen_spans.contains(&span) || slot < lo || slot > hi {
            continue;
        }
        let master = span_records
            .iter()
            .filter(|r| r.span_id == Some(span) && r.day == day && relevant(*r))
            .min_by_key(|r| (!r.is_span_master, r.slot));
        if let Some(record) = master {
            seen_spans.insert(span);
            conflicts.push(resource.conflict_with(record));
        }
    }

    conflicts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        AcademicYearId, ClassCategory, ClassKind, LabGroup, ProgramId, Section, SubjectId,
    };
    use chrono::Utc;

    fn candidate(semester: u8, section: Section, day: u8, slot: u8) -> NewScheduledSlot {
        NewScheduledSlot {
            program: ProgramId::new(1),
            academic_year: AcademicYearId::new(1),
            semester: Semester::new(semester).unwrap(),
            section,
            day: DayIndex::new(day).unwrap(),
            slot: SlotIndex::new(slot),
            class_kind: ClassKind::Lecture,
            subject: Some(SubjectId::new(1)),
            teachers: vec![TeacherId::new(1)],
            room: Some(RoomId::new(1)),
            lab_group: None,
            is_alternating_week: false,
            alternate_group_config: None,
            span_id: None,
            is_span_master: false,
            class_category: ClassCategory::Core,
            elective_info: None,
        }
    }

    fn stored(id: i64, new: NewScheduledSlot) -> ScheduledSlot {
        ScheduledSlot::from_new(SlotId::new(id), new, Utc::now())
    }

    #[test]
    fn test_same_parity_teacher_conflicts() {
        let existing = vec![stored(1, candidate(3, Section::AB, 1, 2))];
        let mut cand = candidate(5, Section::AB, 1, 2);
        cand.room = Some(RoomId::new(9));

        let conflicts = detect(&cand, &existing, &HashSet::new());
        assert_eq!(conflicts.len(), 1);
        assert!(matches!(conflicts[0], Conflict::Teacher { .. }));
    }

    #[test]
    fn test_other_parity_never_conflicts_on_resources() {
        let existing = vec![stored(1, candidate(3, Section::AB, 1, 2))];
        let cand = candidate(4, Section::AB, 1, 2);
        assert!(detect(&cand, &existing, &HashSet::new()).is_empty());
    }

    #[test]
    fn test_section_conflict_reported_once() {
        let existing = vec![stored(1, candidate(3, Section::AB, 1, 2))];
        let cand = candidate(3, Section::AB, 1, 2);

        let conflicts = detect(&cand, &existing, &HashSet::new());
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].kind(), "section");
    }

    #[test]
    fn test_excluded_record_is_skipped() {
        let existing = vec![stored(7, candidate(3, Section::AB, 1, 2))];
        let cand = candidate(3, Section::AB, 1, 2);
        assert!(detect(&cand, &existing, &HashSet::from([SlotId::new(7)])).is_empty());
    }

    #[test]
    fn test_break_skips_resource_checks() {
        let existing = vec![stored(1, candidate(3, Section::AB, 1, 2))];
        let mut cand = candidate(5, Section::CD, 1, 2);
        cand.class_kind = ClassKind::Break;
        assert!(detect(&cand, &existing, &HashSet::new()).is_empty());
    }

    #[test]
    fn test_sibling_lab_groups_coexist() {
        let mut a = candidate(3, Section::AB, 1, 2);
        a.class_kind = ClassKind::Practical;
        a.lab_group = Some(LabGroup::A);
        let existing = vec![stored(1, a.clone())];

        let mut b = a.clone();
        b.lab_group = Some(LabGroup::B);
        assert!(detect(&b, &existing, &HashSet::new()).is_empty());

        let mut whole = a;
        whole.lab_group = Some(LabGroup::All);
        let conflicts = detect(&whole, &existing, &HashSet::new());
        assert!(matches!(conflicts.as_slice(), [Conflict::Section { .. }]));
    }

    #[test]
    fn test_span_range_covers_inner_slot() {
        let span = SpanId::generate();
        let mut records = Vec::new();
        for (id, slot) in [(1, 2u8), (2, 4u8)] {
            let mut new = candidate(3, Section::AB, 1, slot);
            new.span_id = Some(span);
            new.is_span_master = slot == 2;
            records.push(stored(id, new));
        }

        let conflicts = resource_conflicts(
            Resource::Teacher(TeacherId::new(1)),
            DayIndex::new(1).unwrap(),
            SlotIndex::new(3),
            Semester::new(7).unwrap(),
            &[],
            &records,
        );
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].existing().slot_id, SlotId::new(1));

        let outside = resource_conflicts(
            Resource::Teacher(TeacherId::new(1)),
            DayIndex::new(1).unwrap(),
            SlotIndex::new(5),
            Semester::new(7).unwrap(),
            &[],
            &records,
        );
        assert!(outside.is_empty());
    }

    #[test]
    fn test_span_not_reported_twice() {
        let span = SpanId::generate();
        let mut new = candidate(3, Section::AB, 1, 3);
        new.span_id = Some(span);
        let records = vec![stored(1, new)];

        let conflicts = resource_conflicts(
            Resource::Room(RoomId::new(1)),
            DayIndex::new(1).unwrap(),
            SlotIndex::new(3),
            Semester::new(1).unwrap(),
            &records,
            &records,
        );
        assert_eq!(conflicts.len(), 1);
    }
}
