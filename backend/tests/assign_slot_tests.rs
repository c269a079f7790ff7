mod support;

use support::*;
use timetable_backend::conflicts::{Advisory, Conflict};
use timetable_backend::models::{ClassKind, LabGroup, Section, SlotIndex};
use timetable_backend::notify::ChangeReason;
use timetable_backend::services::ClassDetails;
use timetable_backend::SchedulingError;

#[tokio::test]
async fn test_assign_creates_record() {
    let fx = Fixture::new();
    let outcome = fx
        .engine
        .assign_slot(assign(BCT, 5, Section::AB, 0, 1, lecture(1, 1, ROOM_101)))
        .await
        .unwrap();

    assert!(outcome.created);
    assert!(outcome.advisories.is_empty());
    assert_eq!(outcome.record.slot, SlotIndex::new(1));
    assert_eq!(outcome.record.teachers, vec![teacher(1)]);
    assert_eq!(fx.repo.slot_count(), 1);

    let events = fx.delivered().await;
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].teacher_ids, vec![teacher(1)]);
    assert_eq!(events[0].reason, ChangeReason::Assigned);
}

#[tokio::test]
async fn test_repeated_assignment_updates_in_place() {
    let fx = Fixture::new();
    let request = assign(BCT, 5, Section::AB, 0, 1, lecture(1, 1, ROOM_101));

    let first = fx.engine.assign_slot(request.clone()).await.unwrap();
    let second = fx.engine.assign_slot(request).await.unwrap();

    assert!(!second.created);
    assert_eq!(first.record.id, second.record.id);
    assert_eq!(fx.repo.slot_count(), 1);
}

#[tokio::test]
async fn test_update_notifies_old_and_new_teachers() {
    let fx = Fixture::new();
    fx.engine
        .assign_slot(assign(BCT, 5, Section::AB, 0, 1, lecture(1, 1, ROOM_101)))
        .await
        .unwrap();
    fx.engine
        .assign_slot(assign(BCT, 5, Section::AB, 0, 1, lecture(1, 2, ROOM_101)))
        .await
        .unwrap();

    let events = fx.delivered().await;
    assert_eq!(events[1].reason, ChangeReason::Updated);
    assert_eq!(events[1].teacher_ids, vec![teacher(1), teacher(2)]);
}

#[tokio::test]
async fn test_teacher_conflict_within_parity_group() {
    let fx = Fixture::new();
    fx.engine
        .assign_slot(assign(BCT, 3, Section::AB, 1, 2, lecture(1, 1, ROOM_101)))
        .await
        .unwrap();

    // Semester 5 is odd too: same teacher at the same time is refused.
    let err = fx
        .engine
        .assign_slot(assign(BEX, 5, Section::CD, 1, 2, lecture(3, 1, ROOM_102)))
        .await
        .unwrap_err();

    let report = err.conflict_report().expect("conflict report");
    assert_eq!(report.conflicts.len(), 1);
    match &report.conflicts[0] {
        Conflict::Teacher {
            teacher_id,
            teacher_name,
            ..
        } => {
            assert_eq!(*teacher_id, teacher(1));
            assert_eq!(teacher_name.as_deref(), Some("Anil Shrestha"));
        }
        other => panic!("unexpected conflict: {other}"),
    }
    assert_eq!(fx.repo.slot_count(), 1);
}

#[tokio::test]
async fn test_other_parity_group_does_not_conflict() {
    let fx = Fixture::new();
    fx.engine
        .assign_slot(assign(BCT, 3, Section::AB, 1, 2, lecture(1, 1, ROOM_101)))
        .await
        .unwrap();
    fx.engine
        .assign_slot(assign(BCT, 4, Section::AB, 1, 2, lecture(3, 1, ROOM_101)))
        .await
        .unwrap();

    assert_eq!(fx.repo.slot_count(), 2);
}

#[tokio::test]
async fn test_room_conflict() {
    let fx = Fixture::new();
    fx.engine
        .assign_slot(assign(BCT, 7, Section::AB, 2, 3, lecture(4, 1, ROOM_101)))
        .await
        .unwrap();
    let err = fx
        .engine
        .assign_slot(assign(BCT, 7, Section::CD, 2, 3, lecture(5, 2, ROOM_101)))
        .await
        .unwrap_err();

    let report = err.conflict_report().unwrap();
    assert!(matches!(
        &report.conflicts[0],
        Conflict::Room { room_name: Some(name), .. } if name == "Room 101"
    ));
}

#[tokio::test]
async fn test_lab_groups_block_whole_slot_class() {
    let fx = Fixture::new();
    for (group, teacher_id, room) in [(LabGroup::A, 1, LAB_1), (LabGroup::B, 2, LAB_2)] {
        fx.engine
            .assign_slot(assign(
                BCT,
                5,
                Section::AB,
                0,
                2,
                practical(2, teacher_id, room, group),
            ))
            .await
            .unwrap();
    }

    let err = fx
        .engine
        .assign_slot(assign(BCT, 5, Section::AB, 0, 2, lecture(1, 3, ROOM_101)))
        .await
        .unwrap_err();
    let report = err.conflict_report().unwrap();
    assert_eq!(report.conflicts.len(), 2);
    assert!(report
        .conflicts
        .iter()
        .all(|c| matches!(c, Conflict::Section { .. })));
    assert_eq!(fx.repo.slot_count(), 2);
}

#[tokio::test]
async fn test_lab_group_replaces_lone_lecture_in_place() {
    let fx = Fixture::new();
    let first = fx
        .engine
        .assign_slot(assign(BCT, 3, Section::AB, 1, 2, lecture(1, 1, ROOM_101)))
        .await
        .unwrap();

    let outcome = fx
        .engine
        .assign_slot(assign(
            BCT,
            3,
            Section::AB,
            1,
            2,
            practical(2, 1, LAB_1, LabGroup::A),
        ))
        .await
        .unwrap();

    assert!(!outcome.created);
    assert_eq!(outcome.record.id, first.record.id);
    assert_eq!(outcome.record.class_kind, ClassKind::Practical);
    assert_eq!(outcome.record.lab_group, Some(LabGroup::A));
    assert_eq!(fx.repo.slot_count(), 1);

    // And back again: a lone lab group is replaced by a whole-slot class.
    let back = fx
        .engine
        .assign_slot(assign(BCT, 3, Section::AB, 1, 2, lecture(1, 2, ROOM_101)))
        .await
        .unwrap();
    assert!(!back.created);
    assert_eq!(back.record.id, first.record.id);
    assert_eq!(fx.repo.slot_count(), 1);
}

#[tokio::test]
async fn test_sibling_lab_groups_never_conflict() {
    let fx = Fixture::new();
    fx.engine
        .assign_slot(assign(
            BCT,
            5,
            Section::AB,
            0,
            2,
            practical(2, 1, LAB_1, LabGroup::A),
        ))
        .await
        .unwrap();

    // Same teacher and room for the other half of the section.
    let outcome = fx
        .engine
        .assign_slot(assign(
            BCT,
            5,
            Section::AB,
            0,
            2,
            practical(2, 1, LAB_1, LabGroup::B),
        ))
        .await
        .unwrap();

    assert!(outcome.created);
    assert_eq!(fx.repo.slot_count(), 2);
}

#[tokio::test]
async fn test_break_class_carries_no_resources() {
    let fx = Fixture::new();
    let outcome = fx
        .engine
        .assign_slot(assign(
            BCT,
            5,
            Section::AB,
            0,
            BREAK_SLOT,
            ClassDetails {
                class_kind: ClassKind::Break,
                ..lecture(1, 1, ROOM_101)
            },
        ))
        .await
        .unwrap();

    assert!(outcome.record.teachers.is_empty());
    assert!(outcome.record.room.is_none());
    // Nobody to notify.
    assert!(fx.delivered().await.is_empty());
}

#[tokio::test]
async fn test_lecture_in_break_period_is_rejected() {
    let fx = Fixture::new();
    let err = fx
        .engine
        .assign_slot(assign(
            BCT,
            5,
            Section::AB,
            0,
            BREAK_SLOT,
            lecture(1, 1, ROOM_101),
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, SchedulingError::Validation { .. }));
}

#[tokio::test]
async fn test_validation_reports_every_field() {
    let fx = Fixture::new();
    let mut class = lecture(1, 1, ROOM_101);
    class.subject = None;
    let err = fx
        .engine
        .assign_slot(assign(BCT, 9, Section::AB, 7, 1, class))
        .await
        .unwrap_err();

    match err {
        SchedulingError::Validation { errors } => {
            let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
            assert_eq!(fields, vec!["semester", "day", "subject"]);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_unknown_and_inactive_teacher() {
    let fx = Fixture::new();
    let err = fx
        .engine
        .assign_slot(assign(BCT, 5, Section::AB, 0, 1, lecture(1, 99, ROOM_101)))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        SchedulingError::ReferenceNotFound {
            entity: "teacher",
            ..
        }
    ));

    fx.reference.set_teacher_active(teacher(2), false);
    let err = fx
        .engine
        .assign_slot(assign(BCT, 5, Section::AB, 0, 1, lecture(1, 2, ROOM_101)))
        .await
        .unwrap_err();
    assert!(matches!(err, SchedulingError::ReferenceNotFound { .. }));
    assert_eq!(fx.repo.slot_count(), 0);
}

#[tokio::test]
async fn test_advisories_block_only_in_strict_mode() {
    let fx = Fixture::new();
    let class = practical(2, 1, ROOM_101, LabGroup::A);

    let mut request = assign(BCT, 5, Section::AB, 3, 1, class);
    request.strict = true;
    let err = fx.engine.assign_slot(request.clone()).await.unwrap_err();
    let report = err.conflict_report().unwrap();
    assert!(report.conflicts.is_empty());
    assert!(matches!(report.advisories[0], Advisory::NonLabRoom { .. }));
    assert_eq!(fx.repo.slot_count(), 0);

    request.strict = false;
    let outcome = fx.engine.assign_slot(request).await.unwrap();
    assert_eq!(outcome.advisories.len(), 1);
}

#[tokio::test]
async fn test_span_member_is_not_overwritten_by_single_assignment() {
    let fx = Fixture::new();
    fx.engine
        .assign_spanned(span(
            BCT,
            5,
            Section::AB,
            0,
            &[1, 2],
            lecture(1, 1, ROOM_101),
        ))
        .await
        .unwrap();

    let err = fx
        .engine
        .assign_slot(assign(BCT, 5, Section::AB, 0, 2, lecture(3, 2, ROOM_102)))
        .await
        .unwrap_err();
    assert!(matches!(
        err.conflict_report().unwrap().conflicts[0],
        Conflict::Section { .. }
    ));
    assert_eq!(fx.repo.slot_count(), 2);
}
