mod support;

use support::*;
use timetable_backend::models::{AlternateGroupConfig, DayIndex, LabGroup, Section, SlotIndex};
use timetable_backend::notify::ChangeReason;
use timetable_backend::services::{ClearStatus, SlotKeyQuery};
use timetable_backend::SchedulingError;

#[tokio::test]
async fn test_section_routine_resolves_names() {
    let fx = Fixture::new();
    fx.engine
        .assign_slot(assign(BCT, 5, Section::AB, 1, 2, lecture(1, 1, ROOM_101)))
        .await
        .unwrap();
    fx.engine
        .assign_slot(assign(BCT, 5, Section::AB, 0, 3, lecture(3, 2, ROOM_102)))
        .await
        .unwrap();

    let entries = fx
        .engine
        .section_routine(BCT, 5, Section::AB, None)
        .await
        .unwrap();

    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].day, DayIndex::new(0).unwrap());
    assert_eq!(entries[1].day, DayIndex::new(1).unwrap());

    let entry = &entries[1];
    assert_eq!(entry.program_code.as_deref(), Some("BCT"));
    assert_eq!(entry.subject_code.as_deref(), Some("CT501"));
    assert_eq!(entry.display_name, "Computer Networks");
    assert_eq!(entry.teacher_names, vec!["Anil Shrestha".to_string()]);
    assert_eq!(entry.room_name.as_deref(), Some("Room 101"));
    assert_eq!(entry.slot_label.as_deref(), Some("Period 2"));
}

#[tokio::test]
async fn test_alternating_week_label() {
    let fx = Fixture::new();
    let mut class = practical(2, 1, LAB_1, LabGroup::A);
    class.is_alternating_week = true;
    class.alternate_group_config = Some(AlternateGroupConfig {
        paired_group: LabGroup::B,
        paired_subject: Some(subject(2)),
        paired_teachers: vec![teacher(2)],
        paired_room: Some(LAB_2),
    });
    fx.engine
        .assign_slot(assign(BCT, 5, Section::AB, 1, 5, class))
        .await
        .unwrap();

    let entries = fx
        .engine
        .section_routine(BCT, 5, Section::AB, Some(YEAR))
        .await
        .unwrap();
    assert_eq!(entries[0].display_name, "Networks Lab (Group A - Alt Week)");
}

#[tokio::test]
async fn test_teacher_schedule_spans_programs() {
    let fx = Fixture::new();
    fx.engine
        .assign_slot(assign(BCT, 5, Section::AB, 1, 2, lecture(1, 1, ROOM_101)))
        .await
        .unwrap();
    fx.engine
        .assign_slot(assign(BEX, 6, Section::CD, 0, 1, lecture(3, 1, ROOM_102)))
        .await
        .unwrap();
    fx.engine
        .assign_slot(assign(BEX, 6, Section::CD, 0, 2, lecture(3, 2, ROOM_102)))
        .await
        .unwrap();

    let entries = fx.engine.teacher_schedule(teacher(1)).await.unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].program_code.as_deref(), Some("BEX"));
    assert_eq!(entries[0].slot, SlotIndex::new(1));

    let err = fx.engine.teacher_schedule(teacher(42)).await.unwrap_err();
    assert!(matches!(err, SchedulingError::ReferenceNotFound { .. }));
}

#[tokio::test]
async fn test_clear_empty_slot_is_not_found() {
    let fx = Fixture::new();
    let outcome = fx
        .engine
        .clear_slot(SlotKeyQuery {
            program: BCT,
            semester: 5,
            section: Section::AB,
            day: 0,
            slot: 1,
        })
        .await
        .unwrap();
    assert_eq!(outcome.status, ClearStatus::NotFound);
    assert_eq!(outcome.deleted_count, 0);
}

#[tokio::test]
async fn test_assign_clear_twice_and_reassign() {
    let fx = Fixture::new();
    let request = assign(BCT, 5, Section::AB, 2, 3, lecture(1, 1, ROOM_101));
    let key = SlotKeyQuery {
        program: BCT,
        semester: 5,
        section: Section::AB,
        day: 2,
        slot: 3,
    };

    let first = fx.engine.assign_slot(request.clone()).await.unwrap();

    let cleared = fx.engine.clear_slot(key).await.unwrap();
    assert_eq!(cleared.status, ClearStatus::Cleared);
    assert_eq!(cleared.deleted_count, 1);

    let again = fx.engine.clear_slot(key).await.unwrap();
    assert_eq!(again.status, ClearStatus::NotFound);
    assert_eq!(again.deleted_count, 0);

    let second = fx.engine.assign_slot(request).await.unwrap();
    assert!(second.created);
    assert_eq!(first.record.to_new(), second.record.to_new());
    assert_eq!(fx.repo.slot_count(), 1);
}

#[tokio::test]
async fn test_clear_slot_removes_both_lab_groups() {
    let fx = Fixture::new();
    for (group, teacher_id, room) in [(LabGroup::A, 1, LAB_1), (LabGroup::B, 2, LAB_2)] {
        fx.engine
            .assign_slot(assign(
                BCT,
                5,
                Section::AB,
                0,
                1,
                practical(2, teacher_id, room, group),
            ))
            .await
            .unwrap();
    }

    let outcome = fx
        .engine
        .clear_slot(SlotKeyQuery {
            program: BCT,
            semester: 5,
            section: Section::AB,
            day: 0,
            slot: 1,
        })
        .await
        .unwrap();
    assert_eq!(outcome.deleted_count, 2);
    assert_eq!(outcome.cleared_teacher_ids, vec![teacher(1), teacher(2)]);
}

#[tokio::test]
async fn test_clear_section_notifies_affected_teachers() {
    let fx = Fixture::new();
    fx.engine
        .assign_slot(assign(BCT, 5, Section::AB, 0, 1, lecture(1, 1, ROOM_101)))
        .await
        .unwrap();
    fx.engine
        .assign_spanned(span(
            BCT,
            5,
            Section::AB,
            2,
            &[5, 6],
            lecture(3, 3, ROOM_102),
        ))
        .await
        .unwrap();
    fx.engine
        .assign_slot(assign(BCT, 5, Section::CD, 0, 1, lecture(1, 2, ROOM_102)))
        .await
        .unwrap();

    let outcome = fx
        .engine
        .clear_section(BCT, 5, Section::AB, None)
        .await
        .unwrap();
    assert_eq!(outcome.deleted_count, 3);
    assert_eq!(fx.repo.slot_count(), 1);

    let events = fx.delivered().await;
    let cleared = events.last().unwrap();
    assert_eq!(cleared.reason, ChangeReason::Cleared);
    assert_eq!(cleared.teacher_ids, vec![teacher(1), teacher(3)]);
}

#[tokio::test]
async fn test_notification_failure_does_not_fail_the_write() {
    let fx = Fixture::new();
    // More failures than the retry budget.
    fx.publisher.fail_next(10);

    let outcome = fx
        .engine
        .assign_slot(assign(BCT, 5, Section::AB, 0, 1, lecture(1, 1, ROOM_101)))
        .await;
    assert!(outcome.is_ok());

    assert!(fx.delivered().await.is_empty());
    assert_eq!(fx.publisher.attempts(), 3);
    assert_eq!(fx.notifier.stats().failed, 1);
}

#[tokio::test]
async fn test_notification_is_retried() {
    let fx = Fixture::new();
    fx.publisher.fail_next(2);

    fx.engine
        .assign_slot(assign(BCT, 5, Section::AB, 0, 1, lecture(1, 1, ROOM_101)))
        .await
        .unwrap();

    assert_eq!(fx.delivered().await.len(), 1);
    assert_eq!(fx.notifier.stats().retried, 2);
}
