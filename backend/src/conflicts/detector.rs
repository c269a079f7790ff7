use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;

use tracing::debug;

use super::rules::{self, Resource};
use super::Conflict;
use crate::db::repository::{FullRepository, RepositoryResult};
use crate::models::{DayIndex, NewScheduledSlot, ScheduledSlot, Semester, SlotId, SlotIndex};
use crate::reference::ReferenceDataProvider;

/// Storage-backed conflict detection.
///
/// Reads are not locked against concurrent writers. The storage uniqueness
/// constraint is the final arbiter for races between check and write.
#[derive(Clone)]
pub struct ConflictDetector {
    repo: Arc<dyn FullRepository>,
    reference: Arc<dyn ReferenceDataProvider>,
}

impl ConflictDetector {
    pub fn new(repo: Arc<dyn FullRepository>, reference: Arc<dyn ReferenceDataProvider>) -> Self {
        Self { repo, reference }
    }

    /// Conflicts of a single candidate, ignoring the records in `exclude`.
    pub async fn detect(
        &self,
        candidate: &NewScheduledSlot,
        exclude: &HashSet<SlotId>,
    ) -> RepositoryResult<Vec<Conflict>> {
        self.detect_all(std::slice::from_ref(candidate), exclude)
            .await
    }

    /// Conflicts of a set of candidates that will be written together.
    ///
    /// Candidates are only checked against stored records, not against each
    /// other: siblings of one span or elective fan-out legitimately share
    /// teachers and rooms. A conflict reached from several candidates is
    /// reported once.
    pub async fn detect_all(
        &self,
        candidates: &[NewScheduledSlot],
        exclude: &HashSet<SlotId>,
    ) -> RepositoryResult<Vec<Conflict>> {
        let mut by_time: HashMap<(DayIndex, SlotIndex), Vec<ScheduledSlot>> = HashMap::new();
        let mut seen = HashSet::new();
        let mut conflicts = Vec::new();

        for candidate in candidates {
            let time = (candidate.day, candidate.slot);
            if !by_time.contains_key(&time) {
                let records = self.repo.find_at_time(candidate.day, candidate.slot).await?;
                by_time.insert(time, records);
            }
            let existing = by_time.get(&time).map(Vec::as_slice).unwrap_or_default();

            for conflict in rules::detect(candidate, existing, exclude) {
                if seen.insert(dedup_key(&conflict)) {
                    conflicts.push(conflict);
                }
            }
        }

        debug!(
            candidates = candidates.len(),
            conflicts = conflicts.len(),
            "conflict check finished"
        );
        self.resolve_names(&mut conflicts).await;
        Ok(conflicts)
    }

    /// Whether `resource` is busy at (day, slot) for a class of `semester`,
    /// including spans whose period range covers `slot`.
    pub async fn resource_conflicts(
        &self,
        resource: Resource,
        day: DayIndex,
        slot: SlotIndex,
        semester: Semester,
    ) -> RepositoryResult<Vec<Conflict>> {
        let at_time = self.repo.find_at_time(day, slot).await?;

        let span_ids: BTreeSet<_> = self
            .repo
            .find_spans_on_day(day)
            .await?
            .into_iter()
            .filter_map(|r| r.span_id)
            .collect();
        let mut span_records = Vec::new();
        for span in span_ids {
            span_records.extend(self.repo.find_span(span).await?);
        }

        let mut conflicts =
            rules::resource_conflicts(resource, day, slot, semester, &at_time, &span_records);
        debug!(
            ?resource,
            day = day.value(),
            slot = slot.value(),
            semester = semester.value(),
            busy = !conflicts.is_empty(),
            "availability check"
        );
        self.resolve_names(&mut conflicts).await;
        Ok(conflicts)
    }

    /// Fill in teacher and room names from reference data.
    pub async fn resolve_names(&self, conflicts: &mut [Conflict]) {
        for conflict in conflicts.iter_mut() {
            match conflict {
                Conflict::Teacher {
                    teacher_id,
                    teacher_name,
                    ..
                } if teacher_name.is_none() => {
                    *teacher_name = self.reference.teacher(*teacher_id).await.map(|t| t.name);
                }
                Conflict::Room {
                    room_id, room_name, ..
                } if room_name.is_none() => {
                    *room_name = self.reference.room(*room_id).await.map(|r| r.name);
                }
                _ => {}
            }
        }
    }
}

fn dedup_key(conflict: &Conflict) -> (&'static str, i64, SlotId) {
    let resource = match conflict {
        Conflict::Teacher { teacher_id, .. } => teacher_id.value(),
        Conflict::Room { room_id, .. } => room_id.value(),
        Conflict::Section { .. } => 0,
    };
    (conflict.kind(), resource, conflict.existing().slot_id)
}
