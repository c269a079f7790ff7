//! In-memory local repository implementation.
//!
//! This module provides a local implementation of all repository traits
//! suitable for unit testing and local development. All data is stored in memory using HashMap
//! structures, providing fast, deterministic, and isolated execution.

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::db::repository::*;
use crate::models::{
    AcademicYearId, DayIndex, ElectiveGroupId, NewScheduledSlot, ProgramId, ScheduledSlot,
    Section, SectionSlotKey, Semester, SlotId, SlotIndex, SpanId, TeacherId,
};

/// In-memory local repository.
///
/// Stores records in a HashMap guarded by a single lock, so batch writes are
/// naturally atomic. A repository built with [`LocalRepository::non_transactional`]
/// reports `supports_transactions() == false`, which lets callers exercise the
/// compensating-delete path. [`LocalRepository::fail_inserts_after`] injects
/// write failures.
///
/// # Example
/// ```ignore
/// use timetable_backend::db::repositories::LocalRepository;
///
/// #[tokio::test]
/// async fn test_slot_storage() {
///     let repo = LocalRepository::new();
///     let stored = repo.insert_slot(&new_slot).await.unwrap();
///     assert_eq!(repo.slot_count(), 1);
/// }
/// ```
#[derive(Clone)]
pub struct LocalRepository {
    data: Arc<RwLock<LocalData>>,
    transactional: bool,
}

struct LocalData {
    slots: HashMap<SlotId, ScheduledSlot>,

    // ID counter
    next_slot_id: i64,

    // Connection health
    is_healthy: bool,

    // Remaining inserts before injected failures start
    inserts_before_failure: Option<usize>,
}

impl Default for LocalData {
    fn default() -> Self {
        Self {
            slots: HashMap::new(),
            next_slot_id: 1,
            is_healthy: true,
            inserts_before_failure: None,
        }
    }
}

impl LocalRepository {
    /// Create a new empty local repository with atomic batch support.
    pub fn new() -> Self {
        Self {
            data: Arc::new(RwLock::new(LocalData::default())),
            transactional: true,
        }
    }

    /// Create a repository that does not offer atomic batches.
    pub fn non_transactional() -> Self {
        Self {
            data: Arc::new(RwLock::new(LocalData::default())),
            transactional: false,
        }
    }

    /// Set the health status for testing connection failures.
    pub fn set_healthy(&self, healthy: bool) {
        self.data.write().is_healthy = healthy;
    }

    /// Let `count` more inserts succeed, then fail every following insert.
    pub fn fail_inserts_after(&self, count: usize) {
        self.data.write().inserts_before_failure = Some(count);
    }

    /// Stop injecting insert failures.
    pub fn clear_fault(&self) {
        self.data.write().inserts_before_failure = None;
    }

    /// Clear all data from the repository.
    pub fn clear(&self) {
        let mut data = self.data.write();
        *data = LocalData {
            is_healthy: data.is_healthy,
            ..Default::default()
        };
    }

    /// Get the number of records stored.
    pub fn slot_count(&self) -> usize {
        self.data.read().slots.len()
    }

    /// Snapshot of every stored record.
    pub fn all_slots(&self) -> Vec<ScheduledSlot> {
        let mut slots: Vec<ScheduledSlot> = self.data.read().slots.values().cloned().collect();
        slots.sort_by_key(|s| s.id);
        slots
    }

    /// Helper to check health and return error if unhealthy.
    fn check_health(data: &LocalData) -> RepositoryResult<()> {
        if !data.is_healthy {
            return Err(RepositoryError::connection("Database is not healthy"));
        }
        Ok(())
    }

    /// Consume one unit of the injected-failure budget.
    fn take_insert_permit(data: &mut LocalData) -> RepositoryResult<()> {
        match data.inserts_before_failure {
            Some(0) => Err(RepositoryError::query("Injected insert failure")
                .with_operation("insert_slot")),
            Some(ref mut remaining) => {
                *remaining -= 1;
                Ok(())
            }
            None => Ok(()),
        }
    }

    /// Enforce the storage uniqueness constraint against stored records.
    fn check_unique(
        data: &LocalData,
        slot: &NewScheduledSlot,
        ignore: &HashSet<SlotId>,
    ) -> RepositoryResult<()> {
        let key = slot.key();
        let partition = slot.occupancy().storage_key();
        let clash = data.slots.values().find(|existing| {
            existing.is_active
                && !ignore.contains(&existing.id)
                && existing.key() == key
                && existing.occupancy().storage_key() == partition
        });

        match clash {
            Some(existing) => Err(RepositoryError::constraint_with_context(
                format!("Duplicate active record for {} ({})", key, partition),
                ErrorContext::new("check_unique")
                    .with_entity("scheduled_slot")
                    .with_entity_id(existing.id),
            )),
            None => Ok(()),
        }
    }

    /// Reject batches that collide with themselves.
    fn check_batch_unique(slots: &[NewScheduledSlot]) -> RepositoryResult<()> {
        let mut seen = HashSet::new();
        for slot in slots {
            if !seen.insert((slot.key(), slot.occupancy().storage_key())) {
                return Err(RepositoryError::constraint(format!(
                    "Batch contains duplicate entries for {}",
                    slot.key()
                )));
            }
        }
        Ok(())
    }

    fn insert_locked(data: &mut LocalData, slot: &NewScheduledSlot) -> ScheduledSlot {
        let id = SlotId::new(data.next_slot_id);
        data.next_slot_id += 1;
        let stored = ScheduledSlot::from_new(id, slot.clone(), Utc::now());
        data.slots.insert(id, stored.clone());
        stored
    }

    fn collect_sorted<F>(&self, filter: F) -> RepositoryResult<Vec<ScheduledSlot>>
    where
        F: Fn(&ScheduledSlot) -> bool,
    {
        let data = self.data.read();
        Self::check_health(&data)?;
        let mut slots: Vec<ScheduledSlot> = data
            .slots
            .values()
            .filter(|s| s.is_active && filter(*s))
            .cloned()
            .collect();
        slots.sort_by_key(|s| (s.day, s.slot, s.section, s.id));
        Ok(slots)
    }
}

impl Default for LocalRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SlotRepository for LocalRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        Ok(self.data.read().is_healthy)
    }

    async fn get_slot(&self, id: SlotId) -> RepositoryResult<ScheduledSlot> {
        let data = self.data.read();
        Self::check_health(&data)?;
        data.slots.get(&id).cloned().ok_or_else(|| {
            RepositoryError::not_found_with_context(
                format!("Scheduled slot {} not found", id),
                ErrorContext::new("get_slot")
                    .with_entity("scheduled_slot")
                    .with_entity_id(id),
            )
        })
    }

    async fn insert_slot(&self, slot: &NewScheduledSlot) -> RepositoryResult<ScheduledSlot> {
        let mut data = self.data.write();
        Self::check_health(&data)?;
        Self::check_unique(&data, slot, &HashSet::new())?;
        Self::take_insert_permit(&mut data)?;
        Ok(Self::insert_locked(&mut data, slot))
    }

    async fn update_slot(
        &self,
        id: SlotId,
        slot: &NewScheduledSlot,
    ) -> RepositoryResult<ScheduledSlot> {
        let mut data = self.data.write();
        Self::check_health(&data)?;
        if !data.slots.contains_key(&id) {
            return Err(RepositoryError::not_found_with_context(
                format!("Scheduled slot {} not found", id),
                ErrorContext::new("update_slot").with_entity_id(id),
            ));
        }
        Self::check_unique(&data, slot, &HashSet::from([id]))?;

        let now = Utc::now();
        let stored = data
            .slots
            .get_mut(&id)
            .ok_or_else(|| RepositoryError::internal("Record vanished during update"))?;
        stored.apply(slot.clone(), now);
        Ok(stored.clone())
    }

    async fn delete_slots(&self, ids: &[SlotId]) -> RepositoryResult<usize> {
        let mut data = self.data.write();
        Self::check_health(&data)?;
        Ok(ids
            .iter()
            .filter(|id| data.slots.remove(*id).is_some())
            .count())
    }

    fn supports_transactions(&self) -> bool {
        self.transactional
    }

    async fn insert_batch(
        &self,
        slots: &[NewScheduledSlot],
    ) -> RepositoryResult<Vec<ScheduledSlot>> {
        self.replace_batch(&[], slots).await
    }

    async fn replace_batch(
        &self,
        remove: &[SlotId],
        slots: &[NewScheduledSlot],
    ) -> RepositoryResult<Vec<ScheduledSlot>> {
        if !self.transactional {
            return Err(RepositoryError::transaction(
                "Local repository was built without batch transactions",
            ));
        }

        let mut data = self.data.write();
        Self::check_health(&data)?;

        // Validate everything before touching the map
        let ignore: HashSet<SlotId> = remove.iter().copied().collect();
        Self::check_batch_unique(slots)?;
        for slot in slots {
            Self::check_unique(&data, slot, &ignore)?;
        }
        if let Some(remaining) = data.inserts_before_failure {
            if remaining < slots.len() {
                return Err(RepositoryError::transaction(
                    "Injected insert failure; batch rolled back",
                ));
            }
            data.inserts_before_failure = Some(remaining - slots.len());
        }

        for id in remove {
            data.slots.remove(id);
        }
        Ok(slots
            .iter()
            .map(|slot| Self::insert_locked(&mut data, slot))
            .collect())
    }
}

#[async_trait]
impl OccupancyRepository for LocalRepository {
    async fn find_at_key(&self, key: &SectionSlotKey) -> RepositoryResult<Vec<ScheduledSlot>> {
        let key = *key;
        self.collect_sorted(|s| s.key() == key)
    }

    async fn find_at_time(
        &self,
        day: DayIndex,
        slot: SlotIndex,
    ) -> RepositoryResult<Vec<ScheduledSlot>> {
        self.collect_sorted(|s| s.day == day && s.slot == slot)
    }

    async fn find_span(&self, span_id: SpanId) -> RepositoryResult<Vec<ScheduledSlot>> {
        self.collect_sorted(|s| s.span_id == Some(span_id))
    }

    async fn find_spans_on_day(&self, day: DayIndex) -> RepositoryResult<Vec<ScheduledSlot>> {
        self.collect_sorted(|s| s.day == day && s.span_id.is_some())
    }

    async fn find_elective_group(
        &self,
        group_id: ElectiveGroupId,
    ) -> RepositoryResult<Vec<ScheduledSlot>> {
        self.collect_sorted(|s| s.elective_group() == Some(group_id))
    }

    async fn list_section(
        &self,
        program: ProgramId,
        semester: Semester,
        section: Section,
        academic_year: Option<AcademicYearId>,
    ) -> RepositoryResult<Vec<ScheduledSlot>> {
        self.collect_sorted(|s| {
            s.program == program
                && s.semester == semester
                && s.section == section
                && academic_year.map_or(true, |year| s.academic_year == year)
        })
    }

    async fn list_for_teacher(&self, teacher: TeacherId) -> RepositoryResult<Vec<ScheduledSlot>> {
        self.collect_sorted(|s| s.teachers.contains(&teacher))
    }
}
