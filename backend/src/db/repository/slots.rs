//! Record-level storage operations for scheduled slots.

use async_trait::async_trait;

use super::error::RepositoryResult;
use crate::models::{NewScheduledSlot, ScheduledSlot, SlotId};

/// Repository trait for scheduled-slot writes and point reads.
///
/// Every write enforces the storage uniqueness constraint: at most one active
/// record per (program, semester, section, day, slot, occupancy partition).
/// A violation is reported as [`RepositoryError::ConstraintViolation`](super::RepositoryError).
///
/// # Thread Safety
/// Implementations must be `Send + Sync` to work with async Rust.
#[async_trait]
pub trait SlotRepository: Send + Sync {
    // ==================== Health & Connection ====================

    /// Check if the storage backend is healthy.
    async fn health_check(&self) -> RepositoryResult<bool>;

    // ==================== Single Records ====================

    /// Fetch one record by surrogate id.
    ///
    /// # Returns
    /// * `Err(RepositoryError::NotFound)` - If no such record exists
    async fn get_slot(&self, id: SlotId) -> RepositoryResult<ScheduledSlot>;

    /// Insert one record and return it with its assigned id.
    async fn insert_slot(&self, slot: &NewScheduledSlot) -> RepositoryResult<ScheduledSlot>;

    /// Overwrite the assignable fields of an existing record in place.
    async fn update_slot(
        &self,
        id: SlotId,
        slot: &NewScheduledSlot,
    ) -> RepositoryResult<ScheduledSlot>;

    /// Hard-delete records. Unknown ids are ignored.
    ///
    /// # Returns
    /// The number of records actually removed.
    async fn delete_slots(&self, ids: &[SlotId]) -> RepositoryResult<usize>;

    // ==================== Batches ====================

    /// Whether [`insert_batch`](Self::insert_batch) and
    /// [`replace_batch`](Self::replace_batch) are all-or-nothing.
    fn supports_transactions(&self) -> bool;

    /// Insert every record or none of them.
    ///
    /// Backends without transactions return `TransactionError`; callers are
    /// expected to check [`supports_transactions`](Self::supports_transactions) first.
    async fn insert_batch(
        &self,
        slots: &[NewScheduledSlot],
    ) -> RepositoryResult<Vec<ScheduledSlot>>;

    /// Delete `remove` and insert `slots` as one atomic unit.
    async fn replace_batch(
        &self,
        remove: &[SlotId],
        slots: &[NewScheduledSlot],
    ) -> RepositoryResult<Vec<ScheduledSlot>>;
}
