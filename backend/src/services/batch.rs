//! Multi-record writes.
//!
//! Repositories that support transactions get the whole batch as one atomic
//! `replace_batch`. Otherwise records are written one by one; when a write
//! fails, everything this batch wrote is deleted again and removed records
//! are restored, and the outcome is reported as a `PartialWrite`.

use std::sync::Arc;
use tracing::{error, warn};

use super::error::{SchedulingError, SchedulingResult};
use crate::db::repository::FullRepository;
use crate::models::{NewScheduledSlot, ScheduledSlot, SlotId};

#[derive(Clone)]
pub struct BatchWriter {
    repo: Arc<dyn FullRepository>,
}

impl BatchWriter {
    pub fn new(repo: Arc<dyn FullRepository>) -> Self {
        Self { repo }
    }

    /// Insert every record or none.
    pub async fn insert_all(
        &self,
        slots: &[NewScheduledSlot],
    ) -> SchedulingResult<Vec<ScheduledSlot>> {
        self.replace_all(&[], slots).await
    }

    /// Remove `remove` and insert `slots` as one unit.
    pub async fn replace_all(
        &self,
        remove: &[ScheduledSlot],
        slots: &[NewScheduledSlot],
    ) -> SchedulingResult<Vec<ScheduledSlot>> {
        if self.repo.supports_transactions() {
            let ids: Vec<SlotId> = remove.iter().map(|r| r.id).collect();
            return Ok(self.repo.replace_batch(&ids, slots).await?);
        }
        self.write_sequentially(remove, slots).await
    }

    async fn write_sequentially(
        &self,
        remove: &[ScheduledSlot],
        slots: &[NewScheduledSlot],
    ) -> SchedulingResult<Vec<ScheduledSlot>> {
        if !remove.is_empty() {
            let ids: Vec<SlotId> = remove.iter().map(|r| r.id).collect();
            self.repo.delete_slots(&ids).await?;
        }

        let mut written = Vec::with_capacity(slots.len());
        for slot in slots {
            match self.repo.insert_slot(slot).await {
                Ok(stored) => written.push(stored),
                Err(err) => {
                    if written.is_empty() && remove.is_empty() {
                        // Nothing was touched.
                        return Err(err.into());
                    }
                    warn!(
                        written = written.len(),
                        total = slots.len(),
                        error = %err,
                        "batch write failed, compensating"
                    );
                    let rolled_back = self.compensate(&written, remove).await;
                    return Err(SchedulingError::PartialWrite {
                        written: written.len(),
                        rolled_back,
                        message: err.to_string(),
                    });
                }
            }
        }
        Ok(written)
    }

    /// Undo a failed sequential batch. Returns whether every step succeeded.
    async fn compensate(&self, written: &[ScheduledSlot], removed: &[ScheduledSlot]) -> bool {
        let mut complete = true;

        let ids: Vec<SlotId> = written.iter().map(|r| r.id).collect();
        match self.repo.delete_slots(&ids).await {
            Ok(deleted) if deleted == ids.len() => {}
            Ok(deleted) => {
                error!(expected = ids.len(), deleted, "compensating delete incomplete");
                complete = false;
            }
            Err(e) => {
                error!(error = %e, "compensating delete failed");
                complete = false;
            }
        }

        for record in removed {
            if let Err(e) = self.repo.insert_slot(&record.to_new()).await {
                error!(slot_id = %record.id, error = %e, "failed to restore replaced record");
                complete = false;
            }
        }
        complete
    }
}
