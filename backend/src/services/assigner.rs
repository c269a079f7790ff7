//! Single-slot assignment.

use std::collections::HashSet;
use tracing::{info, instrument, warn};

use super::error::{SchedulingError, SchedulingResult};
use super::requests::{AssignOutcome, AssignSlotRequest};
use super::validation::{PeriodShape, RawPosition};
use super::{ensure_no_conflicts, SchedulingContext};
use crate::conflicts::{rules, Conflict, ConflictReport};
use crate::models::ClassCategory;
use crate::notify::ChangeReason;

/// Upserts one record per (program, semester, section, day, slot) and
/// occupancy partition.
#[derive(Clone)]
pub struct Assigner {
    ctx: SchedulingContext,
}

impl Assigner {
    pub fn new(ctx: SchedulingContext) -> Self {
        Self { ctx }
    }

    /// Validate, check conflicts and write one record.
    ///
    /// An active record in the same partition of the key is updated in place
    /// and keeps its id, so repeating a request is idempotent. A single record
    /// in another partition is updated in place as well; when several lab
    /// groups hold the key the request is a section conflict. A record that
    /// belongs to a span or an elective is never overwritten here; the request
    /// is refused with a section conflict instead.
    #[instrument(skip_all, fields(program = %request.program, semester = request.semester, day = request.day, slot = request.slot))]
    pub async fn assign_slot(&self, request: AssignSlotRequest) -> SchedulingResult<AssignOutcome> {
        let strict = request.strict;
        let validated = self
            .ctx
            .validator()
            .validate(
                RawPosition {
                    program: request.program,
                    academic_year: request.academic_year,
                    semester: request.semester,
                    section: request.section,
                    day: request.day,
                    slots: &[request.slot],
                },
                request.class,
                PeriodShape::Single,
            )
            .await?;

        let Some(candidate) = validated
            .records_for(request.section, None, ClassCategory::Core, None)
            .into_iter()
            .next()
        else {
            return Err(SchedulingError::validation("slot", "a slot is required"));
        };

        let partition = candidate.occupancy().storage_key();
        let mut at_key = self.ctx.repo.find_at_key(&candidate.key()).await?;
        let same_partition = at_key
            .iter()
            .position(|existing| existing.occupancy().storage_key() == partition);
        // A lone record in another partition is replaced unless it is a sibling lab group.
        let target = match same_partition {
            Some(index) => Some(at_key.swap_remove(index)),
            None if at_key.len() == 1
                && rules::occupies_same_section_slot(&candidate, &at_key[0]) =>
            {
                at_key.pop()
            }
            None => None,
        };

        if let Some(existing) = target.as_ref().filter(|t| t.is_linked()) {
            warn!(slot_id = %existing.id, "key is held by a linked record");
            return Err(SchedulingError::Conflict(ConflictReport::new(
                vec![Conflict::Section {
                    section: existing.section,
                    existing: existing.summary(),
                }],
                validated.advisories,
            )));
        }

        let exclude: HashSet<_> = target.iter().map(|t| t.id).collect();
        let conflicts = self.ctx.detector().detect(&candidate, &exclude).await?;
        let advisories = validated.advisories.clone();
        ensure_no_conflicts(ConflictReport::new(conflicts, validated.advisories), strict)?;

        let (record, created, mut touched) = match target {
            Some(existing) => {
                let record = self.ctx.repo.update_slot(existing.id, &candidate).await?;
                (record, false, existing.teachers)
            }
            None => {
                let record = self.ctx.repo.insert_slot(&candidate).await?;
                (record, true, Vec::new())
            }
        };

        info!(slot_id = %record.id, created, "slot assigned");
        touched.extend(record.teachers.iter().copied());
        self.ctx.notify(
            touched,
            if created {
                ChangeReason::Assigned
            } else {
                ChangeReason::Updated
            },
        );

        Ok(AssignOutcome {
            record,
            created,
            advisories,
        })
    }
}
