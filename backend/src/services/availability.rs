//! Teacher and room availability.

use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::error::{SchedulingError, SchedulingResult};
use super::validation::{parse_day, parse_semester};
use super::SchedulingContext;
use crate::conflicts::rules::Resource;
use crate::conflicts::Conflict;
use crate::models::{RoomId, SlotIndex, TeacherId};

/// Answer to an availability query.
///
/// `conflicts` lists the records that keep the resource busy; it is empty
/// exactly when `is_available` is true.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Availability {
    pub is_available: bool,
    pub conflicts: Vec<Conflict>,
}

impl Availability {
    fn from_conflicts(conflicts: Vec<Conflict>) -> Self {
        Self {
            is_available: conflicts.is_empty(),
            conflicts,
        }
    }
}

#[derive(Clone)]
pub struct AvailabilityService {
    ctx: SchedulingContext,
}

impl AvailabilityService {
    pub fn new(ctx: SchedulingContext) -> Self {
        Self { ctx }
    }

    /// Whether a teacher is free at (day, slot) for a class of `semester`.
    ///
    /// Only records of the same parity group count. Spans covering the slot
    /// count even when the slot itself is not one of their stored periods.
    #[instrument(skip(self))]
    pub async fn check_teacher_availability(
        &self,
        teacher: TeacherId,
        day: u8,
        slot: u8,
        semester: u8,
    ) -> SchedulingResult<Availability> {
        if self.ctx.reference.teacher(teacher).await.is_none() {
            return Err(SchedulingError::reference("teacher", teacher));
        }
        self.check(Resource::Teacher(teacher), day, slot, semester)
            .await
    }

    /// Whether a room is free at (day, slot) for a class of `semester`.
    #[instrument(skip(self))]
    pub async fn check_room_availability(
        &self,
        room: RoomId,
        day: u8,
        slot: u8,
        semester: u8,
    ) -> SchedulingResult<Availability> {
        if self.ctx.reference.room(room).await.is_none() {
            return Err(SchedulingError::reference("room", room));
        }
        self.check(Resource::Room(room), day, slot, semester).await
    }

    async fn check(
        &self,
        resource: Resource,
        day: u8,
        slot: u8,
        semester: u8,
    ) -> SchedulingResult<Availability> {
        let mut errors = Vec::new();
        let semester = parse_semester(semester, &mut errors);
        let day = parse_day(day, &mut errors);
        let (Some(semester), Some(day)) = (semester, day) else {
            return Err(SchedulingError::Validation { errors });
        };

        let conflicts = self
            .ctx
            .detector()
            .resource_conflicts(resource, day, SlotIndex::new(slot), semester)
            .await?;
        Ok(Availability::from_conflicts(conflicts))
    }
}
