//! Data Transfer Objects for the HTTP API.
//!
//! Request bodies and outcomes are the service types themselves; this module
//! only adds the query strings and envelopes that exist for HTTP alone.

use serde::{Deserialize, Serialize};

use crate::models::AcademicYearId;
use crate::notify::DispatchStats;

pub use crate::services::{
    AssignLabGroupsRequest, AssignOutcome, AssignSlotRequest, AssignSpanRequest, Availability,
    ClearOutcome, ElectiveOutcome, ElectiveRequest, LabGroupsOutcome, RoutineEntry, SlotKeyQuery,
    SpanOutcome,
};

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    /// API version
    pub version: String,
    /// Storage connection status
    pub database: String,
    /// Notification delivery counters since start-up
    pub notifications: DispatchStats,
}

/// Query parameters of the availability endpoints.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AvailabilityQuery {
    pub day: u8,
    pub slot: u8,
    /// Semester of the class being planned; selects the parity group.
    pub semester: u8,
}

/// Optional academic-year filter of the routine endpoints.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct RoutineQuery {
    #[serde(default)]
    pub academic_year: Option<AcademicYearId>,
}

/// Routine listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutineResponse {
    pub entries: Vec<RoutineEntry>,
    pub total: usize,
}

impl From<Vec<RoutineEntry>> for RoutineResponse {
    fn from(entries: Vec<RoutineEntry>) -> Self {
        Self {
            total: entries.len(),
            entries,
        }
    }
}
