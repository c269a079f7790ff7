//! # Timetable Backend
//!
//! Weekly class-timetable scheduling engine for an academic department.
//!
//! Programs are split into semesters, semesters into sections (`AB`, `CD`)
//! and sections into lab groups. Classes are assigned to fixed daily time
//! slots; the engine validates each request, refuses double bookings of
//! teachers, rooms and section slots, writes multi-record units atomically
//! and tells downstream systems which teachers' schedules changed.
//!
//! ## Architecture
//!
//! - [`models`]: calendar value types, reference entities and the
//!   `ScheduledSlot` record
//! - [`reference`]: read-only lookup of programs, teachers, rooms, ...
//! - [`conflicts`]: conflict rules and the storage-backed detector
//! - [`db`]: repository traits, in-memory and PostgreSQL backends
//! - [`services`]: assignment, elective, clear and query orchestration
//! - [`notify`]: best-effort schedule-change notifications
//! - [`http`]: Axum-based REST API
//!
//! ## Semester parity
//!
//! Odd and even semesters run in different terms. Teacher and room
//! conflicts are only possible between semesters of the same parity; the
//! section dimension ignores parity.

// Allow large error types - RepositoryError contains rich context for debugging
#![allow(clippy::result_large_err)]

pub mod conflicts;
pub mod db;
pub mod models;
pub mod notify;
pub mod reference;
pub mod services;

#[cfg(feature = "http-server")]
pub mod http;

pub use services::{SchedulingEngine, SchedulingError, SchedulingResult};
