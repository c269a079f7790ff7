//! Domain model for the timetable engine.
//!
//! - [`calendar`]: semesters, days, slot indices, sections and lab groups
//! - [`slot`]: the `ScheduledSlot` record and its structured payloads
//! - [`reference`]: read-only reference entities (programs, teachers, rooms, ...)

pub mod calendar;
pub mod macros;
pub mod reference;
pub mod slot;

pub use calendar::*;
pub use reference::*;
pub use slot::*;
