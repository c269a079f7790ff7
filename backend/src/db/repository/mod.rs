//! Repository trait definitions for scheduled-slot storage.
//!
//! Storage is split across two focused traits:
//!
//! - [`SlotRepository`]: record-level reads and writes, including atomic batches
//! - [`OccupancyRepository`]: lookups used by conflict detection and read views
//!
//! # Convenience Trait Bound
//!
//! For functions that need all repository capabilities, use the [`FullRepository`] trait bound:
//!
//! ```ignore
//! async fn my_service<R: FullRepository + ?Sized>(repo: &R) -> RepositoryResult<()> {
//!     let existing = repo.find_at_key(&key).await?;
//!     repo.insert_slot(&new_slot).await?;
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod occupancy;
pub mod slots;

// Re-export error types
pub use error::{ErrorContext, RepositoryError, RepositoryResult};

// Re-export all traits
pub use occupancy::OccupancyRepository;
pub use slots::SlotRepository;

/// Composite trait bound for a complete repository implementation.
///
/// This trait is automatically implemented for any type that implements
/// both repository traits.
pub trait FullRepository: SlotRepository + OccupancyRepository {}

// Blanket implementation: any type implementing both traits automatically implements FullRepository
impl<T> FullRepository for T where T: SlotRepository + OccupancyRepository {}
