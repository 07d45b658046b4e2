//! Persistence for students and attendance records.
//!
//! Stores report domain failures as [`StoreError`] variants so callers can
//! tell a field-level problem from a conflict or a missing record.

mod attendance;
mod error;
mod students;

pub use attendance::AttendanceStore;
pub use error::{StoreError, StoreResult};
pub use students::{StudentStore, UpdateOutcome};
