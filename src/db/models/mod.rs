//! Database models split into domain-specific modules.

pub mod attendance;
pub mod student;

pub use attendance::*;
pub use student::*;
