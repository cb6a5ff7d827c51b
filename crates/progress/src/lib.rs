//! Progression Tracking
//!
//! The ordered level set, its lock/unlock/complete state and the rule for
//! advancing unlock state on completion.

#![warn(missing_docs)]

pub mod catalog;
pub mod transition;
pub mod tracker;

pub use catalog::standard_levels;
pub use transition::apply_completion;
pub use tracker::{ProgressionTracker, ProgressSnapshot, ProgressError};
