//! Domain model for the to-do list.
//!
//! # Responsibility
//! - Define canonical data structures used by core business logic.
//! - Own the JSON wire shape shared by storage and the prioritization call.
//!
//! # Invariants
//! - Every task is identified by a stable `TaskId`.
//! - A stored description is never blank.

pub mod task;
