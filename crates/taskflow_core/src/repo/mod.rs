//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the local key-value storage contract.
//! - Persist the ordered task list as one JSON document under a fixed key.
//!
//! # Invariants
//! - Task writes replace the whole list; there are no partial updates.
//! - Read paths reject invalid persisted state instead of masking it; the
//!   service layer decides how to recover.

pub mod kv_store;
pub mod task_repo;
