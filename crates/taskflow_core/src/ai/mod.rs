//! AI-assisted prioritization.
//!
//! # Responsibility
//! - Define the collaborator contract (`TaskPrioritizer`) and its wire records.
//! - Provide the Gemini-backed implementation.

pub mod gemini;
pub mod prioritize;
