//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository and prioritizer calls into use-case level APIs.
//! - Keep CLI callers decoupled from storage details.

pub mod task_service;
