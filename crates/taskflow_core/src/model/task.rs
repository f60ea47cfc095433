//! Task domain model.
//!
//! # Responsibility
//! - Define the canonical task record kept in the store.
//! - Validate records on construction and on deserialization.
//!
//! # Invariants
//! - `id` is stable and never reused for another task.
//! - `description` is trimmed and never empty.
//! - `priority`, when set, is a finite number (1 is the highest priority).
//! - `reason` is only meaningful alongside `priority`.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier for every task.
pub type TaskId = Uuid;

/// Validation failures for task records.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskValidationError {
    /// Description is empty after trimming.
    EmptyDescription,
    /// Nil UUID cannot identify a task.
    NilId,
    /// Priority is NaN or infinite.
    NonFinitePriority(f64),
}

impl Display for TaskValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyDescription => write!(f, "task description cannot be empty"),
            Self::NilId => write!(f, "task id cannot be the nil uuid"),
            Self::NonFinitePriority(value) => {
                write!(f, "task priority must be a finite number, got {value}")
            }
        }
    }
}

impl Error for TaskValidationError {}

/// Canonical to-do record.
///
/// Serialized with camelCase keys (`isCompleted`) so the persisted list keeps
/// the same shape the prioritization call sends over the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "TaskRecord")]
pub struct Task {
    pub id: TaskId,
    pub description: String,
    pub is_completed: bool,
    /// Assigned by prioritization only; lower sorts first.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<f64>,
    /// Model-provided justification for `priority`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Free-form deadline text as the user typed it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deadline: Option<String>,
}

/// Unvalidated serde mirror of `Task`.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TaskRecord {
    id: TaskId,
    description: String,
    #[serde(default)]
    is_completed: bool,
    #[serde(default)]
    priority: Option<f64>,
    #[serde(default)]
    reason: Option<String>,
    #[serde(default)]
    deadline: Option<String>,
}

impl TryFrom<TaskRecord> for Task {
    type Error = TaskValidationError;

    fn try_from(value: TaskRecord) -> Result<Self, Self::Error> {
        let task = Self {
            id: value.id,
            description: value.description,
            is_completed: value.is_completed,
            priority: value.priority,
            reason: value.reason,
            deadline: value.deadline,
        };
        task.validate()?;
        Ok(task)
    }
}

impl Task {
    /// Creates a new incomplete task with a generated stable ID.
    ///
    /// # Errors
    /// - `EmptyDescription` when `description` is blank after trimming.
    pub fn new(description: impl AsRef<str>) -> Result<Self, TaskValidationError> {
        Self::with_id(Uuid::new_v4(), description)
    }

    /// Creates a new incomplete task with a caller-provided ID.
    ///
    /// Used by import paths and tests where identity already exists.
    pub fn with_id(id: TaskId, description: impl AsRef<str>) -> Result<Self, TaskValidationError> {
        let task = Self {
            id,
            description: normalize_description(description.as_ref())?,
            is_completed: false,
            priority: None,
            reason: None,
            deadline: None,
        };
        task.validate()?;
        Ok(task)
    }

    /// Checks record-level invariants.
    pub fn validate(&self) -> Result<(), TaskValidationError> {
        if self.id.is_nil() {
            return Err(TaskValidationError::NilId);
        }
        if self.description.trim().is_empty() {
            return Err(TaskValidationError::EmptyDescription);
        }
        if let Some(priority) = self.priority {
            if !priority.is_finite() {
                return Err(TaskValidationError::NonFinitePriority(priority));
            }
        }
        Ok(())
    }

    /// Sets the deadline, treating blank text as "no deadline".
    pub fn set_deadline(&mut self, deadline: Option<&str>) {
        self.deadline = normalize_deadline(deadline);
    }

    /// Drops any previously assigned priority and its reason.
    pub fn clear_priority(&mut self) {
        self.priority = None;
        self.reason = None;
    }

    /// Returns whether prioritization has assigned a rank to this task.
    pub fn is_prioritized(&self) -> bool {
        self.priority.is_some()
    }
}

/// Trims user input and rejects blank descriptions.
pub fn normalize_description(value: &str) -> Result<String, TaskValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(TaskValidationError::EmptyDescription);
    }
    Ok(trimmed.to_string())
}

/// Trims deadline text; blank input means no deadline.
pub fn normalize_deadline(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}
