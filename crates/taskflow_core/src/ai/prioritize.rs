//! Prioritization contract shared by the task service and model backends.
//!
//! # Responsibility
//! - Define the request/response records exchanged with the language model.
//! - Render the fixed prompt template.
//! - Validate raw model output into typed priority records.
//!
//! # Invariants
//! - Output is accepted only as a whole: one malformed record fails the call.
//! - Requests only ever carry incomplete tasks.

use crate::model::task::Task;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter, Write as _};

/// Habits description sent when the caller does not supply one.
pub const DEFAULT_USER_HABITS: &str = "User is a busy professional who wants to optimize their workflow. They tend to complete urgent tasks first and sometimes procrastinates on less important ones.";

static CODE_FENCE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)^\s*```[A-Za-z0-9_-]*\s*\n?(.*?)\s*```\s*$").expect("valid fence regex")
});

/// One task as presented to the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrioritizeTaskInput {
    pub id: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_completed: Option<bool>,
}

impl From<&Task> for PrioritizeTaskInput {
    fn from(task: &Task) -> Self {
        Self {
            id: task.id.to_string(),
            description: task.description.clone(),
            deadline: task.deadline.clone(),
            is_completed: Some(task.is_completed),
        }
    }
}

/// Full input of one prioritization call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrioritizeRequest {
    pub tasks: Vec<PrioritizeTaskInput>,
    pub user_habits: String,
}

/// One model-assigned priority.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskPriority {
    pub id: String,
    /// 1 is the highest priority.
    pub priority: f64,
    pub reason: String,
}

/// Failure of a prioritization call.
#[derive(Debug)]
pub enum PrioritizeError {
    /// No API key configured for the hosted model.
    MissingApiKey,
    /// Transport-level failure (DNS, TLS, timeout, ...).
    Http(reqwest::Error),
    /// Service answered with a non-success status.
    Status { code: u16, message: String },
    /// Service answered without any candidate text.
    EmptyResponse,
    /// Output did not match the expected schema.
    InvalidResponse(String),
}

impl Display for PrioritizeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingApiKey => write!(f, "no API key configured for the prioritization model"),
            Self::Http(err) => write!(f, "prioritization request failed: {err}"),
            Self::Status { code, message } => {
                write!(f, "prioritization service returned status {code}: {message}")
            }
            Self::EmptyResponse => write!(f, "prioritization service returned no output"),
            Self::InvalidResponse(message) => {
                write!(f, "prioritization output is invalid: {message}")
            }
        }
    }
}

impl Error for PrioritizeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Http(err) => Some(err),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for PrioritizeError {
    fn from(value: reqwest::Error) -> Self {
        Self::Http(value)
    }
}

/// External collaborator that ranks tasks.
///
/// Implementations make exactly one attempt; retry policy is out of scope.
pub trait TaskPrioritizer {
    fn prioritize(&self, request: &PrioritizeRequest) -> Result<Vec<TaskPriority>, PrioritizeError>;
}

/// Renders the prompt text for one request.
pub fn render_prompt(request: &PrioritizeRequest) -> String {
    let mut prompt = String::from(
        "You are an AI task prioritization expert. Given a list of tasks and a description of the user's habits,\n\
         you will prioritize the tasks based on their deadlines and the user's habits.\n\n\
         Tasks:\n",
    );

    for task in &request.tasks {
        let _ = write!(
            prompt,
            "- ID: {}\n  Description: {}\n  Deadline: {}\n  Is Completed: {}\n",
            task.id,
            task.description,
            task.deadline.as_deref().unwrap_or_default(),
            task.is_completed
                .map(|done| done.to_string())
                .unwrap_or_default(),
        );
    }

    let _ = write!(
        prompt,
        "\nUser Habits: {}\n\n\
         Prioritize the tasks and provide a reason for each task's priority. \
         The tasks should be returned in an array with the task's ID, the priority, and a reason for the priority.\n\
         DO NOT INCLUDE ANY ADDITIONAL TEXT OR EXPLANATIONS OUTSIDE OF THE JSON OUTPUT.\n",
        request.user_habits
    );
    prompt
}

/// JSON schema (OpenAPI subset) describing the expected output array.
pub fn output_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "ARRAY",
        "items": {
            "type": "OBJECT",
            "properties": {
                "id": { "type": "STRING" },
                "priority": {
                    "type": "NUMBER",
                    "description": "The priority of the task, where 1 is the highest priority."
                },
                "reason": {
                    "type": "STRING",
                    "description": "The reason for the assigned priority."
                }
            },
            "required": ["id", "priority", "reason"]
        }
    })
}

/// Parses raw model text into validated priority records.
///
/// Accepts a bare JSON array, optionally wrapped in one markdown code fence.
pub fn parse_priorities(text: &str) -> Result<Vec<TaskPriority>, PrioritizeError> {
    let body = match CODE_FENCE_RE.captures(text) {
        Some(captures) => captures.get(1).map_or("", |m| m.as_str()),
        None => text.trim(),
    };
    if body.is_empty() {
        return Err(PrioritizeError::EmptyResponse);
    }

    let records: Vec<TaskPriority> = serde_json::from_str(body)
        .map_err(|err| PrioritizeError::InvalidResponse(err.to_string()))?;

    for record in &records {
        if record.id.trim().is_empty() {
            return Err(PrioritizeError::InvalidResponse(
                "record with empty id".to_string(),
            ));
        }
        if !record.priority.is_finite() {
            return Err(PrioritizeError::InvalidResponse(format!(
                "non-finite priority for id `{}`",
                record.id
            )));
        }
    }
    Ok(records)
}
