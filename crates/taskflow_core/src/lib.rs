//! Core domain logic for TaskFlow, a local to-do list with AI-assisted
//! prioritization.
//! This crate is the single source of truth for task invariants.

pub mod ai;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod view;

pub use ai::gemini::{GeminiConfig, GeminiPrioritizer};
pub use ai::prioritize::{
    PrioritizeError, PrioritizeRequest, PrioritizeTaskInput, TaskPriority, TaskPrioritizer,
    DEFAULT_USER_HABITS,
};
pub use config::{AppConfig, ConfigError, ConfigOverrides};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::task::{Task, TaskId, TaskValidationError};
pub use repo::kv_store::{KeyValueStore, SqliteKeyValueStore, StoreError, StoreResult};
pub use repo::task_repo::{KvTaskRepository, TaskRepository, TASKS_KEY};
pub use service::task_service::{PrioritizeOutcome, TaskService, TaskServiceError};
