//! Task editor and prioritization use-cases.
//!
//! # Responsibility
//! - Hold the ordered task list in memory.
//! - Mirror the full list to the repository after every change.
//! - Merge model-assigned priorities back into the list.
//!
//! # Invariants
//! - New tasks are prepended (newest first).
//! - A change is applied in memory only after it was persisted.
//! - Prioritization touches priority/reason only; a failed call changes nothing.

use crate::ai::prioritize::{
    PrioritizeError, PrioritizeRequest, PrioritizeTaskInput, TaskPriority, TaskPrioritizer,
};
use crate::model::task::{
    normalize_deadline, normalize_description, Task, TaskId, TaskValidationError,
};
use crate::repo::kv_store::StoreError;
use crate::repo::task_repo::TaskRepository;
use crate::view;
use log::{error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Service error for task use-cases.
#[derive(Debug)]
pub enum TaskServiceError {
    /// Description is blank after trimming.
    EmptyDescription,
    /// Other record-level validation failure.
    Validation(TaskValidationError),
    /// No task with this ID exists.
    TaskNotFound(TaskId),
    /// Completed tasks are read-only until toggled back to to-do.
    TaskCompleted(TaskId),
    /// Selector text matches no task.
    NoMatch(String),
    /// Selector text matches more than one task.
    AmbiguousSelector { selector: String, matches: usize },
    /// Prioritization requested while every task is completed.
    NothingToPrioritize,
    /// The prioritization collaborator failed.
    Prioritize(PrioritizeError),
    /// Persistence-layer failure.
    Store(StoreError),
}

impl Display for TaskServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyDescription => write!(f, "task description cannot be empty"),
            Self::Validation(err) => write!(f, "{err}"),
            Self::TaskNotFound(id) => write!(f, "task not found: {id}"),
            Self::TaskCompleted(id) => {
                write!(f, "task {id} is completed; mark it as to-do before editing")
            }
            Self::NoMatch(selector) => write!(f, "no task matches `{selector}`"),
            Self::AmbiguousSelector { selector, matches } => {
                write!(f, "`{selector}` matches {matches} tasks; use a longer id prefix")
            }
            Self::NothingToPrioritize => write!(f, "no incomplete tasks to prioritize"),
            Self::Prioritize(err) => write!(f, "{err}"),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for TaskServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Prioritize(err) => Some(err),
            Self::Store(err) => Some(err),
            _ => None,
        }
    }
}

impl From<TaskValidationError> for TaskServiceError {
    fn from(value: TaskValidationError) -> Self {
        match value {
            TaskValidationError::EmptyDescription => Self::EmptyDescription,
            other => Self::Validation(other),
        }
    }
}

impl From<StoreError> for TaskServiceError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

impl From<PrioritizeError> for TaskServiceError {
    fn from(value: PrioritizeError) -> Self {
        Self::Prioritize(value)
    }
}

pub type ServiceResult<T> = Result<T, TaskServiceError>;

/// Summary of one successful prioritization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrioritizeOutcome {
    /// Tasks that received a priority.
    pub prioritized: usize,
    /// Tasks whose previous priority was dropped.
    pub cleared: usize,
}

/// In-memory task list mirrored to a repository.
pub struct TaskService<R: TaskRepository> {
    repo: R,
    tasks: Vec<Task>,
}

impl<R: TaskRepository> TaskService<R> {
    /// Loads the persisted list.
    ///
    /// Corrupt persisted data is logged and replaced by an empty list; storage
    /// transport errors are returned.
    pub fn open(repo: R) -> ServiceResult<Self> {
        let tasks = match repo.load_tasks() {
            Ok(tasks) => tasks,
            Err(StoreError::InvalidData { key, message }) => {
                error!(
                    "event=tasks_load module=service status=error error_code=invalid_data key={} error={}",
                    key, message
                );
                Vec::new()
            }
            Err(err) => return Err(err.into()),
        };
        info!(
            "event=tasks_open module=service status=ok count={}",
            tasks.len()
        );
        Ok(Self { repo, tasks })
    }

    /// Current list in store order (newest first).
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get_task(&self, id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == id)
    }

    /// Resolves a task by full ID or unique ID prefix.
    pub fn find_task(&self, selector: &str) -> ServiceResult<&Task> {
        let needle = selector.trim().to_ascii_lowercase();
        if needle.is_empty() {
            return Err(TaskServiceError::NoMatch(selector.to_string()));
        }
        if let Ok(id) = Uuid::parse_str(&needle) {
            return self.get_task(id).ok_or(TaskServiceError::TaskNotFound(id));
        }

        let mut matches = self
            .tasks
            .iter()
            .filter(|task| task.id.to_string().starts_with(&needle));
        match (matches.next(), matches.count()) {
            (Some(task), 0) => Ok(task),
            (Some(_), rest) => Err(TaskServiceError::AmbiguousSelector {
                selector: selector.to_string(),
                matches: rest + 1,
            }),
            (None, _) => Err(TaskServiceError::NoMatch(selector.to_string())),
        }
    }

    /// Incomplete tasks sorted for display.
    pub fn incomplete_by_priority(&self) -> Vec<&Task> {
        view::incomplete_by_priority(&self.tasks)
    }

    /// Completed tasks in store order.
    pub fn completed(&self) -> Vec<&Task> {
        view::completed(&self.tasks)
    }

    /// Creates a new incomplete task at the front of the list.
    pub fn add_task(&mut self, description: &str, deadline: Option<&str>) -> ServiceResult<&Task> {
        let mut task = Task::new(description)?;
        task.set_deadline(deadline);
        let id = task.id;

        let mut next = Vec::with_capacity(self.tasks.len() + 1);
        next.push(task);
        next.extend(self.tasks.iter().cloned());
        self.commit(next)?;

        info!("event=task_add module=service status=ok task_id={id}");
        Ok(&self.tasks[0])
    }

    /// Replaces the description, keeping every other field.
    ///
    /// Completed tasks are rejected with `TaskCompleted`.
    pub fn update_description(&mut self, id: TaskId, description: &str) -> ServiceResult<&Task> {
        let description = normalize_description(description)?;
        if self.tasks[self.index_of(id)?].is_completed {
            return Err(TaskServiceError::TaskCompleted(id));
        }
        let index = self.modify(id, |task| task.description = description)?;
        info!("event=task_update module=service status=ok task_id={id}");
        Ok(&self.tasks[index])
    }

    /// Sets or clears (blank/`None`) the deadline text.
    pub fn set_deadline(&mut self, id: TaskId, deadline: Option<&str>) -> ServiceResult<&Task> {
        let deadline = normalize_deadline(deadline);
        let has_deadline = deadline.is_some();
        let index = self.modify(id, |task| task.deadline = deadline)?;
        info!(
            "event=task_deadline module=service status=ok task_id={id} has_deadline={has_deadline}"
        );
        Ok(&self.tasks[index])
    }

    /// Flips completion state; priority and reason are kept.
    pub fn toggle_complete(&mut self, id: TaskId) -> ServiceResult<&Task> {
        let index = self.modify(id, |task| task.is_completed = !task.is_completed)?;
        info!(
            "event=task_toggle module=service status=ok task_id={id} is_completed={}",
            self.tasks[index].is_completed
        );
        Ok(&self.tasks[index])
    }

    /// Removes a task and returns it.
    pub fn delete_task(&mut self, id: TaskId) -> ServiceResult<Task> {
        let index = self.index_of(id)?;
        let mut next = self.tasks.clone();
        let removed = next.remove(index);
        self.commit(next)?;
        info!("event=task_delete module=service status=ok task_id={id}");
        Ok(removed)
    }

    /// Removes every completed task and returns how many were removed.
    pub fn clear_completed(&mut self) -> ServiceResult<usize> {
        let next: Vec<Task> = self
            .tasks
            .iter()
            .filter(|task| !task.is_completed)
            .cloned()
            .collect();
        let removed = self.tasks.len() - next.len();
        if removed > 0 {
            self.commit(next)?;
        }
        info!("event=tasks_clear_completed module=service status=ok removed={removed}");
        Ok(removed)
    }

    /// Asks `prioritizer` to rank incomplete tasks and merges the result.
    ///
    /// # Contract
    /// - Fails with `NothingToPrioritize` without calling the collaborator
    ///   when every task is completed.
    /// - Sends incomplete tasks only, with `habits` as the user description.
    /// - On success every task is updated: matched IDs (first match wins) get
    ///   priority and reason, all others have both cleared.
    /// - On collaborator failure the list is left untouched.
    pub fn prioritize<P: TaskPrioritizer + ?Sized>(
        &mut self,
        prioritizer: &P,
        habits: &str,
    ) -> ServiceResult<PrioritizeOutcome> {
        let request = PrioritizeRequest {
            tasks: self
                .tasks
                .iter()
                .filter(|task| !task.is_completed)
                .map(PrioritizeTaskInput::from)
                .collect(),
            user_habits: habits.to_string(),
        };
        if request.tasks.is_empty() {
            info!("event=tasks_prioritize module=service status=skipped reason=no_incomplete_tasks");
            return Err(TaskServiceError::NothingToPrioritize);
        }

        let priorities = match prioritizer.prioritize(&request) {
            Ok(priorities) => priorities,
            Err(err) => {
                warn!("event=tasks_prioritize module=service status=error error={err}");
                return Err(err.into());
            }
        };

        let (next, outcome) = merge_priorities(&self.tasks, &priorities);
        self.commit(next)?;
        info!(
            "event=tasks_prioritize module=service status=ok requested={} returned={} prioritized={} cleared={}",
            request.tasks.len(),
            priorities.len(),
            outcome.prioritized,
            outcome.cleared
        );
        Ok(outcome)
    }

    fn index_of(&self, id: TaskId) -> ServiceResult<usize> {
        self.tasks
            .iter()
            .position(|task| task.id == id)
            .ok_or(TaskServiceError::TaskNotFound(id))
    }

    fn modify(&mut self, id: TaskId, change: impl FnOnce(&mut Task)) -> ServiceResult<usize> {
        let index = self.index_of(id)?;
        let mut next = self.tasks.clone();
        change(&mut next[index]);
        next[index].validate()?;
        self.commit(next)?;
        Ok(index)
    }

    fn commit(&mut self, next: Vec<Task>) -> ServiceResult<()> {
        self.repo.save_tasks(&next)?;
        self.tasks = next;
        Ok(())
    }
}

/// Applies returned priorities to a copy of `tasks`.
pub fn merge_priorities(tasks: &[Task], priorities: &[TaskPriority]) -> (Vec<Task>, PrioritizeOutcome) {
    let mut outcome = PrioritizeOutcome {
        prioritized: 0,
        cleared: 0,
    };
    let merged = tasks
        .iter()
        .map(|task| {
            let mut task = task.clone();
            let matched = priorities
                .iter()
                .find(|record| matches_task(record, task.id));
            match matched {
                Some(record) => {
                    task.priority = Some(record.priority);
                    task.reason = Some(record.reason.clone());
                    outcome.prioritized += 1;
                }
                None => {
                    if task.is_prioritized() || task.reason.is_some() {
                        outcome.cleared += 1;
                    }
                    task.clear_priority();
                }
            }
            task
        })
        .collect();
    (merged, outcome)
}

fn matches_task(record: &TaskPriority, id: TaskId) -> bool {
    Uuid::parse_str(record.id.trim()).is_ok_and(|parsed| parsed == id)
}
