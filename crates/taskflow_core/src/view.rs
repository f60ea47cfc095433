//! Display partitions of the task list.
//!
//! # Invariants
//! - Incomplete tasks sort by ascending priority; unprioritized tasks last.
//! - Ties keep store order.

use crate::model::task::Task;
use std::cmp::Ordering;

/// Incomplete tasks, highest priority (lowest number) first.
pub fn incomplete_by_priority(tasks: &[Task]) -> Vec<&Task> {
    let mut incomplete: Vec<&Task> = tasks.iter().filter(|task| !task.is_completed).collect();
    incomplete.sort_by(|a, b| compare_priority(a.priority, b.priority));
    incomplete
}

/// Completed tasks in store order.
pub fn completed(tasks: &[Task]) -> Vec<&Task> {
    tasks.iter().filter(|task| task.is_completed).collect()
}

fn compare_priority(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.total_cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
