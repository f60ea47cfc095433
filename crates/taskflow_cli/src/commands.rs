//! Command handlers.
//!
//! # Responsibility
//! - Translate parsed commands into `TaskService` calls.
//! - Render the two-section list view and user-facing messages.

use crate::cli::{AddArgs, Commands, DeadlineArgs, EditArgs, ListArgs, PrioritizeArgs, TaskRef};
use anyhow::{Context, Result};
use serde::Serialize;
use std::io::Write;
use taskflow_core::{
    AppConfig, GeminiPrioritizer, Task, TaskRepository, TaskService, TaskServiceError,
};

const SHORT_ID_LEN: usize = 8;

pub fn run<R: TaskRepository>(
    command: Commands,
    service: &mut TaskService<R>,
    config: &AppConfig,
    out: &mut impl Write,
) -> Result<()> {
    match command {
        Commands::Add(args) => add(service, args, out),
        Commands::Edit(args) => edit(service, args, out),
        Commands::Deadline(args) => deadline(service, args, out),
        Commands::Done(args) => toggle(service, args, out),
        Commands::Rm(args) => remove(service, args, out),
        Commands::List(args) => list(service, args, out),
        Commands::Prioritize(args) => prioritize(service, config, args, out),
        Commands::ClearCompleted => {
            let removed = service.clear_completed()?;
            writeln!(out, "Removed {removed} completed task(s).")?;
            Ok(())
        }
    }
}

fn add<R: TaskRepository>(
    service: &mut TaskService<R>,
    args: AddArgs,
    out: &mut impl Write,
) -> Result<()> {
    let task = service.add_task(&args.description.join(" "), args.deadline.as_deref())?;
    writeln!(out, "Task added successfully! [{}]", short_id(task))?;
    Ok(())
}

fn edit<R: TaskRepository>(
    service: &mut TaskService<R>,
    args: EditArgs,
    out: &mut impl Write,
) -> Result<()> {
    let id = service.find_task(&args.id)?.id;
    service.update_description(id, &args.description.join(" "))?;
    writeln!(out, "Task updated successfully!")?;
    Ok(())
}

fn deadline<R: TaskRepository>(
    service: &mut TaskService<R>,
    args: DeadlineArgs,
    out: &mut impl Write,
) -> Result<()> {
    let id = service.find_task(&args.id)?.id;
    let text = args.deadline.join(" ");
    let task = service.set_deadline(id, Some(text.as_str()))?;
    match task.deadline.as_deref() {
        Some(deadline) => writeln!(out, "Deadline set: {deadline}")?,
        None => writeln!(out, "Deadline cleared.")?,
    }
    Ok(())
}

fn toggle<R: TaskRepository>(
    service: &mut TaskService<R>,
    args: TaskRef,
    out: &mut impl Write,
) -> Result<()> {
    let id = service.find_task(&args.id)?.id;
    let task = service.toggle_complete(id)?;
    if task.is_completed {
        writeln!(out, "Marked as completed.")?;
    } else {
        writeln!(out, "Moved back to To-Do.")?;
    }
    Ok(())
}

fn remove<R: TaskRepository>(
    service: &mut TaskService<R>,
    args: TaskRef,
    out: &mut impl Write,
) -> Result<()> {
    let id = service.find_task(&args.id)?.id;
    service.delete_task(id)?;
    writeln!(out, "Task deleted.")?;
    Ok(())
}

#[derive(Serialize)]
struct ListJson<'a> {
    todo: Vec<&'a Task>,
    completed: Vec<&'a Task>,
}

fn list<R: TaskRepository>(
    service: &TaskService<R>,
    args: ListArgs,
    out: &mut impl Write,
) -> Result<()> {
    let todo = service.incomplete_by_priority();
    let completed = service.completed();

    if args.json {
        serde_json::to_writer_pretty(&mut *out, &ListJson { todo, completed })?;
        writeln!(out)?;
        return Ok(());
    }

    writeln!(out, "To-Do")?;
    if todo.is_empty() {
        writeln!(out, "  You're all caught up!")?;
    }
    for task in &todo {
        write_task(out, task)?;
    }

    if !completed.is_empty() {
        writeln!(out)?;
        writeln!(out, "Completed")?;
        for task in &completed {
            write_task(out, task)?;
        }
    }
    Ok(())
}

fn prioritize<R: TaskRepository>(
    service: &mut TaskService<R>,
    config: &AppConfig,
    args: PrioritizeArgs,
    out: &mut impl Write,
) -> Result<()> {
    let habits = args
        .habits
        .filter(|habits| !habits.trim().is_empty())
        .unwrap_or_else(|| config.user_habits.clone());

    if service.incomplete_by_priority().is_empty() {
        return nothing_to_prioritize(out);
    }

    let prioritizer = GeminiPrioritizer::new(&config.gemini)
        .context("AI Prioritization Failed: set GEMINI_API_KEY or [gemini] api_key in the config")?;

    match service.prioritize(&prioritizer, &habits) {
        Ok(outcome) => {
            writeln!(
                out,
                "Tasks prioritized by AI! {} task(s) ranked; your to-do list has been reordered.",
                outcome.prioritized
            )?;
            Ok(())
        }
        Err(TaskServiceError::NothingToPrioritize) => nothing_to_prioritize(out),
        Err(err) => Err(anyhow::Error::new(err)
            .context("AI Prioritization Failed: could not prioritize tasks, please try again later")),
    }
}

fn nothing_to_prioritize(out: &mut impl Write) -> Result<()> {
    writeln!(
        out,
        "No incomplete tasks to prioritize. Add some new tasks or mark some as incomplete."
    )?;
    Ok(())
}

fn write_task(out: &mut impl Write, task: &Task) -> Result<()> {
    let mark = if task.is_completed { "x" } else { " " };
    // Completed tasks keep their rank in storage but no longer show it.
    let ranked = !task.is_completed;
    let rank = task
        .priority
        .filter(|_| ranked)
        .map(|priority| format!(" #{priority}"))
        .unwrap_or_default();
    write!(out, "  [{mark}] {}{rank}  {}", short_id(task), task.description)?;
    if let Some(deadline) = task.deadline.as_deref() {
        write!(out, " (due: {deadline})")?;
    }
    writeln!(out)?;
    if let Some(reason) = task.reason.as_deref().filter(|_| ranked) {
        writeln!(out, "        {reason}")?;
    }
    Ok(())
}

fn short_id(task: &Task) -> String {
    task.id.to_string().chars().take(SHORT_ID_LEN).collect()
}
