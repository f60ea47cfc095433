//! Command-line definition.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "taskflow", version, about = "Your to-do list, prioritized with AI")]
pub struct Cli {
    /// Path to a TOML config file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Directory holding the task database and logs
    #[arg(long, global = true, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Log level: trace|debug|info|warn|error
    #[arg(long, global = true, value_name = "LEVEL")]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Add a new task
    Add(AddArgs),
    /// Replace a task's description
    Edit(EditArgs),
    /// Set or clear a task's deadline
    Deadline(DeadlineArgs),
    /// Toggle a task between to-do and completed
    Done(TaskRef),
    /// Delete a task
    #[command(alias = "delete")]
    Rm(TaskRef),
    /// Show to-do tasks by priority, then completed tasks
    #[command(alias = "ls")]
    List(ListArgs),
    /// Ask the AI model to prioritize incomplete tasks
    Prioritize(PrioritizeArgs),
    /// Delete every completed task
    ClearCompleted,
}

#[derive(Debug, Args)]
pub struct AddArgs {
    /// Task description
    #[arg(required = true, num_args = 1..)]
    pub description: Vec<String>,

    /// Free-form deadline, e.g. "friday" or "2026-11-01"
    #[arg(long, short = 'd')]
    pub deadline: Option<String>,
}

#[derive(Debug, Args)]
pub struct EditArgs {
    /// Task id or unique id prefix
    pub id: String,

    /// New description
    #[arg(required = true, num_args = 1..)]
    pub description: Vec<String>,
}

#[derive(Debug, Args)]
pub struct DeadlineArgs {
    /// Task id or unique id prefix
    pub id: String,

    /// Deadline text; omit to clear
    pub deadline: Vec<String>,
}

#[derive(Debug, Args)]
pub struct TaskRef {
    /// Task id or unique id prefix
    pub id: String,
}

#[derive(Debug, Args)]
pub struct ListArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct PrioritizeArgs {
    /// Description of your work habits sent with the tasks
    #[arg(long)]
    pub habits: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::{Cli, Commands};
    use clap::{CommandFactory, Parser};

    #[test]
    fn definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn add_joins_words_and_reads_deadline() {
        let cli = Cli::parse_from(["taskflow", "add", "buy", "milk", "-d", "today"]);
        match cli.command {
            Commands::Add(args) => {
                assert_eq!(args.description.join(" "), "buy milk");
                assert_eq!(args.deadline.as_deref(), Some("today"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn global_flags_work_after_subcommand() {
        let cli = Cli::parse_from(["taskflow", "list", "--json", "--data-dir", "/tmp/tf"]);
        assert_eq!(cli.data_dir.as_deref(), Some(std::path::Path::new("/tmp/tf")));
        assert!(matches!(cli.command, Commands::List(ref args) if args.json));
    }
}
