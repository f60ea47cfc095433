//! `taskflow` command-line entry point.
//!
//! # Responsibility
//! - Resolve configuration and start file logging.
//! - Open the local task database and dispatch one command.

mod cli;
mod commands;

use anyhow::{Context, Result};
use clap::Parser;
use cli::Cli;
use log::info;
use taskflow_core::db::open_db;
use taskflow_core::{
    init_logging, AppConfig, ConfigOverrides, KvTaskRepository, SqliteKeyValueStore, TaskService,
};

fn main() {
    if let Err(err) = try_main() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

fn try_main() -> Result<()> {
    let cli = Cli::parse();

    let config = AppConfig::resolve(&ConfigOverrides {
        config_path: cli.config,
        data_dir: cli.data_dir,
        log_level: cli.log_level,
        user_habits: None,
    })?;

    // Logging is best-effort; a broken log dir must not block the list.
    if let Err(err) = init_logging(&config.log_level, &config.log_dir) {
        eprintln!("warning: logging disabled: {err}");
    }
    info!(
        "event=cli_start module=cli status=ok data_dir={}",
        config.data_dir.display()
    );

    let conn = open_db(config.db_path())
        .with_context(|| format!("failed to open {}", config.db_path().display()))?;
    let mut service = TaskService::open(KvTaskRepository::new(SqliteKeyValueStore::new(&conn)))?;

    let stdout = std::io::stdout();
    commands::run(cli.command, &mut service, &config, &mut stdout.lock())
}
