use std::path::PathBuf;

use clap::Parser;

use crate::cmd::Commands;

/// Validate, edit and assemble task updates from the terminal.
/// Task records are read from JSON files shaped like the API's task detail.
#[derive(Parser)]
#[command(name = "taskform", version, about = "Task edit form validation CLI")]
pub struct Cli {
    /// Path to a TOML config file.
    #[arg(long, global = true, env = "TASKFORM_CONFIG")]
    pub config: Option<PathBuf>,

    /// Allow saving a task without an assignee (overrides the config file).
    #[arg(long, global = true)]
    pub assignee_nullable: bool,

    /// Log level used when RUST_LOG is not set.
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Commands,
}
