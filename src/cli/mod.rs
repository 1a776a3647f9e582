//! CLI argument definitions for the `tiller` binary.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Tiller coding agent
#[derive(Parser, Debug)]
#[command(name = "tiller", version, about = "Tiller: autonomous coding agent")]
pub struct Cli {
    /// Verbose logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run one agent turn in a project directory
    Run(RunArgs),
    /// List the built-in tools
    Tools,
}

/// Arguments for `tiller run`.
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Model to use (format: provider:model, e.g. ollama:llama3.1)
    #[arg(short, long, default_value = "ollama:llama3.1")]
    pub model: String,

    /// Project directory the agent works in
    #[arg(long)]
    pub cwd: Option<PathBuf>,

    /// Override the iteration budget for this turn
    #[arg(long)]
    pub max_iterations: Option<usize>,

    /// Temperature (0.0 - 2.0)
    #[arg(short, long)]
    pub temperature: Option<f64>,

    /// What the agent should do
    pub prompt: String,
}
