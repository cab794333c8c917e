use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::DEFAULT_CONFIG_PATH;

pub const DEFAULT_RESULTS_PATH: &str = "results.jsonl";

#[derive(Debug, Parser, Clone)]
#[command(
    name = "shard",
    version,
    about = "Fixed-rate HTTP load generator with per-phase request tracing."
)]
pub struct ShardArgs {
    #[command(subcommand)]
    pub command: Command,

    /// Enable debug logging (SHARD_LOG / RUST_LOG take precedence)
    #[arg(long = "verbose", short = 'v', global = true)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Write a default configuration file
    Init(InitArgs),
    /// Run a load test from a configuration file
    Attack(AttackArgs),
    /// Summarize a JSONL results file
    Report(ReportArgs),
}

#[derive(Debug, Args, Clone)]
pub struct InitArgs {
    /// Path of the configuration file to write (.json or .toml)
    #[arg(long = "cfg", default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,
}

#[derive(Debug, Args, Clone)]
pub struct AttackArgs {
    /// Path to the configuration file (.json or .toml)
    #[arg(long = "cfg", default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// Results file (overrides output.jsonl_path)
    #[arg(long = "out")]
    pub out: Option<PathBuf>,

    /// Progress log (overrides output.progress_path)
    #[arg(long = "progress")]
    pub progress: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct ReportArgs {
    /// JSONL results file to summarize
    #[arg(long = "in", default_value = DEFAULT_RESULTS_PATH)]
    pub input: PathBuf,
}
