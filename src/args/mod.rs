//! Command-line surface of the `shard` binary.
mod cli;


pub use cli::{AttackArgs, Command, DEFAULT_RESULTS_PATH, InitArgs, ReportArgs, ShardArgs};
