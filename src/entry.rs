use clap::Parser;

use crate::app::{run_attack_command, run_init_command, run_report_command};
use crate::args::{Command, ShardArgs};
use crate::error::AppResult;

/// Parses the command line, installs logging and runs the chosen command.
///
/// # Errors
///
/// Returns the first fatal error of the command.
pub fn run() -> AppResult<()> {
    let args = ShardArgs::parse();
    crate::logger::init_logging(args.verbose);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(run_command(args.command))
}

async fn run_command(command: Command) -> AppResult<()> {
    match command {
        Command::Init(init) => run_init_command(&init.config),
        Command::Attack(attack) => run_attack_command(&attack).await,
        Command::Report(report) => run_report_command(&report).await,
    }
}
