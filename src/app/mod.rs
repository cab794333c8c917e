mod attack;
mod report;

use std::path::Path;

use tracing::info;

use crate::config::write_default_config;
use crate::error::AppResult;

pub(crate) use attack::run_attack_command;
pub(crate) use report::run_report_command;

pub(crate) fn run_init_command(path: &Path) -> AppResult<()> {
    write_default_config(path)?;
    info!("Default configuration written to {}", path.display());
    Ok(())
}
