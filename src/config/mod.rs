//! Configuration loading, defaults, and validation into an immutable [`RunConfig`].
mod loader;
mod parse;
pub mod types;
mod validate;

#[cfg(test)]
mod tests;

pub use loader::{DEFAULT_CONFIG_PATH, load_config_file, write_default_config};
pub use parse::parse_duration_value;
pub use types::ConfigFile;
pub use validate::{LoadSettings, OutputSettings, RunConfig, TargetSettings};
