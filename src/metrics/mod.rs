//! Result records, the live stats aggregator, and their snapshots.
mod live;
mod record;

#[cfg(test)]
mod tests;

pub use live::{LiveStats, StatsSnapshot};
pub use record::{FailPhase, PhaseTimings, RequestRecord, StatusFamily};
