//! Offline summary of a persisted JSONL record stream.
mod aggregator;

#[cfg(test)]
mod tests;

pub use aggregator::{LoadStats, PhaseStats, ReportAggregator, format_millis};
