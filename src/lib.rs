//! Core library for the `shard` load generator.
//!
//! A run drives one HTTP target at a fixed rate: the [`runner`] schedules
//! tickets into a bounded queue, a worker pool executes each one through the
//! phase-tracing client in [`http`], and the [`sinks`] persist every
//! [`metrics::RequestRecord`] as JSONL while keeping live totals. The
//! [`report`] module summarizes a persisted stream offline.
pub mod args;
pub mod config;
pub mod error;
pub mod http;
pub mod metrics;
pub mod report;
pub mod runner;
pub mod sinks;

mod app;
mod entry;
mod logger;
mod shutdown;

pub use entry::run;
pub use shutdown::spawn_signal_handler;
