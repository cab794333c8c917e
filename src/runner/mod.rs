//! The concurrent runner: fixed-rate scheduling, the worker pool, and the
//! orchestration that drains both on shutdown.
mod lifecycle;
mod pool;
mod scheduler;


use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::RunConfig;
use crate::error::{AppError, AppResult};
use crate::http::{RequestTemplate, RequestTracer, build_client};
use crate::metrics::{LiveStats, StatsSnapshot};
use crate::sinks::ResultSink;

pub use lifecycle::{Lifecycle, RunState};
pub use pool::{PoolReport, RequestExecutor, WorkerPool};
pub use scheduler::{RateScheduler, ScheduleReport, StopReason, WorkTicket};

/// Outcome of one completed run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// Final aggregator view; covers exactly the records that were written.
    pub snapshot: StatsSnapshot,
    pub scheduled: u64,
    pub records_written: u64,
    /// Completed records abandoned during cancellation.
    pub dropped: u64,
    /// Scheduled tickets never executed because cancellation fired while they
    /// were queued. `scheduled == records_written + dropped + discarded`.
    pub discarded: u64,
    pub stop: StopReason,
    pub elapsed: Duration,
    pub state: RunState,
}

impl RunSummary {
    #[must_use]
    pub fn cancelled(&self) -> bool {
        self.stop == StopReason::Cancelled
    }
}

/// Runs one attack against the configured target with the traced HTTP
/// client.
///
/// # Errors
///
/// Returns an error when the base request, the client or an output file
/// cannot be set up (nothing is sent in that case), when a task panics, or
/// when the sink misses its drain window.
pub async fn run_attack(config: &RunConfig, cancel: &CancellationToken) -> AppResult<RunSummary> {
    let template = RequestTemplate::build(&config.target).await?;
    let client = build_client(&config.load)?;
    let tracer = RequestTracer::new(client, Arc::new(template), config.load.timeout);
    run_with_executor(config, Arc::new(tracer), cancel).await
}

/// Runs the schedule, pool and sink around an arbitrary executor.
///
/// # Errors
///
/// Same conditions as [`run_attack`], minus request construction.
pub async fn run_with_executor<E>(
    config: &RunConfig,
    executor: Arc<E>,
    cancel: &CancellationToken,
) -> AppResult<RunSummary>
where
    E: RequestExecutor,
{
    let mut lifecycle = Lifecycle::new();
    let load = &config.load;

    let stats = Arc::new(LiveStats::new());
    let sink = ResultSink::open(&config.output, stats).await?;
    let (tickets_tx, tickets_rx) = async_channel::bounded(load.queue_size.get());
    let (results_tx, results_rx) = mpsc::channel(load.results_capacity());

    let started = Instant::now();
    lifecycle.advance(RunState::Running);
    let mut sink_task = tokio::spawn(sink.run(results_rx, started));
    let pool = WorkerPool::spawn(load.concurrency, executor, tickets_rx, results_tx, cancel);

    let schedule = RateScheduler::from_settings(load)
        .run(tickets_tx, cancel)
        .await;
    lifecycle.advance(RunState::Draining);
    if schedule.stop == StopReason::Cancelled {
        info!("Cancellation received, draining in-flight requests");
    }

    let pool_report = pool.join().await?;
    if pool_report.dropped > 0 {
        warn!(
            "{} completed results were dropped during cancellation",
            pool_report.dropped
        );
    }
    // A ticket enqueued while the workers were already draining is released
    // with the queue, so count from the schedule rather than the drain.
    let discarded = schedule.emitted.saturating_sub(pool_report.executed);
    if discarded > 0 {
        info!(
            "{} queued requests were discarded unsent ({} taken off the queue)",
            discarded, pool_report.discarded
        );
    }

    let drain_timeout = config.output.drain_timeout;
    let sink_report = match tokio::time::timeout(drain_timeout, &mut sink_task).await {
        Ok(joined) => joined??,
        Err(_) => {
            sink_task.abort();
            return Err(AppError::SinkDrainTimeout {
                timeout: drain_timeout,
            });
        }
    };
    lifecycle.advance(RunState::Terminated);
    debug!(
        "Scheduled {} tickets, executed {}, wrote {}",
        schedule.emitted, pool_report.executed, sink_report.records_written
    );

    Ok(RunSummary {
        snapshot: sink_report.snapshot,
        scheduled: schedule.emitted,
        records_written: sink_report.records_written,
        dropped: pool_report.dropped,
        discarded,
        stop: schedule.stop,
        elapsed: started.elapsed(),
        state: lifecycle.state(),
    })
}
