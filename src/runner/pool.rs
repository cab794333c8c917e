use std::num::NonZeroUsize;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::AppResult;
use crate::metrics::RequestRecord;

use super::scheduler::WorkTicket;

/// Turns one ticket into one record. Implementations must not fail: every
/// outcome, including transport errors, is reported through the record.
#[async_trait]
pub trait RequestExecutor: Send + Sync + 'static {
    async fn execute(&self, ticket: WorkTicket) -> RequestRecord;
}

/// Per-pool totals once every worker has exited.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolReport {
    /// Requests run to completion.
    pub executed: u64,
    /// Completed records abandoned because cancellation fired while the
    /// results channel was full or closed.
    pub dropped: u64,
    /// Queued tickets taken off the queue unexecuted after cancellation.
    pub discarded: u64,
}

#[derive(Debug, Clone, Copy, Default)]
struct WorkerTally {
    executed: u64,
    dropped: u64,
    discarded: u64,
}

/// Fixed set of workers, each running one request at a time.
#[derive(Debug)]
pub struct WorkerPool {
    handles: Vec<JoinHandle<WorkerTally>>,
}

impl WorkerPool {
    /// Spawns `size` workers. The pool takes the only `results` sender, so
    /// the channel closes once every worker has exited.
    pub fn spawn<E>(
        size: NonZeroUsize,
        executor: Arc<E>,
        tickets: async_channel::Receiver<WorkTicket>,
        results: mpsc::Sender<RequestRecord>,
        cancel: &CancellationToken,
    ) -> Self
    where
        E: RequestExecutor,
    {
        let handles = (0..size.get())
            .map(|worker_id| {
                let executor = Arc::clone(&executor);
                let tickets = tickets.clone();
                let results = results.clone();
                let cancel = cancel.clone();
                tokio::spawn(async move {
                    let tally = run_worker(executor.as_ref(), &tickets, &results, &cancel).await;
                    debug!(
                        "Worker {} exited after {} requests ({} dropped, {} discarded)",
                        worker_id, tally.executed, tally.dropped, tally.discarded
                    );
                    tally
                })
            })
            .collect();
        drop(results);
        drop(tickets);
        Self { handles }
    }

    #[must_use]
    pub fn size(&self) -> usize {
        self.handles.len()
    }

    /// Waits for every worker to exit.
    ///
    /// # Errors
    ///
    /// Returns an error when a worker task panicked.
    pub async fn join(self) -> AppResult<PoolReport> {
        let mut report = PoolReport::default();
        for handle in self.handles {
            let tally = handle.await?;
            report.executed = report.executed.saturating_add(tally.executed);
            report.dropped = report.dropped.saturating_add(tally.dropped);
            report.discarded = report.discarded.saturating_add(tally.discarded);
        }
        Ok(report)
    }
}

async fn run_worker<E>(
    executor: &E,
    tickets: &async_channel::Receiver<WorkTicket>,
    results: &mpsc::Sender<RequestRecord>,
    cancel: &CancellationToken,
) -> WorkerTally
where
    E: RequestExecutor + ?Sized,
{
    let mut tally = WorkerTally::default();
    loop {
        let ticket = tokio::select! {
            biased;
            () = cancel.cancelled() => {
                tally.discarded = discard_queued(tickets);
                break;
            }
            next = tickets.recv() => match next {
                Ok(ticket) => ticket,
                Err(_) => break,
            },
        };

        let record = executor.execute(ticket).await;
        tally.executed = tally.executed.saturating_add(1);

        let delivered = tokio::select! {
            biased;
            sent = results.send(record) => sent.is_ok(),
            () = cancel.cancelled() => false,
        };
        if !delivered {
            tally.dropped = tally.dropped.saturating_add(1);
            tally.discarded = discard_queued(tickets);
            break;
        }
    }
    tally
}

/// Empties the queue without executing anything, returning how many tickets
/// were taken.
fn discard_queued(tickets: &async_channel::Receiver<WorkTicket>) -> u64 {
    let mut discarded: u64 = 0;
    while tickets.try_recv().is_ok() {
        discarded = discarded.saturating_add(1);
    }
    discarded
}
