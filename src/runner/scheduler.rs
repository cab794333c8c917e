use std::num::NonZeroU64;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::config::LoadSettings;

/// Sequence number of one scheduled request attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WorkTicket(u64);

impl WorkTicket {
    #[must_use]
    pub const fn new(seq: u64) -> Self {
        Self(seq)
    }

    #[must_use]
    pub const fn seq(self) -> u64 {
        self.0
    }
}

/// Why the scheduler stopped emitting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    Elapsed,
    Cancelled,
    /// Every receiver of the ticket queue is gone.
    QueueClosed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleReport {
    pub emitted: u64,
    pub stop: StopReason,
}

const NANOS_PER_SEC: u128 = 1_000_000_000;

/// Fixed-rate ticket emitter.
///
/// Ticket `n` is due at `start + n / rate` seconds, computed from the start
/// rather than accumulated, so rates that do not divide a second evenly
/// still yield `rate * duration` tickets. Tickets due at or after `duration`
/// are not emitted. A full queue blocks the loop; tickets that fell due while
/// blocked fire back to back afterwards rather than being skipped.
#[derive(Debug, Clone, Copy)]
pub struct RateScheduler {
    rate: NonZeroU64,
    duration: Duration,
}

impl RateScheduler {
    #[must_use]
    pub const fn new(rate: NonZeroU64, duration: Duration) -> Self {
        Self { rate, duration }
    }

    #[must_use]
    pub const fn from_settings(load: &LoadSettings) -> Self {
        Self::new(load.rate, load.duration)
    }

    /// Offset of ticket `seq` from the start of the schedule.
    #[must_use]
    pub fn offset(&self, seq: u64) -> Duration {
        let nanos = u128::from(seq)
            .checked_mul(NANOS_PER_SEC)
            .and_then(|scaled| scaled.checked_div(u128::from(self.rate.get())))
            .and_then(|nanos| u64::try_from(nanos).ok())
            .unwrap_or(u64::MAX);
        Duration::from_nanos(nanos)
    }

    /// Emits tickets into `tickets` until the duration elapses or `cancel`
    /// fires, then closes the queue. Consumes the only sender, so the queue
    /// is closed exactly once.
    pub async fn run(
        self,
        tickets: async_channel::Sender<WorkTicket>,
        cancel: &CancellationToken,
    ) -> ScheduleReport {
        let start = Instant::now();
        let deadline = until(start.checked_add(self.duration));
        tokio::pin!(deadline);

        let mut emitted: u64 = 0;
        let stop = loop {
            let offset = self.offset(emitted);
            let due = if offset < self.duration {
                start.checked_add(offset)
            } else {
                None
            };
            tokio::select! {
                biased;
                () = cancel.cancelled() => break StopReason::Cancelled,
                () = &mut deadline => break StopReason::Elapsed,
                () = until(due) => {
                    let ticket = WorkTicket::new(emitted);
                    let sent = tokio::select! {
                        biased;
                        () = cancel.cancelled() => break StopReason::Cancelled,
                        sent = tickets.send(ticket) => sent,
                    };
                    if sent.is_err() {
                        break StopReason::QueueClosed;
                    }
                    emitted = emitted.saturating_add(1);
                }
            }
        };

        tickets.close();
        drop(tickets);
        debug!("Scheduler stopped after {} tickets: {:?}", emitted, stop);
        ScheduleReport { emitted, stop }
    }
}

async fn until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
