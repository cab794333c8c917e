use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use super::record::{FailPhase, RequestRecord, StatusFamily};

/// Concurrency-safe running totals for one run.
///
/// `add` is the only mutator and may be called from any number of tasks.
/// Counters are independent atomics, so a snapshot taken while records are
/// being added can be skewed by a few in-flight updates; once all producers
/// are done, `sent == success + failure` holds exactly.
#[derive(Debug, Default)]
pub struct LiveStats {
    sent: AtomicU64,
    success: AtomicU64,
    failure: AtomicU64,
    success_latency_ns: AtomicU64,
    failures_by_phase: [AtomicU64; FailPhase::ALL.len()],
    status_families: [AtomicU64; StatusFamily::ALL.len()],
}

/// Point-in-time view of [`LiveStats`]. Only non-zero buckets are present in
/// the two maps.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub sent: u64,
    pub success: u64,
    pub failure: u64,
    /// Mean total latency of successful requests; zero before the first success.
    pub avg_latency: Duration,
    pub failures_by_phase: BTreeMap<FailPhase, u64>,
    pub status_families: BTreeMap<StatusFamily, u64>,
}

impl LiveStats {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, record: &RequestRecord) {
        self.sent.fetch_add(1, Ordering::Relaxed);

        if let Some(phase) = record.fail_phase.or(record.error) {
            self.failure.fetch_add(1, Ordering::Relaxed);
            if let Some(counter) = self.failures_by_phase.get(phase.index()) {
                counter.fetch_add(1, Ordering::Relaxed);
            }
            return;
        }

        self.success.fetch_add(1, Ordering::Relaxed);
        let latency_ns = u64::try_from(record.phases.total.as_nanos()).unwrap_or(u64::MAX);
        self.success_latency_ns
            .fetch_add(latency_ns, Ordering::Relaxed);
        if let Some(counter) = record
            .status_family()
            .and_then(|family| self.status_families.get(family.index()))
        {
            counter.fetch_add(1, Ordering::Relaxed);
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> StatsSnapshot {
        let sent = self.sent.load(Ordering::Relaxed);
        let success = self.success.load(Ordering::Relaxed);
        let failure = self.failure.load(Ordering::Relaxed);
        let latency_sum = self.success_latency_ns.load(Ordering::Relaxed);
        let avg_latency = Duration::from_nanos(latency_sum.checked_div(success).unwrap_or(0));

        let failures_by_phase = FailPhase::ALL
            .into_iter()
            .zip(self.failures_by_phase.iter())
            .map(|(phase, counter)| (phase, counter.load(Ordering::Relaxed)))
            .filter(|(_, count)| *count > 0)
            .collect();
        let status_families = StatusFamily::ALL
            .into_iter()
            .zip(self.status_families.iter())
            .map(|(family, counter)| (family, counter.load(Ordering::Relaxed)))
            .filter(|(_, count)| *count > 0)
            .collect();

        StatsSnapshot {
            sent,
            success,
            failure,
            avg_latency,
            failures_by_phase,
            status_families,
        }
    }
}

impl StatsSnapshot {
    #[must_use]
    pub fn failures_in(&self, phase: FailPhase) -> u64 {
        self.failures_by_phase.get(&phase).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn family_count(&self, family: StatusFamily) -> u64 {
        self.status_families.get(&family).copied().unwrap_or(0)
    }
}
