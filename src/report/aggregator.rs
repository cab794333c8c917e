use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::Path;
use std::time::Duration;

use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;

use crate::error::SinkError;
use crate::metrics::{FailPhase, PhaseTimings, RequestRecord, StatusFamily};

const NANOS_PER_HUNDREDTH_MS: u128 = 10_000;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PhaseStats {
    pub count: u64,
    pub sum: Duration,
    pub min: Duration,
    pub max: Duration,
}

impl PhaseStats {
    fn add(&mut self, value: Duration) {
        if self.count == 0 {
            self.min = value;
            self.max = value;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);
        }
        self.count = self.count.saturating_add(1);
        self.sum = self.sum.saturating_add(value);
    }

    #[must_use]
    pub fn avg(&self) -> Duration {
        let nanos = self
            .sum
            .as_nanos()
            .checked_div(u128::from(self.count))
            .unwrap_or(0);
        Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX))
    }
}

/// Line counts from one [`ReportAggregator::load_jsonl`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadStats {
    pub parsed: u64,
    pub skipped: u64,
}

/// Offline totals over a persisted record stream.
#[derive(Debug, Clone, Default)]
pub struct ReportAggregator {
    count: u64,
    status_codes: BTreeMap<u16, u64>,
    status_families: BTreeMap<StatusFamily, u64>,
    errors: BTreeMap<FailPhase, u64>,
    failures_by_phase: BTreeMap<FailPhase, u64>,
    phases: [PhaseStats; PhaseTimings::NAMES.len()],
}

impl ReportAggregator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn count(&self) -> u64 {
        self.count
    }

    #[must_use]
    pub fn status_code(&self, code: u16) -> u64 {
        self.status_codes.get(&code).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn failures_in(&self, phase: FailPhase) -> u64 {
        self.failures_by_phase.get(&phase).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn phase(&self, name: &str) -> Option<&PhaseStats> {
        PhaseTimings::NAMES
            .iter()
            .position(|known| *known == name)
            .and_then(|index| self.phases.get(index))
    }

    pub fn add(&mut self, record: &RequestRecord) {
        self.count = self.count.saturating_add(1);

        if record.code > 0 {
            bump(&mut self.status_codes, record.code);
            if let Some(family) = record.status_family() {
                bump(&mut self.status_families, family);
            }
        }
        if let Some(error) = record.error {
            bump(&mut self.errors, error);
        }
        if let Some(phase) = record.fail_phase {
            bump(&mut self.failures_by_phase, phase);
        }
        for (stats, (_, value)) in self.phases.iter_mut().zip(record.phases.named()) {
            stats.add(value);
        }
    }

    /// Adds every parsable line of a JSONL record stream. Lines that do not
    /// parse are counted and skipped.
    ///
    /// # Errors
    ///
    /// Returns an error when the file cannot be opened or read.
    pub async fn load_jsonl(&mut self, path: &Path) -> Result<LoadStats, SinkError> {
        let file = File::open(path)
            .await
            .map_err(|source| SinkError::OpenResults {
                path: path.to_path_buf(),
                source,
            })?;
        let mut reader = BufReader::new(file);
        let mut line = Vec::new();
        let mut stats = LoadStats::default();

        loop {
            line.clear();
            let read = reader
                .read_until(b'\n', &mut line)
                .await
                .map_err(|source| SinkError::ReadResults {
                    path: path.to_path_buf(),
                    source,
                })?;
            if read == 0 {
                break;
            }
            if line.iter().all(u8::is_ascii_whitespace) {
                continue;
            }
            match serde_json::from_slice::<RequestRecord>(&line) {
                Ok(record) => {
                    self.add(&record);
                    stats.parsed = stats.parsed.saturating_add(1);
                }
                Err(err) => {
                    debug!("Skipping unparsable result line: {}", err);
                    stats.skipped = stats.skipped.saturating_add(1);
                }
            }
        }
        Ok(stats)
    }

    /// Plain-text summary: families, codes, errors, failing phases and the
    /// per-phase timing table.
    ///
    /// # Errors
    ///
    /// Returns an error if formatting fails.
    pub fn render(&self) -> Result<String, SinkError> {
        let mut out = String::new();
        self.render_into(&mut out)
            .map_err(|source| SinkError::WriteLine { source })?;
        Ok(out)
    }

    fn render_into(&self, out: &mut String) -> std::fmt::Result {
        writeln!(out, "\n=== Summary ({} requests) ===", self.count)?;

        writeln!(out, "\nStatus families:")?;
        for (family, count) in &self.status_families {
            writeln!(out, "  {:<3} : {}", family, count)?;
        }

        writeln!(out, "\nStatus codes:")?;
        for (code, count) in &self.status_codes {
            writeln!(out, "  {:>3} : {}", code, count)?;
        }

        writeln!(out, "\nErrors:")?;
        write_phase_counts(out, &self.errors)?;

        writeln!(out, "\nFailures by phase:")?;
        write_phase_counts(out, &self.failures_by_phase)?;

        writeln!(out, "\nPhase timings (ms):")?;
        writeln!(
            out,
            "  {:<8} {:<10} {:<10} {:<10} {:<10}",
            "Phase", "Avg", "Min", "Max", "Total"
        )?;
        for (name, stats) in PhaseTimings::NAMES.iter().zip(self.phases.iter()) {
            if stats.count == 0 {
                continue;
            }
            writeln!(
                out,
                "  {:<8} {:<10} {:<10} {:<10} {:<10}",
                name,
                format_millis(stats.avg()),
                format_millis(stats.min),
                format_millis(stats.max),
                format_millis(stats.sum)
            )?;
        }
        Ok(())
    }
}

fn bump<K: Ord>(map: &mut BTreeMap<K, u64>, key: K) {
    let count = map.entry(key).or_insert(0);
    *count = count.saturating_add(1);
}

fn write_phase_counts(out: &mut String, counts: &BTreeMap<FailPhase, u64>) -> std::fmt::Result {
    if counts.is_empty() {
        return writeln!(out, "  none");
    }
    let mut by_name: Vec<(&str, u64)> = counts
        .iter()
        .map(|(phase, count)| (phase.as_str(), *count))
        .collect();
    by_name.sort_unstable_by_key(|(name, _)| *name);
    for (name, count) in by_name {
        writeln!(out, "  {:<10} : {}", name, count)?;
    }
    Ok(())
}

/// Milliseconds with two decimals, rounded half up.
#[must_use]
pub fn format_millis(duration: Duration) -> String {
    let hundredths = duration
        .as_nanos()
        .saturating_add(NANOS_PER_HUNDREDTH_MS / 2)
        .checked_div(NANOS_PER_HUNDREDTH_MS)
        .unwrap_or(0);
    format!(
        "{}.{:02}",
        hundredths.checked_div(100).unwrap_or(0),
        hundredths.checked_rem(100).unwrap_or(0)
    )
}
