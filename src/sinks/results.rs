use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error};

use crate::config::OutputSettings;
use crate::error::SinkError;
use crate::metrics::{LiveStats, RequestRecord, StatsSnapshot};

use super::progress::{COMPLETED_LINE, finish_live_line, format_progress_line, render_live_line};

#[derive(Debug)]
struct LineWriter {
    path: PathBuf,
    writer: BufWriter<File>,
}

impl LineWriter {
    async fn create(path: &Path) -> Result<Self, SinkError> {
        let file = File::create(path)
            .await
            .map_err(|source| SinkError::OpenOutput {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(Self {
            path: path.to_path_buf(),
            writer: BufWriter::new(file),
        })
    }

    async fn write_line(&mut self, line: &str) -> Result<(), SinkError> {
        let written = match self.writer.write_all(line.as_bytes()).await {
            Ok(()) => self.writer.write_all(b"\n").await,
            Err(err) => Err(err),
        };
        written.map_err(|source| SinkError::Write {
            path: self.path.clone(),
            source,
        })
    }

    async fn flush(&mut self) -> Result<(), SinkError> {
        self.writer
            .flush()
            .await
            .map_err(|source| SinkError::Flush {
                path: self.path.clone(),
                source,
            })
    }
}

/// What the sink saw by the time the results channel closed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkReport {
    pub records_written: u64,
    pub snapshot: StatsSnapshot,
}

/// Single consumer of the results channel: appends one JSON line per record,
/// feeds the live stats, and writes a progress line every interval.
#[derive(Debug)]
pub struct ResultSink {
    results: LineWriter,
    progress: LineWriter,
    stats: Arc<LiveStats>,
    interval: Duration,
}

impl ResultSink {
    /// Creates (truncating) both output files.
    ///
    /// # Errors
    ///
    /// Returns an error when either file cannot be created.
    pub async fn open(output: &OutputSettings, stats: Arc<LiveStats>) -> Result<Self, SinkError> {
        let results = LineWriter::create(&output.results_path).await?;
        let progress = LineWriter::create(&output.progress_path).await?;
        Ok(Self {
            results,
            progress,
            stats,
            interval: output.progress_interval,
        })
    }

    /// Consumes records until every sender is gone, then writes the final
    /// progress line and flushes.
    ///
    /// A write failure does not stop consumption, so producers never stall
    /// on a broken sink; the first failure is returned at the end.
    ///
    /// # Errors
    ///
    /// Returns the first serialization, write or flush error.
    pub async fn run(
        mut self,
        mut results: mpsc::Receiver<RequestRecord>,
        started: Instant,
    ) -> Result<SinkReport, SinkError> {
        let period = self.interval.max(Duration::from_millis(1));
        let first_tick = started.checked_add(period).unwrap_or(started);
        let mut ticker = tokio::time::interval_at(first_tick, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let mut records_written: u64 = 0;
        let mut first_error: Option<SinkError> = None;

        loop {
            tokio::select! {
                next = results.recv() => {
                    let Some(record) = next else {
                        break;
                    };
                    self.stats.add(&record);
                    match self.append(&record).await {
                        Ok(()) => records_written = records_written.saturating_add(1),
                        Err(err) => keep_first(&mut first_error, err),
                    }
                }
                _ = ticker.tick() => {
                    if let Err(err) = self.write_progress(started.elapsed()).await {
                        keep_first(&mut first_error, err);
                    }
                }
            }
        }

        if let Err(err) = self.write_progress(started.elapsed()).await {
            keep_first(&mut first_error, err);
        }
        if let Err(err) = finish_live_line() {
            debug!("Failed to finish progress line: {}", err);
        }
        for outcome in [
            self.progress.write_line(COMPLETED_LINE).await,
            self.results.flush().await,
            self.progress.flush().await,
        ] {
            if let Err(err) = outcome {
                keep_first(&mut first_error, err);
            }
        }

        match first_error {
            Some(err) => Err(err),
            None => Ok(SinkReport {
                records_written,
                snapshot: self.stats.snapshot(),
            }),
        }
    }

    async fn append(&mut self, record: &RequestRecord) -> Result<(), SinkError> {
        let line = serde_json::to_string(record)
            .map_err(|source| SinkError::SerializeRecord { source })?;
        self.results.write_line(&line).await
    }

    async fn write_progress(&mut self, elapsed: Duration) -> Result<(), SinkError> {
        let line = format_progress_line(elapsed, &self.stats.snapshot());
        if let Err(err) = render_live_line(&line) {
            debug!("Failed to render progress line: {}", err);
        }
        self.progress.write_line(&line).await
    }
}

fn keep_first(slot: &mut Option<SinkError>, err: SinkError) {
    if slot.is_none() {
        error!("Result sink error: {}", err);
        *slot = Some(err);
    } else {
        debug!("Further result sink error: {}", err);
    }
}
