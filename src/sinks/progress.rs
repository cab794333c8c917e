use std::io::{IsTerminal, Write};
use std::time::Duration;

use crossterm::{
    cursor, queue,
    style::Print,
    terminal::{Clear, ClearType},
};

use crate::metrics::{FailPhase, StatsSnapshot, StatusFamily};

pub const COMPLETED_LINE: &str = "---- Test completed ----";

const SECS_PER_MINUTE: u64 = 60;
const SECS_PER_HOUR: u64 = 3_600;

/// Elapsed time rounded to whole seconds, as `45s`, `1m5s` or `2h0m3s`.
#[must_use]
pub fn format_elapsed(elapsed: Duration) -> String {
    let rounded = elapsed
        .as_secs()
        .saturating_add(u64::from(elapsed.subsec_millis() >= 500));
    let hours = rounded.checked_div(SECS_PER_HOUR).unwrap_or(0);
    let minutes = rounded
        .checked_rem(SECS_PER_HOUR)
        .and_then(|rest| rest.checked_div(SECS_PER_MINUTE))
        .unwrap_or(0);
    let seconds = rounded.checked_rem(SECS_PER_MINUTE).unwrap_or(0);
    if hours > 0 {
        format!("{}h{}m{}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m{}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}

/// Milliseconds with one decimal, rounded half up.
#[must_use]
pub fn format_millis_tenths(duration: Duration) -> String {
    let micros = u64::try_from(duration.as_micros()).unwrap_or(u64::MAX);
    let tenths = micros.saturating_add(50).checked_div(100).unwrap_or(0);
    format!(
        "{}.{}",
        tenths.checked_div(10).unwrap_or(0),
        tenths.checked_rem(10).unwrap_or(0)
    )
}

/// One progress-log line:
/// `[1m5s] sent=N ok=N fail=N avg=X.Yms (connect=3, timeout=1) 2xx=10 5xx=2`.
/// The failure and family parts only list non-zero buckets.
#[must_use]
pub fn format_progress_line(elapsed: Duration, snapshot: &StatsSnapshot) -> String {
    let mut line = format!(
        "[{}] sent={} ok={} fail={} avg={}ms",
        format_elapsed(elapsed),
        snapshot.sent,
        snapshot.success,
        snapshot.failure,
        format_millis_tenths(snapshot.avg_latency)
    );

    let failures: Vec<String> = FailPhase::ALL
        .into_iter()
        .filter_map(|phase| match snapshot.failures_in(phase) {
            0 => None,
            count => Some(format!("{}={}", phase, count)),
        })
        .collect();
    if !failures.is_empty() {
        line = format!("{} ({})", line, failures.join(", "));
    }

    let families: Vec<String> = StatusFamily::ALL
        .into_iter()
        .filter_map(|family| match snapshot.family_count(family) {
            0 => None,
            count => Some(format!("{}={}", family, count)),
        })
        .collect();
    if !families.is_empty() {
        line = format!("{} {}", line, families.join(" "));
    }
    line
}

/// Overwrites the current terminal line on stderr. No-op when stderr is not
/// a terminal.
pub(crate) fn render_live_line(line: &str) -> Result<(), std::io::Error> {
    let mut out = std::io::stderr();
    if !out.is_terminal() {
        return Ok(());
    }
    queue!(
        out,
        cursor::MoveToColumn(0),
        Clear(ClearType::CurrentLine),
        Print(line)
    )?;
    out.flush()
}

/// Ends the live line so later output starts on a fresh line.
pub(crate) fn finish_live_line() -> Result<(), std::io::Error> {
    let mut out = std::io::stderr();
    if !out.is_terminal() {
        return Ok(());
    }
    queue!(out, Print("\n"))?;
    out.flush()
}
