use super::*;
use crate::metrics::{FailPhase, PhaseTimings, RequestRecord};
use chrono::Utc;
use std::future::Future;
use std::time::Duration;

fn run_async_test<F>(future: F) -> Result<(), String>
where
    F: Future<Output = Result<(), String>>,
{
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|err| format!("Failed to build runtime: {}", err))?;
    runtime.block_on(future)
}

fn phases(dns_us: u64, total_us: u64) -> PhaseTimings {
    PhaseTimings {
        dns: Duration::from_micros(dns_us),
        total: Duration::from_micros(total_us),
        ..PhaseTimings::default()
    }
}

#[test]
fn millis_keep_two_decimals() -> Result<(), String> {
    let cases = [
        (Duration::ZERO, "0.00"),
        (Duration::from_micros(1_234), "1.23"),
        (Duration::from_micros(1_235), "1.24"),
        (Duration::from_secs(3), "3000.00"),
    ];
    for (duration, expected) in cases {
        let actual = format_millis(duration);
        if actual != expected {
            return Err(format!("{:?}: expected {}, got {}", duration, expected, actual));
        }
    }
    Ok(())
}

#[test]
fn aggregates_codes_errors_and_phases() -> Result<(), String> {
    let mut report = ReportAggregator::new();
    report.add(&RequestRecord::success(Utc::now(), 200, false, phases(1_000, 10_000)));
    report.add(&RequestRecord::success(Utc::now(), 200, true, phases(0, 20_000)));
    report.add(&RequestRecord::success(Utc::now(), 404, true, phases(0, 30_000)));
    report.add(&RequestRecord::failure(Utc::now(), FailPhase::Dns, false, phases(2_000, 2_000)));

    if report.count() != 4 || report.status_code(200) != 2 || report.status_code(0) != 0 {
        return Err(format!("Unexpected counts: {:?}", report));
    }
    if report.failures_in(FailPhase::Dns) != 1 {
        return Err("Expected one dns failure".to_owned());
    }
    let total = report.phase("total").ok_or("missing total")?;
    if total.count != 4
        || total.min != Duration::from_millis(2)
        || total.max != Duration::from_millis(30)
        || total.sum != Duration::from_millis(62)
        || total.avg() != Duration::from_micros(15_500)
    {
        return Err(format!("Unexpected total stats: {:?}", total));
    }
    let dns = report.phase("dns").ok_or("missing dns")?;
    if dns.min != Duration::ZERO || dns.max != Duration::from_millis(2) {
        return Err(format!("Unexpected dns stats: {:?}", dns));
    }
    if report.phase("bogus").is_some() {
        return Err("Unknown phases have no stats".to_owned());
    }
    Ok(())
}

#[test]
fn render_prints_every_section() -> Result<(), String> {
    let mut report = ReportAggregator::new();
    report.add(&RequestRecord::success(Utc::now(), 503, false, phases(0, 1_500)));
    let text = report.render().map_err(|err| err.to_string())?;
    let expected = [
        "=== Summary (1 requests) ===",
        "  5xx : 1",
        "  503 : 1",
        "Errors:\n  none",
        "Failures by phase:\n  none",
        "  Phase    Avg        Min        Max        Total",
        "  total    1.50       1.50       1.50       1.50",
    ];
    for fragment in expected {
        if !text.contains(fragment) {
            return Err(format!("Missing {:?} in:\n{}", fragment, text));
        }
    }
    Ok(())
}

#[test]
fn failure_sections_are_sorted_by_name() -> Result<(), String> {
    let mut report = ReportAggregator::new();
    for phase in [FailPhase::Timeout, FailPhase::Ttfb, FailPhase::Dns, FailPhase::Connect] {
        report.add(&RequestRecord::failure(Utc::now(), phase, false, phases(0, 1_000)));
    }
    let text = report.render().map_err(|err| err.to_string())?;
    let section = text
        .split("Errors:\n")
        .nth(1)
        .and_then(|rest| rest.split("Failures by phase:").next())
        .ok_or_else(|| format!("Missing error section:\n{}", text))?;
    let names: Vec<&str> = section
        .lines()
        .filter_map(|line| line.split(':').next())
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .collect();
    if names != ["connect", "dns", "timeout", "ttfb"] {
        return Err(format!("Unexpected order {:?} in:\n{}", names, text));
    }
    Ok(())
}

#[test]
fn load_skips_unparsable_lines() -> Result<(), String> {
    run_async_test(async {
        let dir = tempfile::tempdir().map_err(|err| err.to_string())?;
        let path = dir.path().join("results.jsonl");
        let good = RequestRecord::failure(Utc::now(), FailPhase::Timeout, false, phases(0, 5_000));
        let line = serde_json::to_string(&good).map_err(|err| err.to_string())?;
        let content = format!("{}\nnot json\n\n{}", line, line);
        std::fs::write(&path, content).map_err(|err| err.to_string())?;

        let mut report = ReportAggregator::new();
        let loaded = report.load_jsonl(&path).await.map_err(|err| err.to_string())?;
        if loaded != (LoadStats { parsed: 2, skipped: 1 }) {
            return Err(format!("Unexpected load stats: {:?}", loaded));
        }
        if report.failures_in(FailPhase::Timeout) != 2 {
            return Err("Expected both timeouts".to_owned());
        }
        let text = report.render().map_err(|err| err.to_string())?;
        if !text.contains("  timeout    : 2") {
            return Err(format!("Missing error breakdown:\n{}", text));
        }
        Ok(())
    })
}

#[test]
fn load_reports_missing_file() -> Result<(), String> {
    run_async_test(async {
        let dir = tempfile::tempdir().map_err(|err| err.to_string())?;
        let mut report = ReportAggregator::new();
        match report.load_jsonl(&dir.path().join("nope.jsonl")).await {
            Err(crate::error::SinkError::OpenResults { .. }) => Ok(()),
            other => Err(format!("Expected an open error, got {:?}", other)),
        }
    })
}
