use super::*;
use chrono::{TimeZone, Utc};
use std::sync::Arc;
use std::time::Duration;

fn timings(total_ms: u64) -> PhaseTimings {
    PhaseTimings {
        dns: Duration::from_micros(150),
        connect: Duration::from_micros(300),
        tls: Duration::ZERO,
        ttfb: Duration::from_millis(2),
        total: Duration::from_millis(total_ms),
    }
}

fn ok_record(code: u16, total_ms: u64) -> RequestRecord {
    RequestRecord::success(Utc::now(), code, false, timings(total_ms))
}

fn failed_record(phase: FailPhase) -> RequestRecord {
    RequestRecord::failure(Utc::now(), phase, false, timings(10))
}

#[test]
fn empty_snapshot_reports_zero_average() -> Result<(), String> {
    let snapshot = LiveStats::new().snapshot();
    if snapshot != StatsSnapshot::default() {
        return Err(format!("Unexpected snapshot: {:?}", snapshot));
    }
    if snapshot.avg_latency != Duration::ZERO {
        return Err("Expected zero average without successes".to_owned());
    }
    Ok(())
}

#[test]
fn average_only_counts_successes() -> Result<(), String> {
    let stats = LiveStats::new();
    stats.add(&ok_record(200, 10));
    stats.add(&ok_record(201, 30));
    stats.add(&failed_record(FailPhase::Timeout));

    let snapshot = stats.snapshot();
    if snapshot.avg_latency != Duration::from_millis(20) {
        return Err(format!("Unexpected average: {:?}", snapshot.avg_latency));
    }
    if snapshot.sent != 3 || snapshot.success != 2 || snapshot.failure != 1 {
        return Err(format!("Unexpected counts: {:?}", snapshot));
    }
    Ok(())
}

#[test]
fn tallies_failures_and_status_families() -> Result<(), String> {
    let stats = LiveStats::new();
    stats.add(&ok_record(200, 1));
    stats.add(&ok_record(302, 1));
    stats.add(&ok_record(404, 1));
    stats.add(&ok_record(503, 1));
    stats.add(&ok_record(503, 1));
    stats.add(&ok_record(101, 1));
    stats.add(&failed_record(FailPhase::Connect));
    stats.add(&failed_record(FailPhase::Connect));
    stats.add(&failed_record(FailPhase::Dns));

    let snapshot = stats.snapshot();
    let expected = [
        (StatusFamily::Success, 1),
        (StatusFamily::Redirection, 1),
        (StatusFamily::ClientError, 1),
        (StatusFamily::ServerError, 2),
    ];
    for (family, count) in expected {
        if snapshot.family_count(family) != count {
            return Err(format!("{} expected {}", family, count));
        }
    }
    if snapshot.failures_in(FailPhase::Connect) != 2 || snapshot.failures_in(FailPhase::Dns) != 1
    {
        return Err(format!("Unexpected failures: {:?}", snapshot.failures_by_phase));
    }
    if snapshot.failures_by_phase.contains_key(&FailPhase::Tls) {
        return Err("Zero buckets must be omitted".to_owned());
    }
    if snapshot.success != 6 {
        return Err("1xx responses still count as successes".to_owned());
    }
    Ok(())
}

#[test]
fn concurrent_adds_are_not_lost() -> Result<(), String> {
    let stats = Arc::new(LiveStats::new());
    let mut handles = Vec::new();
    for worker in 0..8u64 {
        let stats = Arc::clone(&stats);
        handles.push(std::thread::spawn(move || {
            for i in 0..1_000u64 {
                if (i + worker) % 4 == 0 {
                    stats.add(&failed_record(FailPhase::Ttfb));
                } else {
                    stats.add(&ok_record(200, 5));
                }
            }
        }));
    }
    for handle in handles {
        handle
            .join()
            .map_err(|_panic| "worker thread panicked".to_owned())?;
    }

    let snapshot = stats.snapshot();
    if snapshot.sent != 8_000 {
        return Err(format!("Lost updates: sent={}", snapshot.sent));
    }
    if snapshot.sent != snapshot.success + snapshot.failure {
        return Err("sent must equal success + failure".to_owned());
    }
    if snapshot.failures_in(FailPhase::Ttfb) != snapshot.failure {
        return Err("Failure phases must add up to failures".to_owned());
    }
    if snapshot.family_count(StatusFamily::Success) != snapshot.success {
        return Err("2xx must equal success".to_owned());
    }
    Ok(())
}

#[test]
fn success_record_omits_error_fields() -> Result<(), String> {
    let timestamp = Utc
        .with_ymd_and_hms(2024, 5, 1, 12, 0, 0)
        .single()
        .ok_or_else(|| "invalid timestamp".to_owned())?;
    let record = RequestRecord::success(timestamp, 200, true, timings(7));
    let line = serde_json::to_string(&record).map_err(|err| err.to_string())?;
    if line.contains("\"error\"") || line.contains("\"fail_phase\"") {
        return Err(format!("Unexpected error fields: {}", line));
    }
    if !line.contains("\"ts\":\"2024-05-01T12:00:00Z\"") {
        return Err(format!("Unexpected timestamp: {}", line));
    }
    if !line.contains("\"total\":7000000") || !line.contains("\"dns\":150000") {
        return Err(format!("Phases must be nanoseconds: {}", line));
    }
    Ok(())
}

#[test]
fn failure_record_carries_error_and_phase() -> Result<(), String> {
    let record = failed_record(FailPhase::Tls);
    let line = serde_json::to_string(&record).map_err(|err| err.to_string())?;
    if !line.contains("\"error\":\"tls\"") || !line.contains("\"fail_phase\":\"tls\"") {
        return Err(format!("Missing failure fields: {}", line));
    }
    if !line.contains("\"code\":0") {
        return Err(format!("Failures have no status: {}", line));
    }
    let parsed: RequestRecord = serde_json::from_str(&line).map_err(|err| err.to_string())?;
    if parsed != record {
        return Err(format!("Record changed on re-read: {:?}", parsed));
    }
    Ok(())
}

#[test]
fn parses_records_with_offset_timestamps() -> Result<(), String> {
    let line = r#"{"ts":"2024-05-01T14:00:00.123456789+02:00","code":200,"reused":false,"phases":{"dns":1,"connect":2,"tls":3,"ttfb":4,"total":20}}"#;
    let record: RequestRecord = serde_json::from_str(line).map_err(|err| err.to_string())?;
    if record.timestamp.to_rfc3339() != "2024-05-01T12:00:00.123456789+00:00" {
        return Err(format!("Unexpected timestamp: {}", record.timestamp));
    }
    if record.phases.incremental_sum() != Duration::from_nanos(10) {
        return Err("Unexpected phase sum".to_owned());
    }
    Ok(())
}
