use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::args::AttackArgs;
use crate::config::{RunConfig, load_config_file};
use crate::error::AppResult;
use crate::runner::{RunSummary, run_attack};
use crate::shutdown::spawn_signal_handler;
use crate::sinks::{format_elapsed, format_millis_tenths};

/// Loads and validates the configuration named on the command line, with
/// the output overrides applied.
pub(crate) fn resolve_run_config(args: &AttackArgs) -> AppResult<RunConfig> {
    let mut config = load_config_file(&args.config)?.validate()?;
    if let Some(out) = args.out.clone() {
        config = config.with_results_path(out);
    }
    if let Some(progress) = args.progress.clone() {
        config = config.with_progress_path(progress);
    }
    Ok(config)
}

pub(crate) async fn run_attack_command(args: &AttackArgs) -> AppResult<()> {
    let config = resolve_run_config(args)?;
    let load = &config.load;

    let cancel = CancellationToken::new();
    let signal_handler = spawn_signal_handler(&cancel);

    info!(
        "Starting attack: {} {} rate={}/s duration={} concurrency={}",
        config.target.method,
        config.target.url,
        load.rate,
        format_elapsed(load.duration),
        load.concurrency
    );
    let outcome = run_attack(&config, &cancel).await;

    cancel.cancel();
    signal_handler.await?;
    let summary = outcome?;
    log_completion(&config, &summary);
    Ok(())
}

fn log_completion(config: &RunConfig, summary: &RunSummary) {
    let snapshot = &summary.snapshot;
    let verb = if summary.cancelled() {
        "stopped"
    } else {
        "complete"
    };
    info!(
        "Attack {} in {}, results written to {} (sent={} ok={} fail={} avg={}ms)",
        verb,
        format_elapsed(summary.elapsed),
        config.output.results_path.display(),
        snapshot.sent,
        snapshot.success,
        snapshot.failure,
        format_millis_tenths(snapshot.avg_latency)
    );
    if summary.dropped > 0 || summary.discarded > 0 {
        info!(
            "{} scheduled requests never reached the results file ({} completed but dropped, {} never sent)",
            summary.dropped.saturating_add(summary.discarded),
            summary.dropped,
            summary.discarded
        );
    }
}
