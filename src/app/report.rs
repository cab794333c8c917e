use std::io::Write;

use tracing::warn;

use crate::args::ReportArgs;
use crate::error::AppResult;
use crate::report::ReportAggregator;

pub(crate) async fn run_report_command(args: &ReportArgs) -> AppResult<()> {
    let mut report = ReportAggregator::new();
    let loaded = report.load_jsonl(&args.input).await?;
    if loaded.skipped > 0 {
        warn!(
            "Skipped {} unparsable lines in {}",
            loaded.skipped,
            args.input.display()
        );
    }

    let text = report.render()?;
    let mut stdout = std::io::stdout().lock();
    stdout.write_all(text.as_bytes())?;
    stdout.flush()?;
    Ok(())
}
