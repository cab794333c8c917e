//! Durable outputs of a run: the JSONL record stream and the progress log.
mod progress;
mod results;


pub use progress::{
    COMPLETED_LINE, format_elapsed, format_millis_tenths, format_progress_line,
};
pub use results::{ResultSink, SinkReport};
