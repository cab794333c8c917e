//! Traced HTTP execution: the base request, the instrumented client, and
//! failure classification.
mod classify;
mod client;
mod connect;
mod template;
mod trace;
mod tracer;


pub use classify::classify_failure;
pub use client::{TracedClient, build_client};
pub use connect::{TracedResolver, TracedTcp, TracedTls};
pub use template::RequestTemplate;
pub use trace::{PhaseRecorder, TraceEvent, TraceListener, TraceOutcome, emit, traced};
pub use tracer::RequestTracer;
