use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use crate::metrics::{FailPhase, PhaseTimings};

/// Lifecycle points fired by the transport while one request is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceEvent {
    DnsStart,
    DnsDone,
    DnsFailed,
    ConnectStart,
    ConnectDone,
    ConnectFailed,
    TlsStart,
    TlsDone,
    TlsFailed,
    FirstByte,
}

/// Receives trace events for the request currently being executed.
pub trait TraceListener: Send + Sync {
    fn on_event(&self, event: TraceEvent, at: Instant);
}

tokio::task_local! {
    static ACTIVE_TRACE: Arc<dyn TraceListener>;
}

/// Runs `future` with `listener` receiving every event the connector layers
/// emit while polling it.
pub async fn traced<F>(listener: Arc<dyn TraceListener>, future: F) -> F::Output
where
    F: Future,
{
    ACTIVE_TRACE.scope(listener, future).await
}

/// Reports `event` to the listener of the current request, if any.
///
/// Connections the pool finishes in the background after their request gave
/// up have no listener; their events are dropped.
pub fn emit(event: TraceEvent) {
    let at = Instant::now();
    let _ignored = ACTIVE_TRACE.try_with(|listener| listener.on_event(event, at));
}

#[derive(Debug, Default, Clone, Copy)]
struct Marks {
    dns_start: Option<Instant>,
    dns_done: Option<Instant>,
    connect_start: Option<Instant>,
    connect_done: Option<Instant>,
    tls_start: Option<Instant>,
    tls_done: Option<Instant>,
    first_byte: Option<Instant>,
    failed: Option<FailPhase>,
}

/// Collects event timestamps for one request and turns them into
/// [`PhaseTimings`].
#[derive(Debug)]
pub struct PhaseRecorder {
    started: Instant,
    marks: Mutex<Marks>,
}

/// What the recorder saw once the request is over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraceOutcome {
    pub phases: PhaseTimings,
    pub reused: bool,
    /// A new connection was established for this request.
    pub connected: bool,
    /// Phase of the first failure event, if the transport reported one.
    pub failed: Option<FailPhase>,
}

impl PhaseRecorder {
    #[must_use]
    pub fn new(started: Instant) -> Self {
        Self {
            started,
            marks: Mutex::new(Marks::default()),
        }
    }

    fn marks(&self) -> Marks {
        match self.marks.lock() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }

    /// Closes the trace at `ended`. `responded` says whether a response head
    /// arrived, which decides how connection reuse is inferred.
    ///
    /// A reused connection reports zero dns, connect and tls even when a
    /// speculative dial started inside this request before the pool handed
    /// back an idle connection.
    #[must_use]
    pub fn finish(&self, ended: Instant, responded: bool) -> TraceOutcome {
        let mut marks = self.marks();
        let reused = if responded {
            marks.connect_done.is_none()
        } else {
            marks.dns_start.is_none() && marks.connect_start.is_none()
        };
        if reused {
            marks = Marks {
                first_byte: marks.first_byte,
                failed: marks.failed,
                ..Marks::default()
            };
        }
        let since = |end: Option<Instant>, begin: Option<Instant>| match (end, begin) {
            (Some(end), Some(begin)) => end.saturating_duration_since(begin),
            _ => std::time::Duration::ZERO,
        };

        let connect_begin = match (marks.connect_start, marks.dns_done) {
            (Some(start), Some(dns)) => Some(start.max(dns)),
            (start, _) => start,
        };
        let ttfb_begin = marks
            .tls_done
            .or(marks.connect_done)
            .unwrap_or(self.started);

        let phases = PhaseTimings {
            dns: since(marks.dns_done, marks.dns_start),
            connect: since(marks.connect_done, connect_begin),
            tls: since(marks.tls_done, marks.tls_start),
            ttfb: since(marks.first_byte, Some(ttfb_begin)),
            total: ended.saturating_duration_since(self.started),
        };

        TraceOutcome {
            phases,
            reused,
            connected: marks.connect_done.is_some(),
            failed: marks.failed,
        }
    }
}

impl TraceListener for PhaseRecorder {
    fn on_event(&self, event: TraceEvent, at: Instant) {
        let mut guard = match self.marks.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let marks = &mut *guard;
        let fail = |marks: &mut Marks, phase: FailPhase| {
            if marks.failed.is_none() {
                marks.failed = Some(phase);
            }
        };
        match event {
            TraceEvent::DnsStart => {
                marks.dns_start.get_or_insert(at);
            }
            TraceEvent::DnsDone => {
                marks.dns_done.get_or_insert(at);
            }
            TraceEvent::ConnectStart => {
                marks.connect_start.get_or_insert(at);
            }
            TraceEvent::ConnectDone => {
                marks.connect_done.get_or_insert(at);
            }
            TraceEvent::TlsStart => {
                marks.tls_start.get_or_insert(at);
            }
            TraceEvent::TlsDone => {
                marks.tls_done.get_or_insert(at);
            }
            TraceEvent::FirstByte => {
                marks.first_byte.get_or_insert(at);
            }
            TraceEvent::DnsFailed => fail(marks, FailPhase::Dns),
            TraceEvent::ConnectFailed => fail(marks, FailPhase::Connect),
            // A TLS failure only counts once a handshake actually began.
            TraceEvent::TlsFailed => {
                if marks.tls_start.is_some() {
                    fail(marks, FailPhase::Tls);
                }
            }
        }
    }
}
