use std::error::Error as StdError;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::Utc;
use http_body_util::BodyExt;
use tracing::debug;

use crate::metrics::RequestRecord;
use crate::runner::{RequestExecutor, WorkTicket};

use super::classify::classify_failure;
use super::client::TracedClient;
use super::template::RequestTemplate;
use super::trace::{PhaseRecorder, TraceEvent, TraceListener, traced};

/// Executes one instrumented request per ticket against the shared client.
#[derive(Clone)]
pub struct RequestTracer {
    client: TracedClient,
    template: Arc<RequestTemplate>,
    timeout: Duration,
}

enum Attempt {
    Responded(u16),
    Failed(hyper_util::client::legacy::Error),
}

impl RequestTracer {
    #[must_use]
    pub fn new(client: TracedClient, template: Arc<RequestTemplate>, timeout: Duration) -> Self {
        Self {
            client,
            template,
            timeout,
        }
    }

    /// Runs one request to completion or to its deadline. Never fails: every
    /// outcome becomes a record.
    pub async fn trace(&self) -> RequestRecord {
        let timestamp = Utc::now();
        let started = Instant::now();
        let deadline = tokio::time::Instant::from_std(started).checked_add(self.timeout);
        let recorder = Arc::new(PhaseRecorder::new(started));
        let listener: Arc<dyn TraceListener> = recorder.clone();

        let attempt = within(deadline, traced(listener, self.attempt(&recorder, deadline))).await;
        let responded = matches!(attempt, Some(Attempt::Responded(_)));
        let outcome = recorder.finish(Instant::now(), responded);

        match attempt {
            Some(Attempt::Responded(code)) => {
                RequestRecord::success(timestamp, code, outcome.reused, outcome.phases)
            }
            Some(Attempt::Failed(err)) => {
                let source: &(dyn StdError + 'static) = &err;
                let phase = classify_failure(
                    Some(source),
                    false,
                    outcome.failed,
                    outcome.connected || outcome.reused,
                );
                debug!("Request failed in {} phase: {}", phase, err);
                RequestRecord::failure(timestamp, phase, outcome.reused, outcome.phases)
            }
            None => {
                let phase = classify_failure(None, true, outcome.failed, false);
                debug!("Request exceeded its {:?} deadline", self.timeout);
                RequestRecord::failure(timestamp, phase, outcome.reused, outcome.phases)
            }
        }
    }

    async fn attempt(
        &self,
        recorder: &PhaseRecorder,
        deadline: Option<tokio::time::Instant>,
    ) -> Attempt {
        let response = match self.client.request(self.template.to_request()).await {
            Ok(response) => response,
            Err(err) => return Attempt::Failed(err),
        };
        recorder.on_event(TraceEvent::FirstByte, Instant::now());
        let code = response.status().as_u16();

        // The body is drained and discarded; a broken body still counts as
        // a response.
        match within(deadline, response.into_body().collect()).await {
            Some(Ok(_)) => {}
            Some(Err(err)) => debug!("Failed to drain response body: {}", err),
            None => debug!("Response body did not finish before the deadline"),
        }
        Attempt::Responded(code)
    }
}

async fn within<F>(deadline: Option<tokio::time::Instant>, future: F) -> Option<F::Output>
where
    F: Future,
{
    match deadline {
        Some(deadline) => tokio::time::timeout_at(deadline, future).await.ok(),
        None => Some(future.await),
    }
}

#[async_trait]
impl RequestExecutor for RequestTracer {
    async fn execute(&self, _ticket: WorkTicket) -> RequestRecord {
        self.trace().await
    }
}
