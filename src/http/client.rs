use bytes::Bytes;
use http_body_util::Full;
use hyper_tls::HttpsConnector;
use hyper_util::client::legacy::Client;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::rt::{TokioExecutor, TokioTimer};

use crate::config::LoadSettings;
use crate::error::HttpError;

use super::connect::{TracedResolver, TracedTcp, TracedTls};

/// Shared HTTP client used by every worker of a run.
pub type TracedClient = Client<TracedTls, Full<Bytes>>;

/// Builds the pooled client for a run.
///
/// # Errors
///
/// Returns an error when the TLS connector cannot be initialised.
pub fn build_client(load: &LoadSettings) -> Result<TracedClient, HttpError> {
    let mut http = HttpConnector::new_with_resolver(TracedResolver::new());
    http.enforce_http(false);
    http.set_nodelay(true);
    http.set_connect_timeout(Some(load.timeout));

    let tls = native_tls::TlsConnector::builder()
        .danger_accept_invalid_certs(load.insecure_tls)
        .danger_accept_invalid_hostnames(load.insecure_tls)
        .build()
        .map_err(|source| HttpError::BuildTls { source })?;
    let https = HttpsConnector::from((
        TracedTcp::new(http),
        tokio_native_tls::TlsConnector::from(tls),
    ));

    let mut builder = Client::builder(TokioExecutor::new());
    builder.pool_timer(TokioTimer::new());
    // Each ticket is exactly one attempt.
    builder.retry_canceled_requests(false);
    if load.keep_alive {
        builder.pool_max_idle_per_host(load.concurrency.get());
    } else {
        builder.pool_max_idle_per_host(0);
    }
    Ok(builder.build(TracedTls::new(https)))
}
