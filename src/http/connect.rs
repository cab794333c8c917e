//! Connector layers that report DNS, TCP and TLS boundaries as trace events.
//!
//! The stack is `TracedTls<HttpsConnector<TracedTcp<HttpConnector<TracedResolver>>>>`:
//! each layer wraps the next one's future and emits events on completion, so
//! the events land on whichever request is polling the connect.

use std::error::Error as StdError;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use http::Uri;
use http::uri::Scheme;
use hyper_tls::{HttpsConnector, MaybeHttpsStream};
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::connect::dns::{GaiAddrs, GaiResolver, Name};
use tower_service::Service;

use super::trace::{TraceEvent, emit};

type BoxError = Box<dyn StdError + Send + Sync>;
type BoxFuture<T, E> = Pin<Box<dyn Future<Output = Result<T, E>> + Send>>;
type TcpStream = <HttpConnector<TracedResolver> as Service<Uri>>::Response;
type TcpError = <HttpConnector<TracedResolver> as Service<Uri>>::Error;

fn is_https(uri: &Uri) -> bool {
    uri.scheme() == Some(&Scheme::HTTPS)
}

/// System resolver that reports lookup start and end.
#[derive(Clone)]
pub struct TracedResolver {
    inner: GaiResolver,
}

impl TracedResolver {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: GaiResolver::new(),
        }
    }
}

impl Default for TracedResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl Service<Name> for TracedResolver {
    type Response = GaiAddrs;
    type Error = std::io::Error;
    type Future = BoxFuture<Self::Response, Self::Error>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, name: Name) -> Self::Future {
        emit(TraceEvent::DnsStart);
        let resolving = self.inner.call(name);
        Box::pin(async move {
            let resolved = resolving.await;
            emit(if resolved.is_ok() {
                TraceEvent::DnsDone
            } else {
                TraceEvent::DnsFailed
            });
            resolved
        })
    }
}

/// TCP connector that reports connection establishment, and the start of
/// the TLS handshake for `https` targets.
#[derive(Clone)]
pub struct TracedTcp {
    inner: HttpConnector<TracedResolver>,
}

impl TracedTcp {
    #[must_use]
    pub const fn new(inner: HttpConnector<TracedResolver>) -> Self {
        Self { inner }
    }
}

impl Service<Uri> for TracedTcp {
    type Response = TcpStream;
    type Error = TcpError;
    type Future = BoxFuture<Self::Response, Self::Error>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, uri: Uri) -> Self::Future {
        let secure = is_https(&uri);
        emit(TraceEvent::ConnectStart);
        let connecting = self.inner.call(uri);
        Box::pin(async move {
            match connecting.await {
                Ok(stream) => {
                    emit(TraceEvent::ConnectDone);
                    if secure {
                        emit(TraceEvent::TlsStart);
                    }
                    Ok(stream)
                }
                Err(err) => {
                    emit(TraceEvent::ConnectFailed);
                    Err(err)
                }
            }
        })
    }
}

/// Outermost layer; reports the end of the TLS handshake.
#[derive(Clone)]
pub struct TracedTls {
    inner: HttpsConnector<TracedTcp>,
}

impl TracedTls {
    #[must_use]
    pub const fn new(inner: HttpsConnector<TracedTcp>) -> Self {
        Self { inner }
    }
}

impl Service<Uri> for TracedTls {
    type Response = MaybeHttpsStream<TcpStream>;
    type Error = BoxError;
    type Future = BoxFuture<Self::Response, Self::Error>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, uri: Uri) -> Self::Future {
        let secure = is_https(&uri);
        let connecting = self.inner.call(uri);
        Box::pin(async move {
            let connected = connecting.await;
            if secure {
                emit(if connected.is_ok() {
                    TraceEvent::TlsDone
                } else {
                    TraceEvent::TlsFailed
                });
            }
            connected
        })
    }
}
