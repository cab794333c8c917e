use std::error::Error as StdError;
use std::io;

use crate::metrics::FailPhase;

const DNS_MARKERS: [&str; 4] = [
    "dns error",
    "failed to lookup",
    "no such host",
    "name or service not known",
];
const TLS_MARKERS: [&str; 4] = ["tls", "ssl", "certificate", "handshake"];

/// Maps a failed attempt to its failure class. First match wins:
/// an expired deadline, then the phase the transport reported failing in,
/// then what the error chain itself says.
///
/// `connected` is true when the attempt already held an established
/// connection, so anything left unexplained happened while waiting for the
/// response.
#[must_use]
pub fn classify_failure(
    error: Option<&(dyn StdError + 'static)>,
    timed_out: bool,
    observed: Option<FailPhase>,
    connected: bool,
) -> FailPhase {
    if timed_out || error.is_some_and(chain_timed_out) {
        return FailPhase::Timeout;
    }
    if let Some(phase) = observed {
        return phase;
    }
    let Some(error) = error else {
        return FailPhase::Other;
    };

    let message = chain_message(error);
    if DNS_MARKERS.iter().any(|marker| message.contains(marker)) {
        return FailPhase::Dns;
    }
    if TLS_MARKERS.iter().any(|marker| message.contains(marker)) {
        return FailPhase::Tls;
    }
    if chain(error).any(is_connect_error) {
        return FailPhase::Connect;
    }
    if connected || chain(error).any(is_response_error) {
        return FailPhase::Ttfb;
    }
    FailPhase::Other
}

fn chain<'err>(
    error: &'err (dyn StdError + 'static),
) -> impl Iterator<Item = &'err (dyn StdError + 'static)> {
    std::iter::successors(Some(error), |&err| err.source())
}

fn chain_message(error: &(dyn StdError + 'static)) -> String {
    chain(error)
        .map(|err| err.to_string().to_lowercase())
        .collect::<Vec<_>>()
        .join(": ")
}

fn chain_timed_out(error: &(dyn StdError + 'static)) -> bool {
    chain(error).any(|err| {
        err.downcast_ref::<io::Error>()
            .is_some_and(|io| io.kind() == io::ErrorKind::TimedOut)
            || err.downcast_ref::<hyper::Error>().is_some_and(hyper::Error::is_timeout)
    })
}

fn is_connect_error(error: &(dyn StdError + 'static)) -> bool {
    if let Some(io) = error.downcast_ref::<io::Error>() {
        return matches!(
            io.kind(),
            io::ErrorKind::ConnectionRefused
                | io::ErrorKind::AddrNotAvailable
                | io::ErrorKind::HostUnreachable
                | io::ErrorKind::NetworkUnreachable
        );
    }
    error
        .downcast_ref::<hyper_util::client::legacy::Error>()
        .is_some_and(hyper_util::client::legacy::Error::is_connect)
}

fn is_response_error(error: &(dyn StdError + 'static)) -> bool {
    if let Some(hyper) = error.downcast_ref::<hyper::Error>() {
        return hyper.is_incomplete_message()
            || hyper.is_closed()
            || hyper.is_parse()
            || hyper.is_canceled()
            || hyper.is_body_write_aborted();
    }
    error.downcast_ref::<io::Error>().is_some_and(|io| {
        matches!(
            io.kind(),
            io::ErrorKind::ConnectionReset
                | io::ErrorKind::ConnectionAborted
                | io::ErrorKind::BrokenPipe
                | io::ErrorKind::UnexpectedEof
        )
    })
}
