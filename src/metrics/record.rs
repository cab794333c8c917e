use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Failure taxonomy; doubles as the failing-phase tag of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailPhase {
    Timeout,
    Dns,
    Connect,
    Tls,
    Ttfb,
    Other,
}

impl FailPhase {
    pub const ALL: [FailPhase; 6] = [
        FailPhase::Timeout,
        FailPhase::Dns,
        FailPhase::Connect,
        FailPhase::Tls,
        FailPhase::Ttfb,
        FailPhase::Other,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            FailPhase::Timeout => "timeout",
            FailPhase::Dns => "dns",
            FailPhase::Connect => "connect",
            FailPhase::Tls => "tls",
            FailPhase::Ttfb => "ttfb",
            FailPhase::Other => "other",
        }
    }

    pub(crate) const fn index(self) -> usize {
        match self {
            FailPhase::Timeout => 0,
            FailPhase::Dns => 1,
            FailPhase::Connect => 2,
            FailPhase::Tls => 3,
            FailPhase::Ttfb => 4,
            FailPhase::Other => 5,
        }
    }
}

impl fmt::Display for FailPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Leading digit of an HTTP status code, for 2xx through 5xx.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StatusFamily {
    Success,
    Redirection,
    ClientError,
    ServerError,
}

impl StatusFamily {
    pub const ALL: [StatusFamily; 4] = [
        StatusFamily::Success,
        StatusFamily::Redirection,
        StatusFamily::ClientError,
        StatusFamily::ServerError,
    ];

    #[must_use]
    pub const fn from_code(code: u16) -> Option<Self> {
        match code {
            200..=299 => Some(StatusFamily::Success),
            300..=399 => Some(StatusFamily::Redirection),
            400..=499 => Some(StatusFamily::ClientError),
            500..=599 => Some(StatusFamily::ServerError),
            _ => None,
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            StatusFamily::Success => "2xx",
            StatusFamily::Redirection => "3xx",
            StatusFamily::ClientError => "4xx",
            StatusFamily::ServerError => "5xx",
        }
    }

    pub(crate) const fn index(self) -> usize {
        match self {
            StatusFamily::Success => 0,
            StatusFamily::Redirection => 1,
            StatusFamily::ClientError => 2,
            StatusFamily::ServerError => 3,
        }
    }
}

impl fmt::Display for StatusFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.label())
    }
}

/// Per-phase durations of one request. Every phase except `total` is the
/// increment since the previous phase boundary; phases that did not happen
/// (DNS or connect on a reused connection, TLS on plain HTTP) stay zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseTimings {
    #[serde(with = "nanos")]
    pub dns: Duration,
    #[serde(with = "nanos")]
    pub connect: Duration,
    #[serde(with = "nanos")]
    pub tls: Duration,
    #[serde(with = "nanos")]
    pub ttfb: Duration,
    #[serde(with = "nanos")]
    pub total: Duration,
}

impl PhaseTimings {
    pub const NAMES: [&'static str; 5] = ["dns", "connect", "tls", "ttfb", "total"];

    /// `(name, duration)` pairs in [`Self::NAMES`] order.
    #[must_use]
    pub const fn named(&self) -> [(&'static str, Duration); 5] {
        [
            ("dns", self.dns),
            ("connect", self.connect),
            ("tls", self.tls),
            ("ttfb", self.ttfb),
            ("total", self.total),
        ]
    }

    /// Sum of the incremental phases, excluding `total`.
    #[must_use]
    pub fn incremental_sum(&self) -> Duration {
        [self.dns, self.connect, self.tls, self.ttfb]
            .into_iter()
            .fold(Duration::ZERO, Duration::saturating_add)
    }
}

/// One line of the JSONL result stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestRecord {
    #[serde(rename = "ts")]
    pub timestamp: DateTime<Utc>,
    /// Status code, 0 when no response arrived.
    pub code: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<FailPhase>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fail_phase: Option<FailPhase>,
    pub reused: bool,
    pub phases: PhaseTimings,
}

impl RequestRecord {
    #[must_use]
    pub const fn success(
        timestamp: DateTime<Utc>,
        code: u16,
        reused: bool,
        phases: PhaseTimings,
    ) -> Self {
        Self {
            timestamp,
            code,
            error: None,
            fail_phase: None,
            reused,
            phases,
        }
    }

    #[must_use]
    pub const fn failure(
        timestamp: DateTime<Utc>,
        phase: FailPhase,
        reused: bool,
        phases: PhaseTimings,
    ) -> Self {
        Self {
            timestamp,
            code: 0,
            error: Some(phase),
            fail_phase: Some(phase),
            reused,
            phases,
        }
    }

    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.error.is_none()
    }

    #[must_use]
    pub const fn status_family(&self) -> Option<StatusFamily> {
        StatusFamily::from_code(self.code)
    }
}

mod nanos {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub(super) fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX))
    }

    pub(super) fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        u64::deserialize(deserializer).map(Duration::from_nanos)
    }
}
