use std::num::{NonZeroU64, NonZeroUsize};
use std::path::PathBuf;
use std::time::Duration;

use http::{HeaderMap, HeaderName, HeaderValue, Method};
use url::Url;

use crate::error::ConfigError;

use super::types::{ConfigFile, DurationValue, LoadConfig, OutputConfig, TargetConfig};

const NANOS_PER_SEC: u64 = 1_000_000_000;

/// Validated, immutable settings for one run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub target: TargetSettings,
    pub load: LoadSettings,
    pub output: OutputSettings,
}

#[derive(Debug, Clone)]
pub struct TargetSettings {
    pub url: Url,
    pub method: Method,
    pub headers: HeaderMap,
    pub body_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy)]
pub struct LoadSettings {
    /// Requests per second.
    pub rate: NonZeroU64,
    pub duration: Duration,
    pub concurrency: NonZeroUsize,
    pub timeout: Duration,
    pub queue_size: NonZeroUsize,
    pub keep_alive: bool,
    pub insecure_tls: bool,
}

#[derive(Debug, Clone)]
pub struct OutputSettings {
    pub results_path: PathBuf,
    pub progress_path: PathBuf,
    pub progress_interval: Duration,
    pub drain_timeout: Duration,
}

impl LoadSettings {
    /// Capacity of the results channel between workers and the sink.
    #[must_use]
    pub const fn results_capacity(&self) -> usize {
        self.concurrency.get().saturating_mul(2)
    }
}

impl RunConfig {
    #[must_use]
    pub fn with_results_path(mut self, path: PathBuf) -> Self {
        self.output.results_path = path;
        self
    }

    #[must_use]
    pub fn with_progress_path(mut self, path: PathBuf) -> Self {
        self.output.progress_path = path;
        self
    }
}

impl ConfigFile {
    /// Checks every field and converts the file into a [`RunConfig`].
    ///
    /// # Errors
    ///
    /// Returns the first invalid field encountered.
    pub fn validate(&self) -> Result<RunConfig, ConfigError> {
        Ok(RunConfig {
            target: validate_target(&self.target)?,
            load: validate_load(&self.load)?,
            output: validate_output(&self.output)?,
        })
    }
}

fn validate_target(target: &TargetConfig) -> Result<TargetSettings, ConfigError> {
    let raw_url = target.url.trim();
    if raw_url.is_empty() {
        return Err(ConfigError::MissingUrl);
    }
    let url = Url::parse(raw_url).map_err(|err| ConfigError::InvalidUrl {
        url: raw_url.to_owned(),
        source: err,
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::UnsupportedScheme {
            scheme: url.scheme().to_owned(),
        });
    }

    let method_name = target.method.trim().to_ascii_uppercase();
    let method = if method_name.is_empty() {
        Method::GET
    } else {
        Method::from_bytes(method_name.as_bytes()).map_err(|err| ConfigError::InvalidMethod {
            value: target.method.clone(),
            source: err,
        })?
    };

    let mut headers = HeaderMap::with_capacity(target.headers.len());
    for (key, value) in &target.headers {
        let name = HeaderName::from_bytes(key.trim().as_bytes()).map_err(|err| {
            ConfigError::InvalidHeaderName {
                header: key.clone(),
                source: err,
            }
        })?;
        let header_value =
            HeaderValue::from_str(value).map_err(|err| ConfigError::InvalidHeaderValue {
                header: key.clone(),
                source: err,
            })?;
        headers.insert(name, header_value);
    }

    Ok(TargetSettings {
        url,
        method,
        headers,
        body_file: target.body_file.clone(),
    })
}

fn validate_load(load: &LoadConfig) -> Result<LoadSettings, ConfigError> {
    let rate = NonZeroU64::new(load.rate)
        .ok_or(ConfigError::FieldMustBePositive { field: "load.rate" })?;
    if rate.get() > NANOS_PER_SEC {
        return Err(ConfigError::RateTooHigh { rate: rate.get() });
    }
    let concurrency = NonZeroUsize::new(load.concurrency).ok_or(
        ConfigError::FieldMustBePositive {
            field: "load.concurrency",
        },
    )?;
    let queue_size = match load.queue_size {
        Some(size) => NonZeroUsize::new(size).ok_or(ConfigError::FieldMustBePositive {
            field: "load.queue_size",
        })?,
        None => concurrency,
    };

    Ok(LoadSettings {
        rate,
        duration: duration_field("load.duration", &load.duration)?,
        concurrency,
        timeout: duration_field("load.timeout", &load.timeout)?,
        queue_size,
        keep_alive: !load.disable_keepalive,
        insecure_tls: load.insecure_tls,
    })
}

fn validate_output(output: &OutputConfig) -> Result<OutputSettings, ConfigError> {
    if output.jsonl_path.as_os_str().is_empty() {
        return Err(ConfigError::EmptyField {
            field: "output.jsonl_path",
        });
    }
    if output.progress_path.as_os_str().is_empty() {
        return Err(ConfigError::EmptyField {
            field: "output.progress_path",
        });
    }
    Ok(OutputSettings {
        results_path: output.jsonl_path.clone(),
        progress_path: output.progress_path.clone(),
        progress_interval: duration_field("output.progress_interval", &output.progress_interval)?,
        drain_timeout: duration_field("output.drain_timeout", &output.drain_timeout)?,
    })
}

fn duration_field(field: &'static str, value: &DurationValue) -> Result<Duration, ConfigError> {
    value
        .to_duration()
        .map_err(|err| ConfigError::InvalidDurationField {
            field,
            source: Box::new(err),
        })
}
