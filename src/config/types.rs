use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// On-disk configuration, as read from `shard.json` or `shard.toml`.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct ConfigFile {
    pub target: TargetConfig,
    pub load: LoadConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct TargetConfig {
    pub url: String,
    pub method: String,
    pub headers: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct LoadConfig {
    pub rate: u64,
    pub duration: DurationValue,
    pub concurrency: usize,
    pub timeout: DurationValue,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub queue_size: Option<usize>,
    #[serde(alias = "disable_keep_alive")]
    pub disable_keepalive: bool,
    pub insecure_tls: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct OutputConfig {
    pub jsonl_path: PathBuf,
    pub progress_path: PathBuf,
    pub progress_interval: DurationValue,
    pub drain_timeout: DurationValue,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum DurationValue {
    Seconds(u64),
    Text(String),
}

impl DurationValue {
    pub(crate) fn to_duration(&self) -> Result<Duration, ConfigError> {
        match self {
            DurationValue::Seconds(secs) => {
                if *secs == 0 {
                    Err(ConfigError::DurationZero)
                } else {
                    Ok(Duration::from_secs(*secs))
                }
            }
            DurationValue::Text(text) => super::parse_duration_value(text),
        }
    }

    fn text(value: &str) -> Self {
        DurationValue::Text(value.to_owned())
    }
}

impl ConfigFile {
    /// The configuration written by `shard init`.
    #[must_use]
    pub fn template() -> Self {
        let mut headers = BTreeMap::new();
        headers.insert("User-Agent".to_owned(), "shard/1.0".to_owned());
        Self {
            target: TargetConfig {
                url: "https://example.com".to_owned(),
                method: "GET".to_owned(),
                headers,
                body_file: None,
            },
            load: LoadConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            method: "GET".to_owned(),
            headers: BTreeMap::new(),
            body_file: None,
        }
    }
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            rate: 50,
            duration: DurationValue::text("10s"),
            concurrency: 256,
            timeout: DurationValue::text("10s"),
            queue_size: None,
            disable_keepalive: false,
            insecure_tls: false,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            jsonl_path: PathBuf::from("results.jsonl"),
            progress_path: PathBuf::from("progress.log"),
            progress_interval: DurationValue::text("1s"),
            drain_timeout: DurationValue::text("5s"),
        }
    }
}
