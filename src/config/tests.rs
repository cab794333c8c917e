use super::{
    ConfigFile, load_config_file, parse_duration_value,
    types::{DurationValue, LoadConfig},
    write_default_config,
};
use crate::error::ConfigError;
use std::time::Duration;
use tempfile::tempdir;

fn sample_config() -> ConfigFile {
    let mut config = ConfigFile::template();
    config.target.url = "http://127.0.0.1:8080/health".to_owned();
    config
}

#[test]
fn parse_json_config() -> Result<(), String> {
    let dir = tempdir().map_err(|err| format!("tempdir failed: {}", err))?;
    let path = dir.path().join("shard.json");
    let content = r#"{
  "target": {
    "url": "http://localhost:3000/api",
    "method": "post",
    "headers": { "Content-Type": "application/json" },
    "body_file": "body.json"
  },
  "load": {
    "rate": 200,
    "duration": "30s",
    "concurrency": 16,
    "timeout": "2s",
    "disable_keepalive": true,
    "insecure_tls": true
  },
  "output": { "jsonl_path": "out.jsonl" }
}"#;
    std::fs::write(&path, content).map_err(|err| format!("write failed: {}", err))?;

    let config = load_config_file(&path).map_err(|err| err.to_string())?;
    if config.target.url != "http://localhost:3000/api" {
        return Err(format!("Unexpected url: {}", config.target.url));
    }
    if config.load.rate != 200 || config.load.concurrency != 16 {
        return Err("Unexpected load settings".to_owned());
    }
    if !config.load.disable_keepalive || !config.load.insecure_tls {
        return Err("Expected toggles to be set".to_owned());
    }
    if config.output.progress_path.as_os_str() != "progress.log" {
        return Err("Expected default progress path".to_owned());
    }

    let run = config.validate().map_err(|err| err.to_string())?;
    if run.target.method != http::Method::POST {
        return Err(format!("Unexpected method: {}", run.target.method));
    }
    if run.load.keep_alive {
        return Err("Expected keep-alive to be disabled".to_owned());
    }
    if run.load.queue_size.get() != 16 {
        return Err("Expected queue size to default to concurrency".to_owned());
    }
    if run.load.timeout != Duration::from_secs(2) {
        return Err("Unexpected timeout".to_owned());
    }
    Ok(())
}

#[test]
fn parse_toml_config() -> Result<(), String> {
    let dir = tempdir().map_err(|err| format!("tempdir failed: {}", err))?;
    let path = dir.path().join("shard.toml");
    let content = r#"
[target]
url = "https://example.com"

[load]
rate = 5
duration = 60
concurrency = 2
timeout = "500ms"
queue_size = 8
"#;
    std::fs::write(&path, content).map_err(|err| format!("write failed: {}", err))?;

    let config = load_config_file(&path).map_err(|err| err.to_string())?;
    if config.load.duration != DurationValue::Seconds(60) {
        return Err("Expected numeric duration".to_owned());
    }
    let run = config.validate().map_err(|err| err.to_string())?;
    if run.load.duration != Duration::from_secs(60) {
        return Err("Unexpected duration".to_owned());
    }
    if run.load.rate.get() != 5 {
        return Err(format!("Unexpected rate: {}", run.load.rate));
    }
    if run.load.queue_size.get() != 8 {
        return Err("Unexpected queue size".to_owned());
    }
    Ok(())
}

#[test]
fn unsupported_extension_is_rejected() -> Result<(), String> {
    let dir = tempdir().map_err(|err| format!("tempdir failed: {}", err))?;
    let path = dir.path().join("shard.yaml");
    std::fs::write(&path, "target: {}").map_err(|err| format!("write failed: {}", err))?;
    if load_config_file(&path).is_ok() {
        return Err("Expected unsupported extension error".to_owned());
    }
    Ok(())
}

#[test]
fn default_config_round_trips() -> Result<(), String> {
    let dir = tempdir().map_err(|err| format!("tempdir failed: {}", err))?;
    let path = dir.path().join("shard.json");
    write_default_config(&path).map_err(|err| err.to_string())?;
    let loaded = load_config_file(&path).map_err(|err| err.to_string())?;
    if loaded != ConfigFile::template() {
        return Err(format!("Unexpected default config: {:?}", loaded));
    }
    loaded.validate().map_err(|err| err.to_string())?;
    Ok(())
}

#[test]
fn missing_url_is_rejected() -> Result<(), String> {
    let config = ConfigFile::default();
    match config.validate() {
        Err(ConfigError::MissingUrl) => Ok(()),
        Err(err) => Err(format!("Unexpected error: {}", err)),
        Ok(_) => Err("Expected missing url error".to_owned()),
    }
}

#[test]
fn non_http_scheme_is_rejected() -> Result<(), String> {
    let mut config = sample_config();
    config.target.url = "ftp://example.com/file".to_owned();
    match config.validate() {
        Err(ConfigError::UnsupportedScheme { scheme }) if scheme == "ftp" => Ok(()),
        Err(err) => Err(format!("Unexpected error: {}", err)),
        Ok(_) => Err("Expected scheme error".to_owned()),
    }
}

#[test]
fn zero_rate_and_concurrency_are_rejected() -> Result<(), String> {
    let mut config = sample_config();
    config.load.rate = 0;
    if !matches!(
        config.validate(),
        Err(ConfigError::FieldMustBePositive { field: "load.rate" })
    ) {
        return Err("Expected rate error".to_owned());
    }

    let mut config = sample_config();
    config.load.concurrency = 0;
    if !matches!(
        config.validate(),
        Err(ConfigError::FieldMustBePositive {
            field: "load.concurrency"
        })
    ) {
        return Err("Expected concurrency error".to_owned());
    }
    Ok(())
}

#[test]
fn rate_above_nanosecond_resolution_is_rejected() -> Result<(), String> {
    let mut config = sample_config();
    config.load = LoadConfig {
        rate: 2_000_000_000,
        ..LoadConfig::default()
    };
    match config.validate() {
        Err(ConfigError::RateTooHigh { rate }) if rate == 2_000_000_000 => Ok(()),
        Err(err) => Err(format!("Unexpected error: {}", err)),
        Ok(_) => Err("Expected rate error".to_owned()),
    }
}

#[test]
fn invalid_header_is_rejected() -> Result<(), String> {
    let mut config = sample_config();
    config
        .target
        .headers
        .insert("Bad Header".to_owned(), "value".to_owned());
    if !matches!(
        config.validate(),
        Err(ConfigError::InvalidHeaderName { .. })
    ) {
        return Err("Expected header name error".to_owned());
    }
    Ok(())
}

#[test]
fn parse_duration_units() -> Result<(), String> {
    let cases = [
        ("250ms", Duration::from_millis(250)),
        ("10s", Duration::from_secs(10)),
        ("2m", Duration::from_secs(120)),
        ("1h", Duration::from_secs(3600)),
        ("1m30s", Duration::from_secs(90)),
        ("15", Duration::from_secs(15)),
        ("1.5s", Duration::from_millis(1_500)),
        ("0.25h", Duration::from_secs(900)),
        ("1m0.5s", Duration::from_millis(60_500)),
        (".5ms", Duration::from_micros(500)),
        ("300µs", Duration::from_micros(300)),
        ("1.0000000005s", Duration::from_nanos(1_000_000_000)),
    ];
    for (input, expected) in cases {
        let parsed = parse_duration_value(input).map_err(|err| err.to_string())?;
        if parsed != expected {
            return Err(format!("{} parsed to {:?}", input, parsed));
        }
    }
    Ok(())
}

#[test]
fn parse_duration_rejects_bad_input() -> Result<(), String> {
    for input in ["", "0s", "abc", "10x", "5m3", "1.2.3s", ".s", "0.0000000001s"] {
        if parse_duration_value(input).is_ok() {
            return Err(format!("Expected {} to be rejected", input));
        }
    }
    Ok(())
}
