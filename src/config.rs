//! Configuration loading and validation
//!
//! Settings are read from a YAML file at startup. The staleness threshold
//! drives every freshness decision in the pipeline, so a zero value is
//! rejected up front instead of silently discarding all data.

use std::fmt;
use std::fs;
use std::path::Path;

use chrono::Duration;
use chrono_tz::Tz;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Config {
    /// Duration in milliseconds after which a reading or snapshot is stale.
    pub staleness_threshold_ms: u64,
    #[serde(default = "default_store_key")]
    pub observations_store_key: String,
    /// Named zone device timestamps are converted into before comparison.
    #[serde(default = "default_timezone")]
    pub reference_timezone: Tz,
    /// Buffer entries older than `retention_factor` staleness windows are
    /// dropped on append.
    #[serde(default = "default_retention_factor")]
    pub retention_factor: u32,
    pub api: ApiConfig,
    #[serde(default)]
    pub rounds: RoundsConfig,
}

#[derive(Debug, Deserialize)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize)]
pub struct RoundsConfig {
    #[serde(default = "default_rounds_interval")]
    pub interval_secs: u64,
    /// Device ids visited by the automated rounds loop.
    #[serde(default)]
    pub devices: Vec<String>,
}

impl Default for RoundsConfig {
    fn default() -> Self {
        RoundsConfig {
            interval_secs: default_rounds_interval(),
            devices: Vec::new(),
        }
    }
}

fn default_store_key() -> String {
    "observations".to_string()
}

fn default_timezone() -> Tz {
    chrono_tz::Asia::Kolkata
}

fn default_retention_factor() -> u32 {
    8
}

fn default_rounds_interval() -> u64 {
    300
}

impl Config {
    pub fn staleness_window(&self) -> Duration {
        Duration::milliseconds(self.staleness_threshold_ms as i64)
    }

    pub fn retention_window(&self) -> Duration {
        self.staleness_window() * self.retention_factor as i32
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Io(String),
    Parse(String),
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(msg) => write!(f, "Failed to read config: {}", msg),
            ConfigError::Parse(msg) => write!(f, "Failed to parse config: {}", msg),
            ConfigError::Invalid(msg) => write!(f, "Invalid config: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|e| ConfigError::Io(format!("{}: {}", path.display(), e)))?;
    parse_config(&raw)
}

fn parse_config(raw: &str) -> Result<Config, ConfigError> {
    let config: Config =
        serde_yaml::from_str(raw).map_err(|e| ConfigError::Parse(e.to_string()))?;

    if config.staleness_threshold_ms == 0 {
        return Err(ConfigError::Invalid(
            "staleness_threshold_ms must be positive".to_string(),
        ));
    }
    if config.retention_factor == 0 {
        return Err(ConfigError::Invalid(
            "retention_factor must be positive".to_string(),
        ));
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SAMPLE: &str = r#"
staleness_threshold_ms: 5000
api:
  host: "127.0.0.1"
  port: 8090
"#;

    #[test]
    fn parses_minimal_config_with_defaults() {
        let config = parse_config(SAMPLE).unwrap();
        assert_eq!(config.staleness_threshold_ms, 5000);
        assert_eq!(config.observations_store_key, "observations");
        assert_eq!(config.reference_timezone, chrono_tz::Asia::Kolkata);
        assert_eq!(config.retention_factor, 8);
        assert_eq!(config.rounds.interval_secs, 300);
        assert!(config.rounds.devices.is_empty());
    }

    #[test]
    fn retention_window_is_a_multiple_of_the_staleness_window() {
        let config = parse_config(SAMPLE).unwrap();
        assert_eq!(config.retention_window(), config.staleness_window() * 8);
    }

    #[test]
    fn rejects_zero_staleness_threshold() {
        let raw = r#"
staleness_threshold_ms: 0
api:
  host: "127.0.0.1"
  port: 8090
"#;
        assert!(matches!(parse_config(raw), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn parses_named_reference_timezone() {
        let raw = r#"
staleness_threshold_ms: 5000
reference_timezone: "Europe/Berlin"
api:
  host: "127.0.0.1"
  port: 8090
"#;
        let config = parse_config(raw).unwrap();
        assert_eq!(config.reference_timezone, chrono_tz::Europe::Berlin);
    }
}
