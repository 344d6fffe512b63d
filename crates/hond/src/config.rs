//! Configuration file parsing and structures.
//!
//! hond reads a single TOML file: logging, the HTTP API and one section per
//! native integration.

use std::collections::HashMap;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::filter::Targets;

use crate::integrations::hon::HonConfig;

/// Top-level configuration structure
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub integrations: IntegrationsConfig,

    /// HTTP API; disabled when the section is absent
    #[serde(default)]
    pub api: Option<ApiConfig>,
}

#[derive(Debug, Default, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => LevelFilter::TRACE,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Error => LevelFilter::ERROR,
        }
    }
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default)]
    pub level: LogLevel,

    /// Per-target levels, e.g. `"hond::integrations::hon" = "debug"`
    #[serde(default)]
    pub overrides: HashMap<String, LogLevel>,
}

impl LoggingConfig {
    /// Filter for the tracing subscriber.
    pub fn targets(&self) -> Targets {
        Targets::new()
            .with_default(LevelFilter::from(self.level))
            .with_targets(
                self.overrides
                    .iter()
                    .map(|(target, level)| (target.clone(), LevelFilter::from(*level))),
            )
    }
}

/// Native integration configuration container
#[derive(Debug, Default, Deserialize)]
pub struct IntegrationsConfig {
    #[serde(default)]
    pub hon: Option<HonConfig>,
}

fn default_listen() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8565
}

/// HTTP API configuration
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_listen")]
    pub listen: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

impl Config {
    /// Load and validate configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::Io(path.as_ref().to_path_buf(), e))?;

        contents.parse()
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(hon) = &self.integrations.hon {
            if hon.update_interval_secs == 0 {
                return Err(ConfigError::Invalid(
                    "integrations.hon.update_interval_secs must be greater than 0".to_string(),
                ));
            }
        }
        Ok(())
    }
}

impl std::str::FromStr for Config {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let config: Config = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {0}: {1}")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::time::Duration;

    use super::*;

    #[test]
    fn test_parse_empty_config() {
        let config: Config = "".parse().unwrap();
        assert_eq!(config.logging.level, LogLevel::Info);
        assert!(config.integrations.hon.is_none());
        assert!(config.api.is_none());
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
            [logging]
            level = "warn"

            [logging.overrides]
            "hond::integrations::hon" = "debug"

            [integrations.hon]
            fixtures = "/var/lib/hond/appliances"
            update_interval_secs = 30

            [api]
            port = 9000
        "#;

        let config: Config = toml.parse().unwrap();
        assert_eq!(config.logging.level, LogLevel::Warn);
        assert_eq!(
            config.logging.overrides.get("hond::integrations::hon"),
            Some(&LogLevel::Debug)
        );

        let hon = config.integrations.hon.as_ref().unwrap();
        assert!(hon.enabled);
        assert_eq!(hon.update_interval(), Duration::from_secs(30));

        let api = config.api.unwrap();
        assert_eq!(api.listen, "127.0.0.1");
        assert_eq!(api.port, 9000);
    }

    #[test]
    fn test_zero_interval_is_invalid() {
        let toml = r#"
            [integrations.hon]
            fixtures = "appliances"
            update_interval_secs = 0
        "#;

        let err = toml.parse::<Config>().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_unknown_log_level() {
        let err = "[logging]\nlevel = \"loud\"".parse::<Config>().unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[api]\nlisten = \"0.0.0.0\"").unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.api.unwrap().listen, "0.0.0.0");

        let err = Config::from_file("/nonexistent/hond.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io(..)));
    }

    #[test]
    fn test_targets() {
        let mut logging = LoggingConfig::default();
        logging
            .overrides
            .insert("hond::integrations::hon".to_string(), LogLevel::Debug);

        let targets = logging.targets();
        assert!(targets.would_enable("hond::integrations::hon::coordinator", &tracing::Level::DEBUG));
        assert!(!targets.would_enable("hond::engine", &tracing::Level::DEBUG));
        assert!(targets.would_enable("hond::engine", &tracing::Level::INFO));
    }
}
