//! Agent configuration: structs, parsing, and validation.
//!
//! - `common`: shared helpers and `ConfigError`
//! - `alerts`, `controller`, `metrics`: per-section configs

mod alerts;
mod common;
mod controller;
mod metrics;

pub use alerts::AlertsConfig;
pub use common::{ConfigError, mask_url_credentials};
pub use controller::ControllerConfig;
pub use metrics::{FlushModeConfig, MetricsConfig};

use std::path::Path;

use serde::{Deserialize, Serialize};

use common::warn_if_world_readable;

// ── Top-level config ───────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    #[serde(default)]
    pub agent: AgentInfo,

    pub alerts: AlertsConfig,

    #[serde(default)]
    pub controller: ControllerConfig,

    #[serde(default)]
    pub metrics: MetricsConfig,
}

impl AgentConfig {
    /// Load config from a YAML file.
    ///
    /// On Unix, logs a warning if the file is world-readable, since
    /// controller and Pushgateway URLs may carry credentials.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        warn_if_world_readable(path, "config file");
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse config from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml_ng::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Return a copy of the config with URL credentials masked.
    #[must_use]
    pub fn sanitized(&self) -> Self {
        let mut sanitized = self.clone();
        sanitized.controller.url = mask_url_credentials(&sanitized.controller.url);
        if let Some(ref mut url) = sanitized.metrics.pushgateway_url {
            *url = mask_url_credentials(url);
        }
        sanitized
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.alerts.validate()?;
        self.controller.validate()?;
        self.metrics.validate()?;
        Ok(())
    }
}

// ── Agent info ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AgentInfo {
    #[serde(default = "default_log_level")]
    pub log_level: LogLevel,

    #[serde(default = "default_log_format")]
    pub log_format: LogFormat,
}

impl Default for AgentInfo {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: default_log_format(),
        }
    }
}

fn default_log_level() -> LogLevel {
    LogLevel::Info
}
fn default_log_format() -> LogFormat {
    LogFormat::Json
}

// ── Log level ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "error" => Ok(Self::Error),
            "warn" | "warning" => Ok(Self::Warn),
            "info" => Ok(Self::Info),
            "debug" => Ok(Self::Debug),
            "trace" => Ok(Self::Trace),
            _ => Err(format!(
                "invalid log level '{s}': expected error|warn|info|debug|trace"
            )),
        }
    }
}

// ── Log format ────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Json,
    Text,
}

impl LogFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Text => "text",
        }
    }
}

impl std::fmt::Display for LogFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "text" | "pretty" => Ok(Self::Text),
            _ => Err(format!("invalid log format '{s}': expected json|text")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::time::Duration;

    const MINIMAL: &str = r"
alerts:
  path: /var/log/snort/alert_json.txt
";

    // ── Loading ───────────────────────────────────────────────────

    #[test]
    fn load_minimal_config() {
        let config = AgentConfig::from_yaml(MINIMAL).unwrap();
        assert_eq!(config.alerts.path, "/var/log/snort/alert_json.txt");
        assert_eq!(config.agent.log_level, LogLevel::Info);
        assert_eq!(config.agent.log_format, LogFormat::Json);
        assert_eq!(config.controller.url, "http://127.0.0.1:8080");
        assert_eq!(config.metrics.job, "ddos_mitigation");
        assert!(config.metrics.pushgateway_url.is_none());
    }

    #[test]
    fn missing_alerts_section_fails() {
        let err = AgentConfig::from_yaml("agent:\n  log_level: debug\n").unwrap_err();
        assert!(matches!(err, ConfigError::Yaml(_)));
    }

    #[test]
    fn unknown_top_level_key_fails() {
        let yaml = format!("{MINIMAL}\ndashboard:\n  enabled: true\n");
        assert!(AgentConfig::from_yaml(&yaml).is_err());
    }

    #[test]
    fn load_full_config() {
        let yaml = r"
agent:
  log_level: debug
  log_format: text
alerts:
  path: /tmp/alerts.json
  poll_interval_ms: 250
  trigger_keyword: flood
  channel_capacity: 64
  fields:
    source_fields: [src_addr]
    protocol_fields: [proto]
    message_fields: [msg]
controller:
  url: http://ryu.lab:8080
  dry_run: true
  switch_poll_interval_secs: 2
  request_timeout_ms: 500
  drop_priority: 200
  default_flow_priority: 10
  install_table_miss: true
  replay_on_join: false
metrics:
  pushgateway_url: http://localhost:9091
  job: lab
  flush_mode: interval
  flush_interval_secs: 5
  push_timeout_ms: 1000
";
        let config = AgentConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.agent.log_level, LogLevel::Debug);
        assert_eq!(config.agent.log_format, LogFormat::Text);
        assert_eq!(config.alerts.poll_interval(), Duration::from_millis(250));
        assert_eq!(config.alerts.trigger_policy().unwrap().keyword(), "flood");
        assert_eq!(config.alerts.fields.source_fields, vec!["src_addr"]);
        assert!(config.controller.dry_run);
        assert_eq!(config.controller.drop_priority, 200);
        assert!(config.controller.install_table_miss);
        assert!(!config.controller.replay_on_join);
        assert_eq!(
            config.metrics.pushgateway_url.as_deref(),
            Some("http://localhost:9091")
        );
        assert_eq!(config.metrics.flush_mode, FlushModeConfig::Interval);
    }

    #[test]
    fn invalid_section_propagates() {
        let yaml = format!("{MINIMAL}\ncontroller:\n  drop_priority: 1\n");
        let err = AgentConfig::from_yaml(&yaml).unwrap_err();
        assert!(matches!(err, ConfigError::Validation { .. }));
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(MINIMAL.as_bytes()).unwrap();
        let config = AgentConfig::load(file.path()).unwrap();
        assert_eq!(config.alerts.path, "/var/log/snort/alert_json.txt");
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let err = AgentConfig::load(Path::new("/nonexistent/fabricguard.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn sanitized_masks_url_credentials() {
        let yaml = format!(
            "{MINIMAL}\ncontroller:\n  url: http://ops:pw@ryu:8080\nmetrics:\n  pushgateway_url: https://u:p@push:9091\n"
        );
        let config = AgentConfig::from_yaml(&yaml).unwrap().sanitized();
        assert_eq!(config.controller.url, "http://***@ryu:8080");
        assert_eq!(
            config.metrics.pushgateway_url.as_deref(),
            Some("https://***@push:9091")
        );
    }

    // ── LogLevel / LogFormat ──────────────────────────────────────

    #[test]
    fn log_level_parse() {
        assert_eq!("WARNING".parse::<LogLevel>().unwrap(), LogLevel::Warn);
        assert_eq!(LogLevel::Trace.to_string(), "trace");
        assert!("loud".parse::<LogLevel>().is_err());
    }

    #[test]
    fn log_format_parse() {
        assert_eq!("json".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("pretty".parse::<LogFormat>().unwrap(), LogFormat::Text);
        assert!("xml".parse::<LogFormat>().is_err());
    }
}
