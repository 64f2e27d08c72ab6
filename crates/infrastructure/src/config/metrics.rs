//! Metrics sink configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::common::{ConfigError, check_http_url, check_positive, validation};
use crate::constants::{DEFAULT_FLUSH_INTERVAL_SECS, DEFAULT_METRICS_JOB, DEFAULT_PUSH_TIMEOUT_MS};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlushModeConfig {
    /// Push after every alert.
    #[default]
    PerAlert,
    /// Push on a timer when the snapshot changed.
    Interval,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MetricsConfig {
    /// Pushgateway base URL. Without it metrics stay in memory.
    #[serde(default)]
    pub pushgateway_url: Option<String>,

    #[serde(default = "default_job")]
    pub job: String,

    #[serde(default)]
    pub flush_mode: FlushModeConfig,

    #[serde(default = "default_flush_interval_secs")]
    pub flush_interval_secs: u64,

    #[serde(default = "default_push_timeout_ms")]
    pub push_timeout_ms: u64,
}

fn default_job() -> String {
    DEFAULT_METRICS_JOB.to_string()
}
fn default_flush_interval_secs() -> u64 {
    DEFAULT_FLUSH_INTERVAL_SECS
}
fn default_push_timeout_ms() -> u64 {
    DEFAULT_PUSH_TIMEOUT_MS
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            pushgateway_url: None,
            job: default_job(),
            flush_mode: FlushModeConfig::default(),
            flush_interval_secs: default_flush_interval_secs(),
            push_timeout_ms: default_push_timeout_ms(),
        }
    }
}

impl MetricsConfig {
    pub(super) fn validate(&self) -> Result<(), ConfigError> {
        if let Some(ref url) = self.pushgateway_url {
            check_http_url("metrics.pushgateway_url", url)?;
        }
        if self.job.is_empty() || self.job.contains('/') {
            return Err(validation(
                "metrics.job",
                "job name must be non-empty and contain no '/'",
            ));
        }
        if self.flush_mode == FlushModeConfig::Interval {
            check_positive("metrics.flush_interval_secs", self.flush_interval_secs)?;
        }
        check_positive("metrics.push_timeout_ms", self.push_timeout_ms)?;
        Ok(())
    }

    pub fn flush_interval(&self) -> Duration {
        Duration::from_secs(self.flush_interval_secs)
    }

    pub fn push_timeout(&self) -> Duration {
        Duration::from_millis(self.push_timeout_ms)
    }
}
