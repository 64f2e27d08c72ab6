//! Alert source configuration.

use std::time::Duration;

use domain::alert::entity::AlertFieldMapping;
use domain::mitigation::entity::{DEFAULT_TRIGGER_KEYWORD, TriggerPolicy};
use serde::{Deserialize, Serialize};

use super::common::{ConfigError, check_positive, validation};
use crate::constants::{ALERT_CHANNEL_CAPACITY, DEFAULT_ALERT_POLL_INTERVAL_MS};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AlertsConfig {
    /// Newline-delimited JSON alert log written by the detection engine.
    pub path: String,

    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Case-insensitive substring that marks an alert as actionable.
    #[serde(default = "default_trigger_keyword")]
    pub trigger_keyword: String,

    #[serde(default)]
    pub fields: AlertFieldMapping,

    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

fn default_poll_interval_ms() -> u64 {
    DEFAULT_ALERT_POLL_INTERVAL_MS
}
fn default_trigger_keyword() -> String {
    DEFAULT_TRIGGER_KEYWORD.to_string()
}
fn default_channel_capacity() -> usize {
    ALERT_CHANNEL_CAPACITY
}

impl AlertsConfig {
    pub(super) fn validate(&self) -> Result<(), ConfigError> {
        if self.path.trim().is_empty() {
            return Err(validation("alerts.path", "alert log path is required"));
        }
        check_positive("alerts.poll_interval_ms", self.poll_interval_ms)?;
        check_positive("alerts.channel_capacity", self.channel_capacity as u64)?;
        TriggerPolicy::new(&self.trigger_keyword)
            .map_err(|e| validation("alerts.trigger_keyword", e.to_string()))?;

        for (field, aliases) in [
            ("alerts.fields.source_fields", &self.fields.source_fields),
            ("alerts.fields.protocol_fields", &self.fields.protocol_fields),
            ("alerts.fields.message_fields", &self.fields.message_fields),
        ] {
            if aliases.is_empty() || aliases.iter().any(|a| a.trim().is_empty()) {
                return Err(validation(field, "at least one non-empty key is required"));
            }
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn trigger_policy(&self) -> Result<TriggerPolicy, ConfigError> {
        TriggerPolicy::new(&self.trigger_keyword)
            .map_err(|e| validation("alerts.trigger_keyword", e.to_string()))
    }
}
