//! Fabric controller configuration.

use std::time::Duration;

use domain::datapath::entity::{DEFAULT_DROP_PRIORITY, DEFAULT_FORWARD_PRIORITY};
use domain::mitigation::entity::validate_drop_priority;
use serde::{Deserialize, Serialize};

use super::common::{ConfigError, check_http_url, check_positive, default_true, validation};
use crate::constants::{
    DEFAULT_CONTROLLER_TIMEOUT_MS, DEFAULT_CONTROLLER_URL, DEFAULT_SWITCH_POLL_INTERVAL_SECS,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ControllerConfig {
    /// Base URL of the controller's REST API.
    #[serde(default = "default_url")]
    pub url: String,

    /// Log rules instead of installing them. Datapaths are still
    /// discovered from the controller.
    #[serde(default)]
    pub dry_run: bool,

    #[serde(default = "default_switch_poll_interval_secs")]
    pub switch_poll_interval_secs: u64,

    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    #[serde(default = "default_drop_priority")]
    pub drop_priority: u16,

    /// Priority of the fabric's forward-everything rule.
    #[serde(default = "default_flow_priority")]
    pub default_flow_priority: u16,

    /// Install the table-miss rule on every joining datapath.
    #[serde(default)]
    pub install_table_miss: bool,

    /// Install every blocked source on a datapath when it joins.
    #[serde(default = "default_true")]
    pub replay_on_join: bool,
}

fn default_url() -> String {
    DEFAULT_CONTROLLER_URL.to_string()
}
fn default_switch_poll_interval_secs() -> u64 {
    DEFAULT_SWITCH_POLL_INTERVAL_SECS
}
fn default_request_timeout_ms() -> u64 {
    DEFAULT_CONTROLLER_TIMEOUT_MS
}
fn default_drop_priority() -> u16 {
    DEFAULT_DROP_PRIORITY
}
fn default_flow_priority() -> u16 {
    DEFAULT_FORWARD_PRIORITY
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            dry_run: false,
            switch_poll_interval_secs: default_switch_poll_interval_secs(),
            request_timeout_ms: default_request_timeout_ms(),
            drop_priority: default_drop_priority(),
            default_flow_priority: default_flow_priority(),
            install_table_miss: false,
            replay_on_join: true,
        }
    }
}

impl ControllerConfig {
    pub(super) fn validate(&self) -> Result<(), ConfigError> {
        check_http_url("controller.url", &self.url)?;
        check_positive(
            "controller.switch_poll_interval_secs",
            self.switch_poll_interval_secs,
        )?;
        check_positive("controller.request_timeout_ms", self.request_timeout_ms)?;
        validate_drop_priority(self.drop_priority, self.default_flow_priority)
            .map_err(|e| validation("controller.drop_priority", e.to_string()))?;
        Ok(())
    }

    pub fn switch_poll_interval(&self) -> Duration {
        Duration::from_secs(self.switch_poll_interval_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let c = ControllerConfig::default();
        assert!(c.validate().is_ok());
        assert_eq!(c.drop_priority, 100);
        assert_eq!(c.default_flow_priority, 1);
        assert!(c.replay_on_join);
        assert!(!c.install_table_miss);
        assert_eq!(c.request_timeout(), Duration::from_secs(2));
    }

    #[test]
    fn drop_priority_must_beat_forwarding() {
        let c = ControllerConfig {
            drop_priority: 10,
            default_flow_priority: 10,
            ..ControllerConfig::default()
        };
        let err = c.validate().unwrap_err();
        assert!(err.to_string().contains("controller.drop_priority"));
    }

    #[test]
    fn bad_url_rejected() {
        let c = ControllerConfig {
            url: "127.0.0.1:8080".to_string(),
            ..ControllerConfig::default()
        };
        assert!(c.validate().is_err());
    }

    #[test]
    fn zero_poll_rejected() {
        let c = ControllerConfig {
            switch_poll_interval_secs: 0,
            ..ControllerConfig::default()
        };
        assert!(c.validate().is_err());
    }
}
