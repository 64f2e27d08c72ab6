use std::time::Duration;

// ── Paths ──────────────────────────────────────────────────────────

pub const DEFAULT_CONFIG_PATH: &str = "/etc/fabricguard/config.yaml";

// ── Channel capacities ─────────────────────────────────────────────

pub const ALERT_CHANNEL_CAPACITY: usize = 1_000;
pub const DATAPATH_EVENT_CHANNEL_CAPACITY: usize = 64;

// ── Alert source ───────────────────────────────────────────────────

pub const DEFAULT_ALERT_POLL_INTERVAL_MS: u64 = 1_000;

// ── Controller ─────────────────────────────────────────────────────

/// Ryu `ofctl_rest` listens here by default.
pub const DEFAULT_CONTROLLER_URL: &str = "http://127.0.0.1:8080";
pub const DEFAULT_SWITCH_POLL_INTERVAL_SECS: u64 = 5;
pub const DEFAULT_CONTROLLER_TIMEOUT_MS: u64 = 2_000;

// ── Metrics ────────────────────────────────────────────────────────

pub const DEFAULT_METRICS_JOB: &str = "ddos_mitigation";
pub const DEFAULT_FLUSH_INTERVAL_SECS: u64 = 10;
pub const DEFAULT_PUSH_TIMEOUT_MS: u64 = 2_000;

// ── Timeouts ───────────────────────────────────────────────────────

pub const GRACEFUL_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_capacities_are_positive() {
        assert!(ALERT_CHANNEL_CAPACITY > 0);
        assert!(DATAPATH_EVENT_CHANNEL_CAPACITY > 0);
    }

    #[test]
    fn shutdown_timeout_is_reasonable() {
        assert!(GRACEFUL_SHUTDOWN_TIMEOUT.as_secs() >= 1);
        assert!(GRACEFUL_SHUTDOWN_TIMEOUT.as_secs() <= 30);
    }

    #[test]
    fn push_timeout_shorter_than_shutdown() {
        assert!(Duration::from_millis(DEFAULT_PUSH_TIMEOUT_MS) < GRACEFUL_SHUTDOWN_TIMEOUT);
        assert!(Duration::from_millis(DEFAULT_CONTROLLER_TIMEOUT_MS) < GRACEFUL_SHUTDOWN_TIMEOUT);
    }
}
