// Focused sub-traits for recording mitigation metrics.
//
// All methods take `&self`; implementations use atomics from
// `prometheus-client`. Default implementations are no-ops so test mocks
// implement only the sub-traits relevant to the service under test.

use domain::common::error::DomainError;

// ── Alert metrics ──────────────────────────────────────────────────

pub trait AlertMetrics: Send + Sync {
    /// Increment `attacks_detected`.
    fn record_attack_detected(&self) {}

    /// Increment `source_attacks{src_ip}`.
    fn record_source_attack(&self, _src_ip: &str) {}

    /// Increment `tcp_attacks`.
    fn record_tcp_attack(&self) {}

    /// Increment `icmp_attacks`.
    fn record_icmp_attack(&self) {}

    /// Increment `malformed_alerts`.
    fn record_malformed_alert(&self) {}
}

// ── Enforcement metrics ────────────────────────────────────────────

pub trait EnforcementMetrics: Send + Sync {
    /// Increment `blocked_ips`.
    fn record_blocked_ip(&self) {}

    /// Set the `current_blocked_ips` gauge.
    fn set_current_blocked_ips(&self, _count: u64) {}

    /// Record a rule install attempt (`success` / `failure`).
    fn record_rule_install(&self, _result: &str) {}
}

// ── Publishing ─────────────────────────────────────────────────────

pub trait PublishMetrics: Send + Sync {
    /// Record a snapshot push attempt (`success` / `failure`).
    fn record_metrics_flush(&self, _result: &str) {}
}

pub trait MetricsExport: Send + Sync {
    /// Encode the current snapshot in the OpenMetrics text format.
    fn encode(&self) -> Result<String, DomainError> {
        Ok(String::new())
    }
}

// ── Composite super-trait ──────────────────────────────────────────

/// Unified metrics port. Services accept `Arc<dyn MetricsPort>`.
pub trait MetricsPort: AlertMetrics + EnforcementMetrics + PublishMetrics + MetricsExport {}

impl<T> MetricsPort for T where T: AlertMetrics + EnforcementMetrics + PublishMetrics + MetricsExport
{}
