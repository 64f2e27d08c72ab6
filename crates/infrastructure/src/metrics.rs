use domain::common::error::DomainError;
use ports::secondary::metrics_port::{
    AlertMetrics, EnforcementMetrics, MetricsExport, PublishMetrics,
};
use prometheus_client::encoding::EncodeLabelSet;
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::metrics::gauge::Gauge;
use prometheus_client::registry::Registry;

// ── Label types ─────────────────────────────────────────────────────

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct SourceLabels {
    pub src_ip: String,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct ResultLabels {
    pub result: String,
}

// ── Mitigation metrics registry ─────────────────────────────────────

/// Prometheus metrics registry for the mitigation controller.
///
/// Metric names are unprefixed so the pushed snapshot keeps the names
/// dashboards already query (`attacks_detected`, `blocked_ips`, ...).
/// Counters gain the OpenMetrics `_total` suffix on encode.
///
/// All families use atomics, so recording only requires `&self`. Wrap in
/// `Arc` to share across tasks.
pub struct MitigationMetrics {
    registry: Registry,
    pub attacks_detected: Counter,
    pub tcp_attacks: Counter,
    pub icmp_attacks: Counter,
    pub blocked_ips: Counter,
    pub source_attacks: Family<SourceLabels, Counter>,
    pub current_blocked_ips: Gauge,
    pub malformed_alerts: Counter,
    pub rule_installs: Family<ResultLabels, Counter>,
    pub metrics_flushes: Family<ResultLabels, Counter>,
}

impl MitigationMetrics {
    pub fn new() -> Self {
        let mut registry = Registry::default();

        let attacks_detected = Counter::default();
        registry.register(
            "attacks_detected",
            "Total alerts received from the detection engine",
            attacks_detected.clone(),
        );

        let tcp_attacks = Counter::default();
        registry.register("tcp_attacks", "Alerts with protocol TCP", tcp_attacks.clone());

        let icmp_attacks = Counter::default();
        registry.register(
            "icmp_attacks",
            "Alerts with protocol ICMP",
            icmp_attacks.clone(),
        );

        let blocked_ips = Counter::default();
        registry.register(
            "blocked_ips",
            "Source addresses blocked since startup",
            blocked_ips.clone(),
        );

        let source_attacks = Family::<SourceLabels, Counter>::default();
        registry.register(
            "source_attacks",
            "Alerts per source address",
            source_attacks.clone(),
        );

        let current_blocked_ips = Gauge::default();
        registry.register(
            "current_blocked_ips",
            "Source addresses currently blocked",
            current_blocked_ips.clone(),
        );

        let malformed_alerts = Counter::default();
        registry.register(
            "malformed_alerts",
            "Alert lines that could not be decoded",
            malformed_alerts.clone(),
        );

        let rule_installs = Family::<ResultLabels, Counter>::default();
        registry.register(
            "rule_installs",
            "Flow rule install attempts by result",
            rule_installs.clone(),
        );

        let metrics_flushes = Family::<ResultLabels, Counter>::default();
        registry.register(
            "metrics_flushes",
            "Metrics push attempts by result",
            metrics_flushes.clone(),
        );

        Self {
            registry,
            attacks_detected,
            tcp_attacks,
            icmp_attacks,
            blocked_ips,
            source_attacks,
            current_blocked_ips,
            malformed_alerts,
            rule_installs,
            metrics_flushes,
        }
    }

    /// Encode all registered metrics to `OpenMetrics` text format.
    pub fn encode_text(&self) -> Result<String, DomainError> {
        let mut buffer = String::new();
        prometheus_client::encoding::text::encode(&mut buffer, &self.registry)
            .map_err(|e| DomainError::EngineError(format!("metrics encoding failed: {e}")))?;
        Ok(buffer)
    }
}

impl Default for MitigationMetrics {
    fn default() -> Self {
        Self::new()
    }
}

// ── Sub-trait implementations ──────────────────────────────────────

impl AlertMetrics for MitigationMetrics {
    fn record_attack_detected(&self) {
        self.attacks_detected.inc();
    }

    fn record_source_attack(&self, src_ip: &str) {
        self.source_attacks
            .get_or_create(&SourceLabels {
                src_ip: src_ip.to_string(),
            })
            .inc();
    }

    fn record_tcp_attack(&self) {
        self.tcp_attacks.inc();
    }

    fn record_icmp_attack(&self) {
        self.icmp_attacks.inc();
    }

    fn record_malformed_alert(&self) {
        self.malformed_alerts.inc();
    }
}

impl EnforcementMetrics for MitigationMetrics {
    fn record_blocked_ip(&self) {
        self.blocked_ips.inc();
    }

    fn set_current_blocked_ips(&self, count: u64) {
        self.current_blocked_ips
            .set(count.try_into().unwrap_or(i64::MAX));
    }

    fn record_rule_install(&self, result: &str) {
        self.rule_installs
            .get_or_create(&ResultLabels {
                result: result.to_string(),
            })
            .inc();
    }
}

impl PublishMetrics for MitigationMetrics {
    fn record_metrics_flush(&self, result: &str) {
        self.metrics_flushes
            .get_or_create(&ResultLabels {
                result: result.to_string(),
            })
            .inc();
    }
}

impl MetricsExport for MitigationMetrics {
    fn encode(&self) -> Result<String, DomainError> {
        self.encode_text()
    }
}

// MetricsPort comes from the blanket impl over the sub-traits.

#[cfg(test)]
mod tests {
    use super::*;
    use ports::secondary::metrics_port::MetricsPort;
    use std::sync::Arc;

    #[test]
    fn new_registry_encodes_all_families() {
        let m = MitigationMetrics::new();
        let text = m.encode_text().unwrap();
        for name in [
            "attacks_detected",
            "tcp_attacks",
            "icmp_attacks",
            "blocked_ips",
            "current_blocked_ips",
            "malformed_alerts",
        ] {
            assert!(text.contains(name), "missing {name} in:\n{text}");
        }
        assert!(text.contains("# EOF"));
    }

    #[test]
    fn counters_increment() {
        let m = MitigationMetrics::new();
        m.record_attack_detected();
        m.record_attack_detected();
        m.record_tcp_attack();
        m.record_icmp_attack();
        m.record_blocked_ip();

        assert_eq!(m.attacks_detected.get(), 2);
        assert_eq!(m.tcp_attacks.get(), 1);
        assert_eq!(m.icmp_attacks.get(), 1);
        assert_eq!(m.blocked_ips.get(), 1);

        let text = m.encode_text().unwrap();
        assert!(text.contains("attacks_detected_total 2"));
    }

    #[test]
    fn per_source_counter_is_labelled() {
        let m = MitigationMetrics::new();
        m.record_source_attack("1.2.3.4");
        m.record_source_attack("1.2.3.4");
        m.record_source_attack("unknown");

        let text = m.encode_text().unwrap();
        assert!(text.contains(r#"source_attacks_total{src_ip="1.2.3.4"} 2"#));
        assert!(text.contains(r#"source_attacks_total{src_ip="unknown"} 1"#));
    }

    #[test]
    fn gauge_is_set_not_accumulated() {
        let m = MitigationMetrics::new();
        m.set_current_blocked_ips(3);
        m.set_current_blocked_ips(2);
        assert_eq!(m.current_blocked_ips.get(), 2);
    }

    #[test]
    fn result_families() {
        let m = MitigationMetrics::new();
        m.record_rule_install("success");
        m.record_rule_install("failure");
        m.record_metrics_flush("failure");

        let text = m.encode_text().unwrap();
        assert!(text.contains(r#"rule_installs_total{result="success"} 1"#));
        assert!(text.contains(r#"rule_installs_total{result="failure"} 1"#));
        assert!(text.contains(r#"metrics_flushes_total{result="failure"} 1"#));
    }

    #[test]
    fn usable_as_metrics_port() {
        let port: Arc<dyn MetricsPort> = Arc::new(MitigationMetrics::new());
        port.record_attack_detected();
        assert!(port.encode().unwrap().contains("attacks_detected_total 1"));
    }
}
