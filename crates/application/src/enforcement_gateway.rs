use std::net::IpAddr;
use std::sync::Arc;

use domain::common::error::DomainError;
use domain::datapath::entity::{DEFAULT_DROP_PRIORITY, DatapathId, FlowRule};
use domain::mitigation::entity::validate_drop_priority;
use domain::mitigation::error::MitigationError;
use ports::secondary::flow_rule_port::FlowRulePort;
use ports::secondary::metrics_port::MetricsPort;

use crate::datapath_registry::DatapathRegistry;

/// Per-datapath result of one `block` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnforcementReport {
    pub ip: IpAddr,
    pub installed: Vec<DatapathId>,
    pub failed: Vec<(DatapathId, String)>,
}

impl EnforcementReport {
    fn new(ip: IpAddr) -> Self {
        Self {
            ip,
            installed: Vec::new(),
            failed: Vec::new(),
        }
    }

    pub fn attempted(&self) -> usize {
        self.installed.len() + self.failed.len()
    }

    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    /// Some datapaths accepted the rule and some did not.
    pub fn is_partial(&self) -> bool {
        !self.installed.is_empty() && !self.failed.is_empty()
    }
}

/// Translates "block this source" into one drop-rule install per
/// connected datapath.
///
/// Install failures are logged and reported per datapath; they never
/// abort the fan-out.
pub struct EnforcementGateway {
    datapaths: Arc<DatapathRegistry>,
    flow_rules: Arc<dyn FlowRulePort>,
    metrics: Arc<dyn MetricsPort>,
    drop_priority: u16,
}

impl EnforcementGateway {
    pub fn new(
        datapaths: Arc<DatapathRegistry>,
        flow_rules: Arc<dyn FlowRulePort>,
        metrics: Arc<dyn MetricsPort>,
    ) -> Self {
        Self {
            datapaths,
            flow_rules,
            metrics,
            drop_priority: DEFAULT_DROP_PRIORITY,
        }
    }

    /// Override the drop-rule priority. It must stay strictly above the
    /// fabric's forwarding rule priority and the table-miss priority.
    pub fn with_drop_priority(
        mut self,
        priority: u16,
        forward_priority: u16,
    ) -> Result<Self, MitigationError> {
        validate_drop_priority(priority, forward_priority)?;
        self.drop_priority = priority;
        Ok(self)
    }

    pub fn drop_priority(&self) -> u16 {
        self.drop_priority
    }

    /// Install a drop rule for `ip` on every datapath connected at call time.
    pub async fn block(&self, ip: IpAddr) -> EnforcementReport {
        let rule = FlowRule::drop_source(ip, self.drop_priority);
        let targets = self.datapaths.list();
        let mut report = EnforcementReport::new(ip);

        if targets.is_empty() {
            tracing::warn!(%ip, "no datapath connected, drop rule not installed");
            return report;
        }

        for dpid in targets {
            match self.install_on(dpid, &rule).await {
                Ok(()) => report.installed.push(dpid),
                Err(e) => report.failed.push((dpid, e.to_string())),
            }
        }

        if report.is_complete() {
            tracing::info!(%ip, datapaths = report.installed.len(), "drop rule installed");
        } else {
            tracing::warn!(
                %ip,
                installed = report.installed.len(),
                failed = report.failed.len(),
                "drop rule installed partially"
            );
        }
        report
    }

    /// Install drop rules for already-blocked sources on one datapath.
    /// Returns the number of rules accepted.
    pub async fn replay(&self, dpid: DatapathId, ips: &[IpAddr]) -> usize {
        let mut installed = 0;
        for &ip in ips {
            let rule = FlowRule::drop_source(ip, self.drop_priority);
            if self.install_on(dpid, &rule).await.is_ok() {
                installed += 1;
            }
        }
        installed
    }

    /// Install a single rule, recording the outcome.
    pub async fn install_on(&self, dpid: DatapathId, rule: &FlowRule) -> Result<(), DomainError> {
        match self.flow_rules.install_rule(dpid, rule).await {
            Ok(()) => {
                self.metrics.record_rule_install("success");
                tracing::debug!(dpid = %dpid, priority = rule.priority, "flow rule installed");
                Ok(())
            }
            Err(e) => {
                self.metrics.record_rule_install("failure");
                tracing::warn!(dpid = %dpid, priority = rule.priority, error = %e, "flow rule install failed");
                Err(e)
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use domain::datapath::entity::FlowMatch;
    use ports::secondary::metrics_port::{
        AlertMetrics, EnforcementMetrics, MetricsExport, PublishMetrics,
    };
    use ports::test_utils::NoopMetrics;
    use std::collections::HashSet;
    use std::future::Future;
    use std::pin::Pin;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Records every install call; fails for datapaths in `failing`.
    #[derive(Default)]
    pub(crate) struct RecordingFlowPort {
        pub calls: Mutex<Vec<(DatapathId, FlowRule)>>,
        pub failing: Mutex<HashSet<DatapathId>>,
    }

    impl RecordingFlowPort {
        pub fn calls(&self) -> Vec<(DatapathId, FlowRule)> {
            self.calls.lock().unwrap().clone()
        }

        pub fn fail_on(&self, dpid: DatapathId) {
            self.failing.lock().unwrap().insert(dpid);
        }
    }

    impl FlowRulePort for RecordingFlowPort {
        fn install_rule<'a>(
            &'a self,
            dpid: DatapathId,
            rule: &'a FlowRule,
        ) -> Pin<Box<dyn Future<Output = Result<(), DomainError>> + Send + 'a>> {
            self.calls.lock().unwrap().push((dpid, rule.clone()));
            let fail = self.failing.lock().unwrap().contains(&dpid);
            Box::pin(async move {
                if fail {
                    Err(DomainError::ExternalCall("controller returned 500".into()))
                } else {
                    Ok(())
                }
            })
        }
    }

    #[derive(Default)]
    struct InstallCounter {
        success: AtomicU32,
        failure: AtomicU32,
    }

    impl AlertMetrics for InstallCounter {}
    impl EnforcementMetrics for InstallCounter {
        fn record_rule_install(&self, result: &str) {
            match result {
                "success" => self.success.fetch_add(1, Ordering::Relaxed),
                _ => self.failure.fetch_add(1, Ordering::Relaxed),
            };
        }
    }
    impl PublishMetrics for InstallCounter {}
    impl MetricsExport for InstallCounter {}

    fn ip(s: &str) -> IpAddr {
        s.parse().unwrap()
    }

    fn gateway_with(
        dpids: &[u64],
    ) -> (EnforcementGateway, Arc<DatapathRegistry>, Arc<RecordingFlowPort>) {
        let registry = Arc::new(DatapathRegistry::new());
        for &d in dpids {
            registry.register(DatapathId(d));
        }
        let port = Arc::new(RecordingFlowPort::default());
        let gateway = EnforcementGateway::new(
            Arc::clone(&registry),
            Arc::clone(&port) as Arc<dyn FlowRulePort>,
            Arc::new(NoopMetrics),
        );
        (gateway, registry, port)
    }

    #[tokio::test]
    async fn block_fans_out_to_every_datapath() {
        let (gateway, _registry, port) = gateway_with(&[1, 2]);

        let report = gateway.block(ip("9.9.9.9")).await;

        let calls = port.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].0, DatapathId(1));
        assert_eq!(calls[1].0, DatapathId(2));
        for (_, rule) in &calls {
            assert_eq!(rule.flow_match, FlowMatch::Ipv4Source("9.9.9.9".parse().unwrap()));
            assert!(rule.is_drop());
            assert_eq!(rule.priority, DEFAULT_DROP_PRIORITY);
        }
        assert_eq!(report.installed, vec![DatapathId(1), DatapathId(2)]);
        assert!(report.is_complete());
    }

    #[tokio::test]
    async fn unregistered_datapath_receives_nothing() {
        let (gateway, registry, port) = gateway_with(&[1, 2]);
        registry.unregister(DatapathId(2));

        gateway.block(ip("9.9.9.9")).await;

        let calls = port.calls();
        assert_eq!(calls.len(), 1);
        assert!(calls.iter().all(|(d, _)| *d != DatapathId(2)));
    }

    #[tokio::test]
    async fn failure_on_one_datapath_does_not_stop_others() {
        let registry = Arc::new(DatapathRegistry::new());
        for d in 1..=3 {
            registry.register(DatapathId(d));
        }
        let port = Arc::new(RecordingFlowPort::default());
        port.fail_on(DatapathId(2));
        let metrics = Arc::new(InstallCounter::default());
        let gateway = EnforcementGateway::new(
            registry,
            Arc::clone(&port) as Arc<dyn FlowRulePort>,
            Arc::clone(&metrics) as Arc<dyn MetricsPort>,
        );

        let report = gateway.block(ip("5.5.5.5")).await;

        assert_eq!(port.calls().len(), 3);
        assert_eq!(report.installed, vec![DatapathId(1), DatapathId(3)]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, DatapathId(2));
        assert!(report.is_partial());
        assert_eq!(metrics.success.load(Ordering::Relaxed), 2);
        assert_eq!(metrics.failure.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn no_datapaths_yields_empty_report() {
        let (gateway, _registry, port) = gateway_with(&[]);
        let report = gateway.block(ip("9.9.9.9")).await;
        assert_eq!(report.attempted(), 0);
        assert!(port.calls().is_empty());
    }

    #[tokio::test]
    async fn ipv6_source_gets_ipv6_match() {
        let (gateway, _registry, port) = gateway_with(&[7]);
        gateway.block(ip("2001:db8::5")).await;
        let calls = port.calls();
        assert!(matches!(calls[0].1.flow_match, FlowMatch::Ipv6Source(_)));
    }

    #[tokio::test]
    async fn replay_installs_each_source() {
        let (gateway, _registry, port) = gateway_with(&[]);
        let installed = gateway
            .replay(DatapathId(4), &[ip("1.1.1.1"), ip("2.2.2.2")])
            .await;
        assert_eq!(installed, 2);
        assert!(port.calls().iter().all(|(d, _)| *d == DatapathId(4)));
    }

    #[test]
    fn drop_priority_validated() {
        let (gateway, _, _) = gateway_with(&[]);
        assert!(gateway.with_drop_priority(1, 1).is_err());

        let (gateway, _, _) = gateway_with(&[]);
        let gateway = gateway.with_drop_priority(500, 10).unwrap();
        assert_eq!(gateway.drop_priority(), 500);
    }
}
