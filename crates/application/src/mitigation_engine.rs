use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use domain::alert::entity::AlertRecord;
use domain::mitigation::entity::TriggerPolicy;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::blocked_source_registry::BlockedSourceRegistry;
use crate::enforcement_gateway::{EnforcementGateway, EnforcementReport};
use crate::metrics_aggregator::{MetricEvent, MetricsAggregator};

/// When the metrics snapshot is pushed to the sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushMode {
    /// After every alert, matched or not.
    PerAlert,
    /// On a timer, only when something changed since the last push.
    Interval(Duration),
}

/// What `on_alert` did with a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlertOutcome {
    Blocked {
        ip: IpAddr,
        report: EnforcementReport,
    },
    AlreadyBlocked {
        ip: IpAddr,
    },
    NotTriggered,
    /// The alert asked for enforcement but its source is not an IP address.
    Unenforceable {
        source: String,
    },
}

/// Turns alerts into metrics updates, registry inserts and drop-rule
/// installs. Alerts are handled strictly one at a time, in read order.
pub struct MitigationEngine {
    trigger: TriggerPolicy,
    blocked: Arc<BlockedSourceRegistry>,
    gateway: Arc<EnforcementGateway>,
    aggregator: MetricsAggregator,
    flush_mode: FlushMode,
}

impl MitigationEngine {
    pub fn new(
        trigger: TriggerPolicy,
        blocked: Arc<BlockedSourceRegistry>,
        gateway: Arc<EnforcementGateway>,
        aggregator: MetricsAggregator,
    ) -> Self {
        Self {
            trigger,
            blocked,
            gateway,
            aggregator,
            flush_mode: FlushMode::PerAlert,
        }
    }

    #[must_use]
    pub fn with_flush_mode(mut self, mode: FlushMode) -> Self {
        self.flush_mode = mode;
        self
    }

    pub fn aggregator(&self) -> &MetricsAggregator {
        &self.aggregator
    }

    /// Handle one alert. Never fails: enforcement and flush errors are
    /// logged and reflected in metrics.
    pub async fn on_alert(&mut self, record: &AlertRecord) -> AlertOutcome {
        let outcome = self.apply(record).await;
        if self.flush_mode == FlushMode::PerAlert {
            let _ = self.aggregator.flush().await;
        }
        outcome
    }

    async fn apply(&mut self, record: &AlertRecord) -> AlertOutcome {
        let source = record.source_or_unknown();
        // Per-source series are keyed by address so ephemeral ports fold together.
        let source_label = record
            .source_ip()
            .map_or_else(|| source.to_string(), |ip| ip.to_string());

        self.aggregator.record(MetricEvent::AttackDetected);
        self.aggregator
            .record(MetricEvent::SourceAttack(source_label));
        self.aggregator
            .record(MetricEvent::Protocol(record.protocol.clone()));

        tracing::debug!(
            src = source,
            protocol = %record.protocol,
            message = %record.message,
            "alert received"
        );

        if !self.trigger.matches(&record.message) {
            return AlertOutcome::NotTriggered;
        }

        let Some(ip) = record.source_ip() else {
            tracing::warn!(
                src = source,
                message = %record.message,
                "enforcement requested for a source that is not an IP address"
            );
            return AlertOutcome::Unenforceable {
                source: source.to_string(),
            };
        };

        if self.blocked.is_blocked(ip) {
            tracing::debug!(%ip, "source already blocked");
            return AlertOutcome::AlreadyBlocked { ip };
        }

        let report = self.gateway.block(ip).await;
        if self.blocked.insert(ip, &record.message) {
            self.aggregator.record(MetricEvent::BlockedIp);
        }
        self.aggregator
            .record(MetricEvent::CurrentBlockedIps(self.blocked.len() as u64));

        AlertOutcome::Blocked { ip, report }
    }

    /// Consume alerts until the channel closes or `cancel_token` fires.
    /// Pending alerts are drained on cancellation and a final flush is
    /// performed before returning.
    pub async fn run(mut self, mut rx: mpsc::Receiver<AlertRecord>, cancel_token: CancellationToken) {
        let period = match self.flush_mode {
            FlushMode::Interval(period) => Some(period),
            FlushMode::PerAlert => None,
        };
        let mut ticker = tokio::time::interval(period.unwrap_or(Duration::from_secs(3600)));
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        let mut count: u64 = 0;
        let mut blocked: u64 = 0;

        loop {
            tokio::select! {
                () = cancel_token.cancelled() => {
                    while let Ok(record) = rx.try_recv() {
                        count += 1;
                        if matches!(self.on_alert(&record).await, AlertOutcome::Blocked { .. }) {
                            blocked += 1;
                        }
                    }
                    break;
                }
                msg = rx.recv() => {
                    match msg {
                        Some(record) => {
                            count += 1;
                            if matches!(self.on_alert(&record).await, AlertOutcome::Blocked { .. }) {
                                blocked += 1;
                            }
                        }
                        None => break,
                    }
                }
                _ = ticker.tick(), if period.is_some() => {
                    if self.aggregator.is_dirty() {
                        let _ = self.aggregator.flush().await;
                    }
                }
            }
        }

        let _ = self.aggregator.flush().await;
        tracing::info!(total_alerts = count, blocked_sources = blocked, "mitigation engine stopped");
    }
}
