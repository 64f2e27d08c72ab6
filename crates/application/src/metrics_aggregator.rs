use std::sync::Arc;
use std::time::Duration;

use domain::alert::entity::AlertProtocol;
use domain::common::error::DomainError;
use ports::secondary::metrics_port::MetricsPort;
use ports::secondary::metrics_sink::MetricsSink;

pub const DEFAULT_JOB: &str = "ddos_mitigation";
pub const DEFAULT_PUSH_TIMEOUT: Duration = Duration::from_secs(2);

/// A single mutation of the metrics snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetricEvent {
    AttackDetected,
    SourceAttack(String),
    Protocol(AlertProtocol),
    BlockedIp,
    CurrentBlockedIps(u64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushState {
    Idle,
    Sending,
}

/// Owns the in-memory snapshot mutators and pushes the encoded snapshot
/// to the external sink.
///
/// Counters are cumulative, so a failed flush loses nothing: the next
/// successful push carries the accumulated values.
pub struct MetricsAggregator {
    metrics: Arc<dyn MetricsPort>,
    sink: Arc<dyn MetricsSink>,
    job: String,
    push_timeout: Duration,
    state: FlushState,
    dirty: bool,
}

impl MetricsAggregator {
    pub fn new(metrics: Arc<dyn MetricsPort>, sink: Arc<dyn MetricsSink>) -> Self {
        Self {
            metrics,
            sink,
            job: DEFAULT_JOB.to_string(),
            push_timeout: DEFAULT_PUSH_TIMEOUT,
            state: FlushState::Idle,
            dirty: false,
        }
    }

    #[must_use]
    pub fn with_job(mut self, job: impl Into<String>) -> Self {
        self.job = job.into();
        self
    }

    #[must_use]
    pub fn with_push_timeout(mut self, timeout: Duration) -> Self {
        self.push_timeout = timeout;
        self
    }

    pub fn job(&self) -> &str {
        &self.job
    }

    pub fn state(&self) -> FlushState {
        self.state
    }

    /// `true` if anything was recorded since the last successful flush.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Apply one event to the snapshot. No I/O.
    pub fn record(&mut self, event: MetricEvent) {
        match event {
            MetricEvent::AttackDetected => self.metrics.record_attack_detected(),
            MetricEvent::SourceAttack(src) => self.metrics.record_source_attack(&src),
            MetricEvent::Protocol(AlertProtocol::Tcp) => self.metrics.record_tcp_attack(),
            MetricEvent::Protocol(AlertProtocol::Icmp) => self.metrics.record_icmp_attack(),
            MetricEvent::Protocol(AlertProtocol::Other(_) | AlertProtocol::Unknown) => {}
            MetricEvent::BlockedIp => self.metrics.record_blocked_ip(),
            MetricEvent::CurrentBlockedIps(n) => self.metrics.set_current_blocked_ips(n),
        }
        self.dirty = true;
    }

    /// Encode the snapshot and push it to the sink, bounded by the push
    /// timeout. Failures are logged and returned; they are never fatal.
    pub async fn flush(&mut self) -> Result<(), DomainError> {
        self.state = FlushState::Sending;
        let result = self.push_snapshot().await;
        self.state = FlushState::Idle;

        match &result {
            Ok(()) => {
                self.dirty = false;
                self.metrics.record_metrics_flush("success");
                tracing::debug!(job = %self.job, "metrics flushed");
            }
            Err(e) => {
                self.metrics.record_metrics_flush("failure");
                tracing::warn!(job = %self.job, error = %e, "metrics flush failed");
            }
        }
        result
    }

    async fn push_snapshot(&self) -> Result<(), DomainError> {
        let body = self.metrics.encode()?;
        match tokio::time::timeout(self.push_timeout, self.sink.push(&self.job, &body)).await {
            Ok(result) => result,
            Err(_elapsed) => Err(DomainError::Timeout(format!(
                "metrics push exceeded {}ms",
                self.push_timeout.as_millis()
            ))),
        }
    }
}
