use std::future::Future;
use std::pin::Pin;

use domain::common::error::DomainError;
use ports::secondary::metrics_sink::MetricsSink;

/// Sink used when no Pushgateway is configured. Metrics stay in the
/// in-process registry.
pub struct NoopMetricsSink;

impl MetricsSink for NoopMetricsSink {
    fn push<'a>(
        &'a self,
        job: &'a str,
        body: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<(), DomainError>> + Send + 'a>> {
        Box::pin(async move {
            tracing::trace!(job, bytes = body.len(), "metrics snapshot kept in memory");
            Ok(())
        })
    }
}
