use crate::secondary::metrics_port::{
    AlertMetrics, EnforcementMetrics, MetricsExport, PublishMetrics,
};

/// No-op implementation of all metrics sub-traits for use in tests.
pub struct NoopMetrics;

impl AlertMetrics for NoopMetrics {}
impl EnforcementMetrics for NoopMetrics {}
impl PublishMetrics for NoopMetrics {}
impl MetricsExport for NoopMetrics {}
