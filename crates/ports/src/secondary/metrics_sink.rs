use std::future::Future;
use std::pin::Pin;

use domain::common::error::DomainError;

/// Secondary port for pushing an encoded metrics snapshot to an external
/// collector under a job name.
pub trait MetricsSink: Send + Sync {
    fn push<'a>(
        &'a self,
        job: &'a str,
        body: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<(), DomainError>> + Send + 'a>>;
}
