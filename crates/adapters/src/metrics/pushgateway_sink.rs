use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use domain::common::error::DomainError;
use ports::secondary::metrics_sink::MetricsSink;

/// Content type the Pushgateway push API documents for text payloads.
const TEXT_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Pushes metric snapshots to a Prometheus Pushgateway.
///
/// `PUT` replaces every metric previously pushed under the same job, so a
/// snapshot of cumulative counters is always the full truth.
///
/// The body is OpenMetrics text but goes out as text format 0.0.4, which the
/// Pushgateway parses leniently: the `# EOF` line is ignored and the
/// `*_total` samples are stored as untyped series rather than counters.
pub struct PushgatewaySink {
    client: reqwest::Client,
    base_url: String,
}

impl PushgatewaySink {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, DomainError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("fabricguard-agent/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| DomainError::EngineError(format!("HTTP client init failed: {e}")))?;
        Ok(Self::with_client(client, base_url))
    }

    pub fn with_client(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn job_url(&self, job: &str) -> String {
        format!("{}/metrics/job/{job}", self.base_url)
    }

    async fn do_push(&self, job: &str, body: &str) -> Result<(), DomainError> {
        let response = self
            .client
            .put(self.job_url(job))
            .header(reqwest::header::CONTENT_TYPE, TEXT_CONTENT_TYPE)
            .body(body.to_string())
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    DomainError::Timeout(format!("pushgateway push for job '{job}': {e}"))
                } else {
                    DomainError::ExternalCall(format!("pushgateway push for job '{job}': {e}"))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(DomainError::ExternalCall(format!(
                "pushgateway returned HTTP {status} for job '{job}'"
            )));
        }
        Ok(())
    }
}

impl MetricsSink for PushgatewaySink {
    fn push<'a>(
        &'a self,
        job: &'a str,
        body: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<(), DomainError>> + Send + 'a>> {
        Box::pin(self.do_push(job, body))
    }
}
