//! Adapters for a REST-fronted OpenFlow controller (Ryu `ofctl_rest`
//! compatible endpoints).

pub mod log_flow_adapter;
pub mod rest_flow_adapter;
pub mod switch_poller;

use std::time::Duration;

use domain::common::error::DomainError;
use domain::datapath::error::DatapathError;

const USER_AGENT: &str = concat!("fabricguard-agent/", env!("CARGO_PKG_VERSION"));

fn controller_client(timeout: Duration) -> Result<reqwest::Client, DomainError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| DomainError::EngineError(format!("HTTP client init failed: {e}")))
}

fn normalize_base_url(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}

fn request_error(context: &str, e: &reqwest::Error) -> DomainError {
    if e.is_timeout() {
        DomainError::Timeout(format!("{context}: {e}"))
    } else {
        DatapathError::ControllerUnreachable(format!("{context}: {e}")).into()
    }
}
