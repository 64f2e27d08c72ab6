use thiserror::Error;

use crate::common::error::DomainError;

#[derive(Debug, Error)]
pub enum DatapathError {
    #[error("invalid datapath id: {0}")]
    InvalidId(String),

    #[error("rule install on datapath {dpid} failed: {reason}")]
    InstallFailed { dpid: String, reason: String },

    #[error("controller unreachable: {0}")]
    ControllerUnreachable(String),
}

impl From<DatapathError> for DomainError {
    fn from(e: DatapathError) -> Self {
        match e {
            DatapathError::InvalidId(_) => DomainError::EngineError(e.to_string()),
            DatapathError::InstallFailed { .. } | DatapathError::ControllerUnreachable(_) => {
                DomainError::ExternalCall(e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn install_failed_message() {
        let err = DatapathError::InstallFailed {
            dpid: "0000000000000001".to_string(),
            reason: "HTTP 500".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("0000000000000001"));
        assert!(msg.contains("HTTP 500"));
    }

    #[test]
    fn unreachable_maps_to_external_call() {
        let domain: DomainError = DatapathError::ControllerUnreachable("refused".into()).into();
        assert!(matches!(domain, DomainError::ExternalCall(_)));
    }
}
