use thiserror::Error;

use crate::common::error::DomainError;

#[derive(Debug, Error)]
pub enum MitigationError {
    #[error("invalid trigger policy: {0}")]
    InvalidTrigger(String),

    #[error("source is not an IP address: {source_address}")]
    Unenforceable { source_address: String },

    #[error("invalid flow priority {priority}: {reason}")]
    InvalidPriority { priority: u16, reason: String },
}

impl From<MitigationError> for DomainError {
    fn from(e: MitigationError) -> Self {
        match e {
            MitigationError::InvalidTrigger(_) | MitigationError::InvalidPriority { .. } => {
                DomainError::InvalidConfig(e.to_string())
            }
            MitigationError::Unenforceable { .. } => DomainError::EngineError(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unenforceable_message() {
        let err = MitigationError::Unenforceable {
            source_address: "unknown".to_string(),
        };
        assert!(err.to_string().contains("unknown"));
    }

    #[test]
    fn invalid_priority_maps_to_config_error() {
        let err = MitigationError::InvalidPriority {
            priority: 0,
            reason: "must exceed the table-miss priority".to_string(),
        };
        let domain: DomainError = err.into();
        assert!(matches!(domain, DomainError::InvalidConfig(_)));
    }
}
