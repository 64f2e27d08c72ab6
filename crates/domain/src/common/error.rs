use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("engine error: {0}")]
    EngineError(String),

    #[error("external call failed: {0}")]
    ExternalCall(String),

    #[error("operation timed out: {0}")]
    Timeout(String),
}
