use thiserror::Error;

use crate::common::error::DomainError;

#[derive(Debug, Error)]
pub enum AlertError {
    #[error("malformed alert record: {0}")]
    Malformed(String),

    #[error("alert record is not a JSON object")]
    NotAnObject,

    #[error("alert stream I/O error: {0}")]
    Io(String),
}

impl From<AlertError> for DomainError {
    fn from(e: AlertError) -> Self {
        DomainError::EngineError(e.to_string())
    }
}
