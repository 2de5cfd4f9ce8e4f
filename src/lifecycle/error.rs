use thiserror::Error;

use crate::domain::ValidationError;
use crate::services::DocumentError;
use crate::store::StoreError;

/// Failure of a lifecycle operation.
///
/// Every variant except `Store` is an expected outcome the caller can act
/// on; `Store` wraps unexpected backend failures and is never retried here.
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    InvalidState(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Validation(String),

    #[error("storage failure: {0}")]
    Store(#[from] StoreError),
}

impl LifecycleError {
    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn invalid_state(msg: impl Into<String>) -> Self {
        Self::InvalidState(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }
}

impl From<ValidationError> for LifecycleError {
    fn from(err: ValidationError) -> Self {
        Self::Validation(err.0)
    }
}

impl From<DocumentError> for LifecycleError {
    fn from(err: DocumentError) -> Self {
        Self::Validation(err.to_string())
    }
}
