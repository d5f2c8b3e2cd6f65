//! Error types for regression integration.

use rime_core::RimeError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RegressionError {
    #[error("Invalid input: {what}")]
    InvalidInput { what: String },

    #[error("Core error: {0}")]
    Core(#[from] RimeError),
}

pub type RegressionResult<T> = Result<T, RegressionError>;

pub(crate) fn invalid<T>(what: impl Into<String>) -> RegressionResult<T> {
    Err(RegressionError::InvalidInput { what: what.into() })
}
