//! Error types for field access.

use rime_core::RimeError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FieldError {
    #[error("Malformed field data in {path}: {what}")]
    Malformed { path: PathBuf, what: String },

    #[error("Missing {what}")]
    Missing { what: String },

    #[error("Time level {level} is not present in every partition")]
    Incomplete { level: String },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Core error: {0}")]
    Core(#[from] RimeError),
}

impl FieldError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        FieldError::Io {
            path: path.into(),
            source,
        }
    }

    /// Errors a poller may retry: data that is not there yet.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            FieldError::Missing { .. } | FieldError::Incomplete { .. } | FieldError::Io { .. }
        )
    }
}

pub type FieldResult<T> = Result<T, FieldError>;
