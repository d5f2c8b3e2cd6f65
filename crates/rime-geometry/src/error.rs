//! Error types for geometry smoothing and script editing.

use rime_core::RimeError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GeometryError {
    #[error("Invalid input: {what}")]
    InvalidInput { what: String },

    #[error("Smoothing system is singular (lambda = {lambda:e})")]
    Singular { lambda: f64 },

    #[error("Malformed geometry script line {line}: {what}")]
    Malformed { line: usize, what: String },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Core error: {0}")]
    Core(#[from] RimeError),
}

pub type GeometryResult<T> = Result<T, GeometryError>;
