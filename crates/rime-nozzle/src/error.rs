//! Error types for nozzle-flow operations.

use crate::area_mach::Branch;
use rime_core::RimeError;
use thiserror::Error;

/// Errors raised by the area–Mach solver.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NozzleError {
    #[error("Mach solve did not converge at point {index:?}: A/A* = {area_ratio}, branch = {branch:?}")]
    NonConvergence {
        index: Option<usize>,
        area_ratio: f64,
        branch: Branch,
    },

    #[error("Invalid input: {what}")]
    InvalidInput { what: String },

    #[error("Core error: {0}")]
    Core(#[from] RimeError),
}

impl NozzleError {
    /// Attach the profile index to a point-level failure.
    pub(crate) fn at_index(self, index: usize) -> Self {
        match self {
            NozzleError::NonConvergence {
                area_ratio, branch, ..
            } => NozzleError::NonConvergence {
                index: Some(index),
                area_ratio,
                branch,
            },
            other => other,
        }
    }
}

pub type NozzleResult<T> = Result<T, NozzleError>;
