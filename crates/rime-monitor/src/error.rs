//! Error types for convergence monitoring.

use rime_fields::FieldError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("No steady state within the watchdog limit ({waited_s:.1} s waited)")]
    WatchdogExpired { waited_s: f64 },

    #[error("Invalid monitor configuration: {what}")]
    InvalidConfig { what: String },

    #[error("Field access failed: {0}")]
    Field(#[from] FieldError),
}

impl MonitorError {
    /// True when the next poll may succeed without intervention.
    pub fn is_transient(&self) -> bool {
        match self {
            MonitorError::Field(e) => e.is_transient(),
            _ => false,
        }
    }
}

pub type MonitorResult<T> = Result<T, MonitorError>;
