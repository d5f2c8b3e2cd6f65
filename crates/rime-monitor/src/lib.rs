//! Quasi-steady state detection for a running flow solver.
//!
//! The monitor polls the solver's time levels, compares the RMS magnitude
//! of each monitored field between the two newest levels and declares the
//! run steady once every field has stayed under its relative-error
//! threshold for a number of consecutive checks.

pub mod config;
pub mod error;
pub mod monitor;
pub mod rms;

pub use config::MonitorConfig;
pub use error::{MonitorError, MonitorResult};
pub use monitor::{
    CheckOutcome, ConvergenceMonitor, ConvergenceState, FieldCheck, FieldEvaluation, FieldVerdict,
    MonitorPhase, Sleeper, ThreadSleeper,
};
pub use rms::{relative_error, rms};
