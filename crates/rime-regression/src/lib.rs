//! Wall regression from deposition and sublimation mass fluxes.
//!
//! [`MonolayerModel`] turns a wall mass flux into a recession rate by
//! counting ice monolayers. [`integrate`] advances the accumulated
//! regression with adaptive sub-steps until a threshold is reached or the
//! channel closes.

pub mod error;
pub mod integrator;
pub mod options;
pub mod rate;

pub use error::{RegressionError, RegressionResult};
pub use integrator::{ClosureEvent, RegressionOutcome, RegressionRun, RegressionState, integrate};
pub use options::{RegressionOptions, Threshold};
pub use rate::MonolayerModel;
