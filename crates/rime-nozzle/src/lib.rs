//! Quasi-1D isentropic nozzle flow used to seed initial conditions.
//!
//! Given wall half-heights along the channel, the area ratio `A/A*` is
//! formed against the throat and the isentropic area–Mach relation is
//! inverted point by point. Downstream of the throat the branch follows a
//! two-state regime driven by the sign of the area gradient. The result is
//! an initial-condition estimate for the flow solver, not a flow solution.

pub mod area_mach;
pub mod error;
pub mod gas;
pub mod interp;
pub mod profile;

pub use area_mach::{
    Branch, MachSolution, RootConfig, area_mach_residual, area_ratio_from_mach, solve_mach,
};
pub use error::{NozzleError, NozzleResult};
pub use gas::{IsentropicGas, IsentropicPoint};
pub use interp::interp_clamped;
pub use profile::{
    CellInitialConditions, FlowProfile, FlowRegime, RegimeTransition, next_regime, solve_profile,
};
