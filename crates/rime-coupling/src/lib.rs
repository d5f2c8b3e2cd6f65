//! rime-coupling: the flow / wall-regression coupling loop.
//!
//! Each iteration meshes the current wall, seeds the flow solver from the
//! quasi-1D nozzle estimate, waits for a quasi-steady solution, integrates
//! wall regression from the wall mass fluxes and projects the new wall
//! back onto the mesh control points.

pub mod collaborators;
pub mod config;
pub mod error;
pub mod driver;
pub mod progress;

pub use collaborators::{CollaboratorError, CollaboratorResult, FlowSolver, MeshGenerator, MeshReport};
pub use config::{CouplingConfig, GasConfig, RunConfig};
pub use error::{CouplingError, CouplingResult};
pub use driver::{CouplingLoop, CouplingOutcome, TerminationReason};
pub use progress::{CouplingProgress, CouplingStage};
