//! Seams to the external mesh generator and flow solver.

use rime_core::WallProfile;
use rime_fields::{FieldError, TimeLevel, WallFieldAccess};
use rime_geometry::{GeometryError, MeshDivisions};
use rime_nozzle::CellInitialConditions;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CollaboratorError {
    #[error("Command `{command}` failed: {status}")]
    Command { command: String, status: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Field error: {0}")]
    Field(#[from] FieldError),

    #[error("Geometry error: {0}")]
    Geometry(#[from] GeometryError),

    #[error("{what}")]
    Other { what: String },
}

pub type CollaboratorResult<T> = Result<T, CollaboratorError>;

/// What the coupling loop needs to know about a fresh mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeshReport {
    /// Mesh vertices across the channel.
    pub points_per_column: usize,
}

pub trait MeshGenerator {
    /// Geometry control points as currently stored by the generator.
    fn control_points(&self) -> CollaboratorResult<WallProfile>;

    /// Move the control points to `heights` (same order as
    /// [`MeshGenerator::control_points`]) and mesh the result.
    fn generate(&mut self, heights: &[f64], divisions: &MeshDivisions) -> CollaboratorResult<MeshReport>;
}

/// A flow solver running on a case the loop can read from.
pub trait FlowSolver {
    type Case: WallFieldAccess;

    fn case(&self) -> &Self::Case;

    fn case_mut(&mut self) -> &mut Self::Case;

    /// The mesh was regenerated; refresh anything derived from it.
    fn mesh_updated(&mut self, mesh: &MeshReport) -> CollaboratorResult<()>;

    fn write_initial_conditions(&mut self, initial: &CellInitialConditions) -> CollaboratorResult<()>;

    /// Start solving towards `end_time_s` without waiting for it.
    fn launch(&mut self, end_time_s: f64) -> CollaboratorResult<()>;

    /// Stop the running solve at `level` and leave that level readable.
    fn stop_at(&mut self, level: &TimeLevel) -> CollaboratorResult<()>;

    /// Drop solver output before the next mesh.
    fn clean(&mut self) -> CollaboratorResult<()>;
}
