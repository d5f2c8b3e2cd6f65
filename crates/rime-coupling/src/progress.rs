//! Progress events emitted while the loop runs.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CouplingStage {
    Meshing,
    InitialConditions,
    Solving,
    Monitoring,
    Regression,
    GeometryUpdate,
    Completed,
}

impl fmt::Display for CouplingStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CouplingStage::Meshing => "meshing",
            CouplingStage::InitialConditions => "initial conditions",
            CouplingStage::Solving => "solving",
            CouplingStage::Monitoring => "monitoring",
            CouplingStage::Regression => "regression",
            CouplingStage::GeometryUpdate => "geometry update",
            CouplingStage::Completed => "completed",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone)]
pub struct CouplingProgress {
    pub iteration: usize,
    pub stage: CouplingStage,
    /// Cumulative simulated time at the start of the stage (s).
    pub sim_time_s: f64,
    pub message: Option<String>,
}

impl CouplingProgress {
    pub fn stage(iteration: usize, stage: CouplingStage, sim_time_s: f64) -> Self {
        Self {
            iteration,
            stage,
            sim_time_s,
            message: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}
