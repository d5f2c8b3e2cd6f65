//! The coupling loop.

use crate::collaborators::{FlowSolver, MeshGenerator};
use crate::config::CouplingConfig;
use crate::error::{CouplingError, CouplingResult};
use crate::progress::{CouplingProgress, CouplingStage};
use rime_core::WallProfile;
use rime_fields::{Materialization, SnapshotSource, TimeLevel, WallFieldAccess};
use rime_geometry::smooth_onto;
use rime_history::{ClosureRecord, WallHistoryStore, WallRecord};
use rime_monitor::{ConvergenceMonitor, Sleeper, ThreadSleeper};
use rime_nozzle::{IsentropicGas, RootConfig, solve_profile};
use rime_regression::{ClosureEvent, RegressionOutcome, integrate};
use std::fmt;
use tracing::{error, info, warn};

/// Why the loop stopped without an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationReason {
    WallClosed,
    EndTimeReached,
    MaxIterations,
}

impl TerminationReason {
    pub fn code(&self) -> &'static str {
        match self {
            TerminationReason::WallClosed => "wall_closed",
            TerminationReason::EndTimeReached => "end_time",
            TerminationReason::MaxIterations => "max_iterations",
        }
    }
}

impl fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone)]
pub struct CouplingOutcome {
    pub reason: TerminationReason,
    /// Cumulative simulated time when the loop stopped (s).
    pub sim_time_s: f64,
    /// Completed iterations.
    pub iterations: usize,
    /// Mesh control points the next iteration would have used.
    pub control: WallProfile,
    pub closure: Option<ClosureEvent>,
}

/// Drives mesh, solve, convergence, regression and geometry update until
/// the wall closes or a budget runs out.
pub struct CouplingLoop<M, F, Z = ThreadSleeper> {
    config: CouplingConfig,
    gas: IsentropicGas,
    mesher: M,
    solver: F,
    sleeper: Z,
    history: Option<WallHistoryStore>,
}

impl<M, F> CouplingLoop<M, F, ThreadSleeper>
where
    M: MeshGenerator,
    F: FlowSolver,
{
    pub fn new(config: CouplingConfig, mesher: M, solver: F) -> CouplingResult<Self> {
        Self::with_sleeper(config, mesher, solver, ThreadSleeper::new())
    }
}

impl<M, F, Z> CouplingLoop<M, F, Z>
where
    M: MeshGenerator,
    F: FlowSolver,
    Z: Sleeper,
{
    pub fn with_sleeper(
        config: CouplingConfig,
        mesher: M,
        solver: F,
        sleeper: Z,
    ) -> CouplingResult<Self> {
        config.validate()?;
        let gas = config.gas.to_gas()?;
        Ok(Self {
            config,
            gas,
            mesher,
            solver,
            sleeper,
            history: None,
        })
    }

    /// Record one wall profile per iteration, and the closure snapshot.
    pub fn with_history(mut self, history: WallHistoryStore) -> Self {
        self.history = Some(history);
        self
    }

    pub fn config(&self) -> &CouplingConfig {
        &self.config
    }

    pub fn mesher(&self) -> &M {
        &self.mesher
    }

    pub fn solver(&self) -> &F {
        &self.solver
    }

    /// Run iterations until a [`TerminationReason`] applies.
    ///
    /// The budgets are checked before each iteration starts; closure ends
    /// the loop inside the iteration where it happens.
    pub fn run(
        &mut self,
        mut progress: Option<&mut dyn FnMut(CouplingProgress)>,
    ) -> CouplingResult<CouplingOutcome> {
        let mut control = self
            .mesher
            .control_points()
            .map_err(CouplingError::collaborator(CouplingStage::Meshing))?;
        let mut sim_time_s = 0.0;
        let mut iteration = 0;

        let (reason, closure) = loop {
            if sim_time_s >= self.config.run.end_time_s {
                break (TerminationReason::EndTimeReached, None);
            }
            if iteration >= self.config.run.max_iterations {
                break (TerminationReason::MaxIterations, None);
            }

            info!(iteration, sim_time_s, "coupling iteration started");
            let step = match self.iterate(iteration, sim_time_s, &control, &mut progress) {
                Ok(step) => step,
                Err(err) => {
                    error!(
                        reason = err.code(),
                        sim_time_s,
                        iterations = iteration,
                        error = %err,
                        "coupling loop failed"
                    );
                    emit(
                        &mut progress,
                        CouplingProgress::stage(iteration, CouplingStage::Completed, sim_time_s)
                            .with_message(err.code()),
                    );
                    return Err(err);
                }
            };
            sim_time_s += step.elapsed_s;
            iteration += 1;

            match step.result {
                IterationResult::Closed(event) => {
                    info!(
                        sim_time_s,
                        point_index = event.point_index,
                        "wall closed"
                    );
                    break (TerminationReason::WallClosed, Some(event));
                }
                IterationResult::Open(next) => control = next,
            }
        };

        info!(
            reason = reason.code(),
            sim_time_s,
            iterations = iteration,
            "coupling loop terminated"
        );
        emit(
            &mut progress,
            CouplingProgress::stage(iteration, CouplingStage::Completed, sim_time_s)
                .with_message(reason.code()),
        );

        Ok(CouplingOutcome {
            reason,
            sim_time_s,
            iterations: iteration,
            control,
            closure,
        })
    }

    fn iterate(
        &mut self,
        iteration: usize,
        sim_time_s: f64,
        control: &WallProfile,
        progress: &mut Option<&mut dyn FnMut(CouplingProgress)>,
    ) -> CouplingResult<IterationStep> {
        let stage = |stage| CouplingProgress::stage(iteration, stage, sim_time_s);

        emit(progress, stage(CouplingStage::Meshing));
        let mesh = self
            .mesher
            .generate(control.y(), &self.config.mesh)
            .map_err(CouplingError::collaborator(CouplingStage::Meshing))?;
        self.solver
            .mesh_updated(&mesh)
            .map_err(CouplingError::collaborator(CouplingStage::Meshing))?;

        emit(progress, stage(CouplingStage::InitialConditions));
        let wall = self.solver.case().wall_samples()?;
        let centres = self.solver.case().cell_centres_x()?;
        let flow = solve_profile(&wall, &self.gas, &RootConfig::default())?;
        let initial = flow.interpolate_onto(&centres)?;
        self.solver
            .write_initial_conditions(&initial)
            .map_err(CouplingError::collaborator(CouplingStage::InitialConditions))?;

        emit(progress, stage(CouplingStage::Solving));
        self.solver
            .launch(self.config.run.steady_solve_end_time_s)
            .map_err(CouplingError::collaborator(CouplingStage::Solving))?;

        emit(progress, stage(CouplingStage::Monitoring));
        let mut monitor = ConvergenceMonitor::new(self.config.monitor.clone())?;
        let level = monitor.run(self.solver.case_mut(), &mut self.sleeper)?;
        self.solver
            .stop_at(&level)
            .map_err(CouplingError::collaborator(CouplingStage::Solving))?;
        self.ensure_readable(&level)?;

        emit(
            progress,
            stage(CouplingStage::Regression).with_message(format!("steady at {level}")),
        );
        let opts = &self.config.regression;
        let case = self.solver.case();
        let mdot_a = case.mass_flux(&opts.accretion_field, &level)?;
        let mdot_s = case.mass_flux(&opts.sublimation_field, &level)?;
        let rates = opts.monolayer()?.regression_rates(&mdot_a, &mdot_s)?;
        let regression = integrate(&rates, wall.y(), opts)?;
        if regression.outcome == RegressionOutcome::NoRegression {
            warn!(iteration, "zero regression rates, simulated time does not advance");
        }

        if let Some(history) = &self.history {
            history.append(&WallRecord {
                iteration,
                time_s: sim_time_s,
                x: wall.x().to_vec(),
                y: wall.y().to_vec(),
                steady_level: Some(level.value()),
            })?;
        }

        let elapsed_s = regression.state.elapsed_s;
        if let RegressionOutcome::Closed(event) = regression.outcome {
            if let Some(history) = &self.history {
                history.record_closure(&ClosureRecord {
                    time_s: sim_time_s + event.elapsed_s,
                    point_index: event.point_index,
                    x: wall.x().to_vec(),
                    y: event.heights.clone(),
                })?;
            }
            self.solver
                .clean()
                .map_err(CouplingError::collaborator(CouplingStage::Regression))?;
            return Ok(IterationStep {
                elapsed_s,
                result: IterationResult::Closed(event),
            });
        }

        emit(progress, stage(CouplingStage::GeometryUpdate));
        let geometry = &self.config.geometry;
        let regressed = smooth_onto(
            wall.x(),
            &regression.state.accumulated,
            control.x(),
            geometry.smoothing_factor,
            geometry.extrapolation,
        )?;
        // Sampled heights only feed the integrator; the control points move
        // by the regression alone.
        let next = control
            .y()
            .iter()
            .zip(&regressed)
            .map(|(y, d)| y - d)
            .collect();
        let next = control.with_heights(next)?;
        self.solver
            .clean()
            .map_err(CouplingError::collaborator(CouplingStage::GeometryUpdate))?;

        Ok(IterationStep {
            elapsed_s,
            result: IterationResult::Open(next),
        })
    }

    fn ensure_readable(&mut self, level: &TimeLevel) -> CouplingResult<()> {
        match self
            .solver
            .case_mut()
            .materialize(std::slice::from_ref(level))?
        {
            Materialization::Ready => Ok(()),
            Materialization::Incomplete { level } => Err(CouplingError::MalformedInput {
                what: format!("steady level {level} is incomplete after the solver stopped"),
            }),
        }
    }
}

struct IterationStep {
    elapsed_s: f64,
    result: IterationResult,
}

enum IterationResult {
    Closed(ClosureEvent),
    /// Control points for the next mesh.
    Open(WallProfile),
}

fn emit(progress: &mut Option<&mut dyn FnMut(CouplingProgress)>, event: CouplingProgress) {
    if let Some(cb) = progress.as_deref_mut() {
        cb(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reason_codes() {
        assert_eq!(TerminationReason::WallClosed.code(), "wall_closed");
        assert_eq!(TerminationReason::EndTimeReached.to_string(), "end_time");
        assert_eq!(TerminationReason::MaxIterations.code(), "max_iterations");
    }
}
