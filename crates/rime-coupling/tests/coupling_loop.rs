//! End-to-end loop runs against in-memory mesh generator and solver.

use rime_core::WallProfile;
use rime_coupling::{
    CollaboratorError, CollaboratorResult, CouplingConfig, CouplingError, CouplingLoop,
    CouplingProgress, CouplingStage, FlowSolver, MeshGenerator, MeshReport, TerminationReason,
};
use rime_fields::{
    FieldError, FieldResult, FieldValues, FlowFieldSnapshot, Materialization, SnapshotSource,
    TimeLevel, WallFieldAccess,
};
use rime_geometry::MeshDivisions;
use rime_history::WallHistoryStore;
use rime_monitor::Sleeper;
use rime_nozzle::CellInitialConditions;
use rime_regression::{MonolayerModel, Threshold};
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

/// Converging-diverging wall with its throat at x = 0.5 (index 5).
fn wall() -> WallProfile {
    let x: Vec<f64> = (0..11).map(|i| i as f64 * 0.1).collect();
    let y = x.iter().map(|xi| 0.01 + 0.02 * (xi - 0.5).powi(2)).collect();
    WallProfile::new(x, y).unwrap()
}

#[derive(Default)]
struct Shared {
    heights: Vec<f64>,
    meshes: usize,
    launches: usize,
    cleans: usize,
    initial: Option<CellInitialConditions>,
}

struct FakeMesher {
    control: WallProfile,
    shared: Rc<RefCell<Shared>>,
    fail: bool,
}

impl MeshGenerator for FakeMesher {
    fn control_points(&self) -> CollaboratorResult<WallProfile> {
        Ok(self.control.clone())
    }

    fn generate(&mut self, heights: &[f64], divisions: &MeshDivisions) -> CollaboratorResult<MeshReport> {
        if self.fail {
            return Err(CollaboratorError::Command {
                command: "mesh".into(),
                status: "exit status: 1".into(),
            });
        }
        self.control = self.control.with_heights(heights.to_vec()).unwrap();
        let mut shared = self.shared.borrow_mut();
        shared.heights = heights.to_vec();
        shared.meshes += 1;
        Ok(MeshReport {
            points_per_column: divisions.vertical / 2,
        })
    }
}

/// Writes one new time level each time the levels are listed while running.
struct FakeCase {
    x: Vec<f64>,
    shared: Rc<RefCell<Shared>>,
    running: Cell<bool>,
    written: Cell<usize>,
    stalled: bool,
    accretion_flux: f64,
    /// Sampled heights sit this far below the meshed control heights.
    sample_drop: f64,
}

impl FakeCase {
    fn level(i: usize) -> TimeLevel {
        TimeLevel::from_value((i + 1) as f64 / 100.0)
    }
}

impl SnapshotSource for FakeCase {
    fn available_levels(&self) -> FieldResult<Vec<TimeLevel>> {
        if self.running.get() && !self.stalled {
            self.written.set(self.written.get() + 1);
        }
        Ok((0..self.written.get()).map(Self::level).collect())
    }

    fn materialize(&mut self, _levels: &[TimeLevel]) -> FieldResult<Materialization> {
        Ok(Materialization::Ready)
    }

    fn snapshot(&self, field: &str, level: &TimeLevel) -> FieldResult<FlowFieldSnapshot> {
        let values = match field {
            "U" => FieldValues::Vector(vec![[300.0, 0.0, 0.0]; 8]),
            "p" => FieldValues::Scalar(vec![400.0; 8]),
            "T" => FieldValues::Scalar(vec![250.0; 8]),
            other => {
                return Err(FieldError::Missing {
                    what: other.to_string(),
                });
            }
        };
        Ok(FlowFieldSnapshot {
            field: field.to_string(),
            level: level.clone(),
            values,
            skipped: 0,
        })
    }
}

impl WallFieldAccess for FakeCase {
    fn wall_samples(&self) -> FieldResult<WallProfile> {
        let heights = self
            .shared
            .borrow()
            .heights
            .iter()
            .map(|h| h - self.sample_drop)
            .collect();
        Ok(WallProfile::new(self.x.clone(), heights)?)
    }

    fn cell_centres_x(&self) -> FieldResult<Vec<f64>> {
        Ok((0..40).map(|i| 0.0125 + i as f64 * 0.025).collect())
    }

    fn mass_flux(&self, field: &str, _level: &TimeLevel) -> FieldResult<Vec<f64>> {
        let n = self.x.len();
        match field {
            "mdot_a" => Ok(vec![self.accretion_flux; n]),
            "mdot_s" => Ok(vec![0.0; n]),
            other => Err(FieldError::Missing {
                what: other.to_string(),
            }),
        }
    }
}

struct FakeSolver {
    case: FakeCase,
}

impl FlowSolver for FakeSolver {
    type Case = FakeCase;

    fn case(&self) -> &FakeCase {
        &self.case
    }

    fn case_mut(&mut self) -> &mut FakeCase {
        &mut self.case
    }

    fn mesh_updated(&mut self, mesh: &MeshReport) -> CollaboratorResult<()> {
        assert!(mesh.points_per_column > 1);
        Ok(())
    }

    fn write_initial_conditions(&mut self, initial: &CellInitialConditions) -> CollaboratorResult<()> {
        self.case.shared.borrow_mut().initial = Some(initial.clone());
        Ok(())
    }

    fn launch(&mut self, end_time_s: f64) -> CollaboratorResult<()> {
        assert_eq!(end_time_s, 0.5);
        self.case.running.set(true);
        self.case.written.set(0);
        self.case.shared.borrow_mut().launches += 1;
        Ok(())
    }

    fn stop_at(&mut self, level: &TimeLevel) -> CollaboratorResult<()> {
        assert!(level.value() > 0.0);
        self.case.running.set(false);
        Ok(())
    }

    fn clean(&mut self) -> CollaboratorResult<()> {
        self.case.shared.borrow_mut().cleans += 1;
        Ok(())
    }
}

#[derive(Default)]
struct FakeClock {
    slept: Duration,
}

impl Sleeper for FakeClock {
    fn sleep(&mut self, duration: Duration) {
        self.slept += duration;
    }

    fn elapsed(&self) -> Duration {
        self.slept
    }
}

struct Setup {
    shared: Rc<RefCell<Shared>>,
    mesher: FakeMesher,
    solver: FakeSolver,
}

fn setup(accretion_flux: f64) -> Setup {
    let wall = wall();
    let shared = Rc::new(RefCell::new(Shared::default()));
    let mesher = FakeMesher {
        control: wall.clone(),
        shared: shared.clone(),
        fail: false,
    };
    let solver = FakeSolver {
        case: FakeCase {
            x: wall.x().to_vec(),
            shared: shared.clone(),
            running: Cell::new(false),
            written: Cell::new(0),
            stalled: false,
            accretion_flux,
            sample_drop: 0.0,
        },
    };
    Setup {
        shared,
        mesher,
        solver,
    }
}

fn config() -> CouplingConfig {
    let mut config = CouplingConfig::default();
    config.monitor.poll_interval_s = 1.0;
    config
}

/// Flux giving a regression rate of `rate` m/s.
fn flux_for(rate: f64) -> f64 {
    let model = MonolayerModel::default();
    rate / model.rate(1.0)
}

#[test]
fn end_time_budget_stops_the_loop() {
    let Setup {
        shared,
        mesher,
        solver,
    } = setup(flux_for(1e-6));
    let mut config = config();
    config.run.end_time_s = 800.0;

    let mut coupling =
        CouplingLoop::with_sleeper(config, mesher, solver, FakeClock::default()).unwrap();
    let outcome = coupling.run(None).unwrap();

    // 5% of the 0.01 m throat at 1 µm/s takes about 500 s per iteration.
    assert_eq!(outcome.reason, TerminationReason::EndTimeReached);
    assert_eq!(outcome.iterations, 2);
    assert!(outcome.sim_time_s >= 800.0);
    assert!(outcome.closure.is_none());

    let shared = shared.borrow();
    assert_eq!(shared.meshes, 2);
    assert_eq!(shared.launches, 2);
    assert_eq!(shared.cleans, 2);
    assert_eq!(shared.initial.as_ref().unwrap().mach.len(), 40);

    // The wall grew inwards everywhere.
    for (new, old) in outcome.control.y().iter().zip(wall().y()) {
        assert!(new < old, "{new} >= {old}");
    }
}

#[test]
fn closure_ends_the_loop_and_is_recorded() {
    let Setup {
        mesher, solver, ..
    } = setup(flux_for(1e-3));
    let mut config = config();
    config.regression.threshold = Threshold::AbsoluteM(0.02);

    let root = std::env::temp_dir().join("rime_coupling_closure");
    let _ = std::fs::remove_dir_all(&root);
    let history = WallHistoryStore::create(&root, &config, &root).unwrap();

    let mut coupling = CouplingLoop::with_sleeper(config, mesher, solver, FakeClock::default())
        .unwrap()
        .with_history(history.clone());

    let mut events: Vec<CouplingProgress> = Vec::new();
    let mut record = |e: CouplingProgress| events.push(e);
    let outcome = coupling.run(Some(&mut record)).unwrap();

    assert_eq!(outcome.reason, TerminationReason::WallClosed);
    assert_eq!(outcome.iterations, 1);
    let event = outcome.closure.unwrap();
    assert_eq!(event.point_index, 5);
    // 0.01 m at 1 mm/s, plus the overshoot of the last step.
    assert_eq!(outcome.sim_time_s, event.elapsed_s);
    assert!(outcome.sim_time_s >= 10.0 && outcome.sim_time_s < 12.0);

    let records = history.load_history().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].time_s, 0.0);
    assert_eq!(records[0].y, wall().y());
    let closure = history.load_closure().unwrap().unwrap();
    assert_eq!(closure.point_index, 5);
    assert_eq!(closure.y, event.heights);

    let stages: Vec<CouplingStage> = events.iter().map(|e| e.stage).collect();
    assert_eq!(
        stages,
        vec![
            CouplingStage::Meshing,
            CouplingStage::InitialConditions,
            CouplingStage::Solving,
            CouplingStage::Monitoring,
            CouplingStage::Regression,
            CouplingStage::Completed,
        ]
    );
    assert_eq!(events.last().unwrap().message.as_deref(), Some("wall_closed"));
}

#[test]
fn zero_flux_runs_out_of_iterations() {
    let Setup {
        shared,
        mesher,
        solver,
    } = setup(0.0);
    let mut config = config();
    config.run.max_iterations = 3;

    let mut coupling =
        CouplingLoop::with_sleeper(config, mesher, solver, FakeClock::default()).unwrap();
    let outcome = coupling.run(None).unwrap();

    assert_eq!(outcome.reason, TerminationReason::MaxIterations);
    assert_eq!(outcome.iterations, 3);
    assert_eq!(outcome.sim_time_s, 0.0);
    assert_eq!(shared.borrow().meshes, 3);
}

#[test]
fn wall_holds_still_without_flux_when_samples_sit_below_control() {
    let Setup {
        mesher, mut solver, ..
    } = setup(0.0);
    solver.case.sample_drop = 0.002;
    let mut config = config();
    config.run.max_iterations = 3;

    let mut coupling =
        CouplingLoop::with_sleeper(config, mesher, solver, FakeClock::default()).unwrap();
    let outcome = coupling.run(None).unwrap();

    assert_eq!(outcome.reason, TerminationReason::MaxIterations);
    assert_eq!(outcome.control.y(), wall().y());
}

#[test]
fn control_points_drop_by_the_integrated_regression() {
    let rate = 1e-6;
    let Setup {
        mesher, mut solver, ..
    } = setup(flux_for(rate));
    solver.case.sample_drop = 0.002;
    let mut config = config();
    config.run.max_iterations = 1;

    let mut coupling =
        CouplingLoop::with_sleeper(config, mesher, solver, FakeClock::default()).unwrap();
    let outcome = coupling.run(None).unwrap();

    assert_eq!(outcome.reason, TerminationReason::MaxIterations);
    assert!(outcome.sim_time_s > 0.0);
    // Uniform rate, so every point regressed by the same amount.
    let drop = rate * outcome.sim_time_s;
    for (new, old) in outcome.control.y().iter().zip(wall().y()) {
        assert!((old - new - drop).abs() < 1e-12, "{old} - {new} != {drop}");
    }
}

#[test]
fn stalled_solver_trips_the_watchdog() {
    let Setup {
        mesher, mut solver, ..
    } = setup(flux_for(1e-6));
    solver.case.stalled = true;
    let mut config = config();
    config.monitor.poll_interval_s = 30.0;
    config.monitor.watchdog_s = Some(60.0);

    let mut coupling =
        CouplingLoop::with_sleeper(config, mesher, solver, FakeClock::default()).unwrap();
    let err = coupling.run(None).unwrap_err();
    assert!(matches!(err, CouplingError::Watchdog { waited_s } if waited_s >= 60.0));
}

#[test]
fn mesher_failure_is_a_collaborator_error() {
    let Setup {
        mut mesher, solver, ..
    } = setup(flux_for(1e-6));
    mesher.fail = true;

    let mut coupling =
        CouplingLoop::with_sleeper(config(), mesher, solver, FakeClock::default()).unwrap();
    let mut events: Vec<CouplingProgress> = Vec::new();
    let mut record = |e: CouplingProgress| events.push(e);
    match coupling.run(Some(&mut record)).unwrap_err() {
        CouplingError::Collaborator { stage, .. } => assert_eq!(stage, CouplingStage::Meshing),
        other => panic!("unexpected {other:?}"),
    }

    let last = events.last().unwrap();
    assert_eq!(last.stage, CouplingStage::Completed);
    assert_eq!(last.sim_time_s, 0.0);
    assert_eq!(last.message.as_deref(), Some("collaborator"));
}

#[test]
fn invalid_config_is_rejected_up_front() {
    let Setup {
        mesher, solver, ..
    } = setup(0.0);
    let mut config = config();
    config.run.end_time_s = 0.0;
    let err = CouplingLoop::with_sleeper(config, mesher, solver, FakeClock::default())
        .err()
        .unwrap();
    assert!(matches!(err, CouplingError::Config { .. }));
}
