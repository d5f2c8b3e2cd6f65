//! Collaborators backed by external processes: gmsh, the OpenFOAM
//! utilities and an MPI-launched solver.

use rime_core::WallProfile;
use rime_coupling::{CollaboratorError, CollaboratorResult, FlowSolver, MeshGenerator, MeshReport};
use rime_fields::{FieldValues, FoamCase, Reconstructor, TimeLevel, WallFieldAccess};
use rime_geometry::{MeshDivisions, update_geo_file, write_channel_geo};
use rime_nozzle::CellInitialConditions;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use tracing::{debug, info, warn};

/// Run `command` to completion with its output appended to `log`.
fn run_logged(command: &mut Command, log: &Path) -> CollaboratorResult<()> {
    let name = format!("{command:?}");
    let out = OpenOptions::new().create(true).append(true).open(log)?;
    debug!(command = %name, "running");
    let status = command.stdout(out.try_clone()?).stderr(out).status()?;
    if status.success() {
        Ok(())
    } else {
        Err(CollaboratorError::Command {
            command: name,
            status: status.to_string(),
        })
    }
}

/// `reconstructPar -time <level>` in the case directory.
pub struct ReconstructPar;

impl Reconstructor for ReconstructPar {
    fn reconstruct(&mut self, case_dir: &Path, level: &TimeLevel) -> std::io::Result<()> {
        let status = Command::new("reconstructPar")
            .args(["-time", level.name()])
            .current_dir(case_dir)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()?;
        if status.success() {
            Ok(())
        } else {
            Err(std::io::Error::other(format!(
                "reconstructPar -time {level} failed: {status}"
            )))
        }
    }
}

/// Channel mesh from a gmsh script whose first points are the wall
/// control points.
pub struct GmshMesher {
    case_dir: PathBuf,
    mesh_name: String,
    control: WallProfile,
    divisions: MeshDivisions,
    points_per_column: usize,
    log: PathBuf,
}

impl GmshMesher {
    /// Write `<mesh_name>.geo` (and an `_original` copy) for `wall`.
    pub fn create(
        case_dir: &Path,
        mesh_name: &str,
        wall: &WallProfile,
        divisions: &MeshDivisions,
        log: &Path,
    ) -> CollaboratorResult<Self> {
        let geo = write_channel_geo(wall, divisions)?;
        let script = case_dir.join(format!("{mesh_name}.geo"));
        fs::write(&script, &geo.script)?;
        fs::write(case_dir.join(format!("{mesh_name}_original.geo")), &geo.script)?;
        info!(
            script = %script.display(),
            sections = geo.section_bounds.len().saturating_sub(1),
            points_per_column = geo.points_per_column,
            "wrote mesh script"
        );

        Ok(Self {
            case_dir: case_dir.to_path_buf(),
            mesh_name: mesh_name.to_string(),
            control: wall.clone(),
            divisions: divisions.clone(),
            points_per_column: geo.points_per_column,
            log: log.to_path_buf(),
        })
    }

    fn command(&self, program: &str) -> Command {
        let mut command = Command::new(program);
        command.current_dir(&self.case_dir);
        command
    }
}

impl MeshGenerator for GmshMesher {
    fn control_points(&self) -> CollaboratorResult<WallProfile> {
        Ok(self.control.clone())
    }

    fn generate(&mut self, heights: &[f64], divisions: &MeshDivisions) -> CollaboratorResult<MeshReport> {
        if divisions != &self.divisions {
            warn!("mesh divisions are fixed when the script is written; keeping the original ones");
        }
        let geo = format!("{}.geo", self.mesh_name);
        let msh = format!("{}.msh", self.mesh_name);
        update_geo_file(&self.case_dir.join(&geo), heights)?;
        self.control = self
            .control
            .with_heights(heights.to_vec())
            .map_err(|e| CollaboratorError::Other {
                what: e.to_string(),
            })?;

        run_logged(
            self.command("gmsh")
                .args(["-3", geo.as_str(), "-o", msh.as_str(), "-format", "msh2"]),
            &self.log,
        )?;
        run_logged(self.command("gmshToFoam").arg(&msh), &self.log)?;
        run_logged(
            self.command("postProcess").args(["-func", "writeCellCentres"]),
            &self.log,
        )?;

        Ok(MeshReport {
            points_per_column: self.points_per_column,
        })
    }
}

/// Parallel solver on a decomposed case, started with `mpirun`.
pub struct FoamSolver {
    case: FoamCase,
    application: String,
    processes: usize,
    /// Wall source fields zeroed before the first solve.
    zeroed_fields: Vec<String>,
    zeroed: bool,
    log: PathBuf,
    child: Option<Child>,
}

impl FoamSolver {
    pub fn new(
        case: FoamCase,
        application: impl Into<String>,
        processes: usize,
        zeroed_fields: Vec<String>,
        log: &Path,
    ) -> Self {
        Self {
            case,
            application: application.into(),
            processes,
            zeroed_fields,
            zeroed: false,
            log: log.to_path_buf(),
            child: None,
        }
    }

    fn command(&self, program: &str) -> Command {
        let mut command = Command::new(program);
        command.current_dir(self.case.root());
        command
    }

    /// Remove partitions and every written time level except the initial one.
    fn remove_outputs(&self) -> CollaboratorResult<()> {
        for dir in self.case.processor_dirs()? {
            fs::remove_dir_all(dir)?;
        }
        for entry in fs::read_dir(self.case.root())? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if name != "0" && entry.path().is_dir() && TimeLevel::parse(&name).is_some() {
                fs::remove_dir_all(entry.path())?;
            }
        }
        Ok(())
    }
}

impl FlowSolver for FoamSolver {
    type Case = FoamCase;

    fn case(&self) -> &FoamCase {
        &self.case
    }

    fn case_mut(&mut self) -> &mut FoamCase {
        &mut self.case
    }

    fn mesh_updated(&mut self, mesh: &MeshReport) -> CollaboratorResult<()> {
        self.case.set_points_per_column(mesh.points_per_column);
        if !self.zeroed {
            let cells = self.case.cell_centres_x()?.len();
            for field in &self.zeroed_fields {
                self.case
                    .write_initial_field(field, &FieldValues::Scalar(vec![0.0; cells]))?;
            }
            self.zeroed = true;
        }
        Ok(())
    }

    fn write_initial_conditions(&mut self, initial: &CellInitialConditions) -> CollaboratorResult<()> {
        let scalar = |v: &[f64]| FieldValues::Scalar(v.to_vec());
        self.case.write_initial_field("p", &scalar(&initial.pressure_pa))?;
        self.case.write_initial_field("T", &scalar(&initial.temperature_k))?;
        self.case.write_initial_field("Ma", &scalar(&initial.mach))?;
        let velocity = initial.velocity_mps.iter().map(|&u| [u, 0.0, 0.0]).collect();
        self.case
            .write_initial_field("U", &FieldValues::Vector(velocity))?;
        Ok(())
    }

    fn launch(&mut self, end_time_s: f64) -> CollaboratorResult<()> {
        self.case.set_end_time(end_time_s)?;
        self.remove_outputs()?;
        run_logged(&mut self.command("decomposePar"), &self.log)?;

        let out = OpenOptions::new().create(true).append(true).open(&self.log)?;
        let child = self
            .command("mpirun")
            .arg("-np")
            .arg(self.processes.to_string())
            .arg(&self.application)
            .arg("-parallel")
            .stdout(out.try_clone()?)
            .stderr(out)
            .spawn()?;
        info!(
            application = %self.application,
            processes = self.processes,
            pid = child.id(),
            "solver launched"
        );
        self.child = Some(child);
        Ok(())
    }

    fn stop_at(&mut self, level: &TimeLevel) -> CollaboratorResult<()> {
        self.case.set_end_time(level.value())?;
        if let Some(mut child) = self.child.take() {
            let status = child.wait()?;
            if !status.success() {
                warn!(%status, "solver exited with failure after steady state");
            }
        }
        Ok(())
    }

    fn clean(&mut self) -> CollaboratorResult<()> {
        self.remove_outputs()
    }
}

impl Drop for FoamSolver {
    fn drop(&mut self) {
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}
