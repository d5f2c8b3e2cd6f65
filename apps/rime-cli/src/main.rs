mod error;
mod process;
mod table;

use clap::{Parser, Subcommand, ValueEnum};
use error::CliResult;
use process::{FoamSolver, GmshMesher, ReconstructPar};
use rime_coupling::{CouplingConfig, CouplingError, CouplingLoop, CouplingProgress, CouplingStage};
use rime_fields::FoamCase;
use rime_history::WallHistoryStore;
use rime_monitor::{ConvergenceMonitor, ThreadSleeper};
use rime_nozzle::{RootConfig, solve_profile};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::Level;

#[derive(Parser)]
#[command(name = "rime")]
#[command(about = "Ice-wall regression coupled to a quasi-steady channel flow", long_about = None)]
struct Cli {
    /// Log verbosity
    #[arg(long, global = true, value_enum, default_value_t = LogLevel::Info)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => Level::TRACE,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Info => Level::INFO,
            LogLevel::Warn => Level::WARN,
            LogLevel::Error => Level::ERROR,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Load and validate a run configuration
    Validate {
        /// Path to the configuration file (YAML or JSON)
        config_path: PathBuf,
    },
    /// Estimate initial flow conditions for a wall profile
    InitialConditions {
        /// CSV of wall samples `x,y`
        wall_csv: PathBuf,
        /// CSV whose first column holds the target coordinates
        targets_csv: PathBuf,
        /// Configuration supplying the gas properties
        #[arg(long)]
        config: Option<PathBuf>,
        /// Output CSV file path (optional, defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Watch a running solver until its fields are quasi-steady
    Monitor {
        /// Case directory
        case_dir: PathBuf,
        /// Path to the configuration file
        config_path: PathBuf,
        /// Do not run reconstructPar on decomposed levels
        #[arg(long)]
        no_reconstruct: bool,
    },
    /// Run the coupling loop on a case
    Run {
        /// Case directory
        case_dir: PathBuf,
        /// Path to the configuration file
        config_path: PathBuf,
        /// Wall samples `x,y`, relative to the case directory
        #[arg(long, default_value = "channel_data.csv")]
        wall: PathBuf,
        /// Base name of the mesh script
        #[arg(long, default_value = "channel_mesh")]
        mesh_name: String,
        /// Solver application
        #[arg(long, default_value = "rhoCentralFoam_2ph")]
        solver: String,
        /// MPI processes
        #[arg(long, default_value_t = 7)]
        processes: usize,
        /// Where run histories are kept (defaults to `<case>/history`)
        #[arg(long)]
        history_dir: Option<PathBuf>,
    },
}

fn main() -> CliResult<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(Level::from(cli.log_level))
        .with_target(false)
        .init();

    match cli.command {
        Commands::Validate { config_path } => cmd_validate(&config_path),
        Commands::InitialConditions {
            wall_csv,
            targets_csv,
            config,
            output,
        } => cmd_initial_conditions(&wall_csv, &targets_csv, config.as_deref(), output.as_deref()),
        Commands::Monitor {
            case_dir,
            config_path,
            no_reconstruct,
        } => cmd_monitor(&case_dir, &config_path, !no_reconstruct),
        Commands::Run {
            case_dir,
            config_path,
            wall,
            mesh_name,
            solver,
            processes,
            history_dir,
        } => cmd_run(
            &case_dir,
            &config_path,
            &wall,
            &mesh_name,
            &solver,
            processes,
            history_dir.as_deref(),
        ),
    }
}

fn cmd_validate(config_path: &Path) -> CliResult<()> {
    println!("Validating configuration: {}", config_path.display());
    let config = CouplingConfig::load(config_path)?;
    println!("✓ Configuration is valid");
    println!(
        "  Monitored fields: {}",
        config.monitor.fields.join(", ")
    );
    println!(
        "  End time: {:.1} s, at most {} iterations",
        config.run.end_time_s, config.run.max_iterations
    );
    Ok(())
}

fn cmd_initial_conditions(
    wall_csv: &Path,
    targets_csv: &Path,
    config_path: Option<&Path>,
    output: Option<&Path>,
) -> CliResult<()> {
    let config = match config_path {
        Some(path) => CouplingConfig::load(path)?,
        None => CouplingConfig::default(),
    };
    let gas = config.gas.to_gas()?;
    let wall = table::read_wall(wall_csv)?;
    let targets = table::read_column(targets_csv)?;

    let flow = solve_profile(&wall, &gas, &RootConfig::default())?;
    let cells = flow.interpolate_onto(&targets)?;

    let mut csv = String::from("x,p,T,Ma,U\n");
    for (i, x) in targets.iter().enumerate() {
        csv.push_str(&format!(
            "{},{},{},{},{}\n",
            x, cells.pressure_pa[i], cells.temperature_k[i], cells.mach[i], cells.velocity_mps[i]
        ));
    }

    if let Some(path) = output {
        std::fs::write(path, csv)?;
        println!(
            "✓ Wrote {} rows to {} (throat at x = {})",
            targets.len(),
            path.display(),
            flow.x[flow.throat_index]
        );
    } else {
        print!("{}", csv);
    }
    Ok(())
}

fn cmd_monitor(case_dir: &Path, config_path: &Path, reconstruct: bool) -> CliResult<()> {
    let config = CouplingConfig::load(config_path)?;
    // Only snapshots are read here, never wall cells.
    let mut case = FoamCase::new(case_dir, 0);
    if reconstruct {
        case = case.with_reconstructor(Box::new(ReconstructPar));
    }

    let mut monitor = ConvergenceMonitor::new(config.monitor)?;
    let level = monitor.run(&mut case, &mut ThreadSleeper::new())?;
    case.set_end_time(level.value())?;
    println!("✓ Steady at time level {level}; endTime set to it");
    Ok(())
}

fn cmd_run(
    case_dir: &Path,
    config_path: &Path,
    wall_csv: &Path,
    mesh_name: &str,
    solver_app: &str,
    processes: usize,
    history_dir: Option<&Path>,
) -> CliResult<()> {
    let config = CouplingConfig::load(config_path)?;
    let wall = table::read_wall(&case_dir.join(wall_csv))?;
    let log = case_dir.join("solver.log");

    let mesher = GmshMesher::create(case_dir, mesh_name, &wall, &config.mesh, &log)
        .map_err(|source| CouplingError::Collaborator {
            stage: CouplingStage::Meshing,
            source,
        })?;
    let case = FoamCase::new(case_dir, 0).with_reconstructor(Box::new(ReconstructPar));
    let zeroed = vec![
        config.regression.accretion_field.clone(),
        config.regression.sublimation_field.clone(),
    ];
    let solver = FoamSolver::new(case, solver_app, processes, zeroed, &log);

    let history_root = history_dir
        .map(Path::to_path_buf)
        .unwrap_or_else(|| case_dir.join("history"));
    let history = WallHistoryStore::create(&history_root, &config, case_dir)?;
    println!("Run {} (history in {})", history.run_id(), history.run_dir().display());

    let mut coupling = CouplingLoop::new(config, mesher, solver)?.with_history(history);
    let outcome = coupling.run(Some(&mut |event: CouplingProgress| render_progress(&event)))?;
    clear_progress_line();

    println!(
        "✓ Coupling finished: {} at t = {:.3} s after {} iterations",
        outcome.reason, outcome.sim_time_s, outcome.iterations
    );
    if let Some(closure) = &outcome.closure {
        println!("  Wall closed at point {}", closure.point_index);
    }
    Ok(())
}

fn clear_progress_line() {
    print!("\r{}\r", " ".repeat(100));
    let _ = io::stdout().flush();
}

fn render_progress(event: &CouplingProgress) {
    let mut line = format!(
        "\riteration {}  t={:.3}s  {}",
        event.iteration, event.sim_time_s, event.stage
    );
    if let Some(msg) = &event.message {
        line.push_str(&format!("  {}", msg));
    }
    print!("{:<100}", line);
    let _ = io::stdout().flush();
}
