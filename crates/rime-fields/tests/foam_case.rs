//! File-backed tests for the on-disk case reader.

use rime_fields::{
    FieldError, FieldValues, FoamCase, Materialization, Reconstructor, SnapshotSource, TimeLevel,
    WallFieldAccess,
};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

const CENTRES: &str = r#"FoamFile { class volVectorField; object C; }
dimensions      [0 1 0 0 0 0 0];

internalField   nonuniform List<vector>
8
(
(0.0 0.25 0.5)
(0.0 0.75 0.5)
(0.1 0.25 0.5)
(0.1 0.70 0.5)
(0.2 0.65 0.5)
(0.2 0.25 0.5)
(0.3 0.25 0.5)
(0.3 0.70 0.5)
)
;

boundaryField
{
    inlet
    {
        type calculated;
        value uniform (0 0.5 0.5);
    }
    outerwall
    {
        type calculated;
        value nonuniform List<vector> 4((0.0 1.0 0.5) (0.1 0.95 0.5) (0.2 0.9 0.5) (0.3 0.95 0.5));
    }
}
"#;

fn scalar_field(values: &[f64]) -> String {
    let body: Vec<String> = values.iter().map(|v| v.to_string()).collect();
    format!(
        "FoamFile {{ class volScalarField; }}\ninternalField   nonuniform List<scalar>\n{}\n(\n{}\n)\n;\nboundaryField\n{{\n}}\n",
        values.len(),
        body.join("\n")
    )
}

fn fresh_case(name: &str) -> PathBuf {
    let root = std::env::temp_dir().join(format!("rime_fields_{name}"));
    let _ = fs::remove_dir_all(&root);
    fs::create_dir_all(root.join("0")).unwrap();
    fs::create_dir_all(root.join("system")).unwrap();
    fs::write(root.join("0").join("C"), CENTRES).unwrap();
    root
}

fn mkdirs(root: &Path, dirs: &[&str]) {
    for d in dirs {
        fs::create_dir_all(root.join(d)).unwrap();
    }
}

#[test]
fn wall_samples_and_mass_flux_follow_wall_cells() {
    let root = fresh_case("wall");
    mkdirs(&root, &["0.5"]);
    let mdot: Vec<f64> = (0..8).map(|i| i as f64).collect();
    fs::write(root.join("0.5").join("mdot_a"), scalar_field(&mdot)).unwrap();

    let case = FoamCase::new(&root, 3);
    let wall = case.wall_samples().unwrap();
    assert_eq!(wall.x(), &[0.0, 0.1, 0.2, 0.3]);
    // Half-heights from the wall faces, not the cell centres below them.
    assert_eq!(wall.y(), &[1.0, 0.95, 0.9, 0.95]);

    let level = TimeLevel::parse("0.5").unwrap();
    let flux = case.mass_flux("mdot_a", &level).unwrap();
    assert_eq!(flux, vec![1.0, 3.0, 4.0, 7.0]);

    let sizes = case.wall_cell_sizes().unwrap();
    assert!((sizes.heights[0] - 0.25).abs() < 1e-12);
    assert!((sizes.heights[2] - 0.25).abs() < 1e-12);

    assert_eq!(case.cell_centres_x().unwrap().len(), 8);
}

#[test]
fn malformed_mass_flux_is_reported_not_defaulted() {
    let root = fresh_case("malformed");
    mkdirs(&root, &["1"]);
    fs::write(
        root.join("1").join("mdot_a"),
        "internalField nonuniform List<scalar> 2 (1.0 oops);",
    )
    .unwrap();

    let case = FoamCase::new(&root, 3);
    let err = case
        .mass_flux("mdot_a", &TimeLevel::parse("1").unwrap())
        .unwrap_err();
    assert!(matches!(err, FieldError::Malformed { .. }));
    assert!(!err.is_transient());
}

#[test]
fn levels_come_from_first_partition() {
    let root = fresh_case("levels");
    mkdirs(
        &root,
        &[
            "processor0/0",
            "processor0/constant",
            "processor0/0.1",
            "processor0/0.05",
            "processor1/0.05",
        ],
    );

    let case = FoamCase::new(&root, 3);
    let names: Vec<String> = case
        .available_levels()
        .unwrap()
        .iter()
        .map(|l| l.name().to_string())
        .collect();
    assert_eq!(names, vec!["0.05", "0.1"]);
}

#[test]
fn materialize_waits_for_every_partition() {
    let root = fresh_case("partitions");
    mkdirs(
        &root,
        &["processor0/0.05", "processor0/0.1", "processor1/0.05"],
    );

    let mut case = FoamCase::new(&root, 3);
    let levels = case.available_levels().unwrap();
    let outcome = case.materialize(&levels).unwrap();
    assert_eq!(
        outcome,
        Materialization::Incomplete {
            level: TimeLevel::parse("0.1").unwrap()
        }
    );
}

struct RecordingReconstructor {
    calls: Arc<Mutex<Vec<String>>>,
}

impl Reconstructor for RecordingReconstructor {
    fn reconstruct(&mut self, case_dir: &Path, level: &TimeLevel) -> std::io::Result<()> {
        self.calls.lock().unwrap().push(level.name().to_string());
        fs::create_dir_all(case_dir.join(level.name()))
    }
}

#[test]
fn materialize_runs_reconstruction_when_complete() {
    let root = fresh_case("reconstruct");
    mkdirs(
        &root,
        &[
            "processor0/0.05",
            "processor0/0.1",
            "processor1/0.05",
            "processor1/0.1",
        ],
    );

    let calls = Arc::new(Mutex::new(Vec::new()));
    let mut case = FoamCase::new(&root, 3).with_reconstructor(Box::new(RecordingReconstructor {
        calls: Arc::clone(&calls),
    }));
    let levels = case.available_levels().unwrap();
    assert_eq!(case.materialize(&levels).unwrap(), Materialization::Ready);
    assert_eq!(*calls.lock().unwrap(), vec!["0.05", "0.1"]);
}

#[test]
fn snapshot_skips_bad_vectors() {
    let root = fresh_case("snapshot");
    mkdirs(&root, &["0.2"]);
    fs::write(
        root.join("0.2").join("U"),
        "internalField nonuniform List<vector> 3 ((3 4 0) (1 2) (0 0 5));",
    )
    .unwrap();

    let case = FoamCase::new(&root, 3);
    let snap = case.snapshot("U", &TimeLevel::parse("0.2").unwrap()).unwrap();
    assert_eq!(snap.skipped, 1);
    assert_eq!(
        snap.values,
        FieldValues::Vector(vec![[3.0, 4.0, 0.0], [0.0, 0.0, 5.0]])
    );

    let missing = case.snapshot("T", &TimeLevel::parse("0.2").unwrap()).unwrap_err();
    assert!(missing.is_transient());
}

#[test]
fn initial_fields_and_end_time_are_rewritten() {
    let root = fresh_case("write");
    fs::write(root.join("0").join("p"), scalar_field(&[0.0])).unwrap();
    fs::write(
        root.join("system").join("controlDict"),
        "application rhoCentralFoam;\nstopAt endTime;\nendTime 100;\n",
    )
    .unwrap();

    let case = FoamCase::new(&root, 3);
    case.write_initial_field("p", &FieldValues::Scalar(vec![600.0, 605.5]))
        .unwrap();
    let written = fs::read_to_string(root.join("0").join("p")).unwrap();
    assert!(written.contains("605.5"));
    assert!(written.contains("boundaryField"));

    case.set_end_time(0.5).unwrap();
    let dict = fs::read_to_string(root.join("system").join("controlDict")).unwrap();
    assert!(dict.contains("endTime         0.5;"));
    assert!(dict.contains("stopAt endTime;"));
}
