//! On-disk solver case: time directories, partitions and field files.

use crate::access::{FlowFieldSnapshot, Materialization, SnapshotSource, TimeLevel, WallFieldAccess};
use crate::error::{FieldError, FieldResult};
use crate::foam::{self, FieldValues, ParseMode, ParsedField};
use crate::wall::{WallCellSizes, WallCells, find_wall_cells};
use rime_core::WallProfile;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Turns partitioned time levels into full ones (e.g. by running a
/// reconstruction utility in the case directory).
pub trait Reconstructor {
    fn reconstruct(&mut self, case_dir: &Path, level: &TimeLevel) -> std::io::Result<()>;
}

/// A case directory laid out as `<root>/<time>/<field>`, optionally split
/// into `<root>/processorN/<time>/<field>` while the solver runs.
pub struct FoamCase {
    root: PathBuf,
    points_per_column: usize,
    wall_patch: String,
    reconstructor: Option<Box<dyn Reconstructor>>,
}

const INITIAL_LEVEL: &str = "0";
const CELL_CENTRES: &str = "C";

impl FoamCase {
    /// `points_per_column` is the number of mesh vertices across the channel.
    pub fn new(root: impl Into<PathBuf>, points_per_column: usize) -> Self {
        Self {
            root: root.into(),
            points_per_column,
            wall_patch: "outerwall".to_string(),
            reconstructor: None,
        }
    }

    pub fn with_wall_patch(mut self, patch: impl Into<String>) -> Self {
        self.wall_patch = patch.into();
        self
    }

    pub fn with_reconstructor(mut self, reconstructor: Box<dyn Reconstructor>) -> Self {
        self.reconstructor = Some(reconstructor);
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn set_points_per_column(&mut self, points_per_column: usize) {
        self.points_per_column = points_per_column;
    }

    /// `processorN` directories, ordered by N.
    pub fn processor_dirs(&self) -> FieldResult<Vec<PathBuf>> {
        let entries = fs::read_dir(&self.root).map_err(|e| FieldError::io(&self.root, e))?;
        let mut dirs: Vec<(usize, PathBuf)> = entries
            .filter_map(Result::ok)
            .filter(|e| e.path().is_dir())
            .filter_map(|e| {
                let name = e.file_name().to_string_lossy().to_string();
                let n = name.strip_prefix("processor")?.parse::<usize>().ok()?;
                Some((n, e.path()))
            })
            .collect();
        dirs.sort_by_key(|(n, _)| *n);
        Ok(dirs.into_iter().map(|(_, p)| p).collect())
    }

    fn levels_in(dir: &Path) -> FieldResult<Vec<TimeLevel>> {
        let entries = fs::read_dir(dir).map_err(|e| FieldError::io(dir, e))?;
        let mut levels: Vec<TimeLevel> = entries
            .filter_map(Result::ok)
            .filter(|e| e.path().is_dir())
            .filter_map(|e| {
                let name = e.file_name().to_string_lossy().to_string();
                if name == INITIAL_LEVEL {
                    return None;
                }
                TimeLevel::parse(&name)
            })
            .collect();
        levels.sort();
        Ok(levels)
    }

    fn read_text(path: &Path) -> FieldResult<String> {
        if !path.exists() {
            return Err(FieldError::Missing {
                what: format!("field file {}", path.display()),
            });
        }
        fs::read_to_string(path).map_err(|e| FieldError::io(path, e))
    }

    fn field_path(&self, level: &str, field: &str) -> PathBuf {
        self.root.join(level).join(field)
    }

    fn parse_internal(&self, path: &Path, mode: ParseMode) -> FieldResult<ParsedField> {
        let text = Self::read_text(path)?;
        foam::parse_internal_field(&text, mode).map_err(|what| FieldError::Malformed {
            path: path.to_path_buf(),
            what,
        })
    }

    fn cell_centres(&self) -> FieldResult<Vec<[f64; 3]>> {
        let path = self.field_path(INITIAL_LEVEL, CELL_CENTRES);
        match self.parse_internal(&path, ParseMode::Strict)?.values {
            FieldValues::Vector(v) => Ok(v),
            FieldValues::Scalar(_) => Err(FieldError::Malformed {
                path,
                what: "cell centres must be a vector field".to_string(),
            }),
        }
    }

    /// Face centres of the wall patch, from the cell-centre field.
    pub fn wall_faces(&self) -> FieldResult<Vec<[f64; 3]>> {
        let path = self.field_path(INITIAL_LEVEL, CELL_CENTRES);
        let text = Self::read_text(&path)?;
        let parsed = foam::parse_patch_value(&text, &self.wall_patch, ParseMode::Strict)
            .map_err(|what| FieldError::Malformed {
                path: path.clone(),
                what,
            })?;
        match parsed.values {
            FieldValues::Vector(v) => Ok(v),
            FieldValues::Scalar(_) => Err(FieldError::Malformed {
                path,
                what: format!("patch '{}' must hold vectors", self.wall_patch),
            }),
        }
    }

    pub fn wall_cells(&self) -> FieldResult<WallCells> {
        find_wall_cells(&self.cell_centres()?, self.points_per_column)
    }

    pub fn wall_cell_sizes(&self) -> FieldResult<WallCellSizes> {
        self.wall_cells()?.sizes(&self.wall_faces()?)
    }

    /// Replace the internal field of `<root>/0/<field>`.
    pub fn write_initial_field(&self, field: &str, values: &FieldValues) -> FieldResult<()> {
        let path = self.field_path(INITIAL_LEVEL, field);
        let text = Self::read_text(&path)?;
        let edited =
            foam::replace_internal_field(&text, values).map_err(|what| FieldError::Malformed {
                path: path.clone(),
                what,
            })?;
        fs::write(&path, edited).map_err(|e| FieldError::io(&path, e))
    }

    /// Set `endTime` in `<root>/system/controlDict`.
    pub fn set_end_time(&self, end_time: f64) -> FieldResult<()> {
        let path = self.root.join("system").join("controlDict");
        let text = Self::read_text(&path)?;
        fs::write(&path, foam::set_end_time(&text, end_time)).map_err(|e| FieldError::io(&path, e))
    }
}

impl SnapshotSource for FoamCase {
    /// Levels are read from `processor0` when the case is decomposed,
    /// otherwise from the case root.
    fn available_levels(&self) -> FieldResult<Vec<TimeLevel>> {
        match self.processor_dirs()?.first() {
            Some(first) => Self::levels_in(first),
            None => Self::levels_in(&self.root),
        }
    }

    fn materialize(&mut self, levels: &[TimeLevel]) -> FieldResult<Materialization> {
        let processors = self.processor_dirs()?;
        for level in levels {
            if let Some(missing) = processors
                .iter()
                .find(|p| !p.join(level.name()).is_dir())
            {
                debug!(%level, partition = %missing.display(), "time level not yet complete");
                return Ok(Materialization::Incomplete {
                    level: level.clone(),
                });
            }
        }

        if let Some(reconstructor) = self.reconstructor.as_mut() {
            for level in levels {
                reconstructor
                    .reconstruct(&self.root, level)
                    .map_err(|e| FieldError::io(&self.root, e))?;
            }
        }

        match levels
            .iter()
            .find(|level| !self.root.join(level.name()).is_dir())
        {
            Some(level) => Ok(Materialization::Incomplete {
                level: level.clone(),
            }),
            None => Ok(Materialization::Ready),
        }
    }

    fn snapshot(&self, field: &str, level: &TimeLevel) -> FieldResult<FlowFieldSnapshot> {
        let parsed = self.parse_internal(&self.field_path(level.name(), field), ParseMode::Lenient)?;
        Ok(FlowFieldSnapshot {
            field: field.to_string(),
            level: level.clone(),
            values: parsed.values,
            skipped: parsed.skipped,
        })
    }
}

impl WallFieldAccess for FoamCase {
    /// Samples at the wall patch faces, so `y` is the half-height.
    fn wall_samples(&self) -> FieldResult<WallProfile> {
        self.wall_cells()?.profile(&self.wall_faces()?)
    }

    fn cell_centres_x(&self) -> FieldResult<Vec<f64>> {
        Ok(self.cell_centres()?.iter().map(|c| c[0]).collect())
    }

    fn mass_flux(&self, field: &str, level: &TimeLevel) -> FieldResult<Vec<f64>> {
        let path = self.field_path(level.name(), field);
        let parsed = self.parse_internal(&path, ParseMode::Strict)?;
        let wall = self.wall_cells()?;
        match parsed.values {
            FieldValues::Scalar(v) if parsed.uniform => Ok(vec![v[0]; wall.len()]),
            FieldValues::Scalar(v) => wall.select(&v),
            FieldValues::Vector(_) => Err(FieldError::Malformed {
                path,
                what: "mass flux must be a scalar field".to_string(),
            }),
        }
    }
}
