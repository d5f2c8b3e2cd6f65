//! History storage.

use crate::types::{ClosureRecord, HistoryManifest, WallRecord};
use crate::{HistoryError, HistoryResult, compute_run_id};
use serde::Serialize;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

const MANIFEST: &str = "manifest.json";
const HISTORY: &str = "history.jsonl";
const CLOSURE: &str = "closure.json";

/// One run's directory: manifest, one JSON line per iteration, and the
/// closure snapshot when the wall closed.
#[derive(Clone, Debug)]
pub struct WallHistoryStore {
    run_dir: PathBuf,
    run_id: String,
}

impl WallHistoryStore {
    /// Start a run under `root`, keyed by the hash of `config`. An existing
    /// history for the same key is replaced.
    pub fn create<C: Serialize>(root: &Path, config: &C, case_dir: &Path) -> HistoryResult<Self> {
        let run_id = compute_run_id(config)?;
        let run_dir = root.join(&run_id);
        fs::create_dir_all(&run_dir)?;

        let manifest = HistoryManifest {
            run_id: run_id.clone(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            tool_version: env!("CARGO_PKG_VERSION").to_string(),
            case_dir: case_dir.display().to_string(),
        };
        fs::write(run_dir.join(MANIFEST), serde_json::to_string_pretty(&manifest)?)?;
        fs::write(run_dir.join(HISTORY), "")?;
        let closure = run_dir.join(CLOSURE);
        if closure.exists() {
            fs::remove_file(closure)?;
        }
        debug!(run_id = %run_id, dir = %run_dir.display(), "history store created");

        Ok(Self { run_dir, run_id })
    }

    /// Open an existing run.
    pub fn open(root: &Path, run_id: &str) -> HistoryResult<Self> {
        let run_dir = root.join(run_id);
        if !run_dir.join(MANIFEST).exists() {
            return Err(HistoryError::NotFound {
                run_id: run_id.to_string(),
            });
        }
        Ok(Self {
            run_dir,
            run_id: run_id.to_string(),
        })
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn run_dir(&self) -> &Path {
        &self.run_dir
    }

    pub fn append(&self, record: &WallRecord) -> HistoryResult<()> {
        let mut line = serde_json::to_string(record)?;
        line.push('\n');
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.run_dir.join(HISTORY))?;
        file.write_all(line.as_bytes())?;
        Ok(())
    }

    pub fn record_closure(&self, record: &ClosureRecord) -> HistoryResult<()> {
        fs::write(
            self.run_dir.join(CLOSURE),
            serde_json::to_string_pretty(record)?,
        )?;
        Ok(())
    }

    pub fn load_manifest(&self) -> HistoryResult<HistoryManifest> {
        let content = fs::read_to_string(self.run_dir.join(MANIFEST))?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn load_history(&self) -> HistoryResult<Vec<WallRecord>> {
        let content = fs::read_to_string(self.run_dir.join(HISTORY))?;
        let mut records = Vec::new();
        for line in content.lines() {
            if !line.trim().is_empty() {
                records.push(serde_json::from_str(line)?);
            }
        }
        Ok(records)
    }

    pub fn load_closure(&self) -> HistoryResult<Option<ClosureRecord>> {
        let path = self.run_dir.join(CLOSURE);
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(path)?;
        Ok(Some(serde_json::from_str(&content)?))
    }
}
