//! Errors surfaced by the command-line front end.

use rime_core::RimeError;
use rime_coupling::CouplingError;
use rime_fields::FieldError;
use rime_geometry::GeometryError;
use rime_history::HistoryError;
use rime_monitor::MonitorError;
use rime_nozzle::NozzleError;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("Coupling error [{}]: {0}", .0.code())]
    Coupling(#[from] CouplingError),

    #[error("Nozzle error: {0}")]
    Nozzle(#[from] NozzleError),

    #[error("Monitor error: {0}")]
    Monitor(#[from] MonitorError),

    #[error("Field error: {0}")]
    Field(#[from] FieldError),

    #[error("Geometry error: {0}")]
    Geometry(#[from] GeometryError),

    #[error("History error: {0}")]
    History(#[from] HistoryError),

    #[error("Invalid data: {0}")]
    Core(#[from] RimeError),

    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("No usable rows in {path}")]
    EmptyTable { path: PathBuf },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type CliResult<T> = Result<T, CliError>;
