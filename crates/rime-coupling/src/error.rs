//! Error taxonomy of the coupling loop.
//!
//! Wall closure and exhausted time or iteration budgets are not errors;
//! they end the loop through [`crate::TerminationReason`]. Transient field
//! access problems are absorbed by the convergence monitor and never
//! surface here.

use crate::collaborators::CollaboratorError;
use crate::progress::CouplingStage;
use rime_core::RimeError;
use rime_fields::FieldError;
use rime_geometry::GeometryError;
use rime_history::HistoryError;
use rime_monitor::MonitorError;
use rime_nozzle::NozzleError;
use rime_regression::RegressionError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CouplingError {
    /// Field or geometry data that cannot be read into the expected shape.
    #[error("Malformed input: {what}")]
    MalformedInput { what: String },

    #[error("Numerical non-convergence: {what}")]
    NumericalNonConvergence { what: String },

    #[error("{stage} collaborator failed: {source}")]
    Collaborator {
        stage: CouplingStage,
        #[source]
        source: CollaboratorError,
    },

    #[error("No steady state within the watchdog limit ({waited_s:.1} s waited)")]
    Watchdog { waited_s: f64 },

    #[error("Invalid configuration: {what}")]
    Config { what: String },

    #[error("History error: {0}")]
    History(#[from] HistoryError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type CouplingResult<T> = Result<T, CouplingError>;

impl CouplingError {
    pub(crate) fn config(what: impl ToString) -> Self {
        CouplingError::Config {
            what: what.to_string(),
        }
    }

    pub(crate) fn collaborator(stage: CouplingStage) -> impl FnOnce(CollaboratorError) -> Self {
        move |source| CouplingError::Collaborator { stage, source }
    }

    /// Short reason code for logs and exit status.
    pub fn code(&self) -> &'static str {
        match self {
            CouplingError::MalformedInput { .. } => "malformed_input",
            CouplingError::NumericalNonConvergence { .. } => "non_convergence",
            CouplingError::Collaborator { .. } => "collaborator",
            CouplingError::Watchdog { .. } => "watchdog",
            CouplingError::Config { .. }
            | CouplingError::Yaml(_)
            | CouplingError::Json(_) => "config",
            CouplingError::History(_) | CouplingError::Io(_) => "io",
        }
    }
}

impl From<RimeError> for CouplingError {
    fn from(err: RimeError) -> Self {
        CouplingError::MalformedInput {
            what: err.to_string(),
        }
    }
}

impl From<FieldError> for CouplingError {
    fn from(err: FieldError) -> Self {
        CouplingError::MalformedInput {
            what: err.to_string(),
        }
    }
}

impl From<NozzleError> for CouplingError {
    fn from(err: NozzleError) -> Self {
        match err {
            NozzleError::NonConvergence { .. } => CouplingError::NumericalNonConvergence {
                what: err.to_string(),
            },
            other => CouplingError::MalformedInput {
                what: other.to_string(),
            },
        }
    }
}

impl From<MonitorError> for CouplingError {
    fn from(err: MonitorError) -> Self {
        match err {
            MonitorError::WatchdogExpired { waited_s } => CouplingError::Watchdog { waited_s },
            MonitorError::InvalidConfig { what } => CouplingError::Config { what },
            MonitorError::Field(e) => e.into(),
        }
    }
}

impl From<RegressionError> for CouplingError {
    fn from(err: RegressionError) -> Self {
        CouplingError::MalformedInput {
            what: err.to_string(),
        }
    }
}

impl From<GeometryError> for CouplingError {
    fn from(err: GeometryError) -> Self {
        match err {
            GeometryError::Singular { .. } => CouplingError::NumericalNonConvergence {
                what: err.to_string(),
            },
            other => CouplingError::MalformedInput {
                what: other.to_string(),
            },
        }
    }
}
