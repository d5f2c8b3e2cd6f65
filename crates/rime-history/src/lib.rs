//! rime-history: per-iteration wall profile history on disk.

pub mod hash;
pub mod store;
pub mod types;

pub use hash::compute_run_id;
pub use store::WallHistoryStore;
pub use types::*;

pub type HistoryResult<T> = Result<T, HistoryError>;

#[derive(thiserror::Error, Debug)]
pub enum HistoryError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Run not found: {run_id}")]
    NotFound { run_id: String },
}
