//! History record types.

use serde::{Deserialize, Serialize};

pub type RunId = String;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HistoryManifest {
    pub run_id: RunId,
    /// RFC 3339 creation time.
    pub timestamp: String,
    pub tool_version: String,
    /// Case directory the run drives.
    pub case_dir: String,
}

/// Wall profile at the start of one coupling iteration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WallRecord {
    pub iteration: usize,
    /// Cumulative simulated time (s).
    pub time_s: f64,
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    /// Solver level at which the flow was judged steady.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub steady_level: Option<f64>,
}

/// Wall heights at the instant the channel closed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClosureRecord {
    pub time_s: f64,
    pub point_index: usize,
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}
