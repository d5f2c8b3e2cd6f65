//! Content-based run ids.

use crate::HistoryResult;
use serde::Serialize;
use sha2::{Digest, Sha256};

/// SHA-256 of the JSON form of the run configuration.
pub fn compute_run_id<C: Serialize>(config: &C) -> HistoryResult<String> {
    let mut hasher = Sha256::new();
    hasher.update(serde_json::to_string(config)?.as_bytes());
    hasher.update(env!("CARGO_PKG_VERSION").as_bytes());
    Ok(format!("{:x}", hasher.finalize()))
}
