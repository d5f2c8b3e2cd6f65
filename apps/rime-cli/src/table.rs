//! Comma-separated numeric tables.

use crate::error::{CliError, CliResult};
use rime_core::WallProfile;
use std::path::Path;
use tracing::warn;

/// Numeric rows of `path`. Rows that do not parse (headers, blanks) are
/// skipped.
fn read_rows(path: &Path) -> CliResult<Vec<Vec<f64>>> {
    let content = std::fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(parse_rows(&content))
}

fn parse_rows(content: &str) -> Vec<Vec<f64>> {
    let mut rows = Vec::new();
    for (i, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let parsed: Result<Vec<f64>, _> = line.split(',').map(|c| c.trim().parse()).collect();
        match parsed {
            Ok(row) => rows.push(row),
            Err(_) => warn!(line = i + 1, row = line, "skipping invalid row"),
        }
    }
    rows
}

/// `x,y` wall samples.
pub fn read_wall(path: &Path) -> CliResult<WallProfile> {
    let pairs: Vec<(f64, f64)> = read_rows(path)?
        .into_iter()
        .filter_map(|row| match row.as_slice() {
            [x, y] => Some((*x, *y)),
            _ => None,
        })
        .collect();
    if pairs.len() < 2 {
        return Err(CliError::EmptyTable {
            path: path.to_path_buf(),
        });
    }
    Ok(WallProfile::from_pairs(&pairs)?)
}

/// First column of every row.
pub fn read_column(path: &Path) -> CliResult<Vec<f64>> {
    let column: Vec<f64> = read_rows(path)?
        .into_iter()
        .filter_map(|row| row.first().copied())
        .collect();
    if column.is_empty() {
        return Err(CliError::EmptyTable {
            path: path.to_path_buf(),
        });
    }
    Ok(column)
}
