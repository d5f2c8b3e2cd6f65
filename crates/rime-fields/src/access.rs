//! Interfaces the coupling engine uses to read solver output.

use crate::error::FieldResult;
use crate::foam::FieldValues;
use rime_core::WallProfile;
use std::cmp::Ordering;
use std::fmt;

/// A solver time level: its numeric value and the directory name it lives in.
#[derive(Clone, Debug)]
pub struct TimeLevel {
    value: f64,
    name: String,
}

impl TimeLevel {
    /// Parse a directory name; `None` when it is not a number.
    pub fn parse(name: &str) -> Option<Self> {
        let value: f64 = name.parse().ok()?;
        value.is_finite().then(|| Self {
            value,
            name: name.to_string(),
        })
    }

    /// Level named by the shortest decimal form of `value`.
    pub fn from_value(value: f64) -> Self {
        Self {
            value,
            name: format!("{value}"),
        }
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl PartialEq for TimeLevel {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for TimeLevel {}

impl PartialOrd for TimeLevel {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TimeLevel {
    fn cmp(&self, other: &Self) -> Ordering {
        self.value
            .total_cmp(&other.value)
            .then_with(|| self.name.cmp(&other.name))
    }
}

impl fmt::Display for TimeLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// One field at one time level.
#[derive(Clone, Debug, PartialEq)]
pub struct FlowFieldSnapshot {
    pub field: String,
    pub level: TimeLevel,
    pub values: FieldValues,
    /// Malformed entries dropped while reading.
    pub skipped: usize,
}

/// Result of asking for time levels in full (non-decomposed) form.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Materialization {
    Ready,
    /// A level is still missing from at least one partition.
    Incomplete { level: TimeLevel },
}

/// Time-leveled snapshots produced by a running solver.
pub trait SnapshotSource {
    /// Written time levels, ascending. The initial level is excluded.
    fn available_levels(&self) -> FieldResult<Vec<TimeLevel>>;

    /// Make `levels` readable in full form.
    fn materialize(&mut self, levels: &[TimeLevel]) -> FieldResult<Materialization>;

    /// Read one field at one level. Malformed entries are skipped.
    fn snapshot(&self, field: &str, level: &TimeLevel) -> FieldResult<FlowFieldSnapshot>;
}

/// Wall geometry and wall-adjacent field values of the current mesh.
pub trait WallFieldAccess: SnapshotSource {
    /// Wall half-heights, one sample per wall-adjacent cell.
    fn wall_samples(&self) -> FieldResult<WallProfile>;

    /// Streamwise coordinate of every cell centre.
    fn cell_centres_x(&self) -> FieldResult<Vec<f64>>;

    /// Per-wall-point values of a scalar mass-flux field at `level`.
    fn mass_flux(&self, field: &str, level: &TimeLevel) -> FieldResult<Vec<f64>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn levels_sort_numerically() {
        let mut levels: Vec<TimeLevel> = ["0.1", "0.05", "1e-3", "0.2"]
            .iter()
            .filter_map(|n| TimeLevel::parse(n))
            .collect();
        levels.sort();
        let names: Vec<&str> = levels.iter().map(TimeLevel::name).collect();
        assert_eq!(names, vec!["1e-3", "0.05", "0.1", "0.2"]);
    }

    #[test]
    fn non_numeric_names_are_not_levels() {
        assert!(TimeLevel::parse("constant").is_none());
        assert!(TimeLevel::parse("inf").is_none());
    }

    #[test]
    fn set_membership_by_value_and_name() {
        let mut seen = BTreeSet::new();
        seen.insert(TimeLevel::parse("0.1").unwrap());
        assert!(seen.contains(&TimeLevel::from_value(0.1)));
    }
}
