//! Wall profile along the streamwise coordinate.

use crate::error::{RimeError, RimeResult};
use crate::numeric::{Real, ensure_finite, ensure_strictly_increasing};

/// Ordered `(x, y)` samples of the channel wall, `y` being the half-height.
///
/// `x` is strictly increasing. `y > 0` holds while the channel is open, but
/// is not enforced here: a closed profile is still a valid record.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WallProfile {
    x: Vec<Real>,
    y: Vec<Real>,
}

impl WallProfile {
    pub fn new(x: Vec<Real>, y: Vec<Real>) -> RimeResult<Self> {
        if x.len() != y.len() {
            return Err(RimeError::LengthMismatch {
                what: "wall profile heights",
                expected: x.len(),
                actual: y.len(),
            });
        }
        if x.len() < 2 {
            return Err(RimeError::InvalidArg {
                what: "wall profile needs at least two samples",
            });
        }
        ensure_strictly_increasing(&x)?;
        for &v in &y {
            ensure_finite(v, "wall height")?;
        }
        Ok(Self { x, y })
    }

    /// Build from `(x, y)` pairs.
    pub fn from_pairs(pairs: &[(Real, Real)]) -> RimeResult<Self> {
        let (x, y) = pairs.iter().copied().unzip();
        Self::new(x, y)
    }

    pub fn x(&self) -> &[Real] {
        &self.x
    }

    pub fn y(&self) -> &[Real] {
        &self.y
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    /// Full channel cross-section per unit depth, `A = 2y`.
    pub fn area(&self) -> Vec<Real> {
        self.y.iter().map(|y| 2.0 * y).collect()
    }

    /// True while every half-height is strictly positive.
    pub fn is_open(&self) -> bool {
        self.y.iter().all(|&y| y > 0.0)
    }

    /// Same abscissae, new heights.
    pub fn with_heights(&self, y: Vec<Real>) -> RimeResult<Self> {
        Self::new(self.x.clone(), y)
    }
}
