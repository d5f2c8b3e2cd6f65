//! Smoothing options.

use crate::error::{GeometryError, GeometryResult};
use serde::{Deserialize, Serialize};

/// Spline value outside the sampled `x` range.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Extrapolation {
    /// Continue linearly with the end slope (zero curvature at the ends).
    #[default]
    Natural,
    /// Hold the end value.
    Clamp,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeometryOptions {
    /// Residual budget is `smoothing_factor · n · var(y)`.
    #[serde(default = "default_smoothing_factor")]
    pub smoothing_factor: f64,
    #[serde(default)]
    pub extrapolation: Extrapolation,
}

fn default_smoothing_factor() -> f64 {
    1e-4
}

impl Default for GeometryOptions {
    fn default() -> Self {
        Self {
            smoothing_factor: default_smoothing_factor(),
            extrapolation: Extrapolation::default(),
        }
    }
}

impl GeometryOptions {
    pub fn validate(&self) -> GeometryResult<()> {
        if !(self.smoothing_factor.is_finite() && self.smoothing_factor >= 0.0) {
            return Err(GeometryError::InvalidInput {
                what: format!(
                    "smoothing_factor must be finite and non-negative, got {}",
                    self.smoothing_factor
                ),
            });
        }
        Ok(())
    }
}
