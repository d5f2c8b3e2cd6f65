//! Integration options.

use crate::error::{RegressionResult, invalid};
use crate::rate::MonolayerModel;
use rime_core::{kg, m};
use serde::{Deserialize, Serialize};

/// How far a point may regress before the segment ends.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Threshold {
    /// Fraction of the point's height at the start of the segment.
    Fraction(f64),
    /// Same absolute distance (m) for every point.
    AbsoluteM(f64),
}

impl Threshold {
    /// Per-point thresholds for the given starting heights.
    pub fn resolve(&self, heights: &[f64]) -> Vec<f64> {
        match *self {
            Threshold::Fraction(f) => heights.iter().map(|h| f * h.abs()).collect(),
            Threshold::AbsoluteM(a) => vec![a; heights.len()],
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RegressionOptions {
    #[serde(default = "default_threshold")]
    pub threshold: Threshold,
    #[serde(default = "default_dt_min")]
    pub dt_min_s: f64,
    #[serde(default = "default_dt_max")]
    pub dt_max_s: f64,
    /// Share of the remaining margin covered by one step at the fastest rate.
    #[serde(default = "default_safety_factor")]
    pub safety_factor: f64,
    #[serde(default = "default_max_steps")]
    pub max_steps: usize,
    /// Solver field holding the deposition mass flux.
    #[serde(default = "default_accretion_field")]
    pub accretion_field: String,
    /// Solver field holding the sublimation mass flux.
    #[serde(default = "default_sublimation_field")]
    pub sublimation_field: String,
    #[serde(default = "default_layer_thickness")]
    pub layer_thickness_m: f64,
    #[serde(default = "default_molecule_mass")]
    pub molecule_mass_kg: f64,
}

fn default_threshold() -> Threshold {
    Threshold::Fraction(0.05)
}

fn default_dt_min() -> f64 {
    1e-4
}

fn default_dt_max() -> f64 {
    3600.0
}

fn default_safety_factor() -> f64 {
    0.2
}

fn default_max_steps() -> usize {
    10_000_000
}

fn default_accretion_field() -> String {
    "mdot_a".to_string()
}

fn default_sublimation_field() -> String {
    "mdot_s".to_string()
}

fn default_layer_thickness() -> f64 {
    3e-10
}

fn default_molecule_mass() -> f64 {
    2.99e-26
}

impl Default for RegressionOptions {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            dt_min_s: default_dt_min(),
            dt_max_s: default_dt_max(),
            safety_factor: default_safety_factor(),
            max_steps: default_max_steps(),
            accretion_field: default_accretion_field(),
            sublimation_field: default_sublimation_field(),
            layer_thickness_m: default_layer_thickness(),
            molecule_mass_kg: default_molecule_mass(),
        }
    }
}

impl RegressionOptions {
    pub fn validate(&self) -> RegressionResult<()> {
        match self.threshold {
            Threshold::Fraction(f) if !(f.is_finite() && f > 0.0) => {
                return invalid(format!("threshold fraction must be positive, got {f}"));
            }
            Threshold::AbsoluteM(a) if !(a.is_finite() && a > 0.0) => {
                return invalid(format!("absolute threshold must be positive, got {a} m"));
            }
            _ => {}
        }
        if !(self.dt_min_s.is_finite() && self.dt_min_s > 0.0) {
            return invalid(format!("dt_min_s must be positive, got {}", self.dt_min_s));
        }
        if !(self.dt_max_s.is_finite() && self.dt_max_s >= self.dt_min_s) {
            return invalid(format!(
                "dt_max_s ({}) must be finite and at least dt_min_s ({})",
                self.dt_max_s, self.dt_min_s
            ));
        }
        if !(self.safety_factor.is_finite() && self.safety_factor > 0.0) {
            return invalid(format!(
                "safety_factor must be positive, got {}",
                self.safety_factor
            ));
        }
        if self.max_steps == 0 {
            return invalid("max_steps must be positive");
        }
        self.monolayer().map(|_| ())
    }

    pub fn monolayer(&self) -> RegressionResult<MonolayerModel> {
        MonolayerModel::new(m(self.layer_thickness_m), kg(self.molecule_mass_kg))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let opts = RegressionOptions::default();
        opts.validate().unwrap();
        assert_eq!(opts.threshold, Threshold::Fraction(0.05));
        assert_eq!(opts.dt_min_s, 1e-4);
        assert_eq!(opts.dt_max_s, 3600.0);
        assert_eq!(opts.safety_factor, 0.2);
    }

    #[test]
    fn threshold_forms_from_yaml() {
        let opts: RegressionOptions =
            serde_yaml::from_str("threshold: { absolute_m: 0.001 }\ndt_min_s: 0.01\n").unwrap();
        assert_eq!(opts.threshold, Threshold::AbsoluteM(0.001));
        assert_eq!(opts.dt_min_s, 0.01);
        assert_eq!(opts.accretion_field, "mdot_a");
    }

    #[test]
    fn fraction_scales_with_height() {
        let t = Threshold::Fraction(0.05).resolve(&[1.0, 0.2]);
        assert!((t[0] - 0.05).abs() < 1e-15);
        assert!((t[1] - 0.01).abs() < 1e-15);
    }

    #[test]
    fn invalid_options() {
        let mut opts = RegressionOptions::default();
        opts.dt_max_s = 1e-5;
        assert!(opts.validate().is_err());

        let mut opts = RegressionOptions::default();
        opts.threshold = Threshold::Fraction(0.0);
        assert!(opts.validate().is_err());

        let mut opts = RegressionOptions::default();
        opts.molecule_mass_kg = 0.0;
        assert!(opts.validate().is_err());
    }
}
