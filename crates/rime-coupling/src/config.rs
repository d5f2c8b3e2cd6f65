//! Run configuration: one immutable document, split into per-component
//! sections.

use crate::error::{CouplingError, CouplingResult};
use rime_core::units::constants::{R_H2O_J_PER_KG_K, TRIPLE_POINT_K, TRIPLE_POINT_PA};
use rime_core::{k, pa};
use rime_geometry::{GeometryOptions, MeshDivisions};
use rime_monitor::MonitorConfig;
use rime_nozzle::IsentropicGas;
use rime_regression::RegressionOptions;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CouplingConfig {
    #[serde(default)]
    pub gas: GasConfig,
    #[serde(default)]
    pub monitor: MonitorConfig,
    #[serde(default)]
    pub regression: RegressionOptions,
    #[serde(default)]
    pub geometry: GeometryOptions,
    #[serde(default)]
    pub mesh: MeshDivisions,
    #[serde(default)]
    pub run: RunConfig,
}

/// Stagnation state and properties of the working gas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GasConfig {
    #[serde(default = "default_gamma")]
    pub gamma: f64,
    #[serde(default = "default_r_specific")]
    pub r_specific_j_per_kg_k: f64,
    #[serde(default = "default_t0")]
    pub t0_k: f64,
    #[serde(default = "default_p0")]
    pub p0_pa: f64,
}

fn default_gamma() -> f64 {
    1.333
}

fn default_r_specific() -> f64 {
    R_H2O_J_PER_KG_K
}

fn default_t0() -> f64 {
    TRIPLE_POINT_K
}

fn default_p0() -> f64 {
    TRIPLE_POINT_PA
}

impl Default for GasConfig {
    fn default() -> Self {
        Self {
            gamma: default_gamma(),
            r_specific_j_per_kg_k: default_r_specific(),
            t0_k: default_t0(),
            p0_pa: default_p0(),
        }
    }
}

impl GasConfig {
    pub fn to_gas(&self) -> CouplingResult<IsentropicGas> {
        IsentropicGas::new(
            self.gamma,
            self.r_specific_j_per_kg_k,
            k(self.t0_k),
            pa(self.p0_pa),
        )
        .map_err(CouplingError::config)
    }
}

/// Loop budgets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Simulated time after which no new iteration starts (s).
    #[serde(default = "default_end_time")]
    pub end_time_s: f64,
    /// Upper bound on completed iterations: the loop runs at most this
    /// many, stopping once `iterations >= max_iterations`.
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,
    /// Solver end time for each quasi-steady solve.
    #[serde(default = "default_steady_end_time")]
    pub steady_solve_end_time_s: f64,
}

fn default_end_time() -> f64 {
    86_400.0
}

fn default_max_iterations() -> usize {
    100
}

fn default_steady_end_time() -> f64 {
    0.5
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            end_time_s: default_end_time(),
            max_iterations: default_max_iterations(),
            steady_solve_end_time_s: default_steady_end_time(),
        }
    }
}

impl CouplingConfig {
    pub fn validate(&self) -> CouplingResult<()> {
        self.gas.to_gas()?;
        self.monitor.validate().map_err(CouplingError::config)?;
        self.regression.validate().map_err(CouplingError::config)?;
        self.geometry.validate().map_err(CouplingError::config)?;

        if self.mesh.vertical < 2 || self.mesh.horizontal < 2 {
            return Err(CouplingError::config(format!(
                "mesh divisions must be at least 2, got {} x {}",
                self.mesh.vertical, self.mesh.horizontal
            )));
        }
        let run = &self.run;
        if !(run.end_time_s.is_finite() && run.end_time_s > 0.0) {
            return Err(CouplingError::config(format!(
                "end_time_s must be positive, got {}",
                run.end_time_s
            )));
        }
        if run.max_iterations == 0 {
            return Err(CouplingError::config("max_iterations must be at least 1"));
        }
        if !(run.steady_solve_end_time_s.is_finite() && run.steady_solve_end_time_s > 0.0) {
            return Err(CouplingError::config(format!(
                "steady_solve_end_time_s must be positive, got {}",
                run.steady_solve_end_time_s
            )));
        }
        Ok(())
    }

    pub fn from_yaml_str(content: &str) -> CouplingResult<Self> {
        let config: Self = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_str(content: &str) -> CouplingResult<Self> {
        let config: Self = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path`; `.json` files are read as JSON, anything else as YAML.
    pub fn load(path: &Path) -> CouplingResult<Self> {
        let content = std::fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_str(&content),
            _ => Self::from_yaml_str(&content),
        }
    }

    pub fn save_yaml(&self, path: &Path) -> CouplingResult<()> {
        self.validate()?;
        std::fs::write(path, serde_yaml::to_string(self)?)?;
        Ok(())
    }
}
