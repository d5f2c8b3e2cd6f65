//! Monolayer stoichiometry: mass flux to wall recession rate.

use crate::error::{RegressionResult, invalid};
use rime_core::constants::{ANGSTROM_M, H2O_MOLECULE_KG};
use rime_core::{Length, Mass, RimeError, kg, m};
use uom::si::length::meter;
use uom::si::mass::kilogram;

/// Ice grows or recedes one molecular layer at a time. A layer of
/// thickness `d` holds `1/d²` molecules per square metre.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MonolayerModel {
    pub layer_thickness: Length,
    pub molecule_mass: Mass,
}

impl Default for MonolayerModel {
    fn default() -> Self {
        Self {
            layer_thickness: m(3.0 * ANGSTROM_M),
            molecule_mass: kg(H2O_MOLECULE_KG),
        }
    }
}

impl MonolayerModel {
    pub fn new(layer_thickness: Length, molecule_mass: Mass) -> RegressionResult<Self> {
        let d = layer_thickness.get::<meter>();
        let mm = molecule_mass.get::<kilogram>();
        if !(d.is_finite() && d > 0.0) {
            return invalid(format!("layer thickness must be positive, got {d} m"));
        }
        if !(mm.is_finite() && mm > 0.0) {
            return invalid(format!("molecule mass must be positive, got {mm} kg"));
        }
        Ok(Self {
            layer_thickness,
            molecule_mass,
        })
    }

    /// Molecules per square metre in one layer.
    pub fn areal_density(&self) -> f64 {
        let d = self.layer_thickness.get::<meter>();
        1.0 / (d * d)
    }

    /// Mass of one layer per square metre (kg/m²).
    pub fn layer_mass(&self) -> f64 {
        self.areal_density() * self.molecule_mass.get::<kilogram>()
    }

    /// Recession rate (m/s) for a wall mass flux (kg/m²/s), sign preserved.
    pub fn rate(&self, mass_flux: f64) -> f64 {
        self.layer_thickness.get::<meter>() * mass_flux / self.layer_mass()
    }

    /// Net per-point rate: accretion plus sublimation.
    pub fn regression_rates(&self, mdot_a: &[f64], mdot_s: &[f64]) -> RegressionResult<Vec<f64>> {
        if mdot_a.len() != mdot_s.len() {
            return Err(RimeError::LengthMismatch {
                what: "sublimation flux vs accretion flux",
                expected: mdot_a.len(),
                actual: mdot_s.len(),
            }
            .into());
        }
        mdot_a
            .iter()
            .zip(mdot_s)
            .map(|(&a, &s)| {
                let r = self.rate(a) + self.rate(s);
                if r.is_finite() {
                    Ok(r)
                } else {
                    Err(RimeError::NonFinite {
                        what: "regression rate",
                        value: r,
                    }
                    .into())
                }
            })
            .collect()
    }
}
