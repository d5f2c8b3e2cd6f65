//! Calorically perfect gas with fixed stagnation state.

use crate::error::{NozzleError, NozzleResult};
use rime_core::units::constants::{R_H2O_J_PER_KG_K, TRIPLE_POINT_K, TRIPLE_POINT_PA};
use rime_core::{Pressure, Temperature, Velocity, k, mps, pa};
use uom::si::pressure::pascal;
use uom::si::thermodynamic_temperature::kelvin;

/// Isentropic gas model: ratio of specific heats, gas constant and the
/// stagnation temperature/pressure the ratios are scaled by.
#[derive(Clone, Copy, Debug)]
pub struct IsentropicGas {
    gamma: f64,
    r_specific: f64,
    t0: Temperature,
    p0: Pressure,
}

/// Static state at one Mach number.
#[derive(Clone, Copy, Debug)]
pub struct IsentropicPoint {
    pub mach: f64,
    pub temperature: Temperature,
    pub pressure: Pressure,
    pub velocity: Velocity,
}

impl Default for IsentropicGas {
    /// Water vapour stagnating at the triple point.
    fn default() -> Self {
        Self {
            gamma: 1.333,
            r_specific: R_H2O_J_PER_KG_K,
            t0: k(TRIPLE_POINT_K),
            p0: pa(TRIPLE_POINT_PA),
        }
    }
}

impl IsentropicGas {
    pub fn new(
        gamma: f64,
        r_specific: f64,
        t0: Temperature,
        p0: Pressure,
    ) -> NozzleResult<Self> {
        if !gamma.is_finite() || gamma <= 1.0 {
            return Err(NozzleError::InvalidInput {
                what: format!("gamma must be > 1, got {gamma}"),
            });
        }
        if !r_specific.is_finite() || r_specific <= 0.0 {
            return Err(NozzleError::InvalidInput {
                what: format!("gas constant must be positive, got {r_specific}"),
            });
        }
        if t0.get::<kelvin>() <= 0.0 || p0.get::<pascal>() <= 0.0 {
            return Err(NozzleError::InvalidInput {
                what: "stagnation temperature and pressure must be positive".to_string(),
            });
        }
        Ok(Self {
            gamma,
            r_specific,
            t0,
            p0,
        })
    }

    pub fn gamma(&self) -> f64 {
        self.gamma
    }

    pub fn r_specific(&self) -> f64 {
        self.r_specific
    }

    pub fn stagnation_temperature(&self) -> Temperature {
        self.t0
    }

    pub fn stagnation_pressure(&self) -> Pressure {
        self.p0
    }

    /// `T/T0 = 1 / (1 + (γ-1)/2 M²)`
    pub fn temperature_ratio(&self, mach: f64) -> f64 {
        1.0 / (1.0 + 0.5 * (self.gamma - 1.0) * mach * mach)
    }

    /// `p/p0 = (T/T0)^(γ/(γ-1))`
    pub fn pressure_ratio(&self, mach: f64) -> f64 {
        self.temperature_ratio(mach)
            .powf(self.gamma / (self.gamma - 1.0))
    }

    /// `c = sqrt(γ R T)`
    pub fn speed_of_sound(&self, temperature: Temperature) -> Velocity {
        mps((self.gamma * self.r_specific * temperature.get::<kelvin>()).sqrt())
    }

    /// Static temperature, pressure and velocity at `mach`.
    pub fn point(&self, mach: f64) -> IsentropicPoint {
        let t_ratio = self.temperature_ratio(mach);
        let temperature = k(t_ratio * self.t0.get::<kelvin>());
        let pressure = pa(self.pressure_ratio(mach) * self.p0.get::<pascal>());
        let velocity = self.speed_of_sound(temperature) * mach;
        IsentropicPoint {
            mach,
            temperature,
            pressure,
            velocity,
        }
    }
}
