// rime-core/src/units.rs

use uom::si::f64::{
    Length as UomLength, Mass as UomMass, Pressure as UomPressure,
    ThermodynamicTemperature as UomThermodynamicTemperature, Velocity as UomVelocity,
};

// Public canonical unit types (SI, f64)
pub type Length = UomLength;
pub type Mass = UomMass;
pub type Pressure = UomPressure;
pub type Temperature = UomThermodynamicTemperature;
pub type Velocity = UomVelocity;

#[inline]
pub fn pa(v: f64) -> Pressure {
    use uom::si::pressure::pascal;
    Pressure::new::<pascal>(v)
}

#[inline]
pub fn k(v: f64) -> Temperature {
    use uom::si::thermodynamic_temperature::kelvin;
    Temperature::new::<kelvin>(v)
}

#[inline]
pub fn kg(v: f64) -> Mass {
    use uom::si::mass::kilogram;
    Mass::new::<kilogram>(v)
}

#[inline]
pub fn m(v: f64) -> Length {
    use uom::si::length::meter;
    Length::new::<meter>(v)
}

#[inline]
pub fn mps(v: f64) -> Velocity {
    use uom::si::velocity::meter_per_second;
    Velocity::new::<meter_per_second>(v)
}

pub mod constants {
    /// Ångström in metres.
    pub const ANGSTROM_M: f64 = 1e-10;
    /// Mass of one water molecule.
    pub const H2O_MOLECULE_KG: f64 = 2.99e-26;
    /// Specific gas constant of water vapour.
    pub const R_H2O_J_PER_KG_K: f64 = 461.52;
    /// Triple point of water.
    pub const TRIPLE_POINT_K: f64 = 273.16;
    pub const TRIPLE_POINT_PA: f64 = 611.657;
}
