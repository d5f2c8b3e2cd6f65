//! Mach/T/p/U profile along a wall, with regime tracking past the throat.

use crate::area_mach::{Branch, RootConfig, solve_mach};
use crate::error::NozzleResult;
use crate::gas::IsentropicGas;
use crate::interp::interp_clamped;
use rime_core::{WallProfile, gradient};
use tracing::debug;
use uom::si::pressure::pascal;
use uom::si::thermodynamic_temperature::kelvin;
use uom::si::velocity::meter_per_second;

/// Regime flag downstream of the throat. Same two states as the branch.
pub type FlowRegime = Branch;

/// Advance the regime flag after a point has been solved.
///
/// A converging section (`dA/dx < 0`) drops a supersonic stream back to
/// subsonic; a diverging section (`dA/dx > 0`) re-accelerates a subsonic
/// stream. Zero gradient keeps the current regime.
pub fn next_regime(current: FlowRegime, area_gradient: f64) -> FlowRegime {
    match current {
        Branch::Supersonic if area_gradient < 0.0 => Branch::Subsonic,
        Branch::Subsonic if area_gradient > 0.0 => Branch::Supersonic,
        unchanged => unchanged,
    }
}

/// Recorded flip of the regime flag at `index`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RegimeTransition {
    pub index: usize,
    pub from: FlowRegime,
    pub to: FlowRegime,
}

/// Solved quasi-1D flow at the wall sample coordinates (SI units).
#[derive(Clone, Debug)]
pub struct FlowProfile {
    pub x: Vec<f64>,
    pub area_ratio: Vec<f64>,
    pub mach: Vec<f64>,
    pub temperature_k: Vec<f64>,
    pub pressure_pa: Vec<f64>,
    pub velocity_mps: Vec<f64>,
    /// Branch each point was solved on.
    pub branch: Vec<Branch>,
    pub throat_index: usize,
    pub transitions: Vec<RegimeTransition>,
}

/// Flow variables interpolated onto target coordinates (usually cell centres).
#[derive(Clone, Debug, PartialEq)]
pub struct CellInitialConditions {
    pub pressure_pa: Vec<f64>,
    pub temperature_k: Vec<f64>,
    pub mach: Vec<f64>,
    pub velocity_mps: Vec<f64>,
}

impl FlowProfile {
    /// Interpolate `(p, T, M, U)` onto `targets`, clamping outside the samples.
    pub fn interpolate_onto(&self, targets: &[f64]) -> NozzleResult<CellInitialConditions> {
        Ok(CellInitialConditions {
            pressure_pa: interp_clamped(targets, &self.x, &self.pressure_pa)?,
            temperature_k: interp_clamped(targets, &self.x, &self.temperature_k)?,
            mach: interp_clamped(targets, &self.x, &self.mach)?,
            velocity_mps: interp_clamped(targets, &self.x, &self.velocity_mps)?,
        })
    }
}

/// Index of the minimum area; the first one wins on ties.
fn throat_index(area: &[f64]) -> usize {
    area.iter()
        .enumerate()
        .fold((0, f64::INFINITY), |(best_i, best_a), (i, &a)| {
            if a < best_a { (i, a) } else { (best_i, best_a) }
        })
        .0
}

/// Solve the isentropic profile for a wall.
///
/// Points up to and including the throat use the subsonic branch. Past the
/// throat the regime starts supersonic; each point is solved on the current
/// regime, then the regime is advanced with that point's area gradient.
pub fn solve_profile(
    wall: &WallProfile,
    gas: &IsentropicGas,
    config: &RootConfig,
) -> NozzleResult<FlowProfile> {
    let x = wall.x();
    let area = wall.area();
    let d_area = gradient(&area, x)?;

    let throat = throat_index(&area);
    let a_star = area[throat];
    if a_star <= 0.0 {
        return Err(crate::error::NozzleError::InvalidInput {
            what: format!("throat area must be positive, got {a_star} at index {throat}"),
        });
    }
    let area_ratio: Vec<f64> = area.iter().map(|a| a / a_star).collect();
    debug!(throat, a_star, "located throat");

    let n = area.len();
    let mut mach = Vec::with_capacity(n);
    let mut branch = Vec::with_capacity(n);
    let mut transitions = Vec::new();

    for (i, &ratio) in area_ratio.iter().enumerate().take(throat + 1) {
        let sol = solve_mach(ratio, gas.gamma(), Branch::Subsonic, config)
            .map_err(|e| e.at_index(i))?;
        mach.push(sol.mach);
        branch.push(Branch::Subsonic);
    }

    let mut regime = Branch::Supersonic;
    for i in throat + 1..n {
        let sol = solve_mach(area_ratio[i], gas.gamma(), regime, config)
            .map_err(|e| e.at_index(i))?;
        mach.push(sol.mach);
        branch.push(regime);

        let next = next_regime(regime, d_area[i]);
        if next != regime {
            debug!(index = i, from = ?regime, to = ?next, "regime switch");
            transitions.push(RegimeTransition {
                index: i,
                from: regime,
                to: next,
            });
        }
        regime = next;
    }

    let points: Vec<_> = mach.iter().map(|&m| gas.point(m)).collect();

    Ok(FlowProfile {
        x: x.to_vec(),
        area_ratio,
        temperature_k: points.iter().map(|p| p.temperature.get::<kelvin>()).collect(),
        pressure_pa: points.iter().map(|p| p.pressure.get::<pascal>()).collect(),
        velocity_mps: points
            .iter()
            .map(|p| p.velocity.get::<meter_per_second>())
            .collect(),
        mach,
        branch,
        throat_index: throat,
        transitions,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_regime_switches_on_sign() {
        assert_eq!(next_regime(Branch::Supersonic, -1.0), Branch::Subsonic);
        assert_eq!(next_regime(Branch::Supersonic, 0.0), Branch::Supersonic);
        assert_eq!(next_regime(Branch::Subsonic, 1.0), Branch::Supersonic);
        assert_eq!(next_regime(Branch::Subsonic, 0.0), Branch::Subsonic);
    }

    #[test]
    fn throat_picks_first_minimum() {
        assert_eq!(throat_index(&[3.0, 1.0, 1.0, 2.0]), 1);
    }

    #[test]
    fn converging_diverging_nozzle_accelerates_through_throat() {
        let x: Vec<f64> = (0..41).map(|i| i as f64 * 0.025).collect();
        let y: Vec<f64> = x.iter().map(|&v| 0.01 + 0.01 * (v - 0.5).powi(2)).collect();
        let wall = WallProfile::new(x, y).unwrap();

        let profile = solve_profile(&wall, &IsentropicGas::default(), &RootConfig::default()).unwrap();

        assert_eq!(profile.throat_index, 20);
        assert!((profile.mach[20] - 1.0).abs() < 1e-12);
        assert!(profile.mach[..20].iter().all(|&m| m < 1.0));
        assert!(profile.mach[21..].iter().all(|&m| m > 1.0));
        assert!(profile.transitions.is_empty());
        // Mach rises monotonically through a converging-diverging duct
        for w in profile.mach.windows(2) {
            assert!(w[1] > w[0]);
        }
    }
}
