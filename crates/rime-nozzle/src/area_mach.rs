//! Isentropic area–Mach relation and its branch-aware inversion.

use crate::error::{NozzleError, NozzleResult};

/// Solution branch of the area–Mach relation.
///
/// Every `A/A* > 1` has one subsonic and one supersonic root.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Branch {
    Subsonic,
    Supersonic,
}

impl Branch {
    /// Newton seed for this branch.
    pub fn initial_guess(self) -> f64 {
        match self {
            Branch::Subsonic => 0.2,
            Branch::Supersonic => 2.0,
        }
    }
}

/// Root solver configuration.
#[derive(Clone, Debug)]
pub struct RootConfig {
    /// Maximum Newton iterations
    pub max_iterations: usize,
    /// Absolute tolerance on the residual
    pub abs_tol: f64,
    /// Relative tolerance on the residual (scaled by `A/A*`)
    pub rel_tol: f64,
    /// Line search backtracking factor
    pub line_search_beta: f64,
    /// Maximum line search iterations
    pub max_line_search_iters: usize,
    /// Maximum bisection iterations for the fallback
    pub max_bisection_iters: usize,
    /// Upper Mach bound searched by the supersonic fallback
    pub max_mach: f64,
}

impl Default for RootConfig {
    fn default() -> Self {
        Self {
            max_iterations: 50,
            abs_tol: 1e-12,
            rel_tol: 1e-10,
            line_search_beta: 0.5,
            max_line_search_iters: 30,
            max_bisection_iters: 200,
            max_mach: 1.0e3,
        }
    }
}

/// Converged Mach number and how it was found.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MachSolution {
    pub mach: f64,
    pub iterations: usize,
    pub used_fallback: bool,
}

/// `A/A*` produced by Mach number `m`.
pub fn area_ratio_from_mach(m: f64, gamma: f64) -> f64 {
    let term1 = (2.0 / (gamma + 1.0)) * (1.0 + 0.5 * (gamma - 1.0) * m * m);
    let exponent = (gamma + 1.0) / (2.0 * (gamma - 1.0));
    term1.powf(exponent) / m
}

/// Residual `A/A* - f(M)`; zero at a root.
pub fn area_mach_residual(m: f64, area_ratio: f64, gamma: f64) -> f64 {
    area_ratio - area_ratio_from_mach(m, gamma)
}

/// d(residual)/dM in closed form.
fn residual_derivative(m: f64, gamma: f64) -> f64 {
    let g = area_ratio_from_mach(m, gamma);
    -g * (m * m - 1.0) / (m * (1.0 + 0.5 * (gamma - 1.0) * m * m))
}

fn in_branch(m: f64, branch: Branch) -> bool {
    match branch {
        Branch::Subsonic => m > 0.0 && m <= 1.0,
        Branch::Supersonic => m.is_finite() && m >= 1.0,
    }
}

/// Invert the area–Mach relation on the requested branch.
///
/// Newton is seeded from the branch guess and kept inside the branch by
/// backtracking. If Newton stalls, a bisection on the branch bracket is
/// tried. Failure of both is reported as [`NozzleError::NonConvergence`].
pub fn solve_mach(
    area_ratio: f64,
    gamma: f64,
    branch: Branch,
    config: &RootConfig,
) -> NozzleResult<MachSolution> {
    let fail = || NozzleError::NonConvergence {
        index: None,
        area_ratio,
        branch,
    };

    if !area_ratio.is_finite() || !gamma.is_finite() || gamma <= 1.0 {
        return Err(fail());
    }
    // Sonic point: both branches meet at M = 1.
    if (area_ratio - 1.0).abs() <= config.abs_tol.max(1e-12) {
        return Ok(MachSolution {
            mach: 1.0,
            iterations: 0,
            used_fallback: false,
        });
    }
    if area_ratio < 1.0 {
        return Err(fail());
    }

    let tol = config.abs_tol + config.rel_tol * area_ratio;

    if let Some((mach, iterations)) = newton(area_ratio, gamma, branch, tol, config) {
        return Ok(MachSolution {
            mach,
            iterations,
            used_fallback: false,
        });
    }

    bisect(area_ratio, gamma, branch, tol, config)
        .map(|(mach, iterations)| MachSolution {
            mach,
            iterations,
            used_fallback: true,
        })
        .ok_or_else(fail)
}

fn newton(
    area_ratio: f64,
    gamma: f64,
    branch: Branch,
    tol: f64,
    config: &RootConfig,
) -> Option<(f64, usize)> {
    let mut m = branch.initial_guess();
    let mut r = area_mach_residual(m, area_ratio, gamma);

    for iter in 0..config.max_iterations {
        if r.abs() <= tol {
            return Some((m, iter));
        }

        let d = residual_derivative(m, gamma);
        if d == 0.0 || !d.is_finite() {
            return None;
        }
        let dm = -r / d;

        // Backtrack until the step stays on the branch and reduces |r|
        let mut alpha = 1.0;
        let mut m_new = m + alpha * dm;
        let mut accepted = false;
        for _ in 0..config.max_line_search_iters {
            if in_branch(m_new, branch) {
                let r_new = area_mach_residual(m_new, area_ratio, gamma);
                if r_new.is_finite() && r_new.abs() < r.abs() {
                    m = m_new;
                    r = r_new;
                    accepted = true;
                    break;
                }
            }
            alpha *= config.line_search_beta;
            m_new = m + alpha * dm;
        }
        if !accepted {
            return None;
        }
    }

    (r.abs() <= tol).then_some((m, config.max_iterations))
}

fn bisect(
    area_ratio: f64,
    gamma: f64,
    branch: Branch,
    tol: f64,
    config: &RootConfig,
) -> Option<(f64, usize)> {
    // Residual is negative toward the branch's far end and positive at M = 1.
    let (mut lo, mut hi) = match branch {
        Branch::Subsonic => (1e-12, 1.0),
        Branch::Supersonic => {
            let mut hi = 2.0;
            while area_mach_residual(hi, area_ratio, gamma) > 0.0 {
                hi *= 2.0;
                if hi > config.max_mach {
                    return None;
                }
            }
            (1.0, hi)
        }
    };

    let f_far = |m: f64| area_mach_residual(m, area_ratio, gamma);
    let far_is_lo = branch == Branch::Subsonic;

    for iter in 0..config.max_bisection_iters {
        let mid = 0.5 * (lo + hi);
        let r = f_far(mid);
        if r.abs() <= tol {
            return Some((mid, iter + 1));
        }
        // On the subsonic branch r < 0 means M is too small.
        let move_lo = if far_is_lo { r < 0.0 } else { r > 0.0 };
        if move_lo {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    None
}
