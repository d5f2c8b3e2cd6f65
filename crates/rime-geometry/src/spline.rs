//! Cubic smoothing spline with a residual budget.
//!
//! Minimizes `Σ (y_i − g(x_i))² + λ ∫ g''²` over natural cubic splines with
//! knots at the samples, choosing `λ` so that the residual sum of squares
//! equals the budget `s` (or stays below it when the straight-line fit
//! already meets the budget). Uses the Reinsch formulation:
//! `(R + λ QᵀQ) γ = Qᵀ y`, `g = y − λ Q γ`, where `γ` holds the second
//! derivatives at the interior knots.

use crate::error::{GeometryError, GeometryResult};
use crate::options::Extrapolation;
use nalgebra::{DMatrix, DVector};
use rime_core::{RimeError, ensure_finite, ensure_strictly_increasing, variance};
use tracing::debug;

const MAX_BRACKET_STEPS: usize = 60;
const MAX_BISECTIONS: usize = 200;
const BUDGET_REL_TOL: f64 = 1e-6;

/// A fitted natural cubic spline.
#[derive(Clone, Debug, PartialEq)]
pub struct SmoothingSpline {
    x: Vec<f64>,
    values: Vec<f64>,
    /// Second derivative at each knot; zero at both ends.
    curvature: Vec<f64>,
    lambda: f64,
    residual_ss: f64,
}

/// Residual budget `factor · n · var(y)`.
pub fn smoothing_target(y: &[f64], factor: f64) -> f64 {
    factor * y.len() as f64 * variance(y)
}

/// Fit `(x, y)` with budget `smoothing_target(y, factor)` and evaluate at
/// `targets`. The output has one value per target.
pub fn smooth_onto(
    x: &[f64],
    y: &[f64],
    targets: &[f64],
    factor: f64,
    extrapolation: Extrapolation,
) -> GeometryResult<Vec<f64>> {
    let s = smoothing_target(y, factor);
    let spline = SmoothingSpline::fit(x, y, s)?;
    debug!(
        samples = x.len(),
        targets = targets.len(),
        budget = s,
        residual_ss = spline.residual_ss(),
        lambda = spline.lambda(),
        "smoothed wall heights"
    );
    Ok(spline.eval_many(targets, extrapolation))
}

struct Trial {
    lambda: f64,
    values: DVector<f64>,
    gamma: DVector<f64>,
    rss: f64,
}

/// Matrices of the penalized problem for fixed knots.
struct ReinschSystem {
    q: DMatrix<f64>,
    r: DMatrix<f64>,
    qtq: DMatrix<f64>,
    qty: DVector<f64>,
    y: DVector<f64>,
}

impl ReinschSystem {
    fn new(x: &[f64], y: &[f64]) -> Self {
        let n = x.len();
        let h: Vec<f64> = x.windows(2).map(|w| w[1] - w[0]).collect();
        let mut q = DMatrix::zeros(n, n - 2);
        let mut r = DMatrix::zeros(n - 2, n - 2);
        for j in 1..n - 1 {
            let c = j - 1;
            q[(j - 1, c)] = 1.0 / h[j - 1];
            q[(j, c)] = -1.0 / h[j - 1] - 1.0 / h[j];
            q[(j + 1, c)] = 1.0 / h[j];
            r[(c, c)] = (h[j - 1] + h[j]) / 3.0;
            if j < n - 2 {
                r[(c, c + 1)] = h[j] / 6.0;
                r[(c + 1, c)] = h[j] / 6.0;
            }
        }
        let y = DVector::from_column_slice(y);
        let qtq = q.transpose() * &q;
        let qty = q.transpose() * &y;
        Self { q, r, qtq, qty, y }
    }

    fn solve(&self, lambda: f64) -> GeometryResult<Trial> {
        let m = &self.r + &self.qtq * lambda;
        let gamma = m
            .cholesky()
            .ok_or(GeometryError::Singular { lambda })?
            .solve(&self.qty);
        let correction = &self.q * &gamma * lambda;
        let rss = correction.norm_squared();
        Ok(Trial {
            lambda,
            values: &self.y - correction,
            gamma,
            rss,
        })
    }
}

/// Least-squares line `a + b x` and its residual sum of squares.
fn linear_fit(x: &[f64], y: &[f64]) -> (f64, f64, f64) {
    let n = x.len() as f64;
    let mx = x.iter().sum::<f64>() / n;
    let my = y.iter().sum::<f64>() / n;
    let sxx: f64 = x.iter().map(|xi| (xi - mx).powi(2)).sum();
    let sxy: f64 = x.iter().zip(y).map(|(xi, yi)| (xi - mx) * (yi - my)).sum();
    let b = sxy / sxx;
    let a = my - b * mx;
    let rss = x.iter().zip(y).map(|(xi, yi)| (yi - a - b * xi).powi(2)).sum();
    (a, b, rss)
}

impl SmoothingSpline {
    /// Fit a spline whose residual sum of squares does not exceed `s`.
    ///
    /// `s = 0` interpolates. Two samples give the straight line through them.
    pub fn fit(x: &[f64], y: &[f64], s: f64) -> GeometryResult<Self> {
        if x.len() != y.len() {
            return Err(RimeError::LengthMismatch {
                what: "spline y vs x",
                expected: x.len(),
                actual: y.len(),
            }
            .into());
        }
        if x.len() < 2 {
            return Err(GeometryError::InvalidInput {
                what: format!("a spline needs at least 2 samples, got {}", x.len()),
            });
        }
        ensure_strictly_increasing(x)?;
        for &v in y {
            ensure_finite(v, "spline sample")?;
        }
        if !(s.is_finite() && s >= 0.0) {
            return Err(GeometryError::InvalidInput {
                what: format!("smoothing budget must be finite and non-negative, got {s}"),
            });
        }

        let n = x.len();
        if n == 2 {
            return Ok(Self::linear(x, y.to_vec(), f64::INFINITY, 0.0));
        }

        let (a, b, rss_linear) = linear_fit(x, y);
        if s > 0.0 && s >= rss_linear {
            let values = x.iter().map(|xi| a + b * xi).collect();
            return Ok(Self::linear(x, values, f64::INFINITY, rss_linear));
        }

        let system = ReinschSystem::new(x, y);
        let trial = if s == 0.0 {
            system.solve(0.0)?
        } else {
            Self::match_budget(&system, x, s)?
        };
        Ok(Self::from_trial(x, trial))
    }

    /// Largest `λ` (to bisection tolerance) whose residual stays within `s`.
    fn match_budget(system: &ReinschSystem, x: &[f64], s: f64) -> GeometryResult<Trial> {
        let mean_h = (x[x.len() - 1] - x[0]) / (x.len() - 1) as f64;
        let mut upper = system.solve(mean_h.powi(3))?;
        let mut lower: Option<Trial> = None;

        for _ in 0..MAX_BRACKET_STEPS {
            if upper.rss > s {
                break;
            }
            let next = system.solve(upper.lambda * 10.0)?;
            lower = Some(upper);
            upper = next;
        }
        if upper.rss <= s {
            return Ok(upper);
        }

        let mut lower = match lower {
            Some(t) => t,
            None => {
                let mut probe = system.solve(upper.lambda / 10.0)?;
                let mut steps = 0;
                while probe.rss > s && steps < MAX_BRACKET_STEPS {
                    upper = probe;
                    probe = system.solve(upper.lambda / 10.0)?;
                    steps += 1;
                }
                if probe.rss > s {
                    probe = system.solve(0.0)?;
                }
                probe
            }
        };
        if lower.lambda == 0.0 {
            return Ok(lower);
        }

        for _ in 0..MAX_BISECTIONS {
            if s - lower.rss <= BUDGET_REL_TOL * s || upper.lambda / lower.lambda < 1.0 + 1e-12 {
                break;
            }
            let mid = system.solve((lower.lambda * upper.lambda).sqrt())?;
            if mid.rss <= s {
                lower = mid;
            } else {
                upper = mid;
            }
        }
        Ok(lower)
    }

    fn linear(x: &[f64], values: Vec<f64>, lambda: f64, residual_ss: f64) -> Self {
        Self {
            x: x.to_vec(),
            values,
            curvature: vec![0.0; x.len()],
            lambda,
            residual_ss,
        }
    }

    fn from_trial(x: &[f64], trial: Trial) -> Self {
        let mut curvature = Vec::with_capacity(x.len());
        curvature.push(0.0);
        curvature.extend(trial.gamma.iter());
        curvature.push(0.0);
        Self {
            x: x.to_vec(),
            values: trial.values.iter().copied().collect(),
            curvature,
            lambda: trial.lambda,
            residual_ss: trial.rss,
        }
    }

    pub fn knots(&self) -> &[f64] {
        &self.x
    }

    /// Spline values at the knots.
    pub fn fitted(&self) -> &[f64] {
        &self.values
    }

    /// Chosen penalty weight. Infinite for a straight-line fit.
    pub fn lambda(&self) -> f64 {
        self.lambda
    }

    /// `Σ (y_i − g(x_i))²` of the fit.
    pub fn residual_ss(&self) -> f64 {
        self.residual_ss
    }

    fn start_slope(&self) -> f64 {
        let h = self.x[1] - self.x[0];
        (self.values[1] - self.values[0]) / h
            - h * (2.0 * self.curvature[0] + self.curvature[1]) / 6.0
    }

    fn end_slope(&self) -> f64 {
        let n = self.x.len();
        let h = self.x[n - 1] - self.x[n - 2];
        (self.values[n - 1] - self.values[n - 2]) / h
            + h * (self.curvature[n - 2] + 2.0 * self.curvature[n - 1]) / 6.0
    }

    pub fn eval(&self, t: f64, extrapolation: Extrapolation) -> f64 {
        let n = self.x.len();
        let (x0, xn) = (self.x[0], self.x[n - 1]);
        if t < x0 {
            return match extrapolation {
                Extrapolation::Clamp => self.values[0],
                Extrapolation::Natural => self.values[0] + self.start_slope() * (t - x0),
            };
        }
        if t > xn {
            return match extrapolation {
                Extrapolation::Clamp => self.values[n - 1],
                Extrapolation::Natural => self.values[n - 1] + self.end_slope() * (t - xn),
            };
        }

        let i = self.x.partition_point(|&xi| xi <= t).saturating_sub(1).min(n - 2);
        let h = self.x[i + 1] - self.x[i];
        let a = (self.x[i + 1] - t) / h;
        let b = 1.0 - a;
        a * self.values[i]
            + b * self.values[i + 1]
            + ((a.powi(3) - a) * self.curvature[i] + (b.powi(3) - b) * self.curvature[i + 1]) * h
                * h
                / 6.0
    }

    pub fn eval_many(&self, targets: &[f64], extrapolation: Extrapolation) -> Vec<f64> {
        targets.iter().map(|&t| self.eval(t, extrapolation)).collect()
    }
}
