//! Adaptive sub-stepping of accumulated wall regression.

use crate::error::{RegressionResult, invalid};
use crate::options::RegressionOptions;
use rime_core::{RimeError, ensure_finite, max_abs};
use tracing::{debug, info};

/// Accumulated regression per point and the pseudo-time it took.
#[derive(Clone, Debug, PartialEq)]
pub struct RegressionState {
    /// Positive values narrow the channel.
    pub accumulated: Vec<f64>,
    pub elapsed_s: f64,
    pub steps: usize,
}

impl RegressionState {
    fn zeros(n: usize) -> Self {
        Self {
            accumulated: vec![0.0; n],
            elapsed_s: 0.0,
            steps: 0,
        }
    }

    /// Instantaneous heights, `initial − accumulated`.
    pub fn heights(&self, initial: &[f64]) -> Vec<f64> {
        initial
            .iter()
            .zip(&self.accumulated)
            .map(|(h, a)| h - a)
            .collect()
    }
}

/// The wall touched the centreline.
#[derive(Clone, Debug, PartialEq)]
pub struct ClosureEvent {
    /// Pseudo-time since the start of the segment.
    pub elapsed_s: f64,
    /// Point with the lowest height when closure was detected.
    pub point_index: usize,
    /// Full height profile at that instant.
    pub heights: Vec<f64>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum RegressionOutcome {
    /// Some point reached its threshold.
    ThresholdReached,
    Closed(ClosureEvent),
    /// Every rate is zero. Nothing was advanced.
    NoRegression,
    /// `max_steps` ran out before any other stop condition.
    StepLimit,
}

impl RegressionOutcome {
    pub fn is_closed(&self) -> bool {
        matches!(self, RegressionOutcome::Closed(_))
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct RegressionRun {
    pub outcome: RegressionOutcome,
    pub state: RegressionState,
}

/// Step size for the current margins.
fn step_size(margins: &[f64], max_rate: f64, opts: &RegressionOptions) -> f64 {
    let max_margin = max_abs(margins);
    if max_margin > 0.0 {
        (opts.safety_factor * max_margin / max_rate).clamp(opts.dt_min_s, opts.dt_max_s)
    } else {
        opts.dt_min_s
    }
}

/// Lowest non-positive height, if any.
fn closed_point(heights: &[f64]) -> Option<usize> {
    heights
        .iter()
        .enumerate()
        .filter(|(_, h)| **h <= 0.0)
        .min_by(|a, b| a.1.total_cmp(b.1))
        .map(|(i, _)| i)
}

/// Advance regression at constant `rates` (m/s) from `initial_heights` (m).
///
/// Sub-steps until any point's accumulated magnitude reaches its threshold,
/// or any height drops to zero. Closure is checked first on every step and
/// stops integration on the step where it first occurs.
pub fn integrate(
    rates: &[f64],
    initial_heights: &[f64],
    opts: &RegressionOptions,
) -> RegressionResult<RegressionRun> {
    opts.validate()?;
    if rates.len() != initial_heights.len() {
        return Err(RimeError::LengthMismatch {
            what: "regression rates vs wall heights",
            expected: initial_heights.len(),
            actual: rates.len(),
        }
        .into());
    }
    if rates.is_empty() {
        return invalid("no wall points to integrate");
    }
    for &r in rates {
        ensure_finite(r, "regression rate")?;
    }
    for &h in initial_heights {
        ensure_finite(h, "wall height")?;
    }

    let n = rates.len();
    let thresholds = opts.threshold.resolve(initial_heights);
    let mut state = RegressionState::zeros(n);

    if let Some(point_index) = closed_point(initial_heights) {
        info!(point_index, "wall already closed before integration");
        return Ok(RegressionRun {
            outcome: RegressionOutcome::Closed(ClosureEvent {
                elapsed_s: 0.0,
                point_index,
                heights: initial_heights.to_vec(),
            }),
            state,
        });
    }

    let max_rate = max_abs(rates);
    if max_rate == 0.0 {
        info!("all regression rates are zero; nothing to integrate");
        return Ok(RegressionRun {
            outcome: RegressionOutcome::NoRegression,
            state,
        });
    }

    let mut margins: Vec<f64> = thresholds.clone();
    let outcome = loop {
        if state.steps >= opts.max_steps {
            break RegressionOutcome::StepLimit;
        }

        let dt = step_size(&margins, max_rate, opts);
        for (acc, r) in state.accumulated.iter_mut().zip(rates) {
            *acc += r * dt;
        }
        state.elapsed_s += dt;
        state.steps += 1;

        let heights = state.heights(initial_heights);
        if let Some(point_index) = closed_point(&heights) {
            break RegressionOutcome::Closed(ClosureEvent {
                elapsed_s: state.elapsed_s,
                point_index,
                heights,
            });
        }

        for ((m, t), acc) in margins.iter_mut().zip(&thresholds).zip(&state.accumulated) {
            *m = t - acc.abs();
        }
        if margins.iter().any(|m| *m <= 0.0) {
            break RegressionOutcome::ThresholdReached;
        }
        debug!(step = state.steps, dt, elapsed_s = state.elapsed_s, "regression sub-step");
    };

    match &outcome {
        RegressionOutcome::Closed(event) => info!(
            elapsed_s = event.elapsed_s,
            point_index = event.point_index,
            steps = state.steps,
            "wall closed during regression"
        ),
        other => info!(
            steps = state.steps,
            elapsed_s = state.elapsed_s,
            outcome = ?other,
            "regression segment finished"
        ),
    }

    Ok(RegressionRun { outcome, state })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::Threshold;

    fn opts(threshold: Threshold) -> RegressionOptions {
        RegressionOptions {
            threshold,
            ..RegressionOptions::default()
        }
    }

    #[test]
    fn step_size_is_clamped() {
        let o = RegressionOptions::default();
        assert_eq!(step_size(&[1.0], 1e-12, &o), 3600.0);
        assert_eq!(step_size(&[1e-12], 1.0, &o), 1e-4);
        assert_eq!(step_size(&[0.0, 0.0], 1.0, &o), 1e-4);
        assert!((step_size(&[0.5, -1.0], 1.0, &o) - 0.2).abs() < 1e-15);
    }

    #[test]
    fn zero_rates_stop_immediately() {
        let run = integrate(&[0.0, 0.0], &[1.0, 1.0], &opts(Threshold::Fraction(0.05))).unwrap();
        assert_eq!(run.outcome, RegressionOutcome::NoRegression);
        assert_eq!(run.state.steps, 0);
        assert_eq!(run.state.elapsed_s, 0.0);
    }

    #[test]
    fn negative_rates_count_toward_threshold() {
        let run = integrate(&[-1e-3], &[1.0], &opts(Threshold::AbsoluteM(0.01))).unwrap();
        assert_eq!(run.outcome, RegressionOutcome::ThresholdReached);
        assert!(run.state.accumulated[0] <= -0.01);
    }

    #[test]
    fn step_limit_guards_the_loop() {
        let mut o = opts(Threshold::AbsoluteM(1.0));
        o.max_steps = 3;
        o.dt_max_s = 1e-3;
        let run = integrate(&[1e-6], &[10.0], &o).unwrap();
        assert_eq!(run.outcome, RegressionOutcome::StepLimit);
        assert_eq!(run.state.steps, 3);
    }

    #[test]
    fn already_closed_wall_reports_closure() {
        let run = integrate(&[1e-6, 1e-6], &[0.5, 0.0], &opts(Threshold::Fraction(0.05))).unwrap();
        match run.outcome {
            RegressionOutcome::Closed(e) => {
                assert_eq!(e.point_index, 1);
                assert_eq!(e.elapsed_s, 0.0);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn bad_inputs_are_rejected() {
        let o = opts(Threshold::Fraction(0.05));
        assert!(integrate(&[1.0], &[1.0, 2.0], &o).is_err());
        assert!(integrate(&[], &[], &o).is_err());
        assert!(integrate(&[f64::INFINITY], &[1.0], &o).is_err());
    }
}
