//! Piecewise-linear interpolation clamped to the sample range.

use crate::error::{NozzleError, NozzleResult};

/// Interpolate `(xp, fp)` at every target.
///
/// `xp` must be strictly increasing. Targets left of `xp[0]` take `fp[0]`,
/// targets right of the last sample take the last value.
pub fn interp_clamped(targets: &[f64], xp: &[f64], fp: &[f64]) -> NozzleResult<Vec<f64>> {
    if xp.len() != fp.len() || xp.is_empty() {
        return Err(NozzleError::InvalidInput {
            what: format!(
                "interpolation needs matching non-empty samples (x: {}, f: {})",
                xp.len(),
                fp.len()
            ),
        });
    }
    rime_core::ensure_strictly_increasing(xp)?;

    let last = xp.len() - 1;
    Ok(targets
        .iter()
        .map(|&t| {
            if t <= xp[0] {
                return fp[0];
            }
            if t >= xp[last] {
                return fp[last];
            }
            // First sample strictly greater than t; 1..=last by the checks above
            let hi = xp.partition_point(|&x| x <= t);
            let lo = hi - 1;
            let w = (t - xp[lo]) / (xp[hi] - xp[lo]);
            fp[lo] + w * (fp[hi] - fp[lo])
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interior_is_linear() {
        let v = interp_clamped(&[0.5, 1.25], &[0.0, 1.0, 2.0], &[0.0, 2.0, 0.0]).unwrap();
        assert_eq!(v, vec![1.0, 1.5]);
    }

    #[test]
    fn clamps_outside_range() {
        let v = interp_clamped(&[-1.0, 3.0], &[0.0, 1.0, 2.0], &[5.0, 2.0, 7.0]).unwrap();
        assert_eq!(v, vec![5.0, 7.0]);
    }

    #[test]
    fn hits_samples_exactly() {
        let v = interp_clamped(&[0.0, 1.0, 2.0], &[0.0, 1.0, 2.0], &[3.0, 4.0, 5.0]).unwrap();
        assert_eq!(v, vec![3.0, 4.0, 5.0]);
    }

    #[test]
    fn rejects_mismatched_samples() {
        assert!(interp_clamped(&[0.0], &[0.0, 1.0], &[1.0]).is_err());
    }
}
