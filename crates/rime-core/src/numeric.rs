use crate::RimeError;

/// Floating point type used throughout system
pub type Real = f64;

pub fn ensure_finite(v: Real, what: &'static str) -> Result<Real, RimeError> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(RimeError::NonFinite { what, value: v })
    }
}

/// Check that `xs` is strictly increasing and finite.
pub fn ensure_strictly_increasing(xs: &[Real]) -> Result<(), RimeError> {
    for (i, &x) in xs.iter().enumerate() {
        ensure_finite(x, "coordinate")?;
        if i > 0 && xs[i - 1] >= x {
            return Err(RimeError::NotIncreasing {
                index: i,
                prev: xs[i - 1],
                next: x,
            });
        }
    }
    Ok(())
}

/// Largest absolute value in a slice, 0 for an empty slice.
pub fn max_abs(values: &[Real]) -> Real {
    values.iter().fold(0.0, |acc, v| acc.max(v.abs()))
}

/// Population variance (divides by N), 0 for fewer than one sample.
pub fn variance(values: &[Real]) -> Real {
    if values.is_empty() {
        return 0.0;
    }
    let n = values.len() as Real;
    let mean = values.iter().sum::<Real>() / n;
    values.iter().map(|v| (v - mean).powi(2)).sum::<Real>() / n
}

/// Gradient of `f` with respect to `x` on a non-uniform grid.
///
/// Interior points use the second-order three-point formula, the two ends
/// use one-sided first differences. Requires at least two points.
pub fn gradient(f: &[Real], x: &[Real]) -> Result<Vec<Real>, RimeError> {
    if f.len() != x.len() {
        return Err(RimeError::LengthMismatch {
            what: "gradient samples",
            expected: x.len(),
            actual: f.len(),
        });
    }
    let n = f.len();
    if n < 2 {
        return Err(RimeError::InvalidArg {
            what: "gradient needs at least two points",
        });
    }

    let mut out = vec![0.0; n];
    out[0] = (f[1] - f[0]) / (x[1] - x[0]);
    out[n - 1] = (f[n - 1] - f[n - 2]) / (x[n - 1] - x[n - 2]);
    for i in 1..n - 1 {
        let hl = x[i] - x[i - 1];
        let hr = x[i + 1] - x[i];
        out[i] = (hl * hl * f[i + 1] + (hr * hr - hl * hl) * f[i] - hr * hr * f[i - 1])
            / (hl * hr * (hl + hr));
    }
    Ok(out)
}
