//! RMS magnitude of a field and the relative change between two levels.

use rime_fields::FieldValues;

/// `sqrt(mean(v²))` for scalars, `sqrt(mean(|v|²))` for vectors.
///
/// Non-finite entries are ignored. `None` when nothing is left.
pub fn rms(values: &FieldValues) -> Option<f64> {
    let squares: Vec<f64> = match values {
        FieldValues::Scalar(v) => v.iter().map(|x| x * x).collect(),
        FieldValues::Vector(v) => v.iter().map(|c| c.iter().map(|x| x * x).sum()).collect(),
    };
    let finite: Vec<f64> = squares.into_iter().filter(|s| s.is_finite()).collect();
    if finite.is_empty() {
        return None;
    }
    Some((finite.iter().sum::<f64>() / finite.len() as f64).sqrt())
}

/// `|rms_new − rms_old| / |rms_new|`, or `None` when `rms_new` is zero.
pub fn relative_error(rms_old: f64, rms_new: f64) -> Option<f64> {
    if rms_new == 0.0 {
        return None;
    }
    Some((rms_new - rms_old).abs() / rms_new.abs())
}
