//! Order statistics shared by the orientation resolver and the median
//! estimator: linearly-interpolated percentiles and per-axis medians.

use nalgebra::Vector3;

/// Percentile of `values` with linear interpolation between ranks.
///
/// `q` is in `[0, 100]`. The input does not need to be sorted; the caller
/// keeps ownership of the original order.
pub fn percentile(values: &[f32], q: f32) -> f32 {
    assert!(!values.is_empty(), "percentile of an empty slice");
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let h = (sorted.len() - 1) as f32 * q / 100.0;
    let lo = h.floor() as usize;
    let hi = h.ceil() as usize;
    if lo == hi {
        sorted[lo]
    } else {
        let frac = h - lo as f32;
        sorted[lo] * (1.0 - frac) + sorted[hi] * frac
    }
}

/// Median of a mutable slice (sorts in place, averages the two middle values
/// for even lengths).
pub fn median_mut(values: &mut [f32]) -> f32 {
    assert!(!values.is_empty(), "median of an empty slice");
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let n = values.len();
    if n % 2 == 1 {
        values[n / 2]
    } else {
        0.5 * (values[n / 2 - 1] + values[n / 2])
    }
}

/// Componentwise median of a set of 3D points.
pub fn component_median(points: &[Vector3<f32>]) -> Vector3<f32> {
    assert!(!points.is_empty(), "median of an empty point set");
    let mut out = Vector3::zeros();
    let mut axis = Vec::with_capacity(points.len());
    for k in 0..3 {
        axis.clear();
        axis.extend(points.iter().map(|p| p[k]));
        out[k] = median_mut(&mut axis);
    }
    out
}
