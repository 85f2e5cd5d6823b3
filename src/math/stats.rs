//! Order statistics and smoothing.

/// Percentile with linear interpolation between order statistics.
///
/// `q` is in percent (`0..=100`). Matches the default "linear" definition:
/// the value at fractional rank `(n - 1) * q / 100` of the sorted sample.
/// Returns `None` for an empty sample.
pub fn percentile(values: &[f64], q: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    Some(percentile_sorted(&sorted, q))
}

/// Percentile of an already sorted, non-empty sample.
pub fn percentile_sorted(sorted: &[f64], q: f64) -> f64 {
    let q = q.clamp(0.0, 100.0);
    let rank = (sorted.len() as f64 - 1.0) * q / 100.0;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = rank - lo as f64;
    sorted[lo] + frac * (sorted[hi] - sorted[lo])
}

/// One-dimensional Gaussian filter with `nearest` edge handling.
///
/// The kernel is truncated at `4 * sigma` (rounded to the nearest sample) and
/// normalized to unit sum. `sigma <= 0` returns the input unchanged.
pub fn gaussian_filter1d(values: &[f64], sigma: f64) -> Vec<f64> {
    if sigma <= 0.0 || values.is_empty() {
        return values.to_vec();
    }
    let radius = (4.0 * sigma + 0.5) as isize;
    let weights: Vec<f64> = (-radius..=radius)
        .map(|k| (-0.5 * (k as f64 / sigma).powi(2)).exp())
        .collect();
    let norm: f64 = weights.iter().sum();

    let last = values.len() as isize - 1;
    (0..values.len() as isize)
        .map(|i| {
            weights
                .iter()
                .enumerate()
                .map(|(w_idx, w)| {
                    let j = (i + w_idx as isize - radius).clamp(0, last);
                    w * values[j as usize]
                })
                .sum::<f64>()
                / norm
        })
        .collect()
}
