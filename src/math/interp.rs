//! Linear interpolation and trapezoid integration on 1-D grids.
//!
//! All grids are expected in strictly increasing order. Callers canonicalize
//! ordering before getting here (see `io::atm`).

/// Linearly interpolate `(xs, ys)` at `x`.
///
/// Returns `None` when `x` lies outside `[xs[0], xs[last]]` or the grid is
/// shorter than two points.
pub fn interp_linear(xs: &[f64], ys: &[f64], x: f64) -> Option<f64> {
    if xs.len() < 2 || xs.len() != ys.len() {
        return None;
    }
    let first = xs[0];
    let last = xs[xs.len() - 1];
    if !(x >= first && x <= last) {
        return None;
    }

    // Index of the first grid point strictly greater than x.
    let hi = xs.partition_point(|&v| v <= x).min(xs.len() - 1).max(1);
    let lo = hi - 1;
    let span = xs[hi] - xs[lo];
    if span == 0.0 {
        return Some(ys[lo]);
    }
    let u = (x - xs[lo]) / span;
    Some(ys[lo] + u * (ys[hi] - ys[lo]))
}

/// Interpolate at many points; `None` if any point is out of range.
pub fn interp_many(xs: &[f64], ys: &[f64], at: &[f64]) -> Option<Vec<f64>> {
    at.iter().map(|&x| interp_linear(xs, ys, x)).collect()
}

/// Trapezoid-rule integral of `ys` over `xs`.
pub fn trapezoid(xs: &[f64], ys: &[f64]) -> f64 {
    xs.windows(2)
        .zip(ys.windows(2))
        .map(|(x, y)| 0.5 * (x[1] - x[0]) * (y[0] + y[1]))
        .sum()
}

/// Cumulative trapezoid integral, starting at zero.
///
/// The output has the same length as the input.
pub fn cumulative_trapezoid(xs: &[f64], ys: &[f64]) -> Vec<f64> {
    let mut out = Vec::with_capacity(xs.len());
    if xs.is_empty() {
        return out;
    }
    let mut acc = 0.0;
    out.push(acc);
    for (x, y) in xs.windows(2).zip(ys.windows(2)) {
        acc += 0.5 * (x[1] - x[0]) * (y[0] + y[1]);
        out.push(acc);
    }
    out
}
