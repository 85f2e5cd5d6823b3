//! Free/fixed parameter bookkeeping.
//!
//! The sampler only explores parameters with a non-zero step size. Its outputs
//! (best-fit record, posterior draws) therefore list free parameters only and
//! must be re-interleaved with the fixed values to recover the full vector:
//!
//! ```text
//! stepsize  [ 0.1   0.0   0.2   0.0 ]
//! fallback  [ a     b     c     d   ]
//! free      [ x           y         ]
//! full      [ x     b     y     d   ]
//! ```

use crate::domain::{Geometry, SplitParameters};
use crate::error::AppError;

/// Number of sampled (non-zero step) parameters.
pub fn free_count(stepsize: &[f64]) -> usize {
    stepsize.iter().filter(|&&s| s != 0.0).count()
}

/// Rebuild the full parameter vector from free values and fixed fallbacks.
pub fn expand_params(free: &[f64], stepsize: &[f64], fallback: &[f64]) -> Result<Vec<f64>, AppError> {
    if stepsize.len() != fallback.len() {
        return Err(AppError::input(format!(
            "Step-size array has {} entries but the parameter array has {}.",
            stepsize.len(),
            fallback.len()
        )));
    }
    let n_free = free_count(stepsize);
    if n_free != free.len() {
        return Err(AppError::input(format!(
            "{n_free} parameters have non-zero step size but {} free values were given.",
            free.len()
        )));
    }

    let mut free_iter = free.iter();
    Ok(stepsize
        .iter()
        .zip(fallback)
        .map(|(&step, &fixed)| {
            if step != 0.0 {
                free_iter.next().copied().unwrap_or(fixed)
            } else {
                fixed
            }
        })
        .collect())
}

/// Split a full parameter vector into PT, radius, and abundance parts.
///
/// Layout: `[pt..., (radius if transit), abundance factors...]`.
pub fn split_params(all: &[f64], geometry: Geometry, n_molfit: usize) -> Result<SplitParameters, AppError> {
    let n_rad = geometry.radius_fit_count();
    if all.len() <= n_molfit + n_rad {
        return Err(AppError::input(format!(
            "{} parameters cannot hold {n_molfit} abundance factors, {n_rad} radius parameter(s), and a PT model.",
            all.len()
        )));
    }
    let n_pt = all.len() - n_molfit - n_rad;
    Ok(SplitParameters {
        pt: all[..n_pt].to_vec(),
        radius_km: (n_rad == 1).then(|| all[n_pt]),
        abundance_factors: all[n_pt + n_rad..].to_vec(),
    })
}

/// PT parameters for one posterior draw.
///
/// Starts from a fresh copy of `base_pt` (the best-fit PT parameters) and
/// overwrites the free entries, in order, with the draw's values. The PT
/// parameters lead the full vector, so the draw's first free values belong
/// to them.
pub fn sample_pt_params(base_pt: &[f64], stepsize: &[f64], draw: &[f64]) -> Vec<f64> {
    let mut params = base_pt.to_vec();
    let mut values = draw.iter();
    for (slot, &step) in params.iter_mut().zip(stepsize) {
        if step != 0.0 {
            if let Some(&v) = values.next() {
                *slot = v;
            }
        }
    }
    params
}
