//! Saved MCMC sampler output.
//!
//! The sampler stores its chains as a 3-D `.npy` array shaped
//! `(chain, parameter, iteration)`. Post-processing only needs the
//! post-burn-in draws, with all chains concatenated along the iteration axis.

use std::path::Path;

use nalgebra::DMatrix;
use ndarray::{Array3, Axis};
use ndarray_npy::read_npy;

use crate::error::AppError;

/// Load a `(chain, parameter, iteration)` array from a `.npy` file.
pub fn read_sampler_output(path: &Path) -> Result<Array3<f64>, AppError> {
    read_npy::<_, Array3<f64>>(path).map_err(|e| {
        AppError::input(format!(
            "Failed to read sampler output '{}' as a 3-D float64 array: {e}",
            path.display()
        ))
    })
}

/// Drop the burn-in prefix of every chain and stack the chains.
///
/// Returns a `(parameter, sample)` matrix whose columns are ordered chain by
/// chain, iteration by iteration.
pub fn stack_chains(chains: &Array3<f64>, burnin: usize) -> Result<DMatrix<f64>, AppError> {
    let (n_chains, n_params, n_iter) = chains.dim();
    if n_chains == 0 || n_params == 0 {
        return Err(AppError::input("Sampler output is empty."));
    }
    if burnin >= n_iter {
        return Err(AppError::input(format!(
            "Burn-in ({burnin}) leaves no samples: chains only have {n_iter} iterations."
        )));
    }

    let kept = n_iter - burnin;
    let mut stacked = DMatrix::zeros(n_params, n_chains * kept);
    for (c, chain) in chains.axis_iter(Axis(0)).enumerate() {
        for p in 0..n_params {
            for it in 0..kept {
                stacked[(p, c * kept + it)] = chain[(p, burnin + it)];
            }
        }
    }
    Ok(stacked)
}
