//! Posterior PT envelope.
//!
//! Every retained sampler draw is turned into a PT profile; the profiles are
//! then reduced, layer by layer, to the 2.5/16/50/84/97.5 percentiles that
//! bound the 1-sigma and 2-sigma bands.
//!
//! Draws whose profile cannot be used (wrong layer count, non-finite
//! temperatures) are skipped and reported; they never enter the percentiles.

use nalgebra::DMatrix;
use tracing::{debug, warn};

use crate::error::AppError;
use crate::math::percentile_sorted;
use crate::models::{PtEvaluator, free_count, sample_pt_params};

/// Percentiles reported per layer, in ascending order.
pub const ENVELOPE_PERCENTILES: [f64; 5] = [2.5, 16.0, 50.0, 84.0, 97.5];

/// Why a posterior draw was left out of the envelope.
#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    /// The profile had a different number of layers than the pressure grid.
    WrongLength { got: usize, expected: usize },
    /// The profile contained NaN or infinite temperatures.
    NonFinite,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::WrongLength { got, expected } => {
                write!(f, "profile has {got} layers, expected {expected}")
            }
            SkipReason::NonFinite => write!(f, "profile has non-finite temperatures"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkippedSample {
    /// Column index in the stacked sample matrix.
    pub index: usize,
    pub reason: SkipReason,
}

/// Layer-wise percentile envelope (increasing pressure).
#[derive(Debug, Clone)]
pub struct PtEnvelope {
    pub pressure: Vec<f64>,
    /// 2.5th percentile.
    pub low2: Vec<f64>,
    /// 16th percentile.
    pub low1: Vec<f64>,
    pub median: Vec<f64>,
    /// 84th percentile.
    pub hi1: Vec<f64>,
    /// 97.5th percentile.
    pub hi2: Vec<f64>,
    /// Best-fit profile; `None` when the best-fit parameters gave no usable profile.
    pub best: Option<Vec<f64>>,
    /// Number of draws that entered the percentiles.
    pub n_used: usize,
    pub skipped: Vec<SkippedSample>,
}

/// Inputs shared by every draw of the ensemble.
pub struct EnvelopeInputs<'a> {
    /// Post-burn-in draws of the free parameters, `(parameter, sample)`.
    pub samples: &'a DMatrix<f64>,
    /// Step sizes of the full parameter vector.
    pub stepsize: &'a [f64],
    /// Best-fit PT parameters; fixed entries are taken from here.
    pub base_pt: &'a [f64],
    /// Pressure grid (bar, increasing).
    pub pressure: &'a [f64],
    /// Best-fit temperature profile on `pressure`, if there is one.
    pub best: Option<&'a [f64]>,
    pub evaluator: &'a dyn PtEvaluator,
}

/// Evaluate every draw and reduce to the percentile envelope.
pub fn build_envelope(inputs: &EnvelopeInputs<'_>) -> Result<PtEnvelope, AppError> {
    let n_layers = inputs.pressure.len();
    let n_free = free_count(inputs.stepsize);
    if inputs.samples.nrows() != n_free {
        return Err(AppError::input(format!(
            "Sampler output has {} parameters but {n_free} step sizes are non-zero.",
            inputs.samples.nrows()
        )));
    }
    if let Some(best) = inputs.best.filter(|b| b.len() != n_layers) {
        return Err(AppError::output(format!(
            "Best-fit profile has {} layers, expected {n_layers}.",
            best.len()
        )));
    }

    let n_samples = inputs.samples.ncols();
    let mut profiles: Vec<Vec<f64>> = Vec::with_capacity(n_samples);
    let mut skipped = Vec::new();
    for (index, column) in inputs.samples.column_iter().enumerate() {
        let draw: Vec<f64> = column.iter().copied().collect();
        let params = sample_pt_params(inputs.base_pt, inputs.stepsize, &draw);
        let profile = inputs.evaluator.evaluate(inputs.pressure, &params)?;

        let reason = if profile.len() != n_layers {
            Some(SkipReason::WrongLength {
                got: profile.len(),
                expected: n_layers,
            })
        } else if profile.iter().any(|t| !t.is_finite()) {
            Some(SkipReason::NonFinite)
        } else {
            None
        };
        match reason {
            Some(reason) => {
                debug!(sample = index, %reason, "skipping posterior draw");
                skipped.push(SkippedSample { index, reason });
            }
            None => profiles.push(profile),
        }
    }

    if !skipped.is_empty() {
        let indices: Vec<usize> = skipped.iter().map(|s| s.index).collect();
        warn!(
            skipped = skipped.len(),
            total = n_samples,
            ?indices,
            "posterior draws left out of the PT envelope"
        );
    }
    if profiles.is_empty() {
        return Err(AppError::output(format!(
            "All {n_samples} posterior draws produced unusable PT profiles."
        )));
    }

    let mut bands: [Vec<f64>; 5] = Default::default();
    let mut layer = Vec::with_capacity(profiles.len());
    for i in 0..n_layers {
        layer.clear();
        layer.extend(profiles.iter().map(|p| p[i]));
        layer.sort_by(f64::total_cmp);
        for (band, &q) in bands.iter_mut().zip(&ENVELOPE_PERCENTILES) {
            band.push(percentile_sorted(&layer, q));
        }
    }
    let [low2, low1, median, hi1, hi2] = bands;

    Ok(PtEnvelope {
        pressure: inputs.pressure.to_vec(),
        low2,
        low1,
        median,
        hi1,
        hi2,
        best: inputs.best.map(<[f64]>::to_vec),
        n_used: profiles.len(),
        skipped,
    })
}
