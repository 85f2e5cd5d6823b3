//! CSV exports of computed results.
//!
//! The exports carry the numbers behind the PNG plots so they can be
//! re-plotted or compared in spreadsheets and downstream scripts.

use std::path::Path;

use serde::Serialize;

use crate::band::BandComparison;
use crate::error::AppError;
use crate::posterior::PtEnvelope;

pub const ENVELOPE_CSV: &str = "MCMC_PTprofiles.csv";
pub const BAND_POINTS_CSV: &str = "BART-bestFit-bandpoints.csv";

#[derive(Debug, Serialize)]
struct EnvelopeRow {
    pressure_bar: f64,
    t_p2_5: f64,
    t_p16: f64,
    t_median: f64,
    t_p84: f64,
    t_p97_5: f64,
    t_best: Option<f64>,
}

#[derive(Debug, Serialize)]
struct BandRow<'a> {
    filter: &'a str,
    mean_wavelength_um: f64,
    model: f64,
    data: f64,
    uncert: f64,
}

/// Write the posterior PT envelope, one row per layer (increasing pressure).
pub fn write_envelope_csv(path: &Path, envelope: &PtEnvelope) -> Result<(), AppError> {
    let mut writer = csv::Writer::from_path(path)
        .map_err(|e| AppError::output(format!("Failed to create '{}': {e}", path.display())))?;

    for i in 0..envelope.pressure.len() {
        writer
            .serialize(EnvelopeRow {
                pressure_bar: envelope.pressure[i],
                t_p2_5: envelope.low2[i],
                t_p16: envelope.low1[i],
                t_median: envelope.median[i],
                t_p84: envelope.hi1[i],
                t_p97_5: envelope.hi2[i],
                t_best: envelope.best.as_ref().map(|b| b[i]),
            })
            .map_err(|e| AppError::output(format!("Failed to write envelope row: {e}")))?;
    }
    writer
        .flush()
        .map_err(|e| AppError::output(format!("Failed to flush '{}': {e}", path.display())))
}

/// Write the synthetic band points next to the observations.
pub fn write_band_points_csv(path: &Path, comparison: &BandComparison) -> Result<(), AppError> {
    let mut writer = csv::Writer::from_path(path)
        .map_err(|e| AppError::output(format!("Failed to create '{}': {e}", path.display())))?;

    for (i, point) in comparison.points.iter().enumerate() {
        writer
            .serialize(BandRow {
                filter: &point.filter,
                mean_wavelength_um: point.mean_wavelength_um(),
                model: comparison.model_value(i),
                data: comparison.data[i],
                uncert: comparison.uncert[i],
            })
            .map_err(|e| AppError::output(format!("Failed to write band row: {e}")))?;
    }
    writer
        .flush()
        .map_err(|e| AppError::output(format!("Failed to flush '{}': {e}", path.display())))
}
