//! MCMC log reader.
//!
//! The sampler log contains a human-readable block:
//!
//! ```text
//!  Best-fit params   Uncertainties   Signal/Noise       Sample Mean
//!   1.2345e-01        2.0000e-02       6.17            1.2000e-01
//!   ...
//! <blank line>
//! ```
//!
//! We scan for the marker, then parse every line up to the first blank line
//! (or end of file) into exactly four numbers.

use std::fs;
use std::path::Path;

use crate::domain::BestFitRecord;
use crate::error::AppError;

/// Marker that opens the best-fit section.
pub const BEST_FIT_MARKER: &str = "Best-fit params";

/// Read the best-fit section of an MCMC log file.
pub fn read_best_fit(path: &Path) -> Result<BestFitRecord, AppError> {
    let text = fs::read_to_string(path)
        .map_err(|e| AppError::input(format!("Failed to read MCMC log '{}': {e}", path.display())))?;
    parse_best_fit(&text)
        .map_err(|e| AppError::input(format!("MCMC log '{}': {}", path.display(), e.message())))
}

/// Parse the best-fit section out of MCMC log text.
pub fn parse_best_fit(text: &str) -> Result<BestFitRecord, AppError> {
    let mut lines = text.lines().enumerate();

    lines
        .by_ref()
        .find(|(_, line)| line.trim_start().starts_with(BEST_FIT_MARKER))
        .ok_or_else(|| AppError::input(format!("missing '{BEST_FIT_MARKER}' section")))?;

    let mut record = BestFitRecord::default();
    for (idx, line) in lines {
        if line.trim().is_empty() {
            break;
        }
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() != 4 {
            return Err(AppError::input(format!(
                "line {}: expected 4 columns in best-fit row, found {}",
                idx + 1,
                fields.len()
            )));
        }
        let mut values = [0.0; 4];
        for (slot, field) in values.iter_mut().zip(&fields) {
            *slot = field.parse::<f64>().map_err(|_| {
                AppError::input(format!("line {}: invalid number '{field}'", idx + 1))
            })?;
        }
        record.best.push(values[0]);
        record.uncertainty.push(values[1]);
        record.snr.push(values[2]);
        record.mean.push(values[3]);
    }

    Ok(record)
}
