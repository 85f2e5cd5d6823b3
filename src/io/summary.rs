//! JSON summary of a best-fit reconstruction.

use std::fs::File;
use std::path::Path;

use crate::domain::BestFitSummary;
use crate::error::AppError;

pub const SUMMARY_JSON: &str = "bestFit_summary.json";

pub fn write_summary_json(path: &Path, summary: &BestFitSummary) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::output(format!("Failed to create summary JSON '{}': {e}", path.display())))?;
    serde_json::to_writer_pretty(file, summary)
        .map_err(|e| AppError::output(format!("Failed to write summary JSON: {e}")))
}

pub fn read_summary_json(path: &Path) -> Result<BestFitSummary, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::input(format!("Failed to open summary JSON '{}': {e}", path.display())))?;
    serde_json::from_reader(file).map_err(|e| AppError::input(format!("Invalid summary JSON: {e}")))
}
