//! Pressure-grid files.
//!
//! Comment lines start with `#`; every other non-blank line describes one
//! layer and carries its pressure (bar) in the last column (a leading layer
//! index column is allowed).

use std::fs;
use std::path::Path;

use crate::error::AppError;

/// Read a pressure grid, returned in increasing order.
pub fn read_pressure_file(path: &Path) -> Result<Vec<f64>, AppError> {
    let text = fs::read_to_string(path).map_err(|e| {
        AppError::input(format!("Failed to read pressure file '{}': {e}", path.display()))
    })?;
    parse_pressure(&text)
        .map_err(|e| AppError::input(format!("Pressure file '{}': {}", path.display(), e.message())))
}

pub fn parse_pressure(text: &str) -> Result<Vec<f64>, AppError> {
    let mut pressure = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let Some(last) = trimmed.split_whitespace().last() else {
            continue;
        };
        let p = last
            .parse::<f64>()
            .map_err(|_| AppError::input(format!("line {}: invalid pressure '{last}'", idx + 1)))?;
        if !(p.is_finite() && p > 0.0) {
            return Err(AppError::input(format!("line {}: pressure must be > 0", idx + 1)));
        }
        pressure.push(p);
    }

    if pressure.len() < 2 {
        return Err(AppError::input("need at least two pressure layers"));
    }
    if pressure[0] > pressure[1] {
        pressure.reverse();
    }
    if pressure.windows(2).any(|w| !(w[1] > w[0])) {
        return Err(AppError::input("pressures are not strictly monotonic"));
    }
    Ok(pressure)
}

/// `n` log-spaced pressures between `p_top` and `p_bottom` (inclusive).
pub fn log_pressure_grid(p_top: f64, p_bottom: f64, n: usize) -> Vec<f64> {
    let n = n.max(2);
    let lo = p_top.log10();
    let hi = p_bottom.log10();
    (0..n)
        .map(|i| 10f64.powf(lo + (hi - lo) * i as f64 / (n as f64 - 1.0)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_last_column_and_sorts_increasing() {
        let text = "# layer  pressure (bar)\n 1 100.0\n 2 1.0\n 3 1e-2\n\n";
        assert_eq!(parse_pressure(text).unwrap(), vec![1e-2, 1.0, 100.0]);
    }

    #[test]
    fn rejects_non_monotonic_grids() {
        let err = parse_pressure("1\n10\n5\n").unwrap_err();
        assert!(err.message().contains("monotonic"));
    }

    #[test]
    fn log_grid_spans_endpoints() {
        let p = log_pressure_grid(1e-5, 100.0, 8);
        assert_eq!(p.len(), 8);
        assert!((p[0] - 1e-5).abs() < 1e-18);
        assert!((p[7] - 100.0).abs() < 1e-9);
    }
}
