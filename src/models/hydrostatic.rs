//! Layer radii from hydrostatic equilibrium.
//!
//! For an ideal gas, `dz = -(R T / (mu g)) d ln P`. Integrating from the top
//! of the grid and pinning the height at the reference pressure `p0` to the
//! planet radius gives the radius of every layer.

use crate::error::AppError;
use crate::math::{cumulative_trapezoid, interp_linear};

/// Inputs to the hydrostatic integration, all in increasing pressure.
#[derive(Debug, Clone, Copy)]
pub struct HydrostaticInputs<'a> {
    /// Pressure (bar).
    pub pressure: &'a [f64],
    /// Temperature (K).
    pub temperature: &'a [f64],
    /// Mean molecular mass (g/mol).
    pub mu: &'a [f64],
    /// Reference pressure (bar).
    pub p0: f64,
    /// Radius at `p0` (km).
    pub r0_km: f64,
    /// Surface gravity (m s^-2).
    pub gravity: f64,
    /// Universal gas constant (J mol^-1 K^-1).
    pub r_gas: f64,
}

/// Radius (km) of every layer.
pub fn radius_from_hydrostatic(inputs: &HydrostaticInputs<'_>) -> Result<Vec<f64>, AppError> {
    let n = inputs.pressure.len();
    if inputs.temperature.len() != n || inputs.mu.len() != n {
        return Err(AppError::input(format!(
            "Hydrostatic solver got {n} pressures, {} temperatures and {} molar masses.",
            inputs.temperature.len(),
            inputs.mu.len()
        )));
    }
    if n < 2 {
        return Err(AppError::input("Hydrostatic solver needs at least two layers."));
    }
    if !(inputs.gravity > 0.0) {
        return Err(AppError::physical("Surface gravity must be positive."));
    }

    let ln_p: Vec<f64> = inputs.pressure.iter().map(|p| p.ln()).collect();
    let integrand: Vec<f64> = inputs
        .temperature
        .iter()
        .zip(inputs.mu)
        .map(|(&t, &mu)| -inputs.r_gas * t / (mu * 1e-3 * inputs.gravity))
        .collect();
    let z = cumulative_trapezoid(&ln_p, &integrand);

    let z0 = interp_linear(&ln_p, &z, inputs.p0.ln()).ok_or_else(|| {
        AppError::physical(format!(
            "Reference pressure {} bar is outside the atmosphere ({} to {} bar).",
            inputs.p0,
            inputs.pressure[0],
            inputs.pressure[n - 1]
        ))
    })?;

    Ok(z.iter().map(|&zi| (zi - z0) / 1000.0 + inputs.r0_km).collect())
}
