//! Diagnostic PNG plots.
//!
//! Data preparation (curves, bounds, axis mapping) lives here so it can be
//! tested without a font stack; `png` only draws.
//!
//! Pressure axes are drawn as `-log10(P)` so that the top of the atmosphere
//! is at the top of the figure without relying on a reversed log axis.

pub mod png;

pub use png::*;

use plotters::style::RGBColor;

use crate::models::InversionLayers;

pub const INITIAL_PT_PNG: &str = "InitialPT.png";
pub const INITIAL_PT_SMOOTHED_PNG: &str = "InitialPTSmoothed.png";
pub const BEST_PT_PNG: &str = "Best_PT.png";
pub const ENVELOPE_PNG: &str = "MCMC_PTprofiles.png";
pub const SPECTRUM_PNG: &str = "BART-bestFit-Spectrum.png";

/// One temperature curve on a pressure axis.
#[derive(Debug, Clone)]
pub struct PtCurve {
    pub label: String,
    pub pressure: Vec<f64>,
    pub temperature: Vec<f64>,
    pub color: RGBColor,
}

impl PtCurve {
    pub fn new(label: impl Into<String>, pressure: &[f64], temperature: &[f64], color: RGBColor) -> Self {
        Self {
            label: label.into(),
            pressure: pressure.to_vec(),
            temperature: temperature.to_vec(),
            color,
        }
    }

    /// `(T, -log10 P)` points, skipping non-positive pressures.
    pub fn points(&self) -> Vec<(f64, f64)> {
        self.temperature
            .iter()
            .zip(&self.pressure)
            .filter(|&(_, &p)| p > 0.0)
            .map(|(&t, &p)| (t, pressure_axis(p)))
            .collect()
    }
}

pub const LAYER_COLORS: [RGBColor; 4] = [
    RGBColor(31, 119, 180),
    RGBColor(214, 39, 40),
    RGBColor(44, 160, 44),
    RGBColor(255, 127, 14),
];

/// The four raw segments of an inversion profile as separate curves.
pub fn inversion_layer_curves(layers: &InversionLayers) -> Vec<PtCurve> {
    const NAMES: [&str; 4] = ["Layer 1", "Layer 2 (p < p2)", "Layer 2 (p >= p2)", "Layer 3"];
    layers
        .segments
        .iter()
        .zip(NAMES)
        .zip(LAYER_COLORS)
        .filter(|((segment, _), _)| !segment.pressure.is_empty())
        .map(|((segment, name), color)| PtCurve::new(name, &segment.pressure, &segment.temperature, color))
        .collect()
}

/// Map pressure (bar) to the vertical plot coordinate.
pub fn pressure_axis(p: f64) -> f64 {
    -p.log10()
}

/// Tick label for a vertical plot coordinate.
pub fn pressure_label(y: f64) -> String {
    let exp = -y;
    if (exp - exp.round()).abs() < 1e-9 {
        format!("1e{}", exp.round() as i64)
    } else {
        format!("{:.2e}", 10f64.powf(exp))
    }
}

/// Min/max of the finite values, padded by `pad` of the span.
///
/// A degenerate span is widened to one unit so plotters can build an axis.
pub fn padded_bounds<'a>(values: impl IntoIterator<Item = &'a f64>, pad: f64) -> Option<(f64, f64)> {
    let (lo, hi) = values
        .into_iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold(None, |acc: Option<(f64, f64)>, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })?;
    let span = hi - lo;
    if span <= 0.0 {
        return Some((lo - 0.5, hi + 0.5));
    }
    Some((lo - pad * span, hi + pad * span))
}
