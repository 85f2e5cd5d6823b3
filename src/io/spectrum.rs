//! Spectrum, filter, and stellar-model readers.
//!
//! Everything is converted to **increasing wavenumber** (cm^-1) on read, so
//! the band-integration code only ever sees one grid orientation.
//!
//! Flux units follow the radiative-transfer output: erg s^-1 cm^-1 (per unit
//! wavenumber).

use std::fs;
use std::path::Path;

use crate::domain::PhysicalConstants;
use crate::error::AppError;

/// A flux table on an increasing wavenumber grid.
#[derive(Debug, Clone, PartialEq)]
pub struct WnTable {
    /// Wavenumber (cm^-1), strictly increasing.
    pub wavenumber: Vec<f64>,
    /// Values at each wavenumber.
    pub values: Vec<f64>,
}

impl WnTable {
    pub fn len(&self) -> usize {
        self.wavenumber.len()
    }

    pub fn is_empty(&self) -> bool {
        self.wavenumber.is_empty()
    }

    /// Wavelengths (um) of the grid points.
    pub fn wavelength_um(&self) -> Vec<f64> {
        self.wavenumber.iter().map(|wn| 1e4 / wn).collect()
    }
}

/// Stellar flux chosen from a model grid (or computed).
#[derive(Debug, Clone)]
pub struct StellarSpectrum {
    pub flux: WnTable,
    /// Effective temperature of the selected model (K).
    pub teff: f64,
    /// log g of the selected model; `None` for a blackbody.
    pub log_g: Option<f64>,
}

/// Read a best-fit spectrum: `#` header, then `wavelength[um] ... flux`.
pub fn read_spectrum(path: &Path) -> Result<WnTable, AppError> {
    read_two_column(path, "spectrum", |fields| fields.last().copied())
}

/// Read a filter transmission curve: `#` header, then `wavelength[um] transmission`.
pub fn read_filter(path: &Path) -> Result<WnTable, AppError> {
    read_two_column(path, "filter", |fields| fields.get(1).copied())
}

fn read_two_column(
    path: &Path,
    what: &str,
    pick_value: impl for<'a> Fn(&[&'a str]) -> Option<&'a str>,
) -> Result<WnTable, AppError> {
    let text = fs::read_to_string(path)
        .map_err(|e| AppError::input(format!("Failed to read {what} file '{}': {e}", path.display())))?;
    parse_wavelength_table(&text, pick_value)
        .map_err(|e| AppError::input(format!("{what} file '{}': {}", path.display(), e.message())))
}

/// Parse a wavelength-keyed table into an increasing-wavenumber table.
pub fn parse_wavelength_table(
    text: &str,
    pick_value: impl for<'a> Fn(&[&'a str]) -> Option<&'a str>,
) -> Result<WnTable, AppError> {
    let mut rows: Vec<(f64, f64)> = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let fields: Vec<&str> = trimmed.split_whitespace().collect();
        let raw_value = pick_value(&fields)
            .filter(|_| fields.len() >= 2)
            .ok_or_else(|| AppError::input(format!("line {}: expected at least 2 columns", idx + 1)))?;
        let wl = parse_field(fields[0], idx)?;
        let value = parse_field(raw_value, idx)?;
        if !(wl > 0.0) {
            return Err(AppError::input(format!("line {}: wavelength must be > 0", idx + 1)));
        }
        rows.push((1e4 / wl, value));
    }

    if rows.len() < 2 {
        return Err(AppError::input("need at least two samples"));
    }
    rows.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));
    if rows.windows(2).any(|w| !(w[1].0 > w[0].0)) {
        return Err(AppError::input("duplicate wavelengths"));
    }

    Ok(WnTable {
        wavenumber: rows.iter().map(|r| r.0).collect(),
        values: rows.iter().map(|r| r.1).collect(),
    })
}

fn parse_field(raw: &str, idx: usize) -> Result<f64, AppError> {
    raw.parse::<f64>()
        .map_err(|_| AppError::input(format!("line {}: invalid number '{raw}'", idx + 1)))
}

/// One model of a Kurucz grid.
#[derive(Debug, Clone)]
struct KuruczModel {
    teff: f64,
    log_g: f64,
    values: Vec<f64>,
}

/// Read a Kurucz model grid and pick the model closest to `(teff, log_g)`.
///
/// The grid file holds a free-form header closed by an `END` line, a
/// wavelength block (nm, fixed-width fields of 10 characters), then one
/// block per model, each opened by a line with
/// `TEFF <T> GRAVITY <log g>` and holding Eddington flux `H_nu` values
/// followed by continuum values. Temperature is matched first, then gravity.
pub fn read_kurucz(
    path: &Path,
    teff: f64,
    log_g: f64,
    constants: &PhysicalConstants,
) -> Result<StellarSpectrum, AppError> {
    let text = fs::read_to_string(path)
        .map_err(|e| AppError::input(format!("Failed to read Kurucz grid '{}': {e}", path.display())))?;
    parse_kurucz(&text, teff, log_g, constants)
        .map_err(|e| AppError::input(format!("Kurucz grid '{}': {}", path.display(), e.message())))
}

pub fn parse_kurucz(
    text: &str,
    teff: f64,
    log_g: f64,
    constants: &PhysicalConstants,
) -> Result<StellarSpectrum, AppError> {
    let mut wavelength_nm: Vec<f64> = Vec::new();
    let mut models: Vec<KuruczModel> = Vec::new();

    let mut lines = text.lines();
    if !lines.by_ref().any(|line| line.trim() == "END") {
        return Err(AppError::input("no END line closing the header"));
    }
    for line in lines {
        if let Some((t, g)) = parse_model_header(line) {
            models.push(KuruczModel {
                teff: t,
                log_g: g,
                values: Vec::new(),
            });
            continue;
        }
        let Some(numbers) = parse_fixed_width(line, 10) else {
            continue;
        };
        match models.last_mut() {
            Some(model) => model.values.extend(numbers),
            None => wavelength_nm.extend(numbers),
        }
    }

    let n_wave = wavelength_nm.len();
    if n_wave < 2 {
        return Err(AppError::input("no wavelength grid before the first model"));
    }

    let t_best = models
        .iter()
        .map(|m| m.teff)
        .min_by(|a, b| (a - teff).abs().total_cmp(&(b - teff).abs()))
        .ok_or_else(|| AppError::input("no TEFF/GRAVITY model blocks"))?;
    let model = models
        .iter()
        .filter(|m| m.teff == t_best)
        .min_by(|a, b| (a.log_g - log_g).abs().total_cmp(&(b.log_g - log_g).abs()))
        .ok_or_else(|| AppError::input("no TEFF/GRAVITY model blocks"))?;

    if model.values.len() < n_wave {
        return Err(AppError::input(format!(
            "model TEFF={} GRAVITY={} has {} flux values, expected {n_wave}",
            model.teff,
            model.log_g,
            model.values.len()
        )));
    }

    // H_nu (per Hz, per sr) -> F = 4 pi H_nu, then per wavenumber: F_wn = F_nu * c.
    let scale = 4.0 * std::f64::consts::PI * constants.c_cgs;
    let mut rows: Vec<(f64, f64)> = wavelength_nm
        .iter()
        .zip(&model.values[..n_wave])
        .map(|(wl, h)| (1e7 / wl, h * scale))
        .collect();
    rows.sort_by(|a, b| a.0.total_cmp(&b.0));
    rows.dedup_by(|a, b| a.0 == b.0);

    Ok(StellarSpectrum {
        flux: WnTable {
            wavenumber: rows.iter().map(|r| r.0).collect(),
            values: rows.iter().map(|r| r.1).collect(),
        },
        teff: model.teff,
        log_g: Some(model.log_g),
    })
}

fn parse_model_header(line: &str) -> Option<(f64, f64)> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let value_after = |key: &str| -> Option<f64> {
        let pos = tokens.iter().position(|t| *t == key)?;
        tokens.get(pos + 1)?.parse().ok()
    };
    Some((value_after("TEFF")?, value_after("GRAVITY")?))
}

/// Split a line into fixed-width numeric fields; `None` if any field is not a number.
fn parse_fixed_width(line: &str, width: usize) -> Option<Vec<f64>> {
    if !line.is_ascii() || line.trim().is_empty() {
        return None;
    }
    line.as_bytes()
        .chunks(width)
        .filter_map(|chunk| {
            let field = std::str::from_utf8(chunk).ok()?.trim();
            (!field.is_empty()).then_some(field)
        })
        .map(|field| field.parse::<f64>().ok())
        .collect()
}

/// Blackbody stellar flux `pi * B(T)` per wavenumber on the given grid.
pub fn blackbody_star(wavenumber: &[f64], t_star: f64, constants: &PhysicalConstants) -> StellarSpectrum {
    let values = wavenumber
        .iter()
        .map(|&wn| std::f64::consts::PI * planck_wn(wn, t_star, constants))
        .collect();
    StellarSpectrum {
        flux: WnTable {
            wavenumber: wavenumber.to_vec(),
            values,
        },
        teff: t_star,
        log_g: None,
    }
}

/// Planck function per wavenumber (erg s^-1 sr^-1 cm^-1 per cm^2).
pub fn planck_wn(wn: f64, temperature: f64, c: &PhysicalConstants) -> f64 {
    let numer = 2.0 * c.h_cgs * c.c_cgs * c.c_cgs * wn.powi(3);
    let x = c.h_cgs * c.c_cgs * wn / (c.k_cgs * temperature);
    numer / x.exp_m1()
}
