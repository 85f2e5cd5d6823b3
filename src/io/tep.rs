//! Transiting Extrasolar Planet (TEP) parameter files.
//!
//! A TEP file is a key-value table. Lines starting with `#` are comments; each
//! data line is `<key> <value> [uncert+ uncert- units reference ...]`.
//! Units are implied by the key (stellar radius in solar radii, planet mass in
//! Jupiter masses, ...), so conversions happen here with explicit constants.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::domain::PhysicalConstants;
use crate::error::AppError;

/// Parsed TEP file.
#[derive(Debug, Clone)]
pub struct TepFile {
    entries: HashMap<String, Vec<String>>,
}

impl TepFile {
    /// All fields following `key` (value first).
    pub fn value(&self, key: &str) -> Option<&[String]> {
        self.entries.get(key).map(Vec::as_slice)
    }

    /// The first field of `key`, parsed as a number.
    pub fn f64(&self, key: &str) -> Result<f64, AppError> {
        let fields = self
            .value(key)
            .ok_or_else(|| AppError::input(format!("TEP file has no `{key}` entry")))?;
        let raw = fields
            .first()
            .ok_or_else(|| AppError::input(format!("TEP entry `{key}` has no value")))?;
        raw.parse::<f64>()
            .map_err(|_| AppError::input(format!("TEP entry `{key}`: invalid number '{raw}'")))
    }
}

/// Stellar and orbital parameters in SI units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StarData {
    /// Stellar radius (m).
    pub r_star: f64,
    /// Stellar effective temperature (K).
    pub t_star: f64,
    /// Orbital semi-major axis (m).
    pub sma: f64,
    /// log10 stellar surface gravity (cgs).
    pub log_g: f64,
}

/// Planetary bulk parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlanetData {
    /// Planet radius (m).
    pub r_planet: f64,
    /// Planet mass (kg).
    pub m_planet: f64,
    /// Surface gravity (m s^-2).
    pub gravity: f64,
}

impl PlanetData {
    pub fn radius_km(&self) -> f64 {
        self.r_planet / 1000.0
    }
}

pub fn read_tep(path: &Path) -> Result<TepFile, AppError> {
    let text = fs::read_to_string(path)
        .map_err(|e| AppError::input(format!("Failed to read TEP file '{}': {e}", path.display())))?;
    Ok(parse_tep(&text))
}

pub fn parse_tep(text: &str) -> TepFile {
    let entries = text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .filter_map(|l| {
            let mut fields = l.split_whitespace();
            let key = fields.next()?.to_string();
            Some((key, fields.map(str::to_string).collect()))
        })
        .collect();
    TepFile { entries }
}

/// Stellar radius, temperature, semi-major axis, and log g.
pub fn star_data(tep: &TepFile, constants: &PhysicalConstants) -> Result<StarData, AppError> {
    Ok(StarData {
        r_star: tep.f64("Rs")? * constants.r_sun,
        t_star: tep.f64("Ts")?,
        sma: tep.f64("a")? * constants.au,
        log_g: tep.f64("loggstar")?,
    })
}

/// Planet radius, mass, and surface gravity `g = G M / R^2`.
pub fn planet_data(tep: &TepFile, constants: &PhysicalConstants) -> Result<PlanetData, AppError> {
    let r_planet = tep.f64("Rp")? * constants.r_jup;
    let m_planet = tep.f64("Mp")? * constants.m_jup;
    if !(r_planet > 0.0 && m_planet > 0.0) {
        return Err(AppError::input("TEP planet radius and mass must be positive."));
    }
    Ok(PlanetData {
        r_planet,
        m_planet,
        gravity: constants.g_newton * m_planet / (r_planet * r_planet),
    })
}

/// Zero-albedo, full-redistribution equilibrium temperature of the planet.
pub fn planet_teff(star: &StarData) -> f64 {
    star.t_star * (star.r_star / (2.0 * star.sma)).sqrt()
}
