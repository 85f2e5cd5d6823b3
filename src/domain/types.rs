//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - loaded from the TOML run configuration
//! - passed between the reconstruction, posterior, and spectrum pipelines
//! - exported to JSON/CSV summaries

use std::path::PathBuf;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Observing geometry of the retrieval.
///
/// Transit retrievals carry one extra free parameter (the reference radius)
/// between the PT parameters and the abundance factors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Geometry {
    Eclipse,
    Transit,
}

impl Geometry {
    /// Number of radius-fit parameters in the full parameter vector.
    pub fn radius_fit_count(self) -> usize {
        match self {
            Geometry::Eclipse => 0,
            Geometry::Transit => 1,
        }
    }
}

/// Parametric pressure-temperature model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum PtModelKind {
    /// Madhusudhan & Seager (2009) inverted profile.
    Madhu,
    /// Line et al. (2013) two-stream radiative profile.
    Line,
}

impl PtModelKind {
    pub fn display_name(self) -> &'static str {
        match self {
            PtModelKind::Madhu => "Madhusudhan-Seager inversion",
            PtModelKind::Line => "Line two-stream",
        }
    }

    /// Number of parameters the model consumes.
    pub fn param_count(self) -> usize {
        match self {
            PtModelKind::Madhu => 6,
            PtModelKind::Line => 5,
        }
    }
}

/// Physical constants used across the pipelines.
///
/// Passed explicitly to the components that need them; nothing reads a
/// global.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhysicalConstants {
    /// Solar radius (m).
    pub r_sun: f64,
    /// Jupiter radius (m).
    pub r_jup: f64,
    /// Jupiter mass (kg).
    pub m_jup: f64,
    /// Astronomical unit (m).
    pub au: f64,
    /// Gravitational constant (m^3 kg^-1 s^-2).
    pub g_newton: f64,
    /// Universal gas constant, k_B * N_A (J mol^-1 K^-1).
    pub r_gas: f64,
    /// Speed of light (cm s^-1).
    pub c_cgs: f64,
    /// Planck constant (erg s).
    pub h_cgs: f64,
    /// Boltzmann constant (erg K^-1).
    pub k_cgs: f64,
}

impl Default for PhysicalConstants {
    fn default() -> Self {
        Self {
            r_sun: 6.955e8,
            r_jup: 7.1492e7,
            m_jup: 1.8986e27,
            au: 1.495_978_707e11,
            g_newton: 6.674_08e-11,
            r_gas: 8.314_459_8,
            c_cgs: 2.997_924_58e10,
            h_cgs: 6.626_070_04e-27,
            k_cgs: 1.380_648_52e-16,
        }
    }
}

/// Pressure ordering of the layers as they appear in a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PressureOrder {
    Increasing,
    Decreasing,
}

impl PressureOrder {
    /// Detect the ordering by comparing the first two values.
    ///
    /// Single-layer (or empty) grids are reported as increasing.
    pub fn detect(pressure: &[f64]) -> Self {
        match pressure {
            [first, second, ..] if first > second => PressureOrder::Decreasing,
            _ => PressureOrder::Increasing,
        }
    }
}

/// Best-fit section of an MCMC log: one entry per free parameter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BestFitRecord {
    pub best: Vec<f64>,
    pub uncertainty: Vec<f64>,
    pub snr: Vec<f64>,
    pub mean: Vec<f64>,
}

impl BestFitRecord {
    pub fn len(&self) -> usize {
        self.best.len()
    }

    pub fn is_empty(&self) -> bool {
        self.best.is_empty()
    }
}

/// The full parameter vector split into its model roles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SplitParameters {
    /// Parameters of the PT model (always first in the vector).
    pub pt: Vec<f64>,
    /// Reference radius in km (transit geometry only).
    pub radius_km: Option<f64>,
    /// log10 abundance scale factors, parallel to `molfit`.
    pub abundance_factors: Vec<f64>,
}

/// Settings for the initial-PT diagnostic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitialPtConfig {
    /// Pressure grid file (bar).
    pub press_file: PathBuf,
    /// PT model parameters.
    pub params: Vec<f64>,
    /// When set (Madhu model), overrides T3 with `t3_factor * Teff`.
    #[serde(default)]
    pub t3_factor: Option<f64>,
}

/// Settings for the best-fit spectrum comparison.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpectrumConfig {
    /// Best-fit spectrum file, relative to the output directory.
    pub output: PathBuf,
    /// Bandpass filter transmission files.
    pub filters: Vec<PathBuf>,
    /// Kurucz stellar grid; a blackbody is used when absent.
    #[serde(default)]
    pub kurucz: Option<PathBuf>,
    /// Observed band values, parallel to `filters`.
    pub data: Vec<f64>,
    /// Observed uncertainties, parallel to `filters`.
    pub uncert: Vec<f64>,
}

/// A full run's configuration as understood by the pipelines.
///
/// Loaded from TOML; relative paths are resolved against the config file's
/// directory by `io::config::load_run_config`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    pub output_dir: PathBuf,
    pub atmfile: PathBuf,
    pub tepfile: PathBuf,
    /// MCMC log holding the best-fit section.
    pub mcmc_log: PathBuf,
    /// Saved sampler output; defaults to `<output_dir>/output.npy`.
    #[serde(default)]
    pub sampler_output: Option<PathBuf>,
    /// Transit config template, relative to the output directory.
    pub tconfig: PathBuf,
    /// Elemental abundance file with atomic masses.
    #[serde(default)]
    pub abun_file: Option<PathBuf>,
    pub solution: Geometry,
    #[serde(default = "RunConfig::default_pt_model")]
    pub pt_model: PtModelKind,
    /// Reference pressure (bar) at which the layer radius equals the planet radius.
    pub p0: f64,
    #[serde(default)]
    pub burnin: usize,
    /// Internal planetary temperature (K) for the Line model.
    #[serde(default = "RunConfig::default_t_int")]
    pub t_int: f64,
    /// Sampler step sizes; zero marks a fixed parameter.
    pub stepsize: Vec<f64>,
    /// Initial/fixed parameter values, same length as `stepsize`.
    pub params: Vec<f64>,
    /// Molecules whose abundances are scaled.
    #[serde(default)]
    pub molfit: Vec<String>,
    #[serde(default)]
    pub initial_pt: Option<InitialPtConfig>,
    #[serde(default)]
    pub spectrum: Option<SpectrumConfig>,
    /// Render PNG plots; CSV and JSON exports are written either way.
    #[serde(default = "RunConfig::default_plots")]
    pub plots: bool,
}

impl RunConfig {
    fn default_pt_model() -> PtModelKind {
        PtModelKind::Madhu
    }

    fn default_t_int() -> f64 {
        100.0
    }

    fn default_plots() -> bool {
        true
    }

    pub fn sampler_path(&self) -> PathBuf {
        self.sampler_output
            .clone()
            .unwrap_or_else(|| self.output_dir.join("output.npy"))
    }
}

/// JSON summary of a best-fit reconstruction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BestFitSummary {
    pub tool: String,
    pub generated: String,
    pub solution: Geometry,
    pub pt_model: PtModelKind,
    pub best_fit: BestFitRecord,
    pub all_params: Vec<f64>,
    pub split: SplitParameters,
    pub atmfile: PathBuf,
    pub n_layers: usize,
}
