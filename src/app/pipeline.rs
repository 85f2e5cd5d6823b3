//! The post-processing pipelines.
//!
//! - initial PT: pressure grid -> PT model -> diagnostic plots
//! - best fit: MCMC log -> full parameters -> PT profile -> radii -> `bestFit.atm`
//! - posterior: sampler output -> per-draw PT profiles -> percentile envelope
//! - spectrum: best-fit spectrum -> band integration -> comparison plot
//!
//! Each pipeline returns its computed outputs so the CLI only prints.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;
use tracing::{debug, info, warn};

use crate::band::{BandComparison, ComparisonInputs, compare};
use crate::domain::{BestFitRecord, BestFitSummary, PhysicalConstants, PtModelKind, RunConfig, SplitParameters};
use crate::error::AppError;
use crate::io::{
    AtmosphereFile, BAND_POINTS_CSV, ENVELOPE_CSV, PlanetData, SUMMARY_JSON, StarData, WnTable, blackbody_star,
    planet_data, planet_teff, read_atm, read_best_fit, read_filter, read_kurucz, read_pressure_file,
    read_sampler_output, read_spectrum, read_tep, stack_chains, star_data, write_band_points_csv,
    write_best_fit_tconfig, write_envelope_csv, write_summary_json,
};
use crate::models::{
    AtomicMasses, HydrostaticInputs, MadhuInversion, PtEvaluator, expand_params, mean_molar_mass, pt_evaluator,
    radius_from_hydrostatic, read_abundance_file, renormalize_h2_he, scale_abundances, split_params,
};
use crate::plot::{
    BEST_PT_PNG, ENVELOPE_PNG, INITIAL_PT_PNG, INITIAL_PT_SMOOTHED_PNG, LAYER_COLORS, PtCurve, SPECTRUM_PNG,
    draw_envelope, draw_pt_profiles, draw_spectrum, inversion_layer_curves,
};
use crate::posterior::{EnvelopeInputs, PtEnvelope, build_envelope};

/// Name of the best-fit atmosphere file inside the output directory.
pub const BEST_FIT_ATM: &str = "bestFit.atm";

/// Outputs of the initial-PT diagnostic.
#[derive(Debug, Clone)]
pub struct InitialPtOutput {
    pub params: Vec<f64>,
    pub teff: f64,
    pub pressure: Vec<f64>,
    pub temperature: Vec<f64>,
    pub outputs: Vec<PathBuf>,
}

/// Everything derived from the MCMC best-fit record, before any file is written.
pub struct Reconstruction {
    pub atm: AtmosphereFile,
    pub star: StarData,
    pub planet: PlanetData,
    pub record: BestFitRecord,
    pub all_params: Vec<f64>,
    pub split: SplitParameters,
    pub evaluator: Box<dyn PtEvaluator>,
    /// Best-fit temperatures on `atm.pressure` (increasing), as the evaluator returned them.
    pub temperature: Vec<f64>,
}

impl Reconstruction {
    /// Best-fit temperatures, provided the profile matches the pressure grid.
    pub fn checked_temperature(&self) -> Result<&[f64], AppError> {
        check_profile_length(&self.temperature, self.atm.n_layers(), "Best-fit PT profile")?;
        Ok(&self.temperature)
    }
}

/// Outputs of the best-fit reconstruction.
pub struct BestFitOutput {
    pub reconstruction: Reconstruction,
    pub radius: Vec<f64>,
    pub summary: BestFitSummary,
    pub outputs: Vec<PathBuf>,
}

/// Outputs of the posterior pipeline.
#[derive(Debug, Clone)]
pub struct PosteriorOutput {
    pub envelope: PtEnvelope,
    pub outputs: Vec<PathBuf>,
}

/// Outputs of the spectrum comparison.
#[derive(Debug, Clone)]
pub struct SpectrumOutput {
    pub comparison: BandComparison,
    pub outputs: Vec<PathBuf>,
}

fn ensure_output_dir(dir: &Path) -> Result<(), AppError> {
    fs::create_dir_all(dir)
        .map_err(|e| AppError::output(format!("Failed to create output directory '{}': {e}", dir.display())))
}

/// Evaluate the initial PT profile and plot it.
pub fn initial_pt(config: &RunConfig, constants: &PhysicalConstants) -> Result<InitialPtOutput, AppError> {
    let initial = config
        .initial_pt
        .as_ref()
        .ok_or_else(|| AppError::input("The config has no [initial_pt] table."))?;
    ensure_output_dir(&config.output_dir)?;

    let pressure = read_pressure_file(&initial.press_file)?;
    let tep = read_tep(&config.tepfile)?;
    let star = star_data(&tep, constants)?;
    let planet = planet_data(&tep, constants)?;
    let teff = planet_teff(&star);

    let mut params = initial.params.clone();
    if let (PtModelKind::Madhu, Some(factor)) = (config.pt_model, initial.t3_factor) {
        if let Some(t3) = params.get_mut(5) {
            *t3 = factor * teff;
            debug!(t3 = *t3, teff, "T3 set from the planet temperature");
        }
    }
    info!(layers = pressure.len(), model = config.pt_model.display_name(), "evaluating initial PT profile");

    let mut outputs = Vec::new();
    let temperature = match config.pt_model {
        PtModelKind::Madhu => {
            let layers = MadhuInversion::default().layers(&pressure, &params)?;
            if config.plots {
                let raw_path = config.output_dir.join(INITIAL_PT_PNG);
                draw_pt_profiles(&raw_path, "Initial PT profile", &inversion_layer_curves(&layers))?;
                outputs.push(raw_path);
            }

            check_profile_length(&layers.smoothed, pressure.len(), "Initial PT profile")?;
            if config.plots {
                let smooth_path = config.output_dir.join(INITIAL_PT_SMOOTHED_PNG);
                let curve = PtCurve::new("Smoothed", &pressure, &layers.smoothed, LAYER_COLORS[0]);
                draw_pt_profiles(&smooth_path, "Initial PT profile (smoothed)", &[curve])?;
                outputs.push(smooth_path);
            }
            layers.smoothed
        }
        PtModelKind::Line => {
            let evaluator = pt_evaluator(config.pt_model, &star, &planet, config.t_int);
            let temperature = evaluator.evaluate(&pressure, &params)?;
            check_profile_length(&temperature, pressure.len(), "Initial PT profile")?;
            if config.plots {
                let path = config.output_dir.join(INITIAL_PT_PNG);
                let curve = PtCurve::new("Initial", &pressure, &temperature, LAYER_COLORS[0]);
                draw_pt_profiles(&path, "Initial PT profile", &[curve])?;
                outputs.push(path);
            }
            temperature
        }
    };

    Ok(InitialPtOutput {
        params,
        teff,
        pressure,
        temperature,
        outputs,
    })
}

fn check_profile_length(temperature: &[f64], expected: usize, what: &str) -> Result<(), AppError> {
    if temperature.len() != expected {
        return Err(AppError::output(format!(
            "{what} has {} layers but the pressure grid has {expected}; check the PT parameters.",
            temperature.len()
        )));
    }
    if temperature.iter().any(|t| !t.is_finite()) {
        return Err(AppError::output(format!("{what} has non-finite temperatures.")));
    }
    Ok(())
}

/// Read the inputs and rebuild the best-fit parameters and PT profile.
pub fn reconstruct(config: &RunConfig, constants: &PhysicalConstants) -> Result<Reconstruction, AppError> {
    let atm = read_atm(&config.atmfile)?;
    debug!(layers = atm.n_layers(), species = atm.n_species(), order = ?atm.order, "read atmosphere");

    let tep = read_tep(&config.tepfile)?;
    let star = star_data(&tep, constants)?;
    let planet = planet_data(&tep, constants)?;

    let record = read_best_fit(&config.mcmc_log)?;
    let all_params = expand_params(&record.best, &config.stepsize, &config.params)?;
    let split = split_params(&all_params, config.solution, config.molfit.len())?;
    info!(
        free = record.len(),
        total = all_params.len(),
        pt = split.pt.len(),
        "expanded best-fit parameters"
    );

    let evaluator = pt_evaluator(config.pt_model, &star, &planet, config.t_int);
    let temperature = evaluator.evaluate(&atm.pressure, &split.pt)?;

    Ok(Reconstruction {
        atm,
        star,
        planet,
        record,
        all_params,
        split,
        evaluator,
        temperature,
    })
}

/// Rebuild the best-fit atmosphere and write every best-fit artifact.
pub fn best_fit(config: &RunConfig, constants: &PhysicalConstants) -> Result<BestFitOutput, AppError> {
    let rec = reconstruct(config, constants)?;
    best_fit_from(config, constants, rec)
}

/// Best-fit artifacts for an existing reconstruction.
pub fn best_fit_from(
    config: &RunConfig,
    constants: &PhysicalConstants,
    rec: Reconstruction,
) -> Result<BestFitOutput, AppError> {
    ensure_output_dir(&config.output_dir)?;
    let atm = &rec.atm;
    let temperature = rec.checked_temperature()?;

    let mut abundances = scale_abundances(atm, &config.molfit, &rec.split.abundance_factors)?;
    renormalize_h2_he(&mut abundances, atm)?;

    let masses = match &config.abun_file {
        Some(path) => read_abundance_file(path)?,
        None => AtomicMasses::builtin(),
    };
    // Molar masses of the input atmosphere, as the retrieval saw it.
    let mu = mean_molar_mass(&atm.abundances, &atm.species, &masses)?;
    let r0_km = rec.split.radius_km.unwrap_or_else(|| rec.planet.radius_km());
    let radius = radius_from_hydrostatic(&HydrostaticInputs {
        pressure: &atm.pressure,
        temperature,
        mu: &mu,
        p0: config.p0,
        r0_km,
        gravity: rec.planet.gravity,
        r_gas: constants.r_gas,
    })?;

    let mut outputs = Vec::new();
    let atm_path = config.output_dir.join(BEST_FIT_ATM);
    let text = atm.render(&radius, temperature, &abundances)?;
    fs::write(&atm_path, text)
        .map_err(|e| AppError::output(format!("Failed to write '{}': {e}", atm_path.display())))?;
    info!(path = %atm_path.display(), "wrote best-fit atmosphere");
    outputs.push(atm_path.clone());

    outputs.push(write_best_fit_tconfig(&config.tconfig, &atm_path, &config.output_dir)?);

    if config.plots {
        let pt_path = config.output_dir.join(BEST_PT_PNG);
        let curve = PtCurve::new("Best fit", &atm.pressure, temperature, LAYER_COLORS[1]);
        draw_pt_profiles(&pt_path, "Best-fit PT profile", &[curve])?;
        outputs.push(pt_path);
    }

    let summary = BestFitSummary {
        tool: "bartpost".to_string(),
        generated: Local::now().format("%Y-%m-%dT%H:%M:%S").to_string(),
        solution: config.solution,
        pt_model: config.pt_model,
        best_fit: rec.record.clone(),
        all_params: rec.all_params.clone(),
        split: rec.split.clone(),
        atmfile: config.atmfile.clone(),
        n_layers: atm.n_layers(),
    };
    let summary_path = config.output_dir.join(SUMMARY_JSON);
    write_summary_json(&summary_path, &summary)?;
    outputs.push(summary_path);

    Ok(BestFitOutput {
        reconstruction: rec,
        radius,
        summary,
        outputs,
    })
}

/// Build the posterior PT envelope from the saved sampler output.
pub fn posterior(config: &RunConfig, constants: &PhysicalConstants) -> Result<PosteriorOutput, AppError> {
    let rec = reconstruct(config, constants)?;
    posterior_from(config, &rec)
}

/// Posterior envelope around an existing reconstruction.
pub fn posterior_from(config: &RunConfig, rec: &Reconstruction) -> Result<PosteriorOutput, AppError> {
    ensure_output_dir(&config.output_dir)?;
    let chains = read_sampler_output(&config.sampler_path())?;
    let samples = stack_chains(&chains, config.burnin)?;
    info!(
        chains = chains.dim().0,
        burnin = config.burnin,
        samples = samples.ncols(),
        "evaluating posterior PT profiles"
    );

    // An unusable best-fit profile only drops the best-fit curve.
    let best = match rec.checked_temperature() {
        Ok(best) => Some(best),
        Err(err) => {
            warn!(reason = %err.message(), "posterior envelope drawn without the best-fit profile");
            None
        }
    };
    let envelope = build_envelope(&EnvelopeInputs {
        samples: &samples,
        stepsize: &config.stepsize,
        base_pt: &rec.split.pt,
        pressure: &rec.atm.pressure,
        best,
        evaluator: rec.evaluator.as_ref(),
    })?;

    let mut outputs = Vec::new();
    if config.plots {
        let png = config.output_dir.join(ENVELOPE_PNG);
        draw_envelope(&png, &envelope)?;
        outputs.push(png);
    }
    let csv = config.output_dir.join(ENVELOPE_CSV);
    write_envelope_csv(&csv, &envelope)?;
    outputs.push(csv);

    Ok(PosteriorOutput { envelope, outputs })
}

/// Band-integrate the best-fit spectrum and compare it with the data.
pub fn spectrum(config: &RunConfig, constants: &PhysicalConstants) -> Result<SpectrumOutput, AppError> {
    let spec_config = config
        .spectrum
        .as_ref()
        .ok_or_else(|| AppError::input("The config has no [spectrum] table."))?;
    ensure_output_dir(&config.output_dir)?;

    let tep = read_tep(&config.tepfile)?;
    let star = star_data(&tep, constants)?;
    let planet = planet_data(&tep, constants)?;
    let spectrum = read_spectrum(&spec_config.output)?;

    let stellar = match &spec_config.kurucz {
        Some(path) => read_kurucz(path, star.t_star, star.log_g, constants)?,
        None => blackbody_star(&spectrum.wavenumber, star.t_star, constants),
    };
    info!(
        teff = stellar.teff,
        log_g = ?stellar.log_g,
        filters = spec_config.filters.len(),
        "comparing best-fit spectrum"
    );

    let filters: Vec<(String, WnTable)> = spec_config
        .filters
        .iter()
        .map(|path| Ok((filter_name(path), read_filter(path)?)))
        .collect::<Result<_, AppError>>()?;

    let comparison = compare(&ComparisonInputs {
        geometry: config.solution,
        spectrum: &spectrum,
        star: &stellar,
        filters: &filters,
        rprs: planet.r_planet / star.r_star,
        data: &spec_config.data,
        uncert: &spec_config.uncert,
    })?;

    let mut outputs = Vec::new();
    if config.plots {
        let png = config.output_dir.join(SPECTRUM_PNG);
        draw_spectrum(&png, &comparison)?;
        outputs.push(png);
    }
    let csv = config.output_dir.join(BAND_POINTS_CSV);
    write_band_points_csv(&csv, &comparison)?;
    outputs.push(csv);

    Ok(SpectrumOutput { comparison, outputs })
}

fn filter_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
