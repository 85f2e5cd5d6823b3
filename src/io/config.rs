//! TOML run configuration.
//!
//! Paths in the file are relative to the file's own directory, so a run
//! directory can be moved around as a unit.

use std::fs;
use std::path::{Path, PathBuf};

use crate::domain::RunConfig;
use crate::error::AppError;

/// Load a run configuration and resolve its relative paths.
pub fn load_run_config(path: &Path) -> Result<RunConfig, AppError> {
    let text = fs::read_to_string(path)
        .map_err(|e| AppError::input(format!("Failed to read config '{}': {e}", path.display())))?;
    let mut config: RunConfig = toml::from_str(&text)
        .map_err(|e| AppError::input(format!("Invalid config '{}': {e}", path.display())))?;

    let base = path.parent().unwrap_or_else(|| Path::new("."));
    resolve_paths(&mut config, base);
    validate(&config)?;
    Ok(config)
}

/// Point the config at a different output directory.
///
/// Paths that were derived from the old output directory (`tconfig`, the
/// default sampler output, and the spectrum output) follow it.
pub fn override_output_dir(config: &mut RunConfig, output_dir: PathBuf) {
    let old = config.output_dir.clone();
    let rebase = |p: &Path| -> PathBuf {
        match p.strip_prefix(&old) {
            Ok(rel) => output_dir.join(rel),
            Err(_) => p.to_path_buf(),
        }
    };
    config.tconfig = rebase(&config.tconfig);
    config.sampler_output = config.sampler_output.as_deref().map(rebase);
    if let Some(spec) = config.spectrum.as_mut() {
        spec.output = rebase(&spec.output);
    }
    config.output_dir = output_dir;
}

fn resolve_paths(config: &mut RunConfig, base: &Path) {
    let abs = |p: &Path| -> PathBuf {
        if p.is_absolute() {
            p.to_path_buf()
        } else {
            base.join(p)
        }
    };

    config.output_dir = abs(&config.output_dir);
    config.atmfile = abs(&config.atmfile);
    config.tepfile = abs(&config.tepfile);
    config.mcmc_log = abs(&config.mcmc_log);
    config.sampler_output = config.sampler_output.as_deref().map(abs);
    config.abun_file = config.abun_file.as_deref().map(abs);

    // The transit template and best-fit spectrum live in the output directory.
    let out = config.output_dir.clone();
    let in_out = |p: &Path| -> PathBuf {
        if p.is_absolute() {
            p.to_path_buf()
        } else {
            out.join(p)
        }
    };
    config.tconfig = in_out(&config.tconfig);

    if let Some(initial) = config.initial_pt.as_mut() {
        initial.press_file = abs(&initial.press_file);
    }
    if let Some(spec) = config.spectrum.as_mut() {
        spec.output = in_out(&spec.output);
        spec.filters = spec.filters.iter().map(|f| abs(f)).collect();
        spec.kurucz = spec.kurucz.as_deref().map(abs);
    }
}

fn validate(config: &RunConfig) -> Result<(), AppError> {
    if config.stepsize.len() != config.params.len() {
        return Err(AppError::input(format!(
            "`stepsize` has {} entries but `params` has {}.",
            config.stepsize.len(),
            config.params.len()
        )));
    }
    if !(config.p0.is_finite() && config.p0 > 0.0) {
        return Err(AppError::input("`p0` must be a positive pressure in bar."));
    }
    if let Some(spec) = &config.spectrum {
        if spec.data.len() != spec.filters.len() || spec.uncert.len() != spec.filters.len() {
            return Err(AppError::input(format!(
                "[spectrum] lists {} filters but {} data points and {} uncertainties.",
                spec.filters.len(),
                spec.data.len(),
                spec.uncert.len()
            )));
        }
    }
    Ok(())
}
