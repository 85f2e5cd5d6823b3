//! Top-level application orchestration.
//!
//! `src/main.rs` stays tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - loads the run configuration and applies overrides
//! - runs the requested pipeline(s)
//! - prints the terminal reports

use clap::Parser;
use tracing::{info, warn};

use crate::cli::{Cli, Command, RunArgs};
use crate::domain::{PhysicalConstants, RunConfig};
use crate::error::AppError;
use crate::io::{load_run_config, override_output_dir};
use crate::report::{
    format_band_table, format_best_fit_summary, format_envelope_summary, format_initial_pt_summary,
};

pub mod pipeline;

/// Entry point for the `bartpost` binary.
pub fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let constants = PhysicalConstants::default();

    match cli.command {
        Command::InitialPt(args) => handle_initial_pt(&load_config(&args)?, &constants),
        Command::BestFit(args) => handle_best_fit(&load_config(&args)?, &constants),
        Command::Posterior(args) => handle_posterior(&load_config(&args)?, &constants),
        Command::Spectrum(args) => handle_spectrum(&load_config(&args)?, &constants),
        Command::Run(args) => handle_run(&load_config(&args)?, &constants),
    }
}

/// Load the TOML config and apply command-line overrides.
pub fn load_config(args: &RunArgs) -> Result<RunConfig, AppError> {
    let mut config = load_run_config(&args.config)?;
    if let Some(dir) = &args.output_dir {
        override_output_dir(&mut config, dir.clone());
    }
    if let Some(solution) = args.solution {
        config.solution = solution;
    }
    if let Some(model) = args.pt_model {
        config.pt_model = model;
    }
    if let Some(burnin) = args.burnin {
        config.burnin = burnin;
    }
    if args.no_plots {
        config.plots = false;
    }
    info!(
        config = %args.config.display(),
        output_dir = %config.output_dir.display(),
        solution = ?config.solution,
        "loaded run configuration"
    );
    Ok(config)
}

fn handle_initial_pt(config: &RunConfig, constants: &PhysicalConstants) -> Result<(), AppError> {
    let out = pipeline::initial_pt(config, constants)?;
    println!(
        "{}",
        format_initial_pt_summary(&out.params, out.teff, out.pressure.len(), &out.outputs)
    );
    Ok(())
}

fn handle_best_fit(config: &RunConfig, constants: &PhysicalConstants) -> Result<(), AppError> {
    let out = pipeline::best_fit(config, constants)?;
    println!("{}", format_best_fit_summary(&out.summary, &out.outputs));
    Ok(())
}

fn handle_posterior(config: &RunConfig, constants: &PhysicalConstants) -> Result<(), AppError> {
    let out = pipeline::posterior(config, constants)?;
    println!("{}", format_envelope_summary(&out.envelope));
    Ok(())
}

fn handle_spectrum(config: &RunConfig, constants: &PhysicalConstants) -> Result<(), AppError> {
    let out = pipeline::spectrum(config, constants)?;
    println!("{}", format_band_table(&out.comparison));
    Ok(())
}

fn handle_run(config: &RunConfig, constants: &PhysicalConstants) -> Result<(), AppError> {
    let rec = pipeline::reconstruct(config, constants)?;
    // A best-fit profile that does not fit the grid still leaves the posterior.
    let best_fit_error = rec.checked_temperature().err();
    let rec = match &best_fit_error {
        None => {
            let best = pipeline::best_fit_from(config, constants, rec)?;
            println!("{}", format_best_fit_summary(&best.summary, &best.outputs));
            best.reconstruction
        }
        Some(err) => {
            warn!(reason = %err.message(), "skipping the best-fit outputs");
            rec
        }
    };

    let posterior = pipeline::posterior_from(config, &rec)?;
    println!("{}", format_envelope_summary(&posterior.envelope));

    if config.spectrum.is_some() {
        let spectrum = pipeline::spectrum(config, constants)?;
        println!("{}", format_band_table(&spectrum.comparison));
    } else {
        info!("no [spectrum] table; skipping the spectrum comparison");
    }
    best_fit_error.map_or(Ok(()), Err)
}
