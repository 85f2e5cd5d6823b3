//! Command-line parsing for the BART post-processing tool.
//!
//! Argument parsing and command dispatch stay separate from the pipelines;
//! everything a run needs comes from the TOML config, with a few overrides.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::{Geometry, PtModelKind};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "bartpost", version, about = "Post-processing for BART atmospheric retrievals")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Plot the initial PT profile from the [initial_pt] settings.
    InitialPt(RunArgs),
    /// Rebuild the best-fit atmosphere and transit config from the MCMC log.
    BestFit(RunArgs),
    /// Plot the posterior PT envelope from the saved sampler output.
    Posterior(RunArgs),
    /// Band-integrate the best-fit spectrum and plot it against the data.
    Spectrum(RunArgs),
    /// Run best-fit, posterior, and (when configured) spectrum in sequence.
    Run(RunArgs),
}

/// Options shared by every subcommand.
#[derive(Debug, Args, Clone)]
pub struct RunArgs {
    /// TOML run configuration.
    #[arg(short, long)]
    pub config: PathBuf,

    /// Write outputs here instead of the config's `output_dir`.
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Override the observing geometry.
    #[arg(long, value_enum)]
    pub solution: Option<Geometry>,

    /// Override the PT model.
    #[arg(long, value_enum)]
    pub pt_model: Option<PtModelKind>,

    /// Override the burn-in length of every chain.
    #[arg(long)]
    pub burnin: Option<usize>,

    /// Skip PNG rendering (exports are still written).
    #[arg(long)]
    pub no_plots: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_subcommand_with_overrides() {
        let cli = Cli::parse_from([
            "bartpost",
            "posterior",
            "--config",
            "run.toml",
            "-o",
            "out",
            "--pt-model",
            "line",
            "--burnin",
            "500",
        ]);
        let Command::Posterior(args) = cli.command else {
            panic!("expected the posterior subcommand");
        };
        assert_eq!(args.config, PathBuf::from("run.toml"));
        assert_eq!(args.output_dir, Some(PathBuf::from("out")));
        assert_eq!(args.pt_model, Some(PtModelKind::Line));
        assert_eq!(args.burnin, Some(500));
        assert_eq!(args.solution, None);
        assert!(!args.no_plots);
    }

    #[test]
    fn subcommand_names_are_kebab_case() {
        let cli = Cli::parse_from(["bartpost", "initial-pt", "-c", "run.toml"]);
        assert!(matches!(cli.command, Command::InitialPt(_)));
        assert!(Cli::try_parse_from(["bartpost", "best-fit"]).is_err());
    }
}
