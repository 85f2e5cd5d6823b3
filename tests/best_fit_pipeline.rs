//! End-to-end runs of the best-fit, posterior, and initial-PT pipelines on
//! synthetic retrieval outputs.

use std::fs;
use std::path::Path;

use bart_post::app::pipeline;
use bart_post::domain::{PhysicalConstants, PressureOrder};
use bart_post::io::{
    BAND_POINTS_CSV, ENVELOPE_CSV, SUMMARY_JSON, load_run_config, parse_atm, planck_wn, planet_data, read_summary_json,
    read_tep, star_data,
};
use ndarray::Array3;
use ndarray_npy::write_npy;

const N_LAYERS: usize = 15;

const TEP: &str = "\
# synthetic hot Jupiter
Rs        1.155   0.016  -0.016  Rsun
Ts        6065    50     -50     K
loggstar  4.361   0.008  -0.008  cgs
a         0.04707 0.00046 -0.00047 AU
Rp        1.359   0.016  -0.019  Rjup
Mp        0.685   0.015  -0.014  Mjup
";

const MCMC_LOG: &str = "\
 MCMC summary

 Best-fit params   Uncertainties   Signal/Noise       Sample Mean
    9.9000e-01      1.0000e-02          99.00      9.9000e-01
    2.0000e-01      1.0000e-02          20.00      2.0000e-01
   -1.0000e+00      1.0000e-01          10.00     -1.0000e+00
    1.0000e+00      1.0000e-01          10.00      1.0000e+00
    1.5000e+03      5.0000e+01          30.00      1.5000e+03
    1.0000e+00      1.0000e-01          10.00      1.0000e+00

 done
";

const TCONFIG: &str = "\
# transit configuration
atm initial.atm
linedb ../inputs/lines.tli
outspec bestFit-flux.dat
";

/// An MCMC log whose best-fit block holds `best`.
fn mcmc_log(best: &[f64]) -> String {
    let mut text = String::from(" MCMC summary\n\n Best-fit params   Uncertainties   Signal/Noise       Sample Mean\n");
    for v in best {
        text.push_str(&format!("    {v}      0.01          10.0      {v}\n"));
    }
    text.push_str("\n done\n");
    text
}

/// Replace `from` with `to` in the run config at `path`.
fn edit_config(path: &Path, from: &str, to: &str) {
    let text = fs::read_to_string(path).unwrap();
    assert!(text.contains(from), "{from}");
    fs::write(path, text.replace(from, to)).unwrap();
}

fn pressure(i: usize) -> f64 {
    10f64.powf(-5.0 + 7.0 * i as f64 / (N_LAYERS - 1) as f64)
}

/// Atmosphere listed from the bottom (high pressure) up, as BART writes it.
fn atmosphere() -> String {
    let mut text = String::from(
        "# synthetic atmosphere\nur 1e5\n#SPECIES\nH2 He H2O\n#TEADATA\n#Radius    Pressure   Temp    H2        He        H2O\n",
    );
    for i in (0..N_LAYERS).rev() {
        text.push_str(&format!(
            "{:10.3} {:.4e} {:7.2} 8.5000e-01 1.0000e-01 5.0000e-02\n",
            90000.0 - 1000.0 * i as f64,
            pressure(i),
            1200.0
        ));
    }
    text
}

fn pressure_file() -> String {
    let mut text = String::from("# layer pressure[bar]\n");
    for i in 0..N_LAYERS {
        text.push_str(&format!("{} {:.6e}\n", i + 1, pressure(N_LAYERS - 1 - i)));
    }
    text
}

/// Free-parameter draws `(chain, parameter, iteration)`.
///
/// Iterations 0..5 are burn-in. Iteration 7 of chain 1 puts `p2` deeper
/// than `p3` (log p2 = 1.9), so the layers between them are counted twice.
fn sampler_output() -> Array3<f64> {
    Array3::from_shape_fn((2, 6, 20), |(chain, param, it)| {
        let wiggle = ((chain * 20 + it) % 7) as f64 - 3.0;
        match param {
            0 => 0.99 + 0.005 * wiggle,
            1 => 0.2 + 0.01 * wiggle,
            2 if chain == 1 && it == 7 => 1.9,
            2 => -1.0 + 0.05 * wiggle,
            3 => 1.0 + 0.05 * wiggle,
            4 => 1500.0 + 20.0 * wiggle,
            _ => 1.0,
        }
    })
}

fn write_run(dir: &Path) -> std::path::PathBuf {
    let inputs = dir.join("inputs");
    let out = dir.join("run01");
    fs::create_dir_all(&inputs).unwrap();
    fs::create_dir_all(&out).unwrap();

    fs::write(inputs.join("initial.atm"), atmosphere()).unwrap();
    fs::write(inputs.join("planet.tep"), TEP).unwrap();
    fs::write(inputs.join("press.dat"), pressure_file()).unwrap();
    fs::write(out.join("MCMC.log"), MCMC_LOG).unwrap();
    fs::write(out.join("transit.cfg"), TCONFIG).unwrap();
    write_npy(out.join("output.npy"), &sampler_output()).unwrap();

    let config = r#"
output_dir = "run01"
atmfile = "inputs/initial.atm"
tepfile = "inputs/planet.tep"
mcmc_log = "run01/MCMC.log"
tconfig = "transit.cfg"
solution = "eclipse"
pt_model = "madhu"
p0 = 0.1
burnin = 5
stepsize = [0.01, 0.01, 0.0, 0.1, 0.1, 10.0, 0.1]
params   = [0.99, 0.2, -1.5, -1.0, 1.0, 1500.0, 0.0]
molfit = ["H2O"]
plots = false

[initial_pt]
press_file = "inputs/press.dat"
params = [0.99, 0.2, -1.5, -1.0, 1.0, 1500.0]
t3_factor = 1.0
"#;
    let path = dir.join("run.toml");
    fs::write(&path, config).unwrap();
    path
}

#[test]
fn best_fit_rewrites_atmosphere_in_original_order() {
    let dir = tempfile::tempdir().unwrap();
    let config = load_run_config(&write_run(dir.path())).unwrap();
    let constants = PhysicalConstants::default();

    let out = pipeline::best_fit(&config, &constants).unwrap();
    assert_eq!(out.summary.all_params, vec![0.99, 0.2, -1.5, -1.0, 1.0, 1500.0, 1.0]);
    assert_eq!(out.summary.split.pt.len(), 6);
    assert_eq!(out.summary.split.radius_km, None);

    let atm_path = config.output_dir.join(pipeline::BEST_FIT_ATM);
    let text = fs::read_to_string(&atm_path).unwrap();
    let atm = parse_atm(&text).unwrap();
    assert_eq!(atm.order, PressureOrder::Decreasing);
    assert_eq!(atm.n_layers(), N_LAYERS);

    // The first data row is still the deepest layer.
    let first_row = text.lines().nth(6).unwrap();
    assert!(first_row.contains("1.0000e+02"), "{first_row}");

    // +1 dex of H2O, renormalized against H2 and He.
    for layer in 0..N_LAYERS {
        let col = atm.abundances.column(layer);
        assert!((col[0] - 0.447368421).abs() < 1e-4);
        assert!((col[1] - 0.052631579).abs() < 1e-4);
        assert!((col[2] - 0.5).abs() < 1e-4);
        assert!((col.sum() - 1.0).abs() < 1e-3);
    }

    // Radius decreases with depth and matches the planet radius at p0.
    assert!(out.radius.windows(2).all(|w| w[1] < w[0]));
    let r_planet_km = 1.359 * constants.r_jup / 1000.0;
    let i0 = (0..N_LAYERS)
        .min_by(|&a, &b| {
            (pressure(a) / 0.1).ln().abs().total_cmp(&(pressure(b) / 0.1).ln().abs())
        })
        .unwrap();
    assert!((out.radius[i0] - r_planet_km).abs() < 0.05 * r_planet_km);

    let tconfig = fs::read_to_string(config.output_dir.join("bestFit_tconfig.cfg")).unwrap();
    let lines: Vec<&str> = tconfig.lines().collect();
    assert_eq!(lines[0], "# transit configuration");
    assert_eq!(lines[1], format!("atm {}", atm_path.display()));
    assert_eq!(lines[2], "linedb ../inputs/lines.tli");

    let summary = read_summary_json(&config.output_dir.join(SUMMARY_JSON)).unwrap();
    assert_eq!(summary.n_layers, N_LAYERS);
    assert_eq!(summary.best_fit.len(), 6);
}

#[test]
fn posterior_envelope_skips_bad_draws() {
    let dir = tempfile::tempdir().unwrap();
    let config = load_run_config(&write_run(dir.path())).unwrap();
    let constants = PhysicalConstants::default();

    let best = pipeline::best_fit(&config, &constants).unwrap();
    let out = pipeline::posterior_from(&config, &best.reconstruction).unwrap();
    let env = &out.envelope;

    assert_eq!(env.n_used + env.skipped.len(), 2 * 15);
    assert_eq!(env.skipped.len(), 1);
    // Chain 1, post-burn-in iteration 2.
    assert_eq!(env.skipped[0].index, 15 + 2);

    for i in 0..N_LAYERS {
        assert!(env.low2[i] <= env.low1[i]);
        assert!(env.low1[i] <= env.median[i]);
        assert!(env.median[i] <= env.hi1[i]);
        assert!(env.hi1[i] <= env.hi2[i]);
        assert!(env.low2[i] > 0.0);
    }

    let csv = fs::read_to_string(config.output_dir.join(ENVELOPE_CSV)).unwrap();
    assert_eq!(csv.lines().count(), N_LAYERS + 1);
    assert!(csv.starts_with("pressure_bar,t_p2_5,t_p16,t_median,t_p84,t_p97_5,t_best"));
}

#[test]
fn initial_pt_uses_planet_temperature_for_t3() {
    let dir = tempfile::tempdir().unwrap();
    let config = load_run_config(&write_run(dir.path())).unwrap();
    let constants = PhysicalConstants::default();

    let out = pipeline::initial_pt(&config, &constants).unwrap();
    assert_eq!(out.pressure.len(), N_LAYERS);
    assert!(out.pressure.windows(2).all(|w| w[1] > w[0]));
    assert_eq!(out.temperature.len(), N_LAYERS);
    assert!((out.params[5] - out.teff).abs() < 1e-9);
    assert!(out.teff > 1000.0 && out.teff < 2000.0);
    assert!(out.outputs.is_empty());
}

#[test]
fn missing_mcmc_log_is_an_input_error() {
    let dir = tempfile::tempdir().unwrap();
    let config = load_run_config(&write_run(dir.path())).unwrap();
    fs::remove_file(&config.mcmc_log).unwrap();
    let err = pipeline::best_fit(&config, &PhysicalConstants::default()).err().unwrap();
    assert_eq!(err.exit_code(), bart_post::error::EXIT_INPUT);
}

#[test]
fn posterior_survives_unusable_best_fit_profile() {
    let dir = tempfile::tempdir().unwrap();
    let config = load_run_config(&write_run(dir.path())).unwrap();
    let constants = PhysicalConstants::default();
    // log p2 = 1.9 lies below log p3 = 1.0, so the best-fit profile repeats layers.
    fs::write(&config.mcmc_log, mcmc_log(&[0.99, 0.2, 1.9, 1.0, 1500.0, 1.0])).unwrap();

    let err = pipeline::best_fit(&config, &constants).err().unwrap();
    assert_eq!(err.exit_code(), bart_post::error::EXIT_OUTPUT);

    let out = pipeline::posterior(&config, &constants).unwrap();
    let env = &out.envelope;
    assert_eq!(env.best, None);
    assert_eq!(env.skipped.len(), 1);
    assert_eq!(env.n_used, 2 * 15 - 1);

    let rec = pipeline::reconstruct(&config, &constants).unwrap();
    assert!(rec.checked_temperature().is_err());
    assert_eq!(pipeline::posterior_from(&config, &rec).unwrap().envelope.n_used, 2 * 15 - 1);

    let csv = fs::read_to_string(config.output_dir.join(ENVELOPE_CSV)).unwrap();
    let rows: Vec<&str> = csv.lines().skip(1).collect();
    assert_eq!(rows.len(), N_LAYERS);
    assert!(rows.iter().all(|row| row.ends_with(',')), "{csv}");
}

#[test]
fn transit_radius_is_pinned_to_fitted_radius_at_p0() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_run(dir.path());
    edit_config(&path, r#"solution = "eclipse""#, r#"solution = "transit""#);
    edit_config(
        &path,
        "stepsize = [0.01, 0.01, 0.0, 0.1, 0.1, 10.0, 0.1]",
        "stepsize = [0.01, 0.01, 0.0, 0.1, 0.1, 10.0, 100.0, 0.1]",
    );
    edit_config(
        &path,
        "params   = [0.99, 0.2, -1.5, -1.0, 1.0, 1500.0, 0.0]",
        "params   = [0.99, 0.2, -1.5, -1.0, 1.0, 1500.0, 90000.0, 0.0]",
    );
    let config = load_run_config(&path).unwrap();
    fs::write(&config.mcmc_log, mcmc_log(&[0.99, 0.2, -1.0, 1.0, 1500.0, 95000.0, 1.0])).unwrap();

    let out = pipeline::best_fit(&config, &PhysicalConstants::default()).unwrap();
    assert_eq!(out.summary.split.radius_km, Some(95000.0));
    assert_eq!(out.summary.split.abundance_factors, vec![1.0]);

    // p0 = 0.1 bar is layer 8 of the grid (increasing pressure).
    assert!((out.radius[8] - 95000.0).abs() < 1e-6);
    assert!(out.radius.windows(2).all(|w| w[1] < w[0]));
}

#[test]
fn eclipse_spectrum_band_points_against_blackbody_star() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_run(dir.path());
    let constants = PhysicalConstants::default();
    let tep = read_tep(&dir.path().join("inputs/planet.tep")).unwrap();
    let star = star_data(&tep, &constants).unwrap();
    let planet = planet_data(&tep, &constants).unwrap();

    // Planet flux is a fixed fraction of the blackbody star on every sample.
    let ratio = 2.0e-3;
    let mut spectrum = String::from("#wvl [um]      Flux [erg/s/cm]\n");
    for k in 0..=120 {
        let wl: f64 = format!("{:.2}", 3.0 + 0.01 * k as f64).parse().unwrap();
        let flux = ratio * std::f64::consts::PI * planck_wn(1e4 / wl, star.t_star, &constants);
        spectrum.push_str(&format!("{wl:.2}  {flux:e}\n"));
    }
    fs::write(dir.path().join("run01/bestFit-flux.dat"), spectrum).unwrap();
    fs::create_dir_all(dir.path().join("filters")).unwrap();
    fs::write(
        dir.path().join("filters/irac1.dat"),
        "# wavelength transmission\n3.2 1.0\n3.4 1.0\n3.6 1.0\n3.8 1.0\n",
    )
    .unwrap();

    let mut text = fs::read_to_string(&path).unwrap();
    text.push_str(
        r#"
[spectrum]
output = "bestFit-flux.dat"
filters = ["filters/irac1.dat"]
data = [0.0003]
uncert = [0.0001]
"#,
    );
    fs::write(&path, text).unwrap();
    let config = load_run_config(&path).unwrap();

    let out = pipeline::spectrum(&config, &constants).unwrap();
    let rprs = planet.r_planet / star.r_star;
    let expected = ratio * rprs * rprs;
    let point = &out.comparison.points[0];
    assert_eq!(point.filter, "irac1");
    assert!((point.band_flux - expected).abs() < 1e-9 * expected, "{}", point.band_flux);
    assert!(point.mean_wavelength_um() > 3.2 && point.mean_wavelength_um() < 3.8);

    let csv = fs::read_to_string(config.output_dir.join(BAND_POINTS_CSV)).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0], "filter,mean_wavelength_um,model,data,uncert");
    let fields: Vec<&str> = lines[1].split(',').collect();
    assert_eq!(fields[0], "irac1");
    let model: f64 = fields[2].parse().unwrap();
    assert!((model - expected).abs() < 1e-9 * expected);
    assert_eq!(fields[3].parse::<f64>().unwrap(), 0.0003);
}
