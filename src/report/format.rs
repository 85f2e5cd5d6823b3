//! Formatted terminal output.
//!
//! Formatting lives in one place so the pipelines only compute, and output
//! changes stay localized.

use std::path::{Path, PathBuf};

use crate::band::BandComparison;
use crate::domain::{BestFitSummary, Geometry};
use crate::posterior::PtEnvelope;

/// Summary of a best-fit reconstruction and the files it wrote.
pub fn format_best_fit_summary(summary: &BestFitSummary, outputs: &[PathBuf]) -> String {
    let mut out = String::new();

    out.push_str("=== bartpost - best-fit reconstruction ===\n");
    out.push_str(&format!("Generated: {}\n", summary.generated));
    out.push_str(&format!(
        "Geometry: {:?} | PT model: {}\n",
        summary.solution,
        summary.pt_model.display_name()
    ));
    out.push_str(&format!(
        "Atmosphere: {} ({} layers)\n",
        summary.atmfile.display(),
        summary.n_layers
    ));
    out.push_str(&format!(
        "Free parameters: {} of {}\n",
        summary.best_fit.len(),
        summary.all_params.len()
    ));

    out.push_str("\nParameters:\n");
    out.push_str(&format!("- PT        : {}\n", fmt_vec(&summary.split.pt)));
    if let Some(r) = summary.split.radius_km {
        out.push_str(&format!("- radius    : {r:.3} km\n"));
    }
    out.push_str(&format!("- abundance : {}\n", fmt_vec(&summary.split.abundance_factors)));

    out.push_str(&format_outputs(outputs));
    out
}

/// Summary of the posterior envelope.
pub fn format_envelope_summary(envelope: &PtEnvelope) -> String {
    let mut out = String::new();

    out.push_str("=== bartpost - posterior PT envelope ===\n");
    out.push_str(&format!(
        "Samples: used={} skipped={}\n",
        envelope.n_used,
        envelope.skipped.len()
    ));
    for s in envelope.skipped.iter().take(10) {
        out.push_str(&format!("  (skipped sample {}) {}\n", s.index, s.reason));
    }
    if envelope.skipped.len() > 10 {
        out.push_str(&format!("  ... and {} more\n", envelope.skipped.len() - 10));
    }

    let n = envelope.pressure.len();
    if n > 0 {
        out.push('\n');
        out.push_str(&envelope_row("pressure", "2.5%", "median", "97.5%", "best"));
        out.push_str(&format!("{:-<10} {:-<9} {:-<9} {:-<9} {:-<9}\n", "", "", "", "", ""));
        // Top, middle, and bottom of the atmosphere.
        let mut rows = vec![0, n / 2, n - 1];
        rows.dedup();
        for i in rows {
            out.push_str(&envelope_row(
                &format!("{:.3e}", envelope.pressure[i]),
                &format!("{:.1}", envelope.low2[i]),
                &format!("{:.1}", envelope.median[i]),
                &format!("{:.1}", envelope.hi2[i]),
                &envelope.best.as_ref().map_or_else(|| "-".to_string(), |b| format!("{:.1}", b[i])),
            ));
        }
    }
    out
}

fn envelope_row(p: &str, lo: &str, med: &str, hi: &str, best: &str) -> String {
    format!("{p:>10} {lo:>9} {med:>9} {hi:>9} {best:>9}\n")
}

/// Table of band-integrated model points against the data.
pub fn format_band_table(comparison: &BandComparison) -> String {
    let mut out = String::new();
    let (scale, unit) = match comparison.geometry {
        Geometry::Eclipse => (1e3, "Fp/Fs x 1e3"),
        Geometry::Transit => (1.0, "(Rp/Rs)^2"),
    };

    out.push_str(&format!("=== bartpost - band comparison ({unit}) ===\n"));
    out.push_str(
        format!(
            "{:<24} {:>10} {:>12} {:>12} {:>12} {:>8}\n",
            "filter", "wl_um", "model", "data", "uncert", "z"
        )
        .trim_end(),
    );
    out.push('\n');
    out.push_str(format!("{:-<24} {:-<10} {:-<12} {:-<12} {:-<12} {:-<8}", "", "", "", "", "", "").trim_end());
    out.push('\n');

    for (i, point) in comparison.points.iter().enumerate() {
        let model = comparison.model_value(i);
        let z = (model - comparison.data[i]) / comparison.uncert[i];
        out.push_str(
            format!(
                "{:<24} {:>10.4} {:>12.5} {:>12.5} {:>12.5} {:>8.2}\n",
                truncate(&point.filter, 24),
                point.mean_wavelength_um(),
                model * scale,
                comparison.data[i] * scale,
                comparison.uncert[i] * scale,
                z
            )
            .trim_end(),
        );
        out.push('\n');
    }
    out.push_str(&format!("chi2 = {:.3} ({} bands)\n", comparison.chi_square(), comparison.points.len()));
    out
}

/// Summary of an initial-PT diagnostic.
pub fn format_initial_pt_summary(params: &[f64], teff: f64, n_layers: usize, outputs: &[PathBuf]) -> String {
    let mut out = String::new();
    out.push_str("=== bartpost - initial PT profile ===\n");
    out.push_str(&format!("Planet Teff: {teff:.1} K\n"));
    out.push_str(&format!("Layers: {n_layers}\n"));
    out.push_str(&format!("Parameters: {}\n", fmt_vec(params)));
    out.push_str(&format_outputs(outputs));
    out
}

fn format_outputs(outputs: &[PathBuf]) -> String {
    let mut out = String::from("\nWrote:\n");
    for path in outputs {
        out.push_str(&format!("- {}\n", file_label(path)));
    }
    out
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn fmt_vec(v: &[f64]) -> String {
    let parts: Vec<String> = v.iter().map(|x| format!("{x:.6}")).collect();
    format!("[{}]", parts.join(", "))
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('.');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::band::BandPoint;
    use crate::domain::{BestFitRecord, PtModelKind, SplitParameters};
    use crate::posterior::{SkipReason, SkippedSample};

    #[test]
    fn best_fit_summary_lists_parameters_and_outputs() {
        let summary = BestFitSummary {
            tool: "bartpost".into(),
            generated: "2026-01-01T00:00:00".into(),
            solution: Geometry::Transit,
            pt_model: PtModelKind::Madhu,
            best_fit: BestFitRecord {
                best: vec![1.0],
                ..Default::default()
            },
            all_params: vec![1.0, 2.0, 3.0],
            split: SplitParameters {
                pt: vec![1.0],
                radius_km: Some(70000.0),
                abundance_factors: vec![0.5],
            },
            atmfile: PathBuf::from("/data/initial.atm"),
            n_layers: 100,
        };
        let text = format_best_fit_summary(&summary, &[PathBuf::from("/out/bestFit.atm")]);
        assert!(text.contains("Free parameters: 1 of 3"));
        assert!(text.contains("radius    : 70000.000 km"));
        assert!(text.contains("- bestFit.atm"));
    }

    #[test]
    fn envelope_summary_reports_skips() {
        let envelope = PtEnvelope {
            pressure: vec![1e-3, 1.0],
            low2: vec![1.0, 2.0],
            low1: vec![1.0, 2.0],
            median: vec![1.0, 2.0],
            hi1: vec![1.0, 2.0],
            hi2: vec![1.0, 2.0],
            best: Some(vec![1.0, 2.0]),
            n_used: 5,
            skipped: vec![SkippedSample {
                index: 3,
                reason: SkipReason::WrongLength { got: 101, expected: 100 },
            }],
        };
        let text = format_envelope_summary(&envelope);
        assert!(text.contains("used=5 skipped=1"));
        assert!(text.contains("(skipped sample 3) profile has 101 layers, expected 100"));
        assert!(text.contains("---------- ---------"));
    }

    #[test]
    fn band_table_scales_eclipse_values() {
        let comparison = BandComparison {
            geometry: Geometry::Eclipse,
            points: vec![BandPoint {
                filter: "spitzer_irac1_sa".into(),
                mean_wavenumber: 2777.0,
                band_flux: 0.0011,
                band_model: 3.0,
            }],
            data: vec![0.0010],
            uncert: vec![0.0001],
            wavelength_um: vec![],
            curve: vec![],
        };
        let text = format_band_table(&comparison);
        assert!(text.contains("spitzer_irac1_sa"));
        assert!(text.contains("1.10000"));
        assert!(text.contains("chi2 = 1.000"));
    }

    #[test]
    fn truncate_marks_long_names() {
        assert_eq!(truncate("abcdef", 4), "abc.");
        assert_eq!(truncate("abc", 4), "abc");
    }
}
