//! Plotters bitmap rendering.

use std::error::Error;
use std::path::Path;

use plotters::prelude::*;

use super::{PtCurve, padded_bounds, pressure_axis, pressure_label};
use crate::band::BandComparison;
use crate::domain::Geometry;
use crate::error::AppError;
use crate::posterior::PtEnvelope;

const SIZE: (u32, u32) = (850, 600);
const SIGMA2_FILL: RGBColor = RGBColor(176, 196, 222);
const SIGMA1_FILL: RGBColor = RGBColor(100, 149, 237);
const MEDIAN_COLOR: RGBColor = RGBColor(0, 0, 139);

type DrawResult = Result<(), Box<dyn Error>>;

fn render(path: &Path, what: &str, draw: impl FnOnce(&Path) -> DrawResult) -> Result<(), AppError> {
    draw(path).map_err(|e| AppError::output(format!("Failed to render {what} to '{}': {e}", path.display())))
}

fn pressure_range(pressure: &[f64]) -> Result<(f64, f64), AppError> {
    let ys: Vec<f64> = pressure.iter().filter(|&&p| p > 0.0).map(|&p| pressure_axis(p)).collect();
    padded_bounds(&ys, 0.0).ok_or_else(|| AppError::output("No positive pressures to plot."))
}

/// Draw one or more PT curves.
pub fn draw_pt_profiles(path: &Path, title: &str, curves: &[PtCurve]) -> Result<(), AppError> {
    let (t_lo, t_hi) = padded_bounds(curves.iter().flat_map(|c| c.temperature.iter()), 0.05)
        .ok_or_else(|| AppError::output(format!("{title}: no finite temperatures to plot.")))?;
    let all_p: Vec<f64> = curves.iter().flat_map(|c| c.pressure.iter().copied()).collect();
    let (y_lo, y_hi) = pressure_range(&all_p)?;

    render(path, title, |path| {
        let root = BitMapBackend::new(path, SIZE).into_drawing_area();
        root.fill(&WHITE)?;
        let mut chart = ChartBuilder::on(&root)
            .caption(title, ("sans-serif", 22))
            .margin(15)
            .x_label_area_size(45)
            .y_label_area_size(70)
            .build_cartesian_2d(t_lo..t_hi, y_lo..y_hi)?;
        chart
            .configure_mesh()
            .x_desc("Temperature (K)")
            .y_desc("Pressure (bar)")
            .y_label_formatter(&|y| pressure_label(*y))
            .draw()?;

        for curve in curves {
            let color = curve.color;
            chart
                .draw_series(LineSeries::new(curve.points(), color.stroke_width(2)))?
                .label(curve.label.as_str())
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2)));
        }
        if curves.len() > 1 {
            chart
                .configure_series_labels()
                .background_style(WHITE.mix(0.8))
                .border_style(BLACK)
                .draw()?;
        }
        root.present()?;
        Ok(())
    })
}

fn band_polygon(envelope: &PtEnvelope, low: &[f64], high: &[f64]) -> Vec<(f64, f64)> {
    let y: Vec<f64> = envelope.pressure.iter().map(|&p| pressure_axis(p)).collect();
    low.iter()
        .zip(&y)
        .map(|(&t, &y)| (t, y))
        .chain(high.iter().zip(&y).rev().map(|(&t, &y)| (t, y)))
        .collect()
}

/// Draw the posterior envelope: 2-sigma and 1-sigma bands, median, best fit.
pub fn draw_envelope(path: &Path, envelope: &PtEnvelope) -> Result<(), AppError> {
    let best_t = envelope.best.as_deref().unwrap_or_default();
    let (t_lo, t_hi) = padded_bounds(envelope.low2.iter().chain(&envelope.hi2).chain(best_t), 0.05)
        .ok_or_else(|| AppError::output("Posterior envelope has no finite temperatures."))?;
    let (y_lo, y_hi) = pressure_range(&envelope.pressure)?;
    let median: Vec<(f64, f64)> = envelope
        .median
        .iter()
        .zip(&envelope.pressure)
        .map(|(&t, &p)| (t, pressure_axis(p)))
        .collect();
    let best: Vec<(f64, f64)> = best_t
        .iter()
        .zip(&envelope.pressure)
        .map(|(&t, &p)| (t, pressure_axis(p)))
        .collect();

    render(path, "posterior PT envelope", |path| {
        let root = BitMapBackend::new(path, SIZE).into_drawing_area();
        root.fill(&WHITE)?;
        let mut chart = ChartBuilder::on(&root)
            .caption("MCMC PT profiles", ("sans-serif", 22))
            .margin(15)
            .x_label_area_size(45)
            .y_label_area_size(70)
            .build_cartesian_2d(t_lo..t_hi, y_lo..y_hi)?;
        chart
            .configure_mesh()
            .x_desc("Temperature (K)")
            .y_desc("Pressure (bar)")
            .y_label_formatter(&|y| pressure_label(*y))
            .draw()?;

        chart
            .draw_series(std::iter::once(Polygon::new(
                band_polygon(envelope, &envelope.low2, &envelope.hi2),
                SIGMA2_FILL.filled(),
            )))?
            .label("2\u{03c3} limits")
            .legend(|(x, y)| Rectangle::new([(x, y - 5), (x + 20, y + 5)], SIGMA2_FILL.filled()));
        chart
            .draw_series(std::iter::once(Polygon::new(
                band_polygon(envelope, &envelope.low1, &envelope.hi1),
                SIGMA1_FILL.filled(),
            )))?
            .label("1\u{03c3} limits")
            .legend(|(x, y)| Rectangle::new([(x, y - 5), (x + 20, y + 5)], SIGMA1_FILL.filled()));
        chart
            .draw_series(LineSeries::new(median, MEDIAN_COLOR.stroke_width(2)))?
            .label("Median")
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], MEDIAN_COLOR.stroke_width(2)));
        if !best.is_empty() {
            chart
                .draw_series(LineSeries::new(best, RED.stroke_width(2)))?
                .label("Best fit")
                .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], RED.stroke_width(2)));
        }

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()?;
        root.present()?;
        Ok(())
    })
}

/// Draw the best-fit spectrum with band-integrated model points and data.
pub fn draw_spectrum(path: &Path, comparison: &BandComparison) -> Result<(), AppError> {
    let (scale, y_desc) = match comparison.geometry {
        Geometry::Eclipse => (1e3, "Fp/Fs (10^3)"),
        Geometry::Transit => (1.0, "(Rp/Rs)^2"),
    };
    let curve: Vec<(f64, f64)> = comparison
        .wavelength_um
        .iter()
        .zip(&comparison.curve)
        .filter(|(wl, v)| **wl > 0.0 && v.is_finite())
        .map(|(&wl, &v)| (wl, v * scale))
        .collect();
    let model: Vec<(f64, f64)> = (0..comparison.points.len())
        .map(|i| (comparison.points[i].mean_wavelength_um(), comparison.model_value(i) * scale))
        .collect();
    let data: Vec<(f64, f64, f64)> = comparison
        .points
        .iter()
        .zip(comparison.data.iter().zip(&comparison.uncert))
        .map(|(p, (&d, &u))| (p.mean_wavelength_um(), d * scale, u * scale))
        .collect();

    let (x_lo, x_hi) = padded_bounds(curve.iter().map(|(x, _)| x), 0.0)
        .ok_or_else(|| AppError::output("Spectrum has no finite samples to plot."))?;
    let ys: Vec<f64> = curve
        .iter()
        .map(|&(_, y)| y)
        .chain(model.iter().map(|&(_, y)| y))
        .chain(data.iter().flat_map(|&(_, d, u)| [d - u, d + u]))
        .collect();
    let (y_lo, y_hi) = padded_bounds(&ys, 0.05).ok_or_else(|| AppError::output("Spectrum values are not finite."))?;

    render(path, "best-fit spectrum", |path| {
        let root = BitMapBackend::new(path, SIZE).into_drawing_area();
        root.fill(&WHITE)?;
        let mut chart = ChartBuilder::on(&root)
            .caption("BART best-fit spectrum", ("sans-serif", 22))
            .margin(15)
            .x_label_area_size(45)
            .y_label_area_size(70)
            .build_cartesian_2d((x_lo..x_hi).log_scale(), y_lo..y_hi)?;
        chart
            .configure_mesh()
            .x_desc("Wavelength (um)")
            .y_desc(y_desc)
            .x_label_formatter(&|x| format!("{x:.2}"))
            .draw()?;

        chart
            .draw_series(LineSeries::new(curve, BLUE.stroke_width(2)))?
            .label("Best-fit")
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], BLUE.stroke_width(2)));
        chart
            .draw_series(
                data.iter()
                    .map(|&(x, d, u)| ErrorBar::new_vertical(x, d - u, d, d + u, RED.filled(), 6)),
            )?
            .label("data")
            .legend(|(x, y)| Circle::new((x + 10, y), 3, RED.filled()));
        chart
            .draw_series(model.iter().map(|&(x, y)| Circle::new((x, y), 4, BLACK.filled())))?
            .label("model")
            .legend(|(x, y)| Circle::new((x + 10, y), 4, BLACK.filled()));

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::LowerRight)
            .background_style(WHITE.mix(0.5))
            .border_style(BLACK)
            .draw()?;
        root.present()?;
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::band::BandPoint;
    use crate::plot::LAYER_COLORS;

    #[test]
    #[ignore = "needs system fonts"]
    fn renders_pt_profile_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pt.png");
        let p = [1e-4, 1e-2, 1.0, 100.0];
        let curve = PtCurve::new("Best fit", &p, &[900.0, 1000.0, 1300.0, 1600.0], LAYER_COLORS[0]);
        draw_pt_profiles(&path, "Best-fit PT profile", &[curve]).unwrap();
        assert!(std::fs::metadata(&path).unwrap().len() > 0);
    }

    #[test]
    #[ignore = "needs system fonts"]
    fn renders_envelope_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("env.png");
        let envelope = PtEnvelope {
            pressure: vec![1e-3, 1e-1, 10.0],
            low2: vec![800.0, 900.0, 1000.0],
            low1: vec![850.0, 950.0, 1050.0],
            median: vec![900.0, 1000.0, 1100.0],
            hi1: vec![950.0, 1050.0, 1150.0],
            hi2: vec![1000.0, 1100.0, 1200.0],
            best: Some(vec![910.0, 1010.0, 1090.0]),
            n_used: 10,
            skipped: Vec::new(),
        };
        draw_envelope(&path, &envelope).unwrap();
        assert!(path.exists());
    }

    #[test]
    #[ignore = "needs system fonts"]
    fn renders_spectrum_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("spec.png");
        let comparison = BandComparison {
            geometry: Geometry::Eclipse,
            points: vec![BandPoint {
                filter: "irac1".into(),
                mean_wavenumber: 2800.0,
                band_flux: 0.002,
                band_model: 1.0,
            }],
            data: vec![0.0021],
            uncert: vec![0.0002],
            wavelength_um: (0..50).map(|i| 5.0 - 0.08 * i as f64).collect(),
            curve: vec![0.002; 50],
        };
        draw_spectrum(&path, &comparison).unwrap();
        assert!(path.exists());
    }
}
