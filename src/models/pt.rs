//! Parametric pressure-temperature profiles.
//!
//! Two models are supported:
//!
//! - **Madhusudhan & Seager (2009)**, thermal-inversion variant. Three layers
//!   with exponential-like P(T) relations, joined at `p1`, `p2`, `p3`, then
//!   Gaussian-smoothed.
//! - **Line et al. (2013)**, analytic two-stream profile driven by stellar
//!   irradiation and internal heat.
//!
//! Both evaluate on a pressure grid in **increasing** order (bar).
//!
//! The inversion model partitions the grid by boundary pressure. When the
//! boundaries are out of order (`p1 > p2` or `p2 > p3`) some layers land in
//! two segments and the returned profile is longer than the grid. That is a
//! property of the model, not an evaluation error: callers compare lengths
//! and skip such draws.

use crate::domain::PtModelKind;
use crate::error::AppError;
use crate::io::tep::{PlanetData, StarData};
use crate::math::{e2, gaussian_filter1d};

/// Smoothing width (in layers) applied to the inversion profile.
pub const INVERSION_SMOOTHING_SIGMA: f64 = 4.0;

/// Evaluates a temperature profile on an increasing pressure grid.
pub trait PtEvaluator {
    /// Temperatures for `pressure` (bar, increasing) given model `params`.
    ///
    /// An `Err` means the call itself is invalid (wrong parameter count). A
    /// successful result may still have a different length than `pressure`.
    fn evaluate(&self, pressure: &[f64], params: &[f64]) -> Result<Vec<f64>, AppError>;
}

fn check_param_count(kind: PtModelKind, params: &[f64]) -> Result<(), AppError> {
    if params.len() != kind.param_count() {
        return Err(AppError::input(format!(
            "{} model takes {} parameters, got {}.",
            kind.display_name(),
            kind.param_count(),
            params.len()
        )));
    }
    Ok(())
}

/// One contiguous piece of the inversion profile.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Segment {
    pub pressure: Vec<f64>,
    pub temperature: Vec<f64>,
}

/// Full breakdown of an inversion-profile evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct InversionLayers {
    /// Layer 1 (`p < p1`), layer 2 below and above `p2`, layer 3 (`p >= p3`).
    pub segments: [Segment; 4],
    pub t0: f64,
    pub t1: f64,
    pub t2: f64,
    pub t3: f64,
    /// Smoothed concatenation of the segments.
    pub smoothed: Vec<f64>,
}

/// Madhusudhan & Seager (2009) inverted profile.
///
/// Parameters: `[a1, a2, log10 p1, log10 p2, log10 p3, T3]` with pressures in bar.
#[derive(Debug, Clone, Copy)]
pub struct MadhuInversion {
    pub smoothing_sigma: f64,
}

impl Default for MadhuInversion {
    fn default() -> Self {
        Self {
            smoothing_sigma: INVERSION_SMOOTHING_SIGMA,
        }
    }
}

impl MadhuInversion {
    pub fn layers(&self, pressure: &[f64], params: &[f64]) -> Result<InversionLayers, AppError> {
        check_param_count(PtModelKind::Madhu, params)?;
        if pressure.is_empty() {
            return Err(AppError::input("Cannot evaluate a PT profile on an empty pressure grid."));
        }

        let (a1, a2, t3) = (params[0], params[1], params[5]);
        let p1 = 10f64.powf(params[2]);
        let p2 = 10f64.powf(params[3]);
        let p3 = 10f64.powf(params[4]);
        let p_top = pressure.iter().copied().fold(f64::INFINITY, f64::min);
        let p_bottom = pressure.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        let t2 = t3 - ((p3 / p2).ln() / a2).powi(2);
        let t0 = t2 + ((p1 / p2).ln() / -a2).powi(2) - ((p1 / p_top).ln() / a1).powi(2);
        let t1 = t0 + ((p1 / p_top).ln() / a1).powi(2);

        let segment = |keep: &dyn Fn(f64) -> bool, temp: &dyn Fn(f64) -> f64| -> Segment {
            let pressure: Vec<f64> = pressure.iter().copied().filter(|&p| keep(p)).collect();
            let temperature = pressure.iter().map(|&p| temp(p)).collect();
            Segment { pressure, temperature }
        };

        let l1 = segment(&|p| p >= p_top && p < p1, &|p| t0 + ((p / p_top).ln() / a1).powi(2));
        let l2_neg = segment(&|p| p >= p1 && p < p2, &|p| t2 + ((p / p2).ln() / -a2).powi(2));
        let l2_pos = segment(&|p| p >= p2 && p < p3, &|p| t2 + ((p / p2).ln() / a2).powi(2));
        let l3 = segment(&|p| p >= p3 && p <= p_bottom, &|_| t3);

        let raw: Vec<f64> = [&l1, &l2_neg, &l2_pos, &l3]
            .iter()
            .flat_map(|s| s.temperature.iter().copied())
            .collect();
        let smoothed = gaussian_filter1d(&raw, self.smoothing_sigma);

        Ok(InversionLayers {
            segments: [l1, l2_neg, l2_pos, l3],
            t0,
            t1,
            t2,
            t3,
            smoothed,
        })
    }
}

impl PtEvaluator for MadhuInversion {
    fn evaluate(&self, pressure: &[f64], params: &[f64]) -> Result<Vec<f64>, AppError> {
        Ok(self.layers(pressure, params)?.smoothed)
    }
}

/// Line et al. (2013) two-stream profile.
///
/// Parameters: `[log10 kappa, log10 gamma1, log10 gamma2, alpha, beta]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineProfile {
    /// Stellar radius (m).
    pub r_star: f64,
    /// Stellar temperature (K).
    pub t_star: f64,
    /// Internal planetary temperature (K).
    pub t_int: f64,
    /// Semi-major axis (m).
    pub sma: f64,
    /// Planetary surface gravity (cm s^-2).
    pub gravity_cgs: f64,
}

impl LineProfile {
    pub fn new(star: &StarData, planet: &PlanetData, t_int: f64) -> Self {
        Self {
            r_star: star.r_star,
            t_star: star.t_star,
            t_int,
            sma: star.sma,
            gravity_cgs: planet.gravity * 100.0,
        }
    }
}

impl PtEvaluator for LineProfile {
    fn evaluate(&self, pressure: &[f64], params: &[f64]) -> Result<Vec<f64>, AppError> {
        check_param_count(PtModelKind::Line, params)?;
        let kappa = 10f64.powf(params[0]);
        let gamma1 = 10f64.powf(params[1]);
        let gamma2 = 10f64.powf(params[2]);
        let (alpha, beta) = (params[3], params[4]);

        let t_irr = beta * (self.r_star / (2.0 * self.sma)).sqrt() * self.t_star;
        let t_irr4 = t_irr.powi(4);
        let t_int4 = self.t_int.powi(4);

        Ok(pressure
            .iter()
            .map(|&p| {
                // bar -> barye for a cgs optical depth.
                let tau = kappa * p * 1e6 / self.gravity_cgs;
                let xi1 = xi(gamma1, tau);
                let xi2 = xi(gamma2, tau);
                (0.75 * (t_int4 * (2.0 / 3.0 + tau) + t_irr4 * (1.0 - alpha) * xi1 + t_irr4 * alpha * xi2))
                    .powf(0.25)
            })
            .collect())
    }
}

fn xi(gamma: f64, tau: f64) -> f64 {
    let gt = gamma * tau;
    (2.0 / 3.0)
        * (1.0 + (1.0 / gamma) * (1.0 + (0.5 * gt - 1.0) * (-gt).exp()) + gamma * (1.0 - 0.5 * tau * tau) * e2(gt))
}

/// Build the evaluator for the configured model.
pub fn pt_evaluator(kind: PtModelKind, star: &StarData, planet: &PlanetData, t_int: f64) -> Box<dyn PtEvaluator> {
    match kind {
        PtModelKind::Madhu => Box::new(MadhuInversion::default()),
        PtModelKind::Line => Box::new(LineProfile::new(star, planet, t_int)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::pressure::log_pressure_grid;

    const INVERTED: [f64; 6] = [0.99, 0.2, -1.5, -1.0, 1.0, 1500.0];

    #[test]
    fn inversion_partitions_ordered_grid() {
        let p = log_pressure_grid(1e-5, 100.0, 100);
        let layers = MadhuInversion::default().layers(&p, &INVERTED).unwrap();
        let total: usize = layers.segments.iter().map(|s| s.pressure.len()).sum();
        assert_eq!(total, 100);
        assert_eq!(layers.smoothed.len(), 100);
        assert!(layers.smoothed.iter().all(|t| t.is_finite()));

        // The deep layer is isothermal at T3.
        assert!(layers.segments[3].temperature.iter().all(|&t| t == 1500.0));
        // T1 is the layer-1 temperature at p1.
        let p1 = 10f64.powf(INVERTED[2]);
        let expect_t1 = layers.t0 + ((p1 / 1e-5).ln() / INVERTED[0]).powi(2);
        assert!((layers.t1 - expect_t1).abs() < 1e-9);
    }

    #[test]
    fn profile_is_continuous_at_p2() {
        let p = log_pressure_grid(1e-5, 100.0, 100);
        let layers = MadhuInversion::default().layers(&p, &INVERTED).unwrap();
        let below = layers.segments[1].temperature.last().copied().unwrap();
        let above = layers.segments[2].temperature.first().copied().unwrap();
        assert!((below - layers.t2).abs() < 50.0);
        assert!((above - layers.t2).abs() < 50.0);
    }

    #[test]
    fn out_of_order_boundaries_change_the_length() {
        let p = log_pressure_grid(1e-5, 100.0, 100);
        // p2 > p3: layer 3 overlaps layer 2.
        let params = [0.99, 0.2, -1.5, 1.5, 0.5, 1500.0];
        let t = MadhuInversion::default().evaluate(&p, &params).unwrap();
        assert_ne!(t.len(), p.len());
    }

    #[test]
    fn wrong_parameter_count_is_an_error() {
        let p = [1e-3, 1.0];
        assert!(MadhuInversion::default().evaluate(&p, &[1.0; 5]).is_err());
        let line = LineProfile {
            r_star: 7e8,
            t_star: 6000.0,
            t_int: 100.0,
            sma: 7e9,
            gravity_cgs: 1000.0,
        };
        assert!(line.evaluate(&p, &[1.0; 6]).is_err());
    }

    #[test]
    fn line_profile_matches_optically_thin_limit() {
        let line = LineProfile {
            r_star: 7e8,
            t_star: 6000.0,
            t_int: 100.0,
            sma: 7e9,
            gravity_cgs: 1000.0,
        };
        let params = [-12.0, -0.5, 0.3, 0.4, 1.0];
        let t = line.evaluate(&[1e-6], &params).unwrap()[0];

        let g1 = 10f64.powf(-0.5);
        let g2 = 10f64.powf(0.3);
        let t_irr = (7e8 / 1.4e10f64).sqrt() * 6000.0;
        let expect = (0.5 * 100f64.powi(4)
            + 0.5 * t_irr.powi(4) * ((1.0 - 0.4) * (1.0 + g1) + 0.4 * (1.0 + g2)))
            .powf(0.25);
        assert!((t - expect).abs() < 1e-6 * expect, "t={t} expect={expect}");
    }

    #[test]
    fn line_profile_warms_with_depth_when_internally_heated() {
        let line = LineProfile {
            r_star: 7e8,
            t_star: 6000.0,
            t_int: 500.0,
            sma: 7e9,
            gravity_cgs: 1000.0,
        };
        let p = log_pressure_grid(1e-2, 1e3, 20);
        let t = line.evaluate(&p, &[-2.0, -1.0, -1.0, 0.0, 1.0]).unwrap();
        assert_eq!(t.len(), 20);
        assert!(t[19] > t[0]);
    }
}
