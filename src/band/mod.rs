//! Band integration of the best-fit spectrum against filter curves.
//!
//! For each filter the transmission curve and the stellar flux are resampled
//! onto the spectrum wavenumbers that fall strictly inside the filter, the
//! filter is normalized to unit integral, and the planet-to-star flux ratio
//! (eclipse) or the raw modulation spectrum (transit) is integrated over it.

use tracing::debug;

use crate::domain::Geometry;
use crate::error::AppError;
use crate::io::spectrum::{StellarSpectrum, WnTable};
use crate::math::{gaussian_filter1d, interp_many, trapezoid};

/// Smoothing width (in samples) of the plotted transit spectrum.
pub const TRANSIT_SMOOTHING_SIGMA: f64 = 2.0;

/// A filter curve resampled onto the spectrum grid.
#[derive(Debug, Clone)]
pub struct ResampledFilter {
    /// Indices into the spectrum grid covered by the filter.
    pub indices: Vec<usize>,
    /// Transmission at those indices, normalized to unit integral.
    pub transmission: Vec<f64>,
    /// Stellar flux at those indices.
    pub stellar_flux: Vec<f64>,
}

/// Resample a filter and the stellar flux onto `spectrum_wn`.
pub fn resample_filter(
    spectrum_wn: &[f64],
    filter: &WnTable,
    star: &WnTable,
) -> Result<ResampledFilter, AppError> {
    let (lo, hi) = match (filter.wavenumber.first(), filter.wavenumber.last()) {
        (Some(&lo), Some(&hi)) => (lo, hi),
        _ => return Err(AppError::input("Filter curve is empty.")),
    };
    let indices: Vec<usize> = spectrum_wn
        .iter()
        .enumerate()
        .filter(|&(_, &wn)| wn > lo && wn < hi)
        .map(|(i, _)| i)
        .collect();
    if indices.len() < 2 {
        return Err(AppError::input(format!(
            "Filter ({lo:.2} to {hi:.2} cm^-1) overlaps only {} spectrum samples.",
            indices.len()
        )));
    }

    let wn: Vec<f64> = indices.iter().map(|&i| spectrum_wn[i]).collect();
    let raw = interp_many(&filter.wavenumber, &filter.values, &wn)
        .ok_or_else(|| AppError::input("Filter resampling fell outside the filter range."))?;
    let area = trapezoid(&wn, &raw);
    if !(area > 0.0) {
        return Err(AppError::input("Filter transmission integrates to zero over the spectrum."));
    }
    let transmission = raw.iter().map(|t| t / area).collect();

    let stellar_flux = interp_many(&star.wavenumber, &star.values, &wn).ok_or_else(|| {
        AppError::input(format!(
            "Stellar spectrum does not cover the filter range ({lo:.2} to {hi:.2} cm^-1)."
        ))
    })?;

    Ok(ResampledFilter {
        indices,
        transmission,
        stellar_flux,
    })
}

/// Integrate `values` (taken at the filter's indices) over the normalized filter.
pub fn band_integrate(values: &[f64], spectrum_wn: &[f64], filter: &ResampledFilter) -> f64 {
    let wn: Vec<f64> = filter.indices.iter().map(|&i| spectrum_wn[i]).collect();
    let weighted: Vec<f64> = values
        .iter()
        .zip(&filter.transmission)
        .map(|(v, t)| v * t)
        .collect();
    trapezoid(&wn, &weighted)
}

/// Transmission-weighted mean wavenumber of a filter on its own grid.
pub fn mean_wavenumber(filter: &WnTable) -> f64 {
    let total: f64 = filter.values.iter().sum();
    filter
        .wavenumber
        .iter()
        .zip(&filter.values)
        .map(|(wn, t)| wn * t)
        .sum::<f64>()
        / total
}

/// Synthetic photometry for one filter.
#[derive(Debug, Clone)]
pub struct BandPoint {
    pub filter: String,
    /// Mean wavenumber (cm^-1).
    pub mean_wavenumber: f64,
    /// Band-integrated planet-to-star flux ratio.
    pub band_flux: f64,
    /// Band-integrated raw spectrum.
    pub band_model: f64,
}

impl BandPoint {
    pub fn mean_wavelength_um(&self) -> f64 {
        1e4 / self.mean_wavenumber
    }
}

/// Model band points next to the observations, plus the curve to plot.
#[derive(Debug, Clone)]
pub struct BandComparison {
    pub geometry: Geometry,
    pub points: Vec<BandPoint>,
    pub data: Vec<f64>,
    pub uncert: Vec<f64>,
    /// Spectrum wavelengths (um), decreasing with index.
    pub wavelength_um: Vec<f64>,
    /// Eclipse: Fp/Fs. Transit: smoothed modulation spectrum.
    pub curve: Vec<f64>,
}

impl BandComparison {
    /// The model value that is compared with `data[i]`.
    pub fn model_value(&self, i: usize) -> f64 {
        match self.geometry {
            Geometry::Eclipse => self.points[i].band_flux,
            Geometry::Transit => self.points[i].band_model,
        }
    }

    /// Chi-square of the band points against the data.
    pub fn chi_square(&self) -> f64 {
        (0..self.points.len())
            .map(|i| ((self.model_value(i) - self.data[i]) / self.uncert[i]).powi(2))
            .sum()
    }
}

pub struct ComparisonInputs<'a> {
    pub geometry: Geometry,
    pub spectrum: &'a WnTable,
    pub star: &'a StellarSpectrum,
    /// `(name, curve)` per filter.
    pub filters: &'a [(String, WnTable)],
    /// Planet-to-star radius ratio.
    pub rprs: f64,
    pub data: &'a [f64],
    pub uncert: &'a [f64],
}

/// Band-integrate the spectrum over every filter.
pub fn compare(inputs: &ComparisonInputs<'_>) -> Result<BandComparison, AppError> {
    let n = inputs.filters.len();
    if inputs.data.len() != n || inputs.uncert.len() != n {
        return Err(AppError::input(format!(
            "{n} filters but {} data points and {} uncertainties.",
            inputs.data.len(),
            inputs.uncert.len()
        )));
    }

    let wn = &inputs.spectrum.wavenumber;
    let spec = &inputs.spectrum.values;
    let rprs2 = inputs.rprs * inputs.rprs;

    let mut points = Vec::with_capacity(n);
    for (name, filter) in inputs.filters {
        let resampled = resample_filter(wn, filter, &inputs.star.flux)
            .map_err(|e| AppError::new(e.exit_code(), format!("Filter '{name}': {}", e.message())))?;
        let in_band: Vec<f64> = resampled.indices.iter().map(|&i| spec[i]).collect();
        let ratio: Vec<f64> = in_band
            .iter()
            .zip(&resampled.stellar_flux)
            .map(|(s, f)| s / f * rprs2)
            .collect();
        let point = BandPoint {
            filter: name.clone(),
            mean_wavenumber: mean_wavenumber(filter),
            band_flux: band_integrate(&ratio, wn, &resampled),
            band_model: band_integrate(&in_band, wn, &resampled),
        };
        debug!(
            filter = %point.filter,
            samples = resampled.indices.len(),
            band_flux = point.band_flux,
            band_model = point.band_model,
            "band-integrated filter"
        );
        points.push(point);
    }

    let curve = match inputs.geometry {
        Geometry::Eclipse => {
            let star = interp_many(&inputs.star.flux.wavenumber, &inputs.star.flux.values, wn)
                .ok_or_else(|| AppError::input("Stellar spectrum does not cover the planet spectrum."))?;
            spec.iter().zip(&star).map(|(s, f)| s / f * rprs2).collect()
        }
        Geometry::Transit => gaussian_filter1d(spec, TRANSIT_SMOOTHING_SIGMA),
    };

    Ok(BandComparison {
        geometry: inputs.geometry,
        points,
        data: inputs.data.to_vec(),
        uncert: inputs.uncert.to_vec(),
        wavelength_um: inputs.spectrum.wavelength_um(),
        curve,
    })
}
