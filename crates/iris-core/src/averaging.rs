//! The three-stage averaging pipeline: finite source disk, illumination
//! spectrum, drop-size distribution.
//!
//! Each stage is an independent, stateless aggregation over a
//! precomputed sample set, instantiating one scattering model per sampled
//! (wavelength, drop radius) pair and combining intensities with
//! quadrature weights. Composed in full they turn the singular
//! single-drop intensity curve into the smooth coloured profile an
//! observer actually sees.
//!
//! External data — refractive index dispersion, black-body radiance, and
//! the colour-matching response — enter only through the
//! [`SpectralEnvironment`] collaborator trait.

use std::f64::consts::PI;
use std::rc::Rc;

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::error::ModelError;
use crate::grid;
use crate::mie::AngularCache;
use crate::model::{MieBuild, ModelKind};
use crate::special::inverse_normal_cdf;
use crate::types::{Polarisation, RaySelection};

/// Apparent angular radius of the sun (half of 1919 arcsec), in radians.
pub const SUN_RADIUS: f64 = 1919.0 / 2.0 * PI / 180.0 / 3600.0;

/// Finite light source: a uniform disk of angular radius `radius`,
/// integrated with step `step` (both radians).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SourceDisc {
    pub radius: f64,
    pub step: f64,
}

impl Default for SourceDisc {
    fn default() -> Self {
        Self {
            radius: SUN_RADIUS,
            step: 1e-3,
        }
    }
}

impl SourceDisc {
    /// A point source: no averaging at all.
    pub fn point() -> Self {
        Self {
            radius: 0.0,
            step: 1e-3,
        }
    }
}

/// Convolve an intensity curve with the semicircular source kernel
/// `w(u) = sqrt(r² - u²)`, normalised so the disk integrates to one.
///
/// The grid is oversampled to the integration step, extended past both
/// edges by the kernel half-width, evaluated once, convolved, and
/// decimated back — a single convolution instead of per-point quadrature.
/// `theta` must be uniformly spaced (single angles are allowed); when the
/// source radius is below the step the curve is returned unaveraged.
pub fn convolve_source<F>(
    theta: &[f64],
    source: &SourceDisc,
    eval: F,
) -> Result<Vec<f64>, ModelError>
where
    F: Fn(&[f64]) -> Result<Vec<f64>, ModelError>,
{
    if source.radius < source.step {
        return eval(theta);
    }

    // Oversampled core grid with sub-step dx <= source.step.
    let (core, n_sub, dx) = if theta.len() > 1 {
        let dt = grid::ensure_uniform(theta)?;
        let n_sub = (dt.abs() / source.step).ceil().max(1.0) as usize;
        let dx = dt / n_sub as f64;
        let core = grid::linspace(
            theta[0],
            theta[theta.len() - 1],
            n_sub * (theta.len() - 1) + 1,
        );
        (core, n_sub, dx)
    } else {
        (vec![theta[0]], 1, source.step)
    };

    let half_width = (source.radius / dx.abs()).floor() as usize;
    let r2 = source.radius * source.radius;
    let kernel: Vec<f64> = (0..=2 * half_width)
        .map(|k| {
            let u = dx.abs() * (k as f64 - half_width as f64);
            (r2 - u * u).sqrt()
        })
        .collect();

    // Edge-extended evaluation grid.
    let mut extended = Vec::with_capacity(core.len() + 2 * half_width);
    for k in 0..half_width {
        extended.push(core[0] + dx * (k as f64 - half_width as f64));
    }
    extended.extend_from_slice(&core);
    for k in half_width + 1..=2 * half_width {
        extended.push(core[core.len() - 1] + dx * (k as f64 - half_width as f64));
    }

    let curve = eval(&extended)?;

    let normalisation = dx.abs() * 2.0 / (PI * r2);
    let mut averaged = Vec::with_capacity(theta.len());
    for j in (0..core.len()).step_by(n_sub) {
        let window = &curve[j..j + kernel.len()];
        let acc: f64 = window.iter().zip(kernel.iter()).map(|(i, w)| i * w).sum();
        averaged.push(acc * normalisation);
    }
    Ok(averaged)
}

/// Per-sample model request threaded through the averaging stages.
#[derive(Clone)]
pub struct ModelRequest {
    pub selection: RaySelection,
    pub polarisation: Polarisation,
    pub source: SourceDisc,
    /// Highest Debye order to decompose in Mie models; derived from the
    /// selection by [`ModelRequest::new`].
    pub debye_max: Option<usize>,
    /// Angular-function cache shared across every instantiated Mie model;
    /// created on demand when absent.
    pub cache: Option<Rc<AngularCache>>,
}

impl ModelRequest {
    pub fn new(selection: RaySelection, polarisation: Polarisation) -> Self {
        let debye_max = selection.max_debye_order();
        Self {
            selection,
            polarisation,
            source: SourceDisc::default(),
            debye_max,
            cache: None,
        }
    }

    pub fn with_source(mut self, source: SourceDisc) -> Self {
        self.source = source;
        self
    }

    fn mie_build(&self, cache: &Rc<AngularCache>) -> MieBuild {
        MieBuild {
            debye_max: self.debye_max,
            cache: Some(Rc::clone(cache)),
        }
    }

    fn shared_cache(&self) -> Rc<AngularCache> {
        self.cache
            .clone()
            .unwrap_or_else(|| Rc::new(AngularCache::new()))
    }
}

/// Wavelength-averaging stage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WavelengthOptions {
    /// Wavelength band to sample (metres).
    pub band: (f64, f64),
    /// Number of sample wavelengths.
    pub samples: usize,
    /// Black-body temperature of the illumination (kelvin).
    pub temperature: f64,
    /// Append a fourth, colour-blind "white" channel.
    pub include_white: bool,
}

impl Default for WavelengthOptions {
    fn default() -> Self {
        Self {
            band: (380e-9, 700e-9),
            samples: 16,
            temperature: 5783.0,
            include_white: false,
        }
    }
}

/// External spectral data consumed by the wavelength stage.
pub trait SpectralEnvironment {
    /// Refractive index of the drop medium at `wavelength` (metres).
    fn refractive_index(&self, wavelength: f64) -> f64;

    /// Relative black-body radiance at `wavelength` for the given
    /// temperature; only ratios matter, the stage renormalises.
    fn spectral_radiance(&self, wavelength: f64, temperature: f64) -> f64;

    /// Colour-matching response `(r, g, b)` at `wavelength`, each in
    /// [0, 1].
    fn colour_response(&self, wavelength: f64) -> [f64; 3];
}

/// Average source-disk-smoothed intensity over the illumination spectrum.
///
/// Samples `options.samples` wavelengths across the band, instantiates
/// one model per wavelength, and forms the radiance-and-colour-weighted
/// sum. Returns shape `(3, n_theta)`, or `(4, n_theta)` with the white
/// channel appended.
pub fn wavelength_average(
    kind: ModelKind,
    theta: &[f64],
    drop_radius: Option<f64>,
    environment: &dyn SpectralEnvironment,
    options: &WavelengthOptions,
    request: &ModelRequest,
) -> Result<Array2<f64>, ModelError> {
    let wavelengths = grid::linspace(options.band.0, options.band.1, options.samples);
    let cache = request.shared_cache();

    let channels = if options.include_white { 4 } else { 3 };
    let mut out = Array2::zeros((channels, theta.len()));
    let mut total_weight = 0.0;

    for &wavelength in &wavelengths {
        let m = environment.refractive_index(wavelength);
        let x = match (kind.requires_size_parameter(), drop_radius) {
            (true, Some(radius)) => Some(2.0 * PI * radius / wavelength),
            (true, None) => {
                return Err(ModelError::SizeParameterRequired { model: kind.name() })
            }
            (false, _) => None,
        };
        let model = kind.instantiate(m, x, &request.mie_build(&cache))?;
        let curve = model.averaged_intensity(
            theta,
            &request.selection,
            request.polarisation,
            &request.source,
        )?;

        // Spectrum in logarithmic wavelength interval, as the black-body
        // normalisation expects.
        let weight = environment.spectral_radiance(wavelength, options.temperature) / wavelength;
        let rgb = environment.colour_response(wavelength);
        total_weight += weight;

        for (channel, &response) in rgb.iter().enumerate() {
            for (j, &value) in curve.iter().enumerate() {
                out[[channel, j]] += response * weight * value;
            }
        }
        if options.include_white {
            for (j, &value) in curve.iter().enumerate() {
                out[[3, j]] += weight * value;
            }
        }
    }

    out /= total_weight;
    Ok(out)
}

/// Drop-radius probability distribution sampled by the drop-size stage.
pub trait DropDistribution {
    /// Quantile (inverse CDF) at probability `q`.
    fn quantile(&self, q: f64) -> f64;
    /// Probability density at `v`.
    fn density(&self, v: f64) -> f64;
    fn mean(&self) -> f64;
    fn std_dev(&self) -> f64;
}

/// Log-normal distribution with shape parameter `s` (`ln X ~ N(0, s²)`),
/// the conventional raindrop-size model.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LogNormal {
    pub shape: f64,
}

impl Default for LogNormal {
    fn default() -> Self {
        Self { shape: 1.0 }
    }
}

impl DropDistribution for LogNormal {
    fn quantile(&self, q: f64) -> f64 {
        (self.shape * inverse_normal_cdf(q)).exp()
    }

    fn density(&self, v: f64) -> f64 {
        if v <= 0.0 {
            return 0.0;
        }
        let z = v.ln() / self.shape;
        (-0.5 * z * z).exp() / (v * self.shape * (2.0 * PI).sqrt())
    }

    fn mean(&self) -> f64 {
        (0.5 * self.shape * self.shape).exp()
    }

    fn std_dev(&self) -> f64 {
        let s2 = (self.shape * self.shape).exp();
        (s2 * (s2 - 1.0)).sqrt()
    }
}

/// Drop-size-averaging stage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DropSizeOptions {
    /// Standard deviation of the drop radius (metres); no averaging when
    /// zero or negative.
    pub sigma: f64,
    /// Probability mass covered by the sample interval, in (0, 1).
    pub width: f64,
    /// Number of radius samples.
    pub samples: usize,
}

impl Default for DropSizeOptions {
    fn default() -> Self {
        Self {
            sigma: 0.0,
            width: 0.95,
            samples: 16,
        }
    }
}

/// Average over the drop-size distribution.
///
/// Samples quantile points of `distribution` over the central `width`
/// probability mass, maps them to radii
/// `a_i = mean_radius + sigma·(q_i - mean)/std`, and forms the
/// density-weighted mean of the per-radius results. With
/// `wavelength = None` each radius is spectrally averaged (rows as in
/// [`wavelength_average`]); with a fixed wavelength the result is the
/// single monochromatic row. `sigma <= 0` degenerates to the unaveraged
/// per-radius result.
pub fn dropsize_average(
    kind: ModelKind,
    theta: &[f64],
    mean_radius: f64,
    distribution: &dyn DropDistribution,
    drop_options: &DropSizeOptions,
    wavelength: Option<f64>,
    environment: &dyn SpectralEnvironment,
    wavelength_options: &WavelengthOptions,
    request: &ModelRequest,
) -> Result<Array2<f64>, ModelError> {
    // Radii in decreasing order so the shared angular cache sees the
    // largest truncation order first.
    let (radii, weights) = if drop_options.sigma > 0.0 {
        let q_low = distribution.quantile((1.0 - drop_options.width) / 2.0);
        let q_high = distribution.quantile((1.0 + drop_options.width) / 2.0);
        let points = grid::linspace(q_high, q_low, drop_options.samples);
        let (mu, sd) = (distribution.mean(), distribution.std_dev());
        let radii: Vec<f64> = points
            .iter()
            .map(|&q| mean_radius + drop_options.sigma * (q - mu) / sd)
            .collect();
        if let Some(&radius) = radii.last() {
            if radius < 0.0 {
                return Err(ModelError::NegativeDropRadius {
                    radius,
                    mean: mean_radius,
                    sigma: drop_options.sigma,
                });
            }
        }
        let weights: Vec<f64> = points.iter().map(|&q| distribution.density(q)).collect();
        (radii, weights)
    } else {
        (vec![mean_radius], vec![1.0])
    };

    log::debug!(
        "drop-size averaging: {} radii in [{:.2e}, {:.2e}] m",
        radii.len(),
        radii.last().copied().unwrap_or(mean_radius),
        radii.first().copied().unwrap_or(mean_radius),
    );

    // Inject one cache for every inner call.
    let mut request = request.clone();
    request.cache = Some(request.shared_cache());

    let mut out: Option<Array2<f64>> = None;
    let mut total_weight = 0.0;
    for (&radius, &weight) in radii.iter().zip(weights.iter()) {
        let curve = match wavelength {
            None => wavelength_average(
                kind,
                theta,
                Some(radius),
                environment,
                wavelength_options,
                &request,
            )?,
            Some(wavelength) => {
                let m = environment.refractive_index(wavelength);
                let x = kind
                    .requires_size_parameter()
                    .then(|| 2.0 * PI * radius / wavelength);
                let cache = request.shared_cache();
                let model = kind.instantiate(m, x, &request.mie_build(&cache))?;
                let row = model.averaged_intensity(
                    theta,
                    &request.selection,
                    request.polarisation,
                    &request.source,
                )?;
                Array2::from_shape_vec((1, theta.len()), row)
                    .expect("curve length matches grid")
            }
        };

        total_weight += weight;
        match out.as_mut() {
            Some(acc) => *acc += &(&curve * weight),
            None => out = Some(curve * weight),
        }
    }

    let mut out = out.expect("at least one radius sample");
    out /= total_weight;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn kernel_preserves_a_constant_curve() {
        let theta = grid::linspace(2.0, 2.5, 200);
        let source = SourceDisc {
            radius: 4.65e-3,
            step: 1e-5,
        };
        let averaged =
            convolve_source(&theta, &source, |grid| Ok(grid.iter().map(|_| 3.0).collect()))
                .unwrap();
        assert_eq!(averaged.len(), theta.len());
        for v in averaged {
            assert_relative_eq!(v, 3.0, max_relative = 1e-3);
        }
    }

    #[test]
    fn zero_radius_source_is_the_identity() {
        let theta = grid::linspace(1.0, 1.1, 11);
        let source = SourceDisc::point();
        let curve =
            convolve_source(&theta, &source, |grid| Ok(grid.iter().map(|t| t * t).collect()))
                .unwrap();
        for (t, v) in theta.iter().zip(curve.iter()) {
            assert_eq!(*v, t * t);
        }
    }

    #[test]
    fn non_uniform_grids_are_rejected() {
        let theta = [1.0, 1.01, 1.03];
        let err = convolve_source(&theta, &SourceDisc::default(), |grid| {
            Ok(vec![0.0; grid.len()])
        })
        .unwrap_err();
        assert!(matches!(err, ModelError::NonUniformGrid { .. }));
    }

    #[test]
    fn scalar_angles_are_averaged_too() {
        let source = SourceDisc {
            radius: 1e-2,
            step: 1e-4,
        };
        // Average of an odd (linear) function about the sample point is
        // the sample value itself.
        let averaged = convolve_source(&[0.7], &source, |grid| {
            Ok(grid.iter().map(|t| 5.0 * t).collect())
        })
        .unwrap();
        assert_eq!(averaged.len(), 1);
        assert_relative_eq!(averaged[0], 3.5, max_relative = 1e-3);
    }

    #[test]
    fn lognormal_moments_match_closed_forms() {
        let dist = LogNormal::default();
        assert_relative_eq!(dist.mean(), f64::exp(0.5), epsilon = 1e-12);
        assert_relative_eq!(
            dist.std_dev(),
            (f64::exp(1.0) * (f64::exp(1.0) - 1.0)).sqrt(),
            epsilon = 1e-12
        );
        // Median of a unit log-normal is 1.
        assert_relative_eq!(dist.quantile(0.5), 1.0, epsilon = 1e-8);
        // Density integrates to ~1 over a generous interval.
        let xs = grid::linspace(1e-4, 60.0, 200_000);
        let dx = xs[1] - xs[0];
        let mass: f64 = xs.iter().map(|&v| dist.density(v) * dx).sum();
        assert_relative_eq!(mass, 1.0, max_relative = 1e-3);
    }
}
