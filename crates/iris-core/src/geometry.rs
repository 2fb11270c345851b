//! Descartes geometric optics for light scattered by a spherical drop.
//!
//! All four scattering models share this substrate: the rainbow and
//! grazing-incidence angle tables fixed by the refractive index, the
//! Newton solver that inverts the deviation-angle relation, and the
//! Fresnel ray-intensity formula whose caustic divergence at the rainbow
//! angle *is* the rainbow. The divergence is deliberately preserved here;
//! only the averaging pipeline renders it finite.
//!
//! # References
//! H. C. van de Hulst, *Light Scattering by Small Particles*, §13.
//! D. K. Lynch and W. Livingston, *Color and Light in Nature*.

use std::f64::consts::{FRAC_PI_2, PI};

use crate::error::ModelError;
use crate::types::{BowOrder, Polarisation};

// Near the rainbow angle the root is nearly double and Newton degrades
// from quadratic to bisection-like convergence, so the bound must cover
// ~log2(range/tolerance) halvings.
const MAX_NEWTON_ITERATIONS: usize = 100;
const NEWTON_STEP_TOLERANCE: f64 = 1e-10;

/// Angle tables of the Descartes rainbow, fixed at construction.
///
/// Index 0 is the primary bow, index 1 the secondary. For the primary bow
/// the two-ray (supernumerary) region is `theta_r[0] < θ ≤ theta_g[0]`;
/// for the secondary it is `theta_g[1] ≤ θ < theta_r[1]`. Alexander's
/// dark band lies between `theta_r[1]` and `theta_r[0]`.
#[derive(Debug, Clone)]
pub struct BowGeometry {
    /// Refractive index of the drop.
    pub m: f64,
    /// Rainbow angle of incidence (radians).
    pub alpha_r: [f64; 2],
    /// Rainbow angle of refraction (radians).
    pub beta_r: [f64; 2],
    /// Rainbow scattering angle, the bright-band boundary (radians).
    pub theta_r: [f64; 2],
    /// Grazing-incidence scattering angle, onset of the second ray
    /// (radians).
    pub theta_g: [f64; 2],
}

impl BowGeometry {
    /// Derive the angle tables from the refractive index.
    ///
    /// Closed-form trigonometry only; `m` must lie in (1, 2) for the
    /// rainbow angles to exist.
    pub fn new(m: f64) -> Result<Self, ModelError> {
        if !m.is_finite() || m <= 1.0 || m >= 2.0 {
            return Err(ModelError::InvalidRefractiveIndex(m));
        }

        let mut alpha_r = [0.0; 2];
        let mut beta_r = [0.0; 2];
        for (j, denom) in [3.0, 8.0].into_iter().enumerate() {
            alpha_r[j] = ((m * m - 1.0) / denom).sqrt().acos();
            beta_r[j] = (alpha_r[j].sin() / m).asin();
        }

        let theta_r = [
            2.0 * alpha_r[0] - 4.0 * beta_r[0] + PI,
            6.0 * beta_r[1] - 2.0 * alpha_r[1],
        ];
        let grazing = (1.0 / m).asin();
        let theta_g = [2.0 * PI - 4.0 * grazing, 6.0 * grazing - PI];

        Ok(Self {
            m,
            alpha_r,
            beta_r,
            theta_r,
            theta_g,
        })
    }

    /// Refraction angle β(α) along the ray path that scatters into `theta`.
    ///
    /// Affine in α: `(2α + π - θ)/4` for the primary bow, `(2α + θ)/6` for
    /// the secondary.
    fn path_beta(&self, alpha: f64, theta: f64, order: BowOrder) -> f64 {
        match order {
            BowOrder::Primary => (2.0 * alpha + PI - theta) / 4.0,
            BowOrder::Secondary => (2.0 * alpha + theta) / 6.0,
        }
    }

    /// Solve Snell's law along the deviation path: the angle of incidence
    /// α with `sin α = m·sin β(α, θ)`.
    ///
    /// Newton-Raphson with the analytic derivative; quadratic from a
    /// reasonable seed (0 for the low-α ray, π/2 for the grazing ray).
    pub fn angle_of_incidence(
        &self,
        theta: f64,
        order: BowOrder,
        initial_guess: f64,
    ) -> Result<f64, ModelError> {
        let d_beta = 1.0 / (order.reflections() as f64 + 1.0);
        let mut alpha = initial_guess;
        let mut residual = f64::MAX;

        for _ in 0..MAX_NEWTON_ITERATIONS {
            let beta = self.path_beta(alpha, theta, order);
            residual = alpha.sin() - self.m * beta.sin();
            let slope = alpha.cos() - self.m * beta.cos() * d_beta;
            if slope == 0.0 {
                break;
            }
            let step = residual / slope;
            alpha -= step;
            if step.abs() < NEWTON_STEP_TOLERANCE {
                return Ok(alpha);
            }
        }

        Err(ModelError::Convergence {
            iterations: MAX_NEWTON_ITERATIONS,
            residual,
        })
    }

    /// Intensity carried by a single outgoing ray.
    ///
    /// Fresnel reflectance for the requested polarisation (the unpolarised
    /// channel averages the two) combined with the angular-dispersion
    /// factor `sin 2α / (2·sin γ·|dγ/dα|)`. Diverges at `alpha = alpha_r`,
    /// where `dγ/dα = 0` — the caustic.
    pub fn ray_intensity(&self, alpha: f64, order: BowOrder, pol: Polarisation) -> f64 {
        let k = order.reflections() as i32;
        let beta = (alpha.sin() / self.m).asin();
        let db_da = alpha.cos() / (self.m * beta.cos());
        let gamma = match order {
            BowOrder::Primary => 2.0 * alpha - 4.0 * beta + PI,
            BowOrder::Secondary => 6.0 * beta - 2.0 * alpha,
        };
        let dg_da = 2.0 * (1.0 - (k + 1) as f64 * db_da);

        let escape = |r: f64| {
            let e = r.powi(k) * (1.0 - r * r);
            e * e
        };
        let perpendicular = || (alpha - beta).sin() / (alpha + beta).sin();
        let parallel = || (beta - alpha).tan() / (alpha + beta).tan();
        let e = match pol {
            Polarisation::Perpendicular => escape(perpendicular()),
            Polarisation::Parallel => escape(parallel()),
            Polarisation::Unpolarised => {
                0.5 * (escape(perpendicular()) + escape(parallel()))
            }
        };

        e * (2.0 * alpha).sin() / (2.0 * gamma.sin() * dg_da.abs())
    }

    /// θ lies in Alexander's dark band for this bow: no ray of the given
    /// order scatters there.
    pub fn in_dark_band(&self, theta: f64, order: BowOrder) -> bool {
        match order {
            BowOrder::Primary => theta <= self.theta_r[0],
            BowOrder::Secondary => theta >= self.theta_r[1],
        }
    }

    /// θ lies inside the grazing boundary, where a second ray of the same
    /// order interferes with the first (the supernumerary region).
    pub fn has_second_ray(&self, theta: f64, order: BowOrder) -> bool {
        match order {
            BowOrder::Primary => theta <= self.theta_g[0],
            BowOrder::Secondary => theta >= self.theta_g[1],
        }
    }

    /// Incoherent geometric intensity at a single scattering angle: zero
    /// in the dark band, otherwise the sum of one or two ray intensities.
    pub fn intensity_at(
        &self,
        theta: f64,
        order: BowOrder,
        pol: Polarisation,
    ) -> Result<f64, ModelError> {
        if self.in_dark_band(theta, order) {
            return Ok(0.0);
        }

        let alpha = self.angle_of_incidence(theta, order, 0.0)?;
        let mut intensity = self.ray_intensity(alpha, order, pol);

        if self.has_second_ray(theta, order) {
            let alpha2 = self.angle_of_incidence(theta, order, FRAC_PI_2)?;
            intensity += self.ray_intensity(alpha2, order, pol);
        }

        Ok(intensity)
    }
}
