//! Young's interference theory: geometric rays with optical phase.
//!
//! Where two rays of the same order coexist (between the rainbow and
//! grazing boundaries) their amplitudes are summed coherently, producing
//! the supernumerary fringes the incoherent geometric model cannot show.
//! Outside that region the model reduces to the geometric result.

use std::f64::consts::FRAC_PI_2;

use num_complex::Complex64;

use crate::error::ModelError;
use crate::geometry::BowGeometry;
use crate::model::OpticalModel;
use crate::types::{BowOrder, Polarisation, RaySelection};

/// Ray-interference model for a drop of size parameter `x`.
pub struct YoungModel {
    geom: BowGeometry,
    x: f64,
}

impl YoungModel {
    pub fn new(m: f64, x: f64) -> Result<Self, ModelError> {
        if !x.is_finite() || x <= 0.0 {
            return Err(ModelError::InvalidSizeParameter(x));
        }
        Ok(Self {
            geom: BowGeometry::new(m)?,
            x,
        })
    }

    /// Optical path length of a ray (radians, up to an additive
    /// constant): `x·[2(1 - cos α) + 2(order+1)·m·cos β]`.
    pub fn phase(&self, alpha: f64, order: BowOrder) -> f64 {
        let beta = (alpha.sin() / self.geom.m).asin();
        let chords = (order.reflections() + 1) as f64;
        self.x * (2.0 * (1.0 - alpha.cos()) + 2.0 * chords * self.geom.m * beta.cos())
    }

    fn intensity_at(
        &self,
        theta: f64,
        order: BowOrder,
        pol: Polarisation,
    ) -> Result<f64, ModelError> {
        if self.geom.in_dark_band(theta, order) {
            return Ok(0.0);
        }

        let alpha1 = self.geom.angle_of_incidence(theta, order, 0.0)?;
        let i1 = self.geom.ray_intensity(alpha1, order, pol);
        if !self.geom.has_second_ray(theta, order) {
            return Ok(i1);
        }

        let alpha2 = self.geom.angle_of_incidence(theta, order, FRAC_PI_2)?;
        let i2 = self.geom.ray_intensity(alpha2, order, pol);

        // Complex ray amplitudes; the ray on the far side of the caustic
        // carries an extra -π/2 phase shift.
        let s1 = Complex64::from_polar(i1.sqrt(), self.phase(alpha1, order));
        let s2 = Complex64::from_polar(i2.sqrt(), self.phase(alpha2, order) - FRAC_PI_2);
        Ok((s1 + s2).norm_sqr())
    }
}

impl OpticalModel for YoungModel {
    fn intensity(
        &self,
        theta: &[f64],
        selection: &RaySelection,
        pol: Polarisation,
    ) -> Result<Vec<f64>, ModelError> {
        let order = selection
            .bow_order()
            .ok_or_else(|| ModelError::UnsupportedSelection {
                model: "young",
                selection: selection.to_string(),
            })?;
        theta
            .iter()
            .map(|&t| self.intensity_at(t, order, pol))
            .collect()
    }

    fn requires_size_parameter(&self) -> bool {
        true
    }

    fn geometry(&self) -> &BowGeometry {
        &self.geom
    }

    fn name(&self) -> &'static str {
        "young"
    }
}
