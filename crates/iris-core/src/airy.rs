//! Airy's diffraction theory: the stationary-phase approximation of the
//! Kirchhoff integral around the rainbow angle.
//!
//! The sharp geometric caustic becomes an Airy-function fringe pattern of
//! width `theta0`; the parallel channel additionally carries the
//! Brewster-angle correction of Koennen and de Boer.
//!
//! # References
//! H. C. van de Hulst, *Light Scattering by Small Particles*, §13.2.
//! G. P. Koennen and J. H. de Boer, *Appl. Opt.* **18** (1979) 1961.

use std::f64::consts::PI;

use crate::error::ModelError;
use crate::geometry::BowGeometry;
use crate::model::OpticalModel;
use crate::special::airy;
use crate::types::{BowOrder, Polarisation, RaySelection};

/// Stationary-phase diffraction model for a drop of size parameter `x`.
pub struct AiryModel {
    geom: BowGeometry,
    x: f64,
}

impl AiryModel {
    pub fn new(m: f64, x: f64) -> Result<Self, ModelError> {
        if !x.is_finite() || x <= 0.0 {
            return Err(ModelError::InvalidSizeParameter(x));
        }
        Ok(Self {
            geom: BowGeometry::new(m)?,
            x,
        })
    }

    /// Angular fringe width `theta0 = (a·sin α_r·x)^(1/3)/(x·cos α_r)`;
    /// negative for the secondary bow, whose fringes open the other way.
    fn fringe_width(&self, order: BowOrder) -> (f64, f64) {
        let a = match order {
            BowOrder::Primary => 3.0 / 4.0,
            BowOrder::Secondary => 8.0 / 9.0,
        };
        let j = order.index();
        let tau = (a * self.geom.alpha_r[j].sin() * self.x).cbrt();
        let mut theta0 = tau / (self.x * self.geom.alpha_r[j].cos());
        if order == BowOrder::Secondary {
            theta0 = -theta0;
        }
        (theta0, tau)
    }

    fn intensity_at(&self, theta: f64, order: BowOrder, pol: Polarisation) -> f64 {
        let j = order.index();
        let k = order.reflections() as i32;
        let alpha = self.geom.alpha_r[j];
        let beta = self.geom.beta_r[j];
        let sa = alpha.sin();

        let (theta0, tau) = self.fringe_width(order);
        let arg = (self.geom.theta_r[j] - theta) / theta0;
        let (ai, aip) = airy(arg);

        let escape = |r: f64| r.powi(k) * (1.0 - r * r);

        let mut intensity = 0.0;
        if pol != Polarisation::Parallel {
            let e = escape((alpha - beta).sin() / (alpha + beta).sin());
            intensity += (e * ai) * (e * ai);
        }
        if pol != Polarisation::Perpendicular {
            let e = escape((beta - alpha).tan() / (alpha + beta).tan());
            // Brewster-angle correction (Koennen & de Boer eq. 17): the
            // parallel amplitude changes sign at the Brewster angle, which
            // sits close to the rainbow angle of incidence.
            let alpha_b = self.geom.m.atan();
            let t = (alpha - alpha_b) * tau;
            let correction = match order {
                BowOrder::Primary => ai * ai + (aip / t) * (aip / t),
                BowOrder::Secondary => {
                    let leading = (1.0 - arg / (t * t)) * ai;
                    leading * leading + (2.0 * aip / t) * (2.0 * aip / t)
                }
            };
            intensity += e * e * correction;
        }
        if pol == Polarisation::Unpolarised {
            intensity /= 2.0;
        }

        2.0 * PI * sa / (self.x * theta0 * theta0 * theta.sin()) * intensity
    }
}

impl OpticalModel for AiryModel {
    fn intensity(
        &self,
        theta: &[f64],
        selection: &RaySelection,
        pol: Polarisation,
    ) -> Result<Vec<f64>, ModelError> {
        let order = selection
            .bow_order()
            .ok_or_else(|| ModelError::UnsupportedSelection {
                model: "airy",
                selection: selection.to_string(),
            })?;
        Ok(theta
            .iter()
            .map(|&t| self.intensity_at(t, order, pol))
            .collect())
    }

    fn requires_size_parameter(&self) -> bool {
        true
    }

    fn geometry(&self) -> &BowGeometry {
        &self.geom
    }

    fn name(&self) -> &'static str {
        "airy"
    }
}
