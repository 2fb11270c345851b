//! Model abstraction: the closed set of scattering theories and the
//! capability trait they share.
//!
//! The four variants form a deliberate closed set — callers select one via
//! [`ModelKind`] and the averaging pipeline instantiates it per sampled
//! (refractive index, size parameter) pair. Each variant composes the
//! shared [`BowGeometry`] value rather than inheriting behaviour, and the
//! trait carries the finite-source average as a provided method so every
//! model gets it uniformly.

use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::averaging::{convolve_source, SourceDisc};
use crate::error::ModelError;
use crate::geometry::BowGeometry;
use crate::mie::{AngularCache, MieModel};
use crate::types::{Polarisation, RaySelection};
use crate::{airy::AiryModel, young::YoungModel};

/// Capability interface implemented by every scattering theory.
pub trait OpticalModel {
    /// Scattered intensity at each angle of `theta` (radians), evaluated
    /// independently per element.
    fn intensity(
        &self,
        theta: &[f64],
        selection: &RaySelection,
        pol: Polarisation,
    ) -> Result<Vec<f64>, ModelError>;

    /// Whether the model needs a size parameter `x = 2πa/λ` at
    /// construction (all but pure geometric optics do).
    fn requires_size_parameter(&self) -> bool;

    /// The shared Descartes angle tables.
    fn geometry(&self) -> &BowGeometry;

    /// Human-readable name of the theory.
    fn name(&self) -> &'static str;

    /// Intensity averaged over a finite source disk, replacing the
    /// caustic singularity with a finite peak.
    fn averaged_intensity(
        &self,
        theta: &[f64],
        selection: &RaySelection,
        pol: Polarisation,
        source: &SourceDisc,
    ) -> Result<Vec<f64>, ModelError> {
        convolve_source(theta, source, |grid| self.intensity(grid, selection, pol))
    }
}

/// Pure geometric optics (Descartes): incoherent ray sums, no size
/// parameter.
pub struct GeometricModel {
    geom: BowGeometry,
}

impl GeometricModel {
    pub fn new(m: f64) -> Result<Self, ModelError> {
        Ok(Self {
            geom: BowGeometry::new(m)?,
        })
    }
}

impl OpticalModel for GeometricModel {
    fn intensity(
        &self,
        theta: &[f64],
        selection: &RaySelection,
        pol: Polarisation,
    ) -> Result<Vec<f64>, ModelError> {
        let order = selection
            .bow_order()
            .ok_or_else(|| ModelError::UnsupportedSelection {
                model: "geometric",
                selection: selection.to_string(),
            })?;
        theta
            .iter()
            .map(|&t| self.geom.intensity_at(t, order, pol))
            .collect()
    }

    fn requires_size_parameter(&self) -> bool {
        false
    }

    fn geometry(&self) -> &BowGeometry {
        &self.geom
    }

    fn name(&self) -> &'static str {
        "geometric"
    }
}

/// The closed set of scattering theories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelKind {
    Geometric,
    Young,
    Airy,
    Mie,
}

/// Mie-specific construction options threaded through [`ModelKind`]
/// dispatch; ignored by the other variants.
#[derive(Default, Clone)]
pub struct MieBuild {
    /// Highest Debye order to decompose; `None` skips the decomposition
    /// (full-series queries only).
    pub debye_max: Option<usize>,
    /// Optional shared angular-function cache.
    pub cache: Option<Rc<AngularCache>>,
}

impl ModelKind {
    /// Whether this variant needs `x` at construction.
    pub fn requires_size_parameter(self) -> bool {
        !matches!(self, ModelKind::Geometric)
    }

    pub fn name(self) -> &'static str {
        match self {
            ModelKind::Geometric => "geometric",
            ModelKind::Young => "young",
            ModelKind::Airy => "airy",
            ModelKind::Mie => "mie",
        }
    }

    /// Construct a model instance for one (m, x) sample.
    pub fn instantiate(
        self,
        m: f64,
        x: Option<f64>,
        mie: &MieBuild,
    ) -> Result<Box<dyn OpticalModel>, ModelError> {
        let size = |model: &'static str| {
            x.ok_or(ModelError::SizeParameterRequired { model })
        };
        match self {
            ModelKind::Geometric => Ok(Box::new(GeometricModel::new(m)?)),
            ModelKind::Young => Ok(Box::new(YoungModel::new(m, size("young")?)?)),
            ModelKind::Airy => Ok(Box::new(AiryModel::new(m, size("airy")?)?)),
            ModelKind::Mie => {
                let mut model = match mie.debye_max {
                    Some(p_max) => MieModel::with_debye(m, size("mie")?, p_max)?,
                    None => MieModel::new(m, size("mie")?)?,
                };
                if let Some(cache) = &mie.cache {
                    model = model.with_cache(cache.clone());
                }
                Ok(Box::new(model))
            }
        }
    }
}

impl std::fmt::Display for ModelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BowOrder;

    #[test]
    fn geometric_model_rejects_series_selections() {
        let model = GeometricModel::new(1.331).unwrap();
        let err = model
            .intensity(&[2.4], &RaySelection::Full, Polarisation::Unpolarised)
            .unwrap_err();
        assert!(matches!(err, ModelError::UnsupportedSelection { .. }));
    }

    #[test]
    fn size_parameter_is_enforced_per_variant() {
        let mie = MieBuild::default();
        assert!(ModelKind::Geometric.instantiate(1.331, None, &mie).is_ok());
        for kind in [ModelKind::Young, ModelKind::Airy, ModelKind::Mie] {
            assert!(kind.requires_size_parameter());
            assert!(matches!(
                kind.instantiate(1.331, None, &mie),
                Err(ModelError::SizeParameterRequired { .. })
            ));
        }
    }

    #[test]
    fn dispatch_produces_the_requested_variant() {
        let mie = MieBuild {
            debye_max: Some(3),
            cache: None,
        };
        let model = ModelKind::Mie.instantiate(1.331, Some(80.0), &mie).unwrap();
        assert_eq!(model.name(), "mie");
        let i = model
            .intensity(
                &[f64::to_radians(140.0)],
                &RaySelection::Bow(BowOrder::Primary),
                Polarisation::Perpendicular,
            )
            .unwrap();
        assert!(i[0].is_finite() && i[0] >= 0.0);
    }
}
