//! The standard daylight environment: sunlit water drops observed by a
//! human eye.
//!
//! Bundles the water dispersion, the Planck illumination spectrum, and
//! the Bruton colour response into the `SpectralEnvironment` collaborator
//! consumed by `iris_core::averaging`.

use iris_core::averaging::SpectralEnvironment;

use crate::blackbody;
use crate::colour;
use crate::water::WaterDispersion;

/// Sunlight on water, seen by the eye.
pub struct SolarEnvironment {
    water: WaterDispersion,
    gamma: f64,
}

impl Default for SolarEnvironment {
    fn default() -> Self {
        Self::new()
    }
}

impl SolarEnvironment {
    pub fn new() -> Self {
        Self {
            water: WaterDispersion::new(),
            gamma: colour::DEFAULT_GAMMA,
        }
    }

    /// Override the display gamma correction.
    pub fn with_gamma(mut self, gamma: f64) -> Self {
        self.gamma = gamma;
        self
    }

    pub fn water(&self) -> &WaterDispersion {
        &self.water
    }
}

impl SpectralEnvironment for SolarEnvironment {
    fn refractive_index(&self, wavelength: f64) -> f64 {
        self.water.index_at(wavelength)
    }

    fn spectral_radiance(&self, wavelength: f64, temperature: f64) -> f64 {
        blackbody::spectral_radiance(wavelength, temperature)
    }

    fn colour_response(&self, wavelength: f64) -> [f64; 3] {
        colour::colour_response(wavelength, self.gamma)
    }
}
