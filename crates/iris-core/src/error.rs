//! Error taxonomy shared by the scattering models and the averaging pipeline.
//!
//! Every failure is raised synchronously at the point of violation; the
//! averaging stages propagate the first error from any sample unchanged.
//! These are deterministic numerical failures, not transient faults, so
//! callers should treat them as fatal to the request.

use thiserror::Error;

/// Errors from model construction, intensity evaluation, and averaging.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("ray order {0} is not a valid bow order (1 = primary, 2 = secondary)")]
    InvalidOrder(usize),

    #[error("Debye order {requested} exceeds the decomposition table (p_max = {max})")]
    DebyeOrderOutOfRange { requested: usize, max: usize },

    #[error("polarisation code {0} is not valid (0 = unpolarised, 1 = perpendicular, 2 = parallel)")]
    InvalidPolarisation(u8),

    #[error("refractive index {0} is outside the physical range (1, 2)")]
    InvalidRefractiveIndex(f64),

    #[error("{model} model requires a size parameter")]
    SizeParameterRequired { model: &'static str },

    #[error("size parameter {0} must be positive and finite")]
    InvalidSizeParameter(f64),

    #[error("angle-of-incidence iteration did not converge after {iterations} steps (residual {residual:.2e})")]
    Convergence { iterations: usize, residual: f64 },

    #[error("angle grid is not uniformly spaced (step {found:.6e} at index {index}, expected {expected:.6e})")]
    NonUniformGrid { index: usize, found: f64, expected: f64 },

    #[error("radius grid is not geometrically spaced (ratio {found:.6e} at index {index}, expected {expected:.6e})")]
    NonGeometricGrid { index: usize, found: f64, expected: f64 },

    #[error("Riccati-Bessel evaluation overflowed at order {order} for argument |z| = {argument:.1}")]
    NumericOverflow { argument: f64, order: usize },

    #[error("sampled drop radius {radius:.3e} m is negative (mean {mean:.3e} m, sigma {sigma:.3e} m)")]
    NegativeDropRadius { radius: f64, mean: f64, sigma: f64 },

    #[error("{model} model does not support {selection} ray selection")]
    UnsupportedSelection { model: &'static str, selection: String },
}
