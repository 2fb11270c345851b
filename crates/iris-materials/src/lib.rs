//! # Iris Materials
//!
//! Spectral data behind the rainbow computation: the refractive index of
//! water across the optical band, the black-body illumination spectrum,
//! and the colour-matching response of the eye. [`environment::SolarEnvironment`]
//! bundles the three into the `SpectralEnvironment` collaborator the
//! averaging pipeline consumes.
//!
//! ## Data sources
//!
//! | Quantity | Module | Source |
//! |----------|--------|--------|
//! | Water dispersion | [`water`] | Lynch & Livingston, *Color and Light in Nature* |
//! | Illumination | [`blackbody`] | Planck spectrum, normalised |
//! | Colour response | [`colour`] | Bruton's piecewise-linear fit |
//!
//! ## Interpolation
//!
//! Tabulated dispersion data is interpolated with natural cubic splines
//! ([`spline::CubicSpline`]), extrapolating on the boundary polynomial
//! just outside the table.

pub mod blackbody;
pub mod colour;
pub mod environment;
pub mod spline;
pub mod water;
