//! Normalised Planck spectrum of the illumination.
//!
//! Expressed per logarithmic wavelength interval so that
//! `∫₀^∞ B(λ, T) dλ/λ = 1`; the wavelength-averaging stage divides by λ
//! and renormalises over its finite band, so only the shape matters.

use std::f64::consts::PI;

/// Planck constant (J·s).
const H: f64 = 6.626_070_15e-34;
/// Speed of light (m/s).
const C: f64 = 2.997_924_58e8;
/// Boltzmann constant (J/K).
const K: f64 = 1.380_649e-23;

/// Dimensionless black-body spectrum at `wavelength` (metres) and
/// `temperature` (kelvin).
pub fn spectral_radiance(wavelength: f64, temperature: f64) -> f64 {
    let u = H * C / (wavelength * K * temperature);
    if !u.is_finite() || u == 0.0 {
        return 0.0;
    }
    15.0 * (u / PI).powi(4) / (u.exp() - 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn spectrum_integrates_to_unity_in_log_wavelength() {
        let t = 5783.0;
        // Log-spaced trapezoid over a band wide enough to hold the
        // whole spectrum.
        let n = 20_000;
        let (lo, hi) = (10e-9_f64, 1e-3_f64);
        let step = (hi / lo).ln() / n as f64;
        let mut integral = 0.0;
        for i in 0..=n {
            let wavelength = lo * (step * i as f64).exp();
            let weight = if i == 0 || i == n { 0.5 } else { 1.0 };
            integral += weight * spectral_radiance(wavelength, t) * step;
        }
        assert_relative_eq!(integral, 1.0, max_relative = 1e-6);
    }

    #[test]
    fn solar_spectrum_peaks_in_the_visible() {
        let t = 5783.0;
        // In per-log-interval form the Planck peak sits at
        // hc/(λkT) ≈ 3.92, λ ≈ 635 nm for the sun.
        let peak = spectral_radiance(635e-9, t);
        assert!(peak > spectral_radiance(300e-9, t));
        assert!(peak > spectral_radiance(1200e-9, t));
    }

    #[test]
    fn extreme_arguments_degrade_to_zero_not_nan() {
        assert_eq!(spectral_radiance(1e-12, 5783.0), 0.0);
        let far_ir = spectral_radiance(1.0, 5783.0);
        assert!(far_ir.is_finite() && far_ir >= 0.0);
    }
}
