//! Colour-matching response of the eye, after Dan Bruton's piecewise
//! linear fit (www.physics.sfasu.edu/astro/color/spectra.html).
//!
//! Each channel is a piecewise-linear function of wavelength, multiplied
//! by a fading factor that rolls the response off towards the band edges,
//! then gamma-corrected. Outside the tabulated band the response is zero.

/// Knots of the RGB channels (metres).
const RGB_WAVELENGTHS: [f64; 7] = [380e-9, 440e-9, 490e-9, 510e-9, 580e-9, 645e-9, 780e-9];
const RED: [f64; 7] = [1.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0];
const GREEN: [f64; 7] = [0.0, 0.0, 1.0, 1.0, 1.0, 0.0, 0.0];
const BLUE: [f64; 7] = [1.0, 1.0, 1.0, 0.0, 0.0, 0.0, 0.0];

/// Knots of the edge-fading factor (metres).
const FADE_WAVELENGTHS: [f64; 4] = [380e-9, 420e-9, 700e-9, 780e-9];
const FADE: [f64; 4] = [0.3, 1.0, 1.0, 0.3];

/// Conventional gamma correction for the Bruton fit.
pub const DEFAULT_GAMMA: f64 = 0.8;

/// Piecewise-linear interpolation, zero outside the knots.
fn interpolate(xs: &[f64], ys: &[f64], x: f64) -> f64 {
    if x < xs[0] || x > xs[xs.len() - 1] {
        return 0.0;
    }
    let hi = xs.partition_point(|&knot| knot < x).max(1);
    let (x0, x1) = (xs[hi - 1], xs[hi]);
    let t = (x - x0) / (x1 - x0);
    ys[hi - 1] + t * (ys[hi] - ys[hi - 1])
}

/// Colour response `(r, g, b)` at `wavelength` (metres), each in [0, 1].
pub fn colour_response(wavelength: f64, gamma: f64) -> [f64; 3] {
    let fade = interpolate(&FADE_WAVELENGTHS, &FADE, wavelength);
    [
        (interpolate(&RGB_WAVELENGTHS, &RED, wavelength) * fade).powf(gamma),
        (interpolate(&RGB_WAVELENGTHS, &GREEN, wavelength) * fade).powf(gamma),
        (interpolate(&RGB_WAVELENGTHS, &BLUE, wavelength) * fade).powf(gamma),
    ]
}
