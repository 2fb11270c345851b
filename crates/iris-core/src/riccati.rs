//! Riccati-Bessel functions for the Mie multipole series.
//!
//! `ψ_n(z) = z·j_n(z)` is the regular solution and must be generated by
//! downward (Miller) recurrence: the upward recurrence that works on paper
//! is contaminated by the exponentially growing irregular solution once
//! `n` passes the turning point `n ≈ |z|`, which is exactly where the Mie
//! truncation rule needs values. The irregular solution `χ_n(z) = -z·y_n(z)`
//! is the one that grows upward, so plain upward recurrence is stable for
//! it. Both recurrences stay finite for size parameters of several
//! thousand, well past where naive evaluations degenerate to NaN.
//!
//! # References
//! Bohren & Huffman, *Absorption and Scattering of Light by Small
//! Particles* (1983), appendix A; Hovenac & Lock, *J. Opt. Soc. Am. A* **9**
//! (1992) 781.

use num_complex::Complex64;

use crate::error::ModelError;

/// Values and derivatives of a Riccati-Bessel family for `n = 0..=n_max`.
#[derive(Debug, Clone)]
pub struct RiccatiTable {
    pub values: Vec<Complex64>,
    pub derivatives: Vec<Complex64>,
}

/// Magnitude at which the downward recurrence is renormalised to keep the
/// raw (unnormalised) solution inside f64 range.
const RESCALE_LIMIT: f64 = 1e250;

/// Extra orders added above the requested maximum so the Miller recurrence
/// has washed out the irregular contamination by the time it reaches
/// `n_max`.
fn guard_orders(z_mag: f64) -> usize {
    15 + (4.0 * z_mag.cbrt()).ceil() as usize
}

/// Regular Riccati-Bessel function `ψ_n(z) = z·j_n(z)` and its derivative
/// for `n = 0..=n_max`, by downward recurrence.
pub fn riccati_psi(n_max: usize, z: Complex64) -> Result<RiccatiTable, ModelError> {
    let z_mag = z.norm();
    let start = n_max.max(z_mag.ceil() as usize) + guard_orders(z_mag);

    let mut raw = vec![Complex64::new(0.0, 0.0); start + 1];
    raw[start - 1] = Complex64::new(1e-30, 0.0);
    for n in (1..start).rev() {
        let next = (2 * n + 1) as f64 / z * raw[n] - raw[n + 1];
        raw[n - 1] = next;
        if next.re.abs() > RESCALE_LIMIT || next.im.abs() > RESCALE_LIMIT {
            // keep the whole raw solution in range; the final
            // normalisation removes the arbitrary scale anyway
            for value in raw[n - 1..].iter_mut() {
                *value /= RESCALE_LIMIT;
            }
        }
    }

    // Normalise against the closed forms ψ₀ = sin z, ψ₁ = sin z / z - cos z,
    // pivoting on whichever is farther from a zero of sin.
    let psi0 = z.sin();
    let psi1 = psi0 / z - z.cos();
    let scale = if psi0.norm() >= psi1.norm() {
        psi0 / raw[0]
    } else {
        psi1 / raw[1]
    };

    // One extra order so the n = 0 derivative has a neighbour to lean on.
    let values: Vec<Complex64> = raw[..=n_max + 1].iter().map(|&v| v * scale).collect();
    finalise(values, z, n_max)
}

/// Irregular Riccati-Bessel function `χ_n(z) = -z·y_n(z)` and its
/// derivative for `n = 0..=n_max`, by upward recurrence.
pub fn riccati_chi(n_max: usize, z: Complex64) -> Result<RiccatiTable, ModelError> {
    let mut values = Vec::with_capacity(n_max + 2);
    values.push(z.cos());
    values.push(z.cos() / z + z.sin());
    for n in 2..=n_max + 1 {
        let next = (2 * n - 1) as f64 / z * values[n - 1] - values[n - 2];
        values.push(next);
    }
    finalise(values, z, n_max)
}

/// Derivatives via `ψ'_n = ψ_{n-1} - n·ψ_n/z` and `ψ'_0 = ψ_0/z - ψ_1`
/// (the same relations hold for every Riccati-Bessel family), plus the
/// finiteness check that turns silent overflow into an error.
///
/// `values` must hold orders `0..=n_max + 1`; the output is truncated to
/// `0..=n_max`.
fn finalise(
    mut values: Vec<Complex64>,
    z: Complex64,
    n_max: usize,
) -> Result<RiccatiTable, ModelError> {
    let mut derivatives = Vec::with_capacity(n_max + 1);
    derivatives.push(values[0] / z - values[1]);
    for n in 1..=n_max {
        derivatives.push(values[n - 1] - n as f64 * values[n] / z);
    }
    values.truncate(n_max + 1);

    for (n, (v, d)) in values.iter().zip(derivatives.iter()).enumerate() {
        if !v.is_finite() || !d.is_finite() {
            return Err(ModelError::NumericOverflow {
                argument: z.norm(),
                order: n,
            });
        }
    }

    Ok(RiccatiTable {
        values,
        derivatives,
    })
}

/// Real-argument convenience wrapper over [`riccati_psi`].
pub fn riccati_psi_real(n_max: usize, x: f64) -> Result<(Vec<f64>, Vec<f64>), ModelError> {
    let table = riccati_psi(n_max, Complex64::new(x, 0.0))?;
    Ok((
        table.values.iter().map(|v| v.re).collect(),
        table.derivatives.iter().map(|v| v.re).collect(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn psi_matches_closed_forms_for_low_orders() {
        let x = 10.0;
        let (psi, dpsi) = riccati_psi_real(2, x).unwrap();
        assert_relative_eq!(psi[0], x.sin(), epsilon = 1e-12);
        assert_relative_eq!(psi[1], x.sin() / x - x.cos(), epsilon = 1e-12);
        assert_relative_eq!(dpsi[0], x.cos(), epsilon = 1e-12);
    }

    #[test]
    fn chi_matches_closed_forms_for_low_orders() {
        let x = 7.3;
        let z = Complex64::new(x, 0.0);
        let table = riccati_chi(2, z).unwrap();
        assert_relative_eq!(table.values[0].re, x.cos(), epsilon = 1e-12);
        assert_relative_eq!(table.values[1].re, x.cos() / x + x.sin(), epsilon = 1e-12);
        assert_relative_eq!(table.derivatives[0].re, -x.sin(), epsilon = 1e-12);
    }

    #[test]
    fn chi_overflow_is_an_error_not_nan() {
        // Orders far above the turning point grow factorially; asking for
        // them at a tiny argument must fail loudly.
        let result = riccati_chi(400, Complex64::new(0.5, 0.0));
        assert!(matches!(result, Err(ModelError::NumericOverflow { .. })));
    }

    #[test]
    fn psi_handles_complex_argument() {
        let z = Complex64::new(3.0, 0.4);
        let table = riccati_psi(1, z).unwrap();
        let expected0 = z.sin();
        let expected1 = z.sin() / z - z.cos();
        assert_relative_eq!(table.values[0].re, expected0.re, epsilon = 1e-12);
        assert_relative_eq!(table.values[0].im, expected0.im, epsilon = 1e-12);
        assert_relative_eq!(table.values[1].re, expected1.re, epsilon = 1e-12);
        assert_relative_eq!(table.values[1].im, expected1.im, epsilon = 1e-12);
    }

    // ψ ξ' - ψ' ξ = i with ξ = ψ - iχ, a direct consequence of the
    // spherical Bessel Wronskian. Holding at x = 5000 across all orders is
    // the stability property the whole Mie layer rests on.
    #[test]
    fn wronskian_holds_at_large_size_parameter() {
        let x: f64 = 5000.0;
        let n_max = (x + 4.0 * x.cbrt() + 2.5) as usize;
        let z = Complex64::new(x, 0.0);
        let psi = riccati_psi(n_max, z).unwrap();
        let chi = riccati_chi(n_max, z).unwrap();

        for n in (0..=n_max).step_by(97) {
            let xi = psi.values[n] - Complex64::i() * chi.values[n];
            let dxi = psi.derivatives[n] - Complex64::i() * chi.derivatives[n];
            let w = psi.values[n] * dxi - psi.derivatives[n] * xi;
            assert_relative_eq!(w.im, 1.0, epsilon = 1e-8);
            assert_relative_eq!(w.re, 0.0, epsilon = 1e-8);
        }
    }

    #[test]
    fn values_stay_finite_at_large_size_parameter() {
        let x: f64 = 5000.0;
        let n_max = (x + 4.0 * x.cbrt() + 2.5) as usize;
        let (psi, dpsi) = riccati_psi_real(n_max, x).unwrap();
        assert_eq!(psi.len(), n_max + 1);
        assert!(psi.iter().chain(dpsi.iter()).all(|v| v.is_finite()));
    }
}
