//! Scalar special functions: the Airy function pair and the normal
//! quantile.
//!
//! `Ai` drives the diffraction model and must stay accurate over the wide
//! negative range the supernumerary fringes occupy, so the evaluation
//! switches from the Maclaurin series to the Abramowitz & Stegun
//! asymptotic expansions away from the origin.
//!
//! # References
//! Abramowitz & Stegun, *Handbook of Mathematical Functions*, §10.4;
//! Acklam, *An algorithm for computing the inverse normal cumulative
//! distribution function* (2003).

use std::f64::consts::PI;

/// Ai(0) = 3^(-2/3)/Γ(2/3).
const AIRY_C1: f64 = 0.355_028_053_887_817_24;
/// -Ai'(0) = 3^(-1/3)/Γ(1/3).
const AIRY_C2: f64 = 0.258_819_403_792_806_8;

/// |x| above which the asymptotic expansions take over.
const AIRY_SERIES_LIMIT: f64 = 6.0;

/// Airy function of the first kind and its derivative, `(Ai(x), Ai'(x))`.
pub fn airy(x: f64) -> (f64, f64) {
    if x.abs() <= AIRY_SERIES_LIMIT {
        airy_series(x)
    } else if x > 0.0 {
        airy_asymptotic_positive(x)
    } else {
        airy_asymptotic_negative(x)
    }
}

/// Maclaurin series, A&S 10.4.2/10.4.3. Converges for all x; cancellation
/// limits it to moderate |x|.
fn airy_series(x: f64) -> (f64, f64) {
    let x3 = x * x * x;

    // Term accumulators for f, g and their derivatives.
    let mut tf = 1.0;
    let mut tg = x;
    let mut tfp = 0.0;
    let mut tgp = 1.0;
    let (mut f, mut g, mut fp, mut gp) = (tf, tg, tfp, tgp);

    for k in 0..60 {
        let kf = k as f64;
        let d1 = (3.0 * kf + 2.0) * (3.0 * kf + 3.0);
        let d2 = (3.0 * kf + 3.0) * (3.0 * kf + 4.0);
        tf = tf * x3 / d1;
        tg = tg * x3 / d2;
        tfp = if k == 0 {
            x * x / 2.0
        } else {
            tfp * x3 * (kf + 1.0) / (kf * d1)
        };
        tgp = tgp * x3 / ((3.0 * kf + 1.0) * (3.0 * kf + 3.0));

        f += tf;
        g += tg;
        fp += tfp;
        gp += tgp;

        if tf.abs() < f64::EPSILON * f.abs() && tg.abs() < f64::EPSILON * g.abs().max(1e-300) {
            break;
        }
    }

    (AIRY_C1 * f - AIRY_C2 * g, AIRY_C1 * fp - AIRY_C2 * gp)
}

/// Coefficients u_k (for Ai) and v_k (for Ai') of the asymptotic series.
fn airy_uv(k: usize, u_prev: f64) -> (f64, f64) {
    let kf = k as f64;
    let u = u_prev * (6.0 * kf - 5.0) * (6.0 * kf - 3.0) * (6.0 * kf - 1.0)
        / (216.0 * kf * (2.0 * kf - 1.0));
    let v = u * (6.0 * kf + 1.0) / (1.0 - 6.0 * kf);
    (u, v)
}

/// A&S 10.4.59/10.4.61, valid for large positive x.
fn airy_asymptotic_positive(x: f64) -> (f64, f64) {
    let zeta = 2.0 / 3.0 * x.powf(1.5);
    let pre = (-zeta).exp() / (2.0 * PI.sqrt());

    let mut sum_u = 1.0;
    let mut sum_v = 1.0;
    let mut u = 1.0;
    let mut term: f64 = 1.0;
    let mut sign = -1.0;
    for k in 1..=20 {
        let (u_next, v_next) = airy_uv(k, u);
        u = u_next;
        let t = u / zeta.powi(k as i32);
        if t.abs() > term.abs() {
            break; // divergent tail reached
        }
        term = t;
        sum_u += sign * t;
        sum_v += sign * v_next / zeta.powi(k as i32);
        sign = -sign;
    }

    let ai = pre / x.powf(0.25) * sum_u;
    let aip = -pre * x.powf(0.25) * sum_v;
    (ai, aip)
}

/// A&S 10.4.60/10.4.62, valid for large negative x (oscillatory region).
fn airy_asymptotic_negative(x: f64) -> (f64, f64) {
    let t = -x;
    let zeta = 2.0 / 3.0 * t.powf(1.5);
    let (s, c) = (zeta + PI / 4.0).sin_cos();

    // Even/odd splits of the u and v series.
    let mut p = 1.0; // Σ (-1)^k u_{2k} ζ^{-2k}
    let mut q = 0.0; // Σ (-1)^k u_{2k+1} ζ^{-2k-1}
    let mut r = 1.0; // Σ (-1)^k v_{2k} ζ^{-2k}
    let mut sv = 0.0; // Σ (-1)^k v_{2k+1} ζ^{-2k-1}

    let mut u = 1.0;
    let mut prev = f64::MAX;
    for k in 1..=20 {
        let (u_next, v_next) = airy_uv(k, u);
        u = u_next;
        let mag = u / zeta.powi(k as i32);
        if mag.abs() > prev {
            break;
        }
        prev = mag.abs();
        // k odd contributes to the odd sums, k even to the even sums;
        // the (-1)^j sign uses j = k/2.
        let sign = if (k / 2) % 2 == 0 { 1.0 } else { -1.0 };
        if k % 2 == 1 {
            q += sign * mag;
            sv += sign * v_next / zeta.powi(k as i32);
        } else {
            p += sign * mag;
            r += sign * v_next / zeta.powi(k as i32);
        }
    }

    let ai = (s * p - c * q) / (PI.sqrt() * t.powf(0.25));
    let aip = -(c * r + sv * s) * t.powf(0.25) / PI.sqrt();
    (ai, aip)
}

/// Inverse of the standard normal CDF (Acklam's rational approximation,
/// relative error below 1.2e-9 over (0, 1)).
pub fn inverse_normal_cdf(p: f64) -> f64 {
    assert!(p > 0.0 && p < 1.0, "probability must lie strictly in (0, 1)");

    const A: [f64; 6] = [
        -3.969_683_028_665_376e1,
        2.209_460_984_245_205e2,
        -2.759_285_104_469_687e2,
        1.383_577_518_672_69e2,
        -3.066_479_806_614_716e1,
        2.506_628_277_459_239,
    ];
    const B: [f64; 5] = [
        -5.447_609_879_822_406e1,
        1.615_858_368_580_409e2,
        -1.556_989_798_598_866e2,
        6.680_131_188_771_972e1,
        -1.328_068_155_288_572e1,
    ];
    const C: [f64; 6] = [
        -7.784_894_002_430_293e-3,
        -3.223_964_580_411_365e-1,
        -2.400_758_277_161_838,
        -2.549_732_539_343_734,
        4.374_664_141_464_968,
        2.938_163_982_698_783,
    ];
    const D: [f64; 4] = [
        7.784_695_709_041_462e-3,
        3.224_671_290_700_398e-1,
        2.445_134_137_142_996,
        3.754_408_661_907_416,
    ];
    const P_LOW: f64 = 0.02425;

    if p < P_LOW {
        let q = (-2.0 * p.ln()).sqrt();
        (((((C[0] * q + C[1]) * q + C[2]) * q + C[3]) * q + C[4]) * q + C[5])
            / ((((D[0] * q + D[1]) * q + D[2]) * q + D[3]) * q + 1.0)
    } else if p <= 1.0 - P_LOW {
        let q = p - 0.5;
        let r = q * q;
        (((((A[0] * r + A[1]) * r + A[2]) * r + A[3]) * r + A[4]) * r + A[5]) * q
            / (((((B[0] * r + B[1]) * r + B[2]) * r + B[3]) * r + B[4]) * r + 1.0)
    } else {
        let q = (-2.0 * (1.0 - p).ln()).sqrt();
        -((((((C[0] * q + C[1]) * q + C[2]) * q + C[3]) * q + C[4]) * q + C[5])
            / ((((D[0] * q + D[1]) * q + D[2]) * q + D[3]) * q + 1.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    // Reference values from DLMF / scipy.special.airy.
    #[test]
    fn airy_at_reference_points() {
        let (ai, aip) = airy(0.0);
        assert_relative_eq!(ai, 0.355_028_053_887_817_2, epsilon = 1e-14);
        assert_relative_eq!(aip, -0.258_819_403_792_806_8, epsilon = 1e-14);

        let (ai, aip) = airy(1.0);
        assert_relative_eq!(ai, 0.135_292_416_312_881_4, epsilon = 1e-12);
        assert_relative_eq!(aip, -0.159_147_441_296_793_3, epsilon = 1e-12);

        let (ai, aip) = airy(-1.0);
        assert_relative_eq!(ai, 0.535_560_883_292_352_1, epsilon = 1e-12);
        assert_relative_eq!(aip, -0.010_160_567_116_645_2, epsilon = 1e-9);

        let (ai, aip) = airy(-5.0);
        assert_relative_eq!(ai, 0.350_761_009_024_114_2, epsilon = 1e-10);
        assert_relative_eq!(aip, 0.327_192_818_554_443_6, epsilon = 1e-10);
    }

    #[test]
    fn airy_asymptotic_branches_match_references() {
        let (ai, _) = airy(10.0);
        assert_relative_eq!(ai, 1.104_753_255_289_868_7e-10, epsilon = 1e-10);

        let (ai, _) = airy(-10.0);
        assert_relative_eq!(ai, 0.040_241_238_486_441_96, epsilon = 1e-9);
    }

    #[test]
    fn airy_vanishes_at_first_zero() {
        // a_1 = -2.338107410459767
        let (ai, _) = airy(-2.338_107_410_459_767);
        assert_abs_diff_eq!(ai, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn airy_is_continuous_across_the_series_boundary() {
        for &x in &[AIRY_SERIES_LIMIT, -AIRY_SERIES_LIMIT] {
            let below = airy(x - 1e-9);
            let above = airy(x + 1e-9);
            assert_relative_eq!(below.0, above.0, max_relative = 1e-6);
            assert_relative_eq!(below.1, above.1, max_relative = 1e-6);
        }
    }

    #[test]
    fn normal_quantile_matches_references() {
        assert_abs_diff_eq!(inverse_normal_cdf(0.5), 0.0, epsilon = 1e-12);
        assert_relative_eq!(
            inverse_normal_cdf(0.975),
            1.959_963_984_540_054,
            epsilon = 1e-8
        );
        assert_relative_eq!(
            inverse_normal_cdf(0.025),
            -1.959_963_984_540_054,
            epsilon = 1e-8
        );
        assert_relative_eq!(
            inverse_normal_cdf(0.999),
            3.090_232_306_167_813,
            epsilon = 1e-7
        );
    }
}
