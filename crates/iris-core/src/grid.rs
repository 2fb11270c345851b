//! Sample-grid construction and validation.
//!
//! The finite-source convolution requires an exactly uniform angle grid and
//! the drop-radius sweeps a geometric one; both validators return the grid
//! parameter (step or ratio) on success so callers never re-derive it.

use crate::error::ModelError;

/// Uniformly spaced samples from `start` to `end` inclusive.
///
/// `n == 1` yields just `start`.
pub fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    if n <= 1 {
        return vec![start];
    }
    let step = (end - start) / (n - 1) as f64;
    (0..n).map(|i| start + step * i as f64).collect()
}

/// Geometrically spaced samples from `start` to `end` inclusive.
///
/// Both endpoints must be positive and of the same sign; `n == 1` yields
/// just `start`.
pub fn geomspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    if n <= 1 {
        return vec![start];
    }
    let ratio = (end / start).powf(1.0 / (n - 1) as f64);
    let mut v = Vec::with_capacity(n);
    let mut x = start;
    for _ in 0..n {
        v.push(x);
        x *= ratio;
    }
    // pin the endpoint against accumulated rounding
    v[n - 1] = end;
    v
}

const REL_TOL: f64 = 1e-6;
const ABS_TOL: f64 = 1e-12;

/// Verify that `xs` is uniformly spaced and return the step.
pub fn ensure_uniform(xs: &[f64]) -> Result<f64, ModelError> {
    let step = xs[1] - xs[0];
    for (i, pair) in xs.windows(2).enumerate().skip(1) {
        let d = pair[1] - pair[0];
        if (d - step).abs() > REL_TOL * step.abs() + ABS_TOL {
            return Err(ModelError::NonUniformGrid {
                index: i + 1,
                found: d,
                expected: step,
            });
        }
    }
    Ok(step)
}

/// Verify that `xs` is geometrically spaced and return the common ratio.
pub fn ensure_geometric(xs: &[f64]) -> Result<f64, ModelError> {
    let ratio = xs[1] / xs[0];
    for (i, pair) in xs.windows(2).enumerate().skip(1) {
        let r = pair[1] / pair[0];
        if (r - ratio).abs() > REL_TOL * ratio.abs() + ABS_TOL {
            return Err(ModelError::NonGeometricGrid {
                index: i + 1,
                found: r,
                expected: ratio,
            });
        }
    }
    Ok(ratio)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn linspace_hits_both_endpoints() {
        let v = linspace(1.0, 2.0, 5);
        assert_eq!(v.len(), 5);
        assert_relative_eq!(v[0], 1.0);
        assert_relative_eq!(v[4], 2.0);
        assert_relative_eq!(v[2], 1.5);
    }

    #[test]
    fn geomspace_has_constant_ratio() {
        let v = geomspace(1e-5, 1e-3, 5);
        assert_eq!(v.len(), 5);
        assert_relative_eq!(v[0], 1e-5);
        assert_relative_eq!(v[4], 1e-3);
        assert!(ensure_geometric(&v).is_ok());
    }

    #[test]
    fn uniform_validator_accepts_linspace_and_rejects_warped_grids() {
        let v = linspace(0.0, 1.0, 100);
        assert_relative_eq!(ensure_uniform(&v).unwrap(), 1.0 / 99.0);

        let mut warped = v;
        warped[50] += 1e-3;
        assert!(matches!(
            ensure_uniform(&warped),
            Err(ModelError::NonUniformGrid { .. })
        ));
    }

    #[test]
    fn geometric_validator_rejects_linspace() {
        let v = linspace(1.0, 2.0, 10);
        assert!(matches!(
            ensure_geometric(&v),
            Err(ModelError::NonGeometricGrid { .. })
        ));
    }
}
