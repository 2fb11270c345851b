//! Mie theory: the exact multipole-series solution for a homogeneous
//! sphere, with optional Debye-series decomposition by number of internal
//! reflections.
//!
//! The multipole coefficients come from Riccati-Bessel boundary-condition
//! ratios at the sphere surface; the Debye decomposition rewrites each
//! coefficient as a geometric series in the single-surface reflection and
//! transmission coefficients, so individual bows can be isolated from the
//! full wave solution.
//!
//! # References
//! C. F. Bohren and D. R. Huffman, *Absorption and Scattering of Light by
//! Small Particles* (1983), chapter 4.
//! E. A. Hovenac and J. A. Lock, *J. Opt. Soc. Am. A* **9** (1992) 781.

mod angular;

pub use angular::{AngularCache, AngularTable};

use std::rc::Rc;

use num_complex::Complex64;

use crate::error::ModelError;
use crate::geometry::BowGeometry;
use crate::model::OpticalModel;
use crate::riccati::{riccati_chi, riccati_psi};
use crate::types::{Polarisation, RaySelection};

/// Debye decomposition tables: row `p` holds the coefficients of the ray
/// family with `p - 1` internal reflections (row 0 is diffraction plus
/// external reflection).
struct DebyeTables {
    a: Vec<Vec<Complex64>>,
    b: Vec<Vec<Complex64>>,
}

/// Exact electromagnetic scattering model for a drop of size parameter
/// `x` and (real) refractive index `m`.
pub struct MieModel {
    geom: BowGeometry,
    x: f64,
    n_max: usize,
    a: Vec<Complex64>,
    b: Vec<Complex64>,
    debye: Option<DebyeTables>,
    cache: Option<Rc<AngularCache>>,
}

/// Series truncation rule `N = x + 4·x^(1/3) + 2.5` (truncated to an
/// integer), after Wiscombe.
fn truncation_order(x: f64) -> usize {
    (x + 4.0 * x.cbrt() + 2.5) as usize
}

impl MieModel {
    /// Full-series model; Debye-order queries will be rejected.
    pub fn new(m: f64, x: f64) -> Result<Self, ModelError> {
        Self::build(m, x, None)
    }

    /// Model with Debye tables for orders `0..=p_max`.
    pub fn with_debye(m: f64, x: f64, p_max: usize) -> Result<Self, ModelError> {
        Self::build(m, x, Some(p_max))
    }

    /// Attach a shared angular-function cache.
    pub fn with_cache(mut self, cache: Rc<AngularCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    fn build(m: f64, x: f64, p_max: Option<usize>) -> Result<Self, ModelError> {
        let geom = BowGeometry::new(m)?;
        if !x.is_finite() || x <= 0.0 {
            return Err(ModelError::InvalidSizeParameter(x));
        }
        let n_max = truncation_order(x);
        log::debug!("mie: x = {x:.1}, truncating multipole series at N = {n_max}");

        let mc = Complex64::from(m);
        let zx = Complex64::new(x, 0.0);
        let zy = mc * zx;

        let psi_x = riccati_psi(n_max, zx)?;
        let chi_x = riccati_chi(n_max, zx)?;
        let psi_y = riccati_psi(n_max, zy)?;

        // First-kind Hankel combination ξ_n = ψ_n - i·χ_n at the sphere
        // surface.
        let i = Complex64::i();
        let xi = |n: usize| psi_x.values[n] - i * chi_x.values[n];
        let dxi = |n: usize| psi_x.derivatives[n] - i * chi_x.derivatives[n];

        let mut a = Vec::with_capacity(n_max);
        let mut b = Vec::with_capacity(n_max);
        for n in 1..=n_max {
            let pp = psi_x.values[n] * psi_y.derivatives[n];
            let dp = psi_x.derivatives[n] * psi_y.values[n];
            let hp = xi(n) * psi_y.derivatives[n];
            let dh = dxi(n) * psi_y.values[n];
            a.push((pp - mc * dp) / (hp - mc * dh));
            b.push((mc * pp - dp) / (mc * hp - dh));
        }

        let debye = match p_max {
            Some(p_max) => Some(Self::debye_tables(
                mc, n_max, p_max, &psi_x, &chi_x, &zy,
            )?),
            None => None,
        };

        Ok(Self {
            geom,
            x,
            n_max,
            a,
            b,
            debye,
            cache: None,
        })
    }

    /// Hovenac & Lock geometric-series decomposition.
    ///
    /// With `R11`/`R22` the internal/external reflection coefficients and
    /// `T12`/`T21` the transmissions, row 0 is `(1 - R22)/2` and row
    /// `p ≥ 1` is `-T21·R11^(p-1)·T12/2`: the ray transmitted in, bounced
    /// `p - 1` times, and transmitted out.
    fn debye_tables(
        mc: Complex64,
        n_max: usize,
        p_max: usize,
        psi_x: &crate::riccati::RiccatiTable,
        chi_x: &crate::riccati::RiccatiTable,
        zy: &Complex64,
    ) -> Result<DebyeTables, ModelError> {
        let psi_y = riccati_psi(n_max, *zy)?;
        let chi_y = riccati_chi(n_max, *zy)?;

        let i = Complex64::i();
        let mut a = vec![Vec::with_capacity(n_max); p_max + 1];
        let mut b = vec![Vec::with_capacity(n_max); p_max + 1];

        for n in 1..=n_max {
            // Hankel combinations of both kinds, inside and outside.
            let xi1x = psi_x.values[n] - i * chi_x.values[n];
            let dxi1x = psi_x.derivatives[n] - i * chi_x.derivatives[n];
            let xi2x = psi_x.values[n] + i * chi_x.values[n];
            let dxi2x = psi_x.derivatives[n] + i * chi_x.derivatives[n];
            let xi1y = psi_y.values[n] - i * chi_y.values[n];
            let dxi1y = psi_y.derivatives[n] - i * chi_y.derivatives[n];
            let xi2y = psi_y.values[n] + i * chi_y.values[n];
            let dxi2y = psi_y.derivatives[n] + i * chi_y.derivatives[n];

            let da = xi1x * dxi2y - mc * dxi1x * xi2y;
            let db = mc * xi1x * dxi2y - dxi1x * xi2y;

            let t12a = -2.0 * i / da;
            let t12b = -2.0 * i / db;
            let t21a = mc * t12a;
            let t21b = mc * t12b;

            let r11a = (mc * dxi1x * xi1y - xi1x * dxi1y) / da;
            let r11b = (dxi1x * xi1y - mc * xi1x * dxi1y) / db;
            let r22a = (mc * dxi2x * xi2y - xi2x * dxi2y) / da;
            let r22b = (dxi2x * xi2y - mc * xi2x * dxi2y) / db;

            a[0].push((Complex64::from(1.0) - r22a) / 2.0);
            b[0].push((Complex64::from(1.0) - r22b) / 2.0);
            let mut power_a = Complex64::from(1.0);
            let mut power_b = Complex64::from(1.0);
            for p in 1..=p_max {
                a[p].push(-t21a * power_a * t12a / 2.0);
                b[p].push(-t21b * power_b * t12b / 2.0);
                power_a *= r11a;
                power_b *= r11b;
            }
        }

        Ok(DebyeTables { a, b })
    }

    /// Resolve a ray selection to summed coefficient vectors.
    fn coefficients(
        &self,
        selection: &RaySelection,
    ) -> Result<(Vec<Complex64>, Vec<Complex64>), ModelError> {
        let orders: Vec<usize> = match selection {
            RaySelection::Full => return Ok((self.a.clone(), self.b.clone())),
            RaySelection::Bow(order) => vec![order.reflections() as usize + 1],
            RaySelection::Debye(orders) => orders.clone(),
        };

        let debye = self
            .debye
            .as_ref()
            .ok_or_else(|| ModelError::UnsupportedSelection {
                model: "mie",
                selection: format!("{selection} (Debye tables not built)"),
            })?;
        let p_max = debye.a.len() - 1;

        let mut a = vec![Complex64::from(0.0); self.n_max];
        let mut b = vec![Complex64::from(0.0); self.n_max];
        for &p in &orders {
            if p > p_max {
                return Err(ModelError::DebyeOrderOutOfRange {
                    requested: p,
                    max: p_max,
                });
            }
            for n in 0..self.n_max {
                a[n] += debye.a[p][n];
                b[n] += debye.b[p][n];
            }
        }
        Ok((a, b))
    }

    fn angular_table(&self, theta: &[f64]) -> Rc<AngularTable> {
        match &self.cache {
            Some(cache) => cache.fetch(theta, self.n_max),
            None => Rc::new(AngularTable::compute(theta, self.n_max)),
        }
    }

    /// Scattering amplitudes `(S⊥, S∥)` at each angle, normalised by `x`
    /// (Bohren & Huffman eq. 4.74).
    pub fn scattering_amplitudes(
        &self,
        theta: &[f64],
        selection: &RaySelection,
    ) -> Result<(Vec<Complex64>, Vec<Complex64>), ModelError> {
        let (a, b) = self.coefficients(selection)?;
        let table = self.angular_table(theta);

        let mut s1 = Vec::with_capacity(theta.len());
        let mut s2 = Vec::with_capacity(theta.len());
        for angle in 0..theta.len() {
            let pi_row = table.pi_row(angle);
            let tau_row = table.tau_row(angle);
            let mut sum1 = Complex64::from(0.0);
            let mut sum2 = Complex64::from(0.0);
            for n in 1..=self.n_max {
                let weight = (2 * n + 1) as f64 / (n * (n + 1)) as f64;
                let pi_n = pi_row[n - 1];
                let tau_n = tau_row[n - 1];
                sum1 += weight * (a[n - 1] * pi_n + b[n - 1] * tau_n);
                sum2 += weight * (a[n - 1] * tau_n + b[n - 1] * pi_n);
            }
            s1.push(sum1 / self.x);
            s2.push(sum2 / self.x);
        }
        Ok((s1, s2))
    }

    /// Degree of polarisation `(I⊥ - I∥)/(I⊥ + I∥)` (Bohren & Huffman
    /// eq. 4.78).
    pub fn degree_of_polarisation(
        &self,
        theta: &[f64],
        selection: &RaySelection,
    ) -> Result<Vec<f64>, ModelError> {
        let (s1, s2) = self.scattering_amplitudes(theta, selection)?;
        Ok(s1
            .iter()
            .zip(s2.iter())
            .map(|(p, q)| {
                let (ip, iq) = (p.norm_sqr(), q.norm_sqr());
                (ip - iq) / (ip + iq)
            })
            .collect())
    }

    /// Scattering efficiency `Q_sca = (2/x²)·Σ (2n+1)(|a_n|² + |b_n|²)`.
    pub fn scattering_efficiency(&self) -> f64 {
        let sum: f64 = self
            .a
            .iter()
            .zip(self.b.iter())
            .enumerate()
            .map(|(idx, (a, b))| {
                (2 * (idx + 1) + 1) as f64 * (a.norm_sqr() + b.norm_sqr())
            })
            .sum();
        2.0 / (self.x * self.x) * sum
    }

    /// Extinction efficiency `Q_ext = (2/x²)·Σ (2n+1)·Re(a_n + b_n)`.
    pub fn extinction_efficiency(&self) -> f64 {
        let sum: f64 = self
            .a
            .iter()
            .zip(self.b.iter())
            .enumerate()
            .map(|(idx, (a, b))| (2 * (idx + 1) + 1) as f64 * (a + b).re)
            .sum();
        2.0 / (self.x * self.x) * sum
    }
}

impl OpticalModel for MieModel {
    fn intensity(
        &self,
        theta: &[f64],
        selection: &RaySelection,
        pol: Polarisation,
    ) -> Result<Vec<f64>, ModelError> {
        let (s1, s2) = self.scattering_amplitudes(theta, selection)?;
        Ok(s1
            .iter()
            .zip(s2.iter())
            .map(|(p, q)| match pol {
                Polarisation::Perpendicular => p.norm_sqr(),
                Polarisation::Parallel => q.norm_sqr(),
                Polarisation::Unpolarised => 0.5 * (p.norm_sqr() + q.norm_sqr()),
            })
            .collect())
    }

    fn requires_size_parameter(&self) -> bool {
        true
    }

    fn geometry(&self) -> &BowGeometry {
        &self.geom
    }

    fn name(&self) -> &'static str {
        "mie"
    }
}
