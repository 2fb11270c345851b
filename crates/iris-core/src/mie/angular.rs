//! Angular functions `π_n(θ)` and `τ_n(θ)` of the Mie series, with an
//! optional shared cache.
//!
//! `π_n = P¹_n(cos θ)/sin θ` and `τ_n = dP¹_n(cos θ)/dθ` are generated by
//! the standard upward recurrence (Bohren & Huffman eq. 4.47), which is
//! stable for all orders. The averaging pipeline evaluates many models on
//! one angle grid, so the tables are cached keyed by (angle-set identity,
//! truncation order); the cache is purely advisory — dropping or clearing
//! it never changes a result.

use std::cell::RefCell;
use std::rc::Rc;

use ndarray::Array2;

/// Precomputed `π_n`/`τ_n` tables over a fixed angle set.
#[derive(Debug)]
pub struct AngularTable {
    theta: Vec<f64>,
    n_max: usize,
    /// Shape (n_angles, n_max); column `n - 1` holds order `n`.
    pi: Array2<f64>,
    tau: Array2<f64>,
}

impl AngularTable {
    /// Build the tables for `n = 1..=n_max` over `theta`.
    pub fn compute(theta: &[f64], n_max: usize) -> Self {
        let mut pi = Array2::zeros((theta.len(), n_max));
        let mut tau = Array2::zeros((theta.len(), n_max));

        for (i, &t) in theta.iter().enumerate() {
            let mu = t.cos();
            let mut pi_prev = 0.0; // π_0
            let mut pi_curr = 1.0; // π_1
            for n in 1..=n_max {
                let nf = n as f64;
                pi[[i, n - 1]] = pi_curr;
                tau[[i, n - 1]] = nf * mu * pi_curr - (nf + 1.0) * pi_prev;
                let pi_next =
                    ((2.0 * nf + 1.0) * mu * pi_curr - (nf + 1.0) * pi_prev) / nf;
                pi_prev = pi_curr;
                pi_curr = pi_next;
            }
        }

        Self {
            theta: theta.to_vec(),
            n_max,
            pi,
            tau,
        }
    }

    /// Whether this table covers the requested angle set and order.
    pub fn covers(&self, theta: &[f64], n_max: usize) -> bool {
        self.n_max >= n_max && self.theta.len() == theta.len() && self.theta == theta
    }

    pub fn pi_row(&self, angle_index: usize) -> &[f64] {
        self.pi.row(angle_index).to_slice().expect("row-major table")
    }

    pub fn tau_row(&self, angle_index: usize) -> &[f64] {
        self.tau.row(angle_index).to_slice().expect("row-major table")
    }
}

/// Shareable, externally invalidatable memo for [`AngularTable`]s.
///
/// One slot: a new angle set or a larger truncation order evicts the
/// previous table, mirroring how the pipeline walks wavelengths with a
/// fixed grid and shrinking order.
#[derive(Debug, Default)]
pub struct AngularCache {
    slot: RefCell<Option<Rc<AngularTable>>>,
}

impl AngularCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch a covering table, or compute and memoise one.
    pub fn fetch(&self, theta: &[f64], n_max: usize) -> Rc<AngularTable> {
        if let Some(table) = self.slot.borrow().as_ref() {
            if table.covers(theta, n_max) {
                return Rc::clone(table);
            }
        }
        let table = Rc::new(AngularTable::compute(theta, n_max));
        *self.slot.borrow_mut() = Some(Rc::clone(&table));
        table
    }

    /// Drop the memoised table.
    pub fn clear(&self) {
        *self.slot.borrow_mut() = None;
    }
}
