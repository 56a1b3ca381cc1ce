//! Matrix form of a QUBO, the representation every sampler in this crate works on.
//!
//! The objective is
//!
//! $$ f(x) = \frac{1}{2} x^T Q x + c^T x + \text{offset}, \quad x \in \{0, 1\}^n $$
//!
//! Labeled models (see [`crate::bqm`]) are lowered into this form before sampling.

use ndarray::Array1;
use smolprng::{Algorithm, PRNG};
use sprs::{CsMat, TriMat};

#[derive(Clone, Debug)]
pub struct Qubo {
    pub q: CsMat<f64>,
    pub c: Array1<f64>,
    pub offset: f64,
}

impl Qubo {
    /// Creates a QUBO with only quadratic terms
    pub fn new(q: CsMat<f64>) -> Self {
        let num_vars = q.cols();
        Self {
            q,
            c: Array1::<f64>::zeros(num_vars),
            offset: 0.0,
        }
    }

    /// Creates a QUBO with quadratic and linear terms
    pub fn new_with_c(q: CsMat<f64>, c: Array1<f64>) -> Self {
        Self { q, c, offset: 0.0 }
    }

    /// Attaches a constant term to the objective
    #[must_use]
    pub fn with_offset(mut self, offset: f64) -> Self {
        self.offset = offset;
        self
    }

    /// Builds a QUBO from triplet vectors, duplicated (i, j) entries are summed
    pub fn from_vec(
        i: Vec<usize>,
        j: Vec<usize>,
        q: Vec<f64>,
        c: Vec<f64>,
        num_x: usize,
    ) -> Self {
        let q = TriMat::<f64>::from_triplets((num_x, num_x), i, j, q);
        Self::new_with_c(q.to_csr(), Array1::from_vec(c))
    }

    /// Generates a random QUBO with the given fraction of nonzero upper triangle entries
    pub fn make_random_qubo<T: Algorithm>(num_x: usize, prng: &mut PRNG<T>, sparsity: f64) -> Self {
        let mut q = TriMat::<f64>::new((num_x, num_x));
        for i in 0..num_x {
            for j in i..num_x {
                if prng.gen_f64() < sparsity {
                    q.add_triplet(i, j, prng.gen_f64() - 0.5f64);
                }
            }
        }

        let c = (0..num_x)
            .map(|_| prng.gen_f64() - 0.5f64)
            .collect::<Array1<f64>>();

        Self::new_with_c(q.to_csr(), c)
    }

    /// Evaluates the objective at a (possibly fractional) point
    pub fn eval(&self, x: &Array1<f64>) -> f64 {
        let temp = &self.q * x;
        0.5 * x.dot(&temp) + self.c.dot(x) + self.offset
    }

    /// Evaluates the objective at a binary point
    pub fn eval_usize(&self, x: &Array1<usize>) -> f64 {
        self.eval(&x.mapv(|v| v as f64))
    }

    pub fn num_x(&self) -> usize {
        self.q.cols()
    }

    /// Gradient of the objective at x, does not assume that Q is symmetric
    pub fn eval_grad(&self, x: &Array1<f64>) -> Array1<f64> {
        0.5 * (&self.q * x + &self.q.transpose_view() * x) + &self.c
    }

    /// Uniform value in [0, 1] minimizing the objective if every variable takes it
    pub fn alpha(&self) -> f64 {
        let q_sum = self.q.data().iter().sum::<f64>();
        let c_sum = self.c.sum();

        if q_sum == 0.0 {
            return match c_sum < 0.0 {
                true => 1.0,
                false => 0.0,
            };
        }

        (-c_sum / q_sum).clamp(0.0, 1.0)
    }

    /// Rho expression from boros2007
    pub fn rho(&self) -> f64 {
        let q_plus: f64 = self.q.data().iter().filter(|x| **x > 0.0).sum();
        let q_minus: f64 = self.q.data().iter().filter(|x| **x < 0.0).sum();
        let c_plus: f64 = self.c.iter().filter(|x| **x > 0.0).sum();
        let c_minus: f64 = self.c.iter().filter(|x| **x < 0.0).sum();

        let p = q_plus + c_plus;
        let n = q_minus + c_minus;

        // an all zero problem has no preferred direction
        if p - n == 0.0 {
            return 0.5;
        }

        p / (p - n)
    }
}
