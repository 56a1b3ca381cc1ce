//! Labeled binary quadratic model.
//!
//! Problem formulations assign biases by variable name, e.g. `x_3` or `s_0`, and never deal with
//! matrix indices. Labels are kept in insertion order, so the i-th label is the i-th entry of a
//! sample vector once the model is lowered with [`BinaryQuadraticModel::to_qubo`].

use crate::qubo::Qubo;
use ndarray::Array1;
use sprs::TriMat;
use std::collections::{BTreeMap, HashMap};

#[derive(Clone, Debug, Default)]
pub struct BinaryQuadraticModel {
    labels: Vec<String>,
    index: HashMap<String, usize>,
    linear: Vec<f64>,
    quadratic: BTreeMap<(usize, usize), f64>,
    offset: f64,
}

impl BinaryQuadraticModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a variable with zero bias if it is not already present, returns its index
    pub fn add_variable(&mut self, label: &str) -> usize {
        if let Some(&i) = self.index.get(label) {
            return i;
        }

        let i = self.labels.len();
        self.labels.push(label.to_string());
        self.index.insert(label.to_string(), i);
        self.linear.push(0.0);
        i
    }

    /// Accumulates a linear bias on a variable
    pub fn add_linear(&mut self, label: &str, bias: f64) {
        let i = self.add_variable(label);
        self.linear[i] += bias;
    }

    /// Accumulates a quadratic bias on an unordered pair of variables.
    ///
    /// A pair of identical labels is folded into the linear term, as x * x = x for binaries.
    pub fn add_quadratic(&mut self, u: &str, v: &str, bias: f64) {
        let i = self.add_variable(u);
        let j = self.add_variable(v);

        if i == j {
            self.linear[i] += bias;
            return;
        }

        *self.quadratic.entry(Self::key(i, j)).or_insert(0.0) += bias;
    }

    pub fn add_offset(&mut self, offset: f64) {
        self.offset += offset;
    }

    pub fn linear(&self, label: &str) -> Option<f64> {
        self.index_of(label).map(|i| self.linear[i])
    }

    /// Quadratic bias between two variables, zero if they do not interact
    pub fn quadratic(&self, u: &str, v: &str) -> Option<f64> {
        let i = self.index_of(u)?;
        let j = self.index_of(v)?;
        Some(self.quadratic.get(&Self::key(i, j)).copied().unwrap_or(0.0))
    }

    pub const fn offset(&self) -> f64 {
        self.offset
    }

    pub fn num_variables(&self) -> usize {
        self.labels.len()
    }

    pub fn num_interactions(&self) -> usize {
        self.quadratic.len()
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn index_of(&self, label: &str) -> Option<usize> {
        self.index.get(label).copied()
    }

    /// Iterates over (index, bias) of the linear terms
    pub fn iter_linear(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.linear.iter().copied().enumerate()
    }

    /// Iterates over (i, j, bias) of the quadratic terms with i < j
    pub fn iter_quadratic(&self) -> impl Iterator<Item = (usize, usize, f64)> + '_ {
        self.quadratic.iter().map(|(&(i, j), &b)| (i, j, b))
    }

    /// Energy of a binary sample whose entries follow the label order
    pub fn energy(&self, x: &Array1<usize>) -> f64 {
        let linear: f64 = self
            .iter_linear()
            .filter(|(i, _)| x[*i] == 1)
            .map(|(_, b)| b)
            .sum();

        let quadratic: f64 = self
            .iter_quadratic()
            .filter(|(i, j, _)| x[*i] == 1 && x[*j] == 1)
            .map(|(_, _, b)| b)
            .sum();

        self.offset + linear + quadratic
    }

    /// Lowers the model to the symmetric matrix form used by the samplers
    pub fn to_qubo(&self) -> Qubo {
        let n = self.num_variables();
        let mut q = TriMat::<f64>::new((n, n));

        // both triangles carry the full bias, the 1/2 in the objective cancels the double count
        for (i, j, b) in self.iter_quadratic() {
            q.add_triplet(i, j, b);
            q.add_triplet(j, i, b);
        }

        Qubo::new_with_c(q.to_csr(), Array1::from_vec(self.linear.clone())).with_offset(self.offset)
    }

    const fn key(i: usize, j: usize) -> (usize, usize) {
        if i < j {
            (i, j)
        } else {
            (j, i)
        }
    }
}
