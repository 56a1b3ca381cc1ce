//! Brute force sampler for small models, mostly a reference to check the other samplers against.

use crate::bqm::BinaryQuadraticModel;
use crate::error::{HermesError, Result};
use crate::qubo::Qubo;
use crate::sampler::sample_set::{Sample, SampleSet};
use crate::sampler::Sampler;
use ndarray::Array1;
use rayon::prelude::*;
use tracing::debug;

/// Largest model the exact sampler agrees to enumerate
pub const MAX_EXACT_VARIABLES: usize = 24;

pub struct ExactSampler {
    max_variables: usize,
}

impl ExactSampler {
    pub const fn new() -> Self {
        Self {
            max_variables: MAX_EXACT_VARIABLES,
        }
    }
}

impl Default for ExactSampler {
    fn default() -> Self {
        Self::new()
    }
}

impl Sampler for ExactSampler {
    fn name(&self) -> &str {
        "exact"
    }

    fn sample(&mut self, bqm: &BinaryQuadraticModel, num_reads: usize) -> Result<SampleSet> {
        let num_x = bqm.num_variables();
        if num_x > self.max_variables {
            return Err(HermesError::InvalidProblem(format!(
                "exact sampler enumerates at most {} variables, the model has {num_x}",
                self.max_variables
            )));
        }

        debug!(variables = num_x, "enumerating all assignments");

        let samples = enumerate_lowest(&bqm.to_qubo(), num_reads.max(1))
            .into_iter()
            .map(|(energy, x)| Sample {
                x,
                energy,
                num_occurrences: 1,
            })
            .collect();

        Ok(SampleSet::from_samples(bqm.labels().to_vec(), samples))
    }
}

/// Enumerate all binary solutions, returning the first one with the lowest objective
pub fn enumerate_solve(qubo: &Qubo) -> (f64, Array1<usize>) {
    let num_vars = qubo.num_x();
    let mut best_obj = f64::INFINITY;
    let mut best_solution = Array1::<usize>::zeros(num_vars);

    for i in 0..(1u64 << num_vars) {
        let solution = point_from_index(i, num_vars);
        let obj = qubo.eval_usize(&solution);

        if obj < best_obj {
            best_obj = obj;
            best_solution = solution;
        }
    }

    (best_obj, best_solution)
}

/// Enumerate all binary solutions in parallel, keeping the k with the lowest objective in ascending order
pub fn enumerate_lowest(qubo: &Qubo, k: usize) -> Vec<(f64, Array1<usize>)> {
    let num_vars = qubo.num_x();

    let mut best = (0..(1u64 << num_vars))
        .into_par_iter()
        .map(|i| {
            let x = point_from_index(i, num_vars);
            (qubo.eval_usize(&x), x)
        })
        .fold(Vec::new, |mut acc, item| {
            push_bounded(&mut acc, item, k);
            acc
        })
        .reduce(Vec::new, |mut acc, other| {
            for item in other {
                push_bounded(&mut acc, item, k);
            }
            acc
        });

    best.sort_by(|a, b| a.0.total_cmp(&b.0));
    best
}

/// The binary point whose j-th entry is the j-th bit of i
fn point_from_index(i: u64, num_vars: usize) -> Array1<usize> {
    (0..num_vars).map(|j| ((i >> j) & 1) as usize).collect()
}

/// Adds an item, dropping the worst one if more than k are held
fn push_bounded(acc: &mut Vec<(f64, Array1<usize>)>, item: (f64, Array1<usize>), k: usize) {
    acc.push(item);

    if acc.len() > k {
        let worst = acc
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.0.total_cmp(&b.0))
            .map(|(i, _)| i);

        if let Some(i) = worst {
            acc.swap_remove(i);
        }
    }
}
