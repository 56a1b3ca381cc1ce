//! # Local Search contains the search algorithms behind the local sampler
//!
//! This module contains the implemented local search algorithms, which are:
//! - Simple local search
//! - Multi simple local search
//! - Simple mixed search
//! - Particle swarm search

use crate::initial_points::generate_random_binary_point;
use crate::local_search_utils;
use crate::local_search_utils::contract_point;
use crate::qubo::Qubo;
use crate::utils::get_best_point;
use ndarray::Array1;
use rayon::prelude::*;
use smolprng::{Algorithm, PRNG};

/// Given a QUBO and an integral initial point, run simple local search until the point converges or the step limit is hit.
pub fn simple_local_search(qubo: &Qubo, x_0: &Array1<usize>, max_steps: usize) -> Array1<usize> {
    let variables = (0..qubo.num_x()).collect::<Vec<_>>();
    let mut x = x_0.clone();
    let mut x_1 = local_search_utils::one_step_local_search_improved(qubo, &x, &variables);
    let mut steps = 0;

    while x_1 != x && steps <= max_steps {
        x = x_1;
        x_1 = local_search_utils::one_step_local_search_improved(qubo, &x, &variables);
        steps += 1;
    }

    x_1
}

/// Given a QUBO and a vector of initial points, run local searches on each initial point and return all of the solutions.
pub fn multi_simple_local_search(
    qubo: &Qubo,
    xs: &[Array1<usize>],
    max_steps: usize,
) -> Vec<Array1<usize>> {
    xs.par_iter()
        .map(|x| simple_local_search(qubo, x, max_steps))
        .collect()
}

/// Given a QUBO and a fractional initial point, round it with the gain criteria and then take one flip steps until
/// the point converges or the step limit is hit.
pub fn simple_mixed_search(qubo: &Qubo, x_0: &Array1<f64>, max_steps: usize) -> Array1<usize> {
    let vars = (0..qubo.num_x()).collect::<Vec<_>>();
    let mut x = local_search_utils::get_gain_criteria(qubo, x_0);
    let mut steps = 0;

    while steps <= max_steps {
        let x_1 = local_search_utils::one_step_local_search_improved(qubo, &x, &vars);
        if x_1 == x {
            break;
        }
        x = x_1;
        steps += 1;
    }

    x
}

/// Performs a particle swarm search on a QUBO.
pub fn particle_swarm_search<T: Algorithm>(
    qubo: &Qubo,
    num_particles: usize,
    max_steps: usize,
    prng: &mut PRNG<T>,
) -> Array1<usize> {
    let num_dim = qubo.num_x();

    let mut particles: Vec<_> = (0..num_particles.max(1))
        .map(|_| generate_random_binary_point(num_dim, prng, 0.5))
        .collect();

    let selected_vars = (0..num_dim).collect::<Vec<_>>();

    // at each step contract 10% of the variables
    let num_contract = num_dim / 10 + 1;

    for _ in 0..max_steps {
        particles = particles
            .par_iter()
            .map(|x| local_search_utils::one_step_local_search_improved(qubo, x, &selected_vars))
            .collect();

        let best_particle = get_best_point(qubo, &particles);

        particles = particles
            .iter()
            .map(|x| contract_point(&best_particle, x, num_contract))
            .collect();
    }

    get_best_point(qubo, &particles)
}
