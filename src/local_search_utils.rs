//! This module contains utility functions for local search algorithms.
//!
//! These include:
//! - objective deltas for every single bit flip
//! - 1-opt local search step
//! - 1-step gain criteria
//! - contraction of a point towards another point

use crate::qubo::Qubo;
use ndarray::Array1;

/// Efficient calculation of the delta of the objective function for a single bit flip for each variable
/// more or less this is a helper function that allows for selecting the best bit to flip option without
/// having to calculate the objective function for each bit flip, independently.
///
/// Run time is O(|Q|) + O(|x|)
pub fn one_flip_objective(qubo: &Qubo, x_0: &Array1<usize>) -> (f64, Array1<f64>) {
    let mut objs = Array1::<f64>::zeros(qubo.num_x());
    let x_0f = x_0.mapv(|x| x as f64);

    // each term of the delta formula
    let x_q = 0.5 * (&qubo.q * &x_0f);
    let q_x = 0.5 * (&qubo.q.transpose_view() * &x_0f);
    let q_jj = 0.5 * qubo.q.diag().to_dense();
    let delta = 1.0 - 2.0 * &x_0f;

    for i in 0..qubo.num_x() {
        objs[i] = q_jj[i] + delta[i] * (x_q[i] + q_x[i] + qubo.c[i]);
    }

    let obj_0 = x_0f.dot(&x_q) + qubo.c.dot(&x_0f) + qubo.offset;

    (obj_0, objs)
}

/// Performs a single step of local search, which is to say that it will flip the single bit out of the selected
/// variables that improves the objective the most, or return the point unchanged if no flip improves it.
///
/// This takes O(|Q|) + O(n) time, where |Q| is the number of non-zero elements in the QUBO matrix.
///
/// Example:
/// ``` rust
/// use hermes::qubo::Qubo;
/// use smolprng::{PRNG, JsfLarge};
/// use hermes::{initial_points, local_search_utils};
///
/// let mut prng = PRNG {
///    generator: JsfLarge::default(),
/// };
/// let p = Qubo::make_random_qubo(10, &mut prng, 0.5);
///
/// let x_0 = initial_points::generate_random_binary_point(p.num_x(), &mut prng, 0.5);
/// let vars = (0..p.num_x()).collect::<Vec<_>>();
///
/// let x_1 = local_search_utils::one_step_local_search_improved(&p, &x_0, &vars);
/// assert!(p.eval_usize(&x_1) <= p.eval_usize(&x_0));
/// ```
pub fn one_step_local_search_improved(
    qubo: &Qubo,
    x_0: &Array1<usize>,
    selected_vars: &[usize],
) -> Array1<usize> {
    let (_, objs) = one_flip_objective(qubo, x_0);

    let best_neighbor = selected_vars
        .iter()
        .map(|&i| (i, objs[i]))
        .min_by(|(_, a), (_, b)| a.total_cmp(b));

    match best_neighbor {
        Some((i, obj)) if obj < 0.0f64 => {
            let mut x_1 = x_0.clone();
            x_1[i] = 1 - x_1[i];
            x_1
        }
        _ => x_0.clone(),
    }
}

/// Auxiliary function to calculate the gains from flipping each variable
///
/// This rounds each variable in the direction its partial derivative points downhill, it accepts fractional points
/// and always returns a binary point.
pub fn get_gain_criteria(qubo: &Qubo, x: &Array1<f64>) -> Array1<usize> {
    qubo.eval_grad(x).mapv(|g| usize::from(g <= 0.0))
}

/// This is a helper function for the basic particle swarm algorithm. It takes two points, x_0 and x_1, and sets up to
/// num_contract differing variables of x_1 to the values they take in x_0.
pub fn contract_point(
    x_0: &Array1<usize>,
    x_1: &Array1<usize>,
    num_contract: usize,
) -> Array1<usize> {
    let mut x_1 = x_1.clone();
    let mut flipped = 0;

    for i in 0..x_0.len() {
        if flipped >= num_contract {
            break;
        }

        if x_0[i] != x_1[i] {
            x_1[i] = x_0[i];
            flipped += 1;
        }
    }

    x_1
}
