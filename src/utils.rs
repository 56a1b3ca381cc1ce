//! This is the general Utils module, which contains functions on binary points that are used by multiple samplers and
//! there is not a better place to put them as of yet.

use crate::qubo::Qubo;
use ndarray::Array1;

/// Given a list of points, return the one with the lowest objective
///
/// # Panics
///
/// Will panic if the list of points is empty.
pub fn get_best_point(qubo: &Qubo, xs: &[Array1<usize>]) -> Array1<usize> {
    xs.iter()
        .map(|x| (x, qubo.eval_usize(x)))
        .min_by(|(_, a), (_, b)| a.total_cmp(b))
        .map(|(x, _)| x.clone())
        .expect("get_best_point requires at least one point")
}

/// Renders a binary point as a bit-string, e.g. `01101`
pub fn bit_string(x: &Array1<usize>) -> String {
    x.iter().map(|v| if *v == 1 { '1' } else { '0' }).collect()
}
