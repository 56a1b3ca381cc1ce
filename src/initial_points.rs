//! Starting points for the local search sampler.

use crate::qubo::Qubo;
use ndarray::Array1;
use smolprng::{Algorithm, PRNG};

/// Generate a random binary point where each bit is set with probability `density`
pub fn generate_random_binary_point<T: Algorithm>(
    num_x: usize,
    prng: &mut PRNG<T>,
    density: f64,
) -> Array1<usize> {
    (0..num_x)
        .map(|_| usize::from(prng.gen_f64() < density))
        .collect()
}

/// Generate num_points random binary points
pub fn generate_random_binary_points<T: Algorithm>(
    num_x: usize,
    num_points: usize,
    prng: &mut PRNG<T>,
) -> Vec<Array1<usize>> {
    (0..num_points)
        .map(|_| generate_random_binary_point(num_x, prng, 0.5))
        .collect()
}

/// The point on the diagonal of the hypercube at qubo.alpha()
pub fn generate_alpha_starting_point(qubo: &Qubo) -> Array1<f64> {
    Array1::<f64>::zeros(qubo.num_x()) + qubo.alpha()
}

/// The point on the diagonal of the hypercube at qubo.rho()
pub fn generate_rho_starting_point(qubo: &Qubo) -> Array1<f64> {
    Array1::<f64>::zeros(qubo.num_x()) + qubo.rho()
}
