//! Traveling salesperson as a QUBO with a one-hot position encoding.
//!
//! Variable `x_{c}_{p}` is set when city c is visited at position p. Two one-hot penalties force a
//! permutation, and the tour length is charged between consecutive positions, wrapping around.

use crate::bqm::BinaryQuadraticModel;
use crate::constraint::Constraint;
use crate::dataset::City;
use crate::error::{HermesError, Result};
use crate::problems::{value_of, variable_index, Problem};
use ndarray::{Array1, Array2};
use tracing::debug;

#[derive(Clone, Debug)]
pub struct Tsp {
    cities: Vec<City>,
    distance: Array2<f64>,
    constraint_strength: f64,
    distance_scale: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TspSolution {
    /// cities assigned to each position, a valid tour has exactly one per position
    pub positions: Vec<Vec<usize>>,
    /// the visiting order, when every city is visited exactly once
    pub tour: Option<Vec<usize>>,
    pub length: Option<f64>,
}

impl Tsp {
    pub fn new(cities: Vec<City>) -> Result<Self> {
        if cities.len() < 3 {
            return Err(HermesError::InvalidProblem(format!(
                "a tour needs at least 3 cities, got {}",
                cities.len()
            )));
        }

        if cities.iter().any(|c| !c.x.is_finite() || !c.y.is_finite()) {
            return Err(HermesError::InvalidProblem("city coordinates must be finite".into()));
        }

        let n = cities.len();
        let distance = Array2::from_shape_fn((n, n), |(u, v)| cities[u].distance(&cities[v]));
        let max_distance = distance.iter().copied().fold(0.0, f64::max);

        Ok(Self {
            cities,
            distance,
            constraint_strength: 2.0 * max_distance + 1.0,
            distance_scale: 1.0,
        })
    }

    /// Overrides the weight of the one-hot penalties
    pub fn with_constraint_strength(mut self, strength: f64) -> Result<Self> {
        if !strength.is_finite() || strength <= 0.0 {
            return Err(HermesError::InvalidProblem(format!(
                "constraint strength must be positive, got {strength}"
            )));
        }

        self.constraint_strength = strength;
        Ok(self)
    }

    pub fn num_cities(&self) -> usize {
        self.cities.len()
    }

    pub const fn distance_matrix(&self) -> &Array2<f64> {
        &self.distance
    }

    pub const fn constraint_strength(&self) -> f64 {
        self.constraint_strength
    }

    /// Length of the closed tour visiting the cities in the given order
    pub fn tour_length(&self, tour: &[usize]) -> f64 {
        (0..tour.len())
            .map(|p| self.distance[[tour[p], tour[(p + 1) % tour.len()]]])
            .sum()
    }

    fn label(city: usize, position: usize) -> String {
        format!("x_{city}_{position}")
    }
}

impl Problem for Tsp {
    type Solution = TspSolution;

    fn name(&self) -> &'static str {
        "tsp"
    }

    fn build_bqm(&self) -> Result<BinaryQuadraticModel> {
        let n = self.num_cities();
        let a = self.constraint_strength;
        let b = self.distance_scale;
        let mut bqm = BinaryQuadraticModel::new();

        for c in 0..n {
            for p in 0..n {
                bqm.add_variable(&Self::label(c, p));
            }
        }

        // A (1 - sum x)^2 = A (1 - sum x + 2 sum_{i<j} x_i x_j), once per city row and once per position column
        for c in 0..n {
            for p in 0..n {
                bqm.add_linear(&Self::label(c, p), -2.0 * a);

                for q in (p + 1)..n {
                    bqm.add_quadratic(&Self::label(c, p), &Self::label(c, q), 2.0 * a);
                    bqm.add_quadratic(&Self::label(p, c), &Self::label(q, c), 2.0 * a);
                }
            }
        }
        bqm.add_offset(2.0 * a * n as f64);

        // tour length between consecutive positions
        for p in 0..n {
            let next = (p + 1) % n;
            for u in 0..n {
                for v in 0..n {
                    if u != v {
                        bqm.add_quadratic(
                            &Self::label(u, p),
                            &Self::label(v, next),
                            b * self.distance[[u, v]],
                        );
                    }
                }
            }
        }

        debug!(
            cities = n,
            variables = bqm.num_variables(),
            interactions = bqm.num_interactions(),
            "built tsp model"
        );

        Ok(bqm)
    }

    fn constraints(&self, bqm: &BinaryQuadraticModel) -> Result<Vec<Constraint>> {
        let n = self.num_cities();
        let mut constraints = Vec::with_capacity(2 * n);

        for c in 0..n {
            let vars = (0..n)
                .map(|p| variable_index(bqm, &Self::label(c, p)))
                .collect::<Result<Vec<_>>>()?;
            constraints.push(Constraint::exactly_one(format!("city {c}"), &vars));
        }

        for p in 0..n {
            let vars = (0..n)
                .map(|c| variable_index(bqm, &Self::label(c, p)))
                .collect::<Result<Vec<_>>>()?;
            constraints.push(Constraint::exactly_one(format!("position {p}"), &vars));
        }

        Ok(constraints)
    }

    fn decode(&self, bqm: &BinaryQuadraticModel, x: &Array1<usize>) -> TspSolution {
        let n = self.num_cities();

        let positions = (0..n)
            .map(|p| {
                (0..n)
                    .filter(|&c| value_of(bqm, x, &Self::label(c, p)) == 1)
                    .collect::<Vec<_>>()
            })
            .collect::<Vec<_>>();

        // a tour needs one city per position and no city twice
        let mut seen = vec![false; n];
        let mut tour = Vec::with_capacity(n);
        for cities in &positions {
            match cities.as_slice() {
                [c] if !seen[*c] => {
                    seen[*c] = true;
                    tour.push(*c);
                }
                _ => break,
            }
        }

        let tour = (tour.len() == n).then_some(tour);
        let length = tour.as_ref().map(|t| self.tour_length(t));

        TspSolution {
            positions,
            tour,
            length,
        }
    }

    fn describe(&self, solution: &TspSolution) -> String {
        match (&solution.tour, solution.length) {
            (Some(tour), Some(length)) => format!("Tour: {tour:?}\nTour length: {length:.4}"),
            _ => format!("Incomplete tour, cities per position: {:?}", solution.positions),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::constraint::check_all;
    use crate::dataset::City;
    use crate::problems::tsp::Tsp;
    use crate::problems::Problem;
    use crate::sampler::exact::enumerate_solve;
    use ndarray::Array1;

    fn square() -> Vec<City> {
        vec![
            City { x: 0.0, y: 0.0 },
            City { x: 1.0, y: 0.0 },
            City { x: 1.0, y: 1.0 },
            City { x: 0.0, y: 1.0 },
        ]
    }

    fn permutation_point(problem: &Tsp, tour: &[usize]) -> Array1<usize> {
        let n = problem.num_cities();
        let mut x = Array1::zeros(n * n);
        for (p, &c) in tour.iter().enumerate() {
            x[c * n + p] = 1;
        }
        x
    }

    #[test]
    fn too_few_cities() {
        assert!(Tsp::new(square()[..2].to_vec()).is_err());
    }

    #[test]
    fn permutation_energy_is_tour_length() {
        let problem = Tsp::new(square()).unwrap();
        let bqm = problem.build_bqm().unwrap();

        let x = permutation_point(&problem, &[0, 1, 2, 3]);
        assert!((bqm.energy(&x) - 4.0).abs() < 1E-9);

        let x = permutation_point(&problem, &[0, 2, 1, 3]);
        assert!((bqm.energy(&x) - (2.0 + 2.0 * 2f64.sqrt())).abs() < 1E-9);
    }

    #[test]
    fn decode_valid_tour() {
        let problem = Tsp::new(square()).unwrap();
        let bqm = problem.build_bqm().unwrap();
        let x = permutation_point(&problem, &[3, 2, 1, 0]);

        let solution = problem.decode(&bqm, &x);
        assert_eq!(solution.tour, Some(vec![3, 2, 1, 0]));
        assert_eq!(solution.length, Some(4.0));
        assert!(check_all(&problem.constraints(&bqm).unwrap(), &x).is_feasible());
    }

    #[test]
    fn decode_duplicate_city() {
        let problem = Tsp::new(square()).unwrap();
        let bqm = problem.build_bqm().unwrap();
        let x = permutation_point(&problem, &[0, 1, 1, 3]);

        let solution = problem.decode(&bqm, &x);
        assert_eq!(solution.tour, None);
        assert_eq!(solution.positions[2], vec![1]);

        let feasibility = check_all(&problem.constraints(&bqm).unwrap(), &x);
        assert!(!feasibility.is_feasible());
    }

    #[test]
    fn ground_state_is_a_tour() {
        let cities = vec![
            City { x: 0.0, y: 0.0 },
            City { x: 3.0, y: 0.0 },
            City { x: 0.0, y: 4.0 },
        ];
        let problem = Tsp::new(cities).unwrap();
        let bqm = problem.build_bqm().unwrap();
        let (energy, x) = enumerate_solve(&bqm.to_qubo());

        let solution = problem.decode(&bqm, &x);
        assert_eq!(solution.length, Some(12.0));
        assert!((energy - 12.0).abs() < 1E-9);
    }
}
