//! 0/1 knapsack as a QUBO via a Lagrangian penalty on the capacity constraint.
//!
//! The unused capacity is carried by slack variables `s_k` with a binary encoding whose coefficients
//! sum to exactly the capacity, so the penalty
//!
//! $$ \lambda \left(\sum_i w_i x_i + \sum_k a_k s_k - W\right)^2 $$
//!
//! can reach zero for every feasible selection and never for an overweight one.

use crate::bqm::BinaryQuadraticModel;
use crate::constraint::Constraint;
use crate::dataset::Item;
use crate::error::{HermesError, Result};
use crate::problems::{value_of, variable_index, Problem};
use ndarray::Array1;
use tracing::debug;

/// Largest integer an `f64` weight or capacity holds exactly, 2^53
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

#[derive(Clone, Debug)]
pub struct Knapsack {
    items: Vec<Item>,
    capacity: u64,
    lagrange: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct KnapsackSolution {
    pub selected: Vec<usize>,
    pub total_cost: f64,
    pub total_weight: f64,
}

impl Knapsack {
    /// Creates an instance, weights and capacity have to be non-negative integers no larger than 2^53
    pub fn new(items: Vec<Item>, capacity: f64) -> Result<Self> {
        if items.is_empty() {
            return Err(HermesError::InvalidProblem("knapsack has no items".into()));
        }

        if !is_whole(capacity) {
            return Err(HermesError::InvalidProblem(format!(
                "capacity must be a non-negative integer up to 2^53, got {capacity}"
            )));
        }

        for (i, item) in items.iter().enumerate() {
            if !is_whole(item.weight) {
                return Err(HermesError::InvalidProblem(format!(
                    "weight of item {i} must be a non-negative integer up to 2^53, got {}",
                    item.weight
                )));
            }

            if !item.cost.is_finite() {
                return Err(HermesError::InvalidProblem(format!("cost of item {i} is not finite")));
            }
        }

        let lagrange = Self::default_lagrange(&items);

        Ok(Self {
            items,
            capacity: capacity as u64,
            lagrange,
        })
    }

    /// Overrides the Lagrange multiplier of the capacity penalty
    pub fn with_lagrange(mut self, lagrange: f64) -> Result<Self> {
        if !lagrange.is_finite() || lagrange <= 0.0 {
            return Err(HermesError::InvalidProblem(format!(
                "lagrange multiplier must be positive, got {lagrange}"
            )));
        }

        self.lagrange = lagrange;
        Ok(self)
    }

    /// One more than the largest cost, so dropping any item is cheaper than one unit of overweight
    pub fn default_lagrange(items: &[Item]) -> f64 {
        let max_cost = items.iter().map(|i| i.cost).fold(0.0, f64::max);
        max_cost + 1.0
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub const fn capacity(&self) -> u64 {
        self.capacity
    }

    pub const fn lagrange(&self) -> f64 {
        self.lagrange
    }

    /// Coefficients 1, 2, 4, ... plus a remainder, every integer in 0..=capacity is a subset sum
    pub fn slack_coefficients(capacity: u64) -> Vec<u64> {
        if capacity == 0 {
            return Vec::new();
        }

        let m = u64::BITS - 1 - capacity.leading_zeros();
        let mut coefficients = (0..m).map(|k| 1u64 << k).collect::<Vec<_>>();
        coefficients.push(capacity - ((1u64 << m) - 1));
        coefficients
    }

    fn item_label(i: usize) -> String {
        format!("x_{i}")
    }

    fn slack_label(k: usize) -> String {
        format!("s_{k}")
    }
}

impl Problem for Knapsack {
    type Solution = KnapsackSolution;

    fn name(&self) -> &'static str {
        "knapsack"
    }

    fn build_bqm(&self) -> Result<BinaryQuadraticModel> {
        let mut bqm = BinaryQuadraticModel::new();
        let lambda = self.lagrange;
        let cap = self.capacity as f64;

        // every variable of the penalty with its coefficient, items first so x_i has index i
        let mut terms = self
            .items
            .iter()
            .enumerate()
            .map(|(i, item)| (Self::item_label(i), item.weight))
            .collect::<Vec<_>>();

        terms.extend(
            Self::slack_coefficients(self.capacity)
                .into_iter()
                .enumerate()
                .map(|(k, a)| (Self::slack_label(k), a as f64)),
        );

        for (label, _) in &terms {
            bqm.add_variable(label);
        }

        // objective, maximise the cost
        for (i, item) in self.items.iter().enumerate() {
            bqm.add_linear(&Self::item_label(i), -item.cost);
        }

        // expanded penalty, lambda * (sum t_i y_i - W)^2
        for (i, (u, t_u)) in terms.iter().enumerate() {
            bqm.add_linear(u, lambda * (t_u * t_u - 2.0 * cap * t_u));

            for (v, t_v) in terms.iter().skip(i + 1) {
                bqm.add_quadratic(u, v, 2.0 * lambda * t_u * t_v);
            }
        }
        bqm.add_offset(lambda * cap * cap);

        debug!(
            items = self.items.len(),
            slack = terms.len() - self.items.len(),
            interactions = bqm.num_interactions(),
            "built knapsack model"
        );

        Ok(bqm)
    }

    fn constraints(&self, bqm: &BinaryQuadraticModel) -> Result<Vec<Constraint>> {
        let terms = self
            .items
            .iter()
            .enumerate()
            .map(|(i, item)| Ok((variable_index(bqm, &Self::item_label(i))?, item.weight)))
            .collect::<Result<Vec<_>>>()?;

        Ok(vec![Constraint::at_most("capacity", terms, self.capacity as f64)])
    }

    fn decode(&self, bqm: &BinaryQuadraticModel, x: &Array1<usize>) -> KnapsackSolution {
        let selected = (0..self.items.len())
            .filter(|&i| value_of(bqm, x, &Self::item_label(i)) == 1)
            .collect::<Vec<_>>();

        let total_cost = selected.iter().map(|&i| self.items[i].cost).sum();
        let total_weight = selected.iter().map(|&i| self.items[i].weight).sum();

        KnapsackSolution {
            selected,
            total_cost,
            total_weight,
        }
    }

    fn describe(&self, solution: &KnapsackSolution) -> String {
        format!(
            "Selected items: {:?}\nTotal cost: {}\nTotal weight: {} of {}",
            solution.selected, solution.total_cost, solution.total_weight, self.capacity
        )
    }
}

fn is_whole(v: f64) -> bool {
    v.is_finite() && (0.0..=MAX_EXACT_INTEGER).contains(&v) && v.fract() == 0.0
}

#[cfg(test)]
mod tests {
    use crate::constraint::check_all;
    use crate::dataset::Item;
    use crate::problems::knapsack::Knapsack;
    use crate::problems::Problem;
    use crate::sampler::exact::enumerate_solve;
    use ndarray::Array1;

    fn make_items() -> Vec<Item> {
        vec![
            Item { cost: 10.0, weight: 5.0 },
            Item { cost: 40.0, weight: 4.0 },
            Item { cost: 30.0, weight: 6.0 },
            Item { cost: 50.0, weight: 3.0 },
        ]
    }

    #[test]
    fn slack_covers_capacity_exactly() {
        for capacity in 0..40u64 {
            let a = Knapsack::slack_coefficients(capacity);
            assert_eq!(a.iter().sum::<u64>(), capacity);

            // every value in 0..=capacity is reachable
            let mut reachable = vec![false; capacity as usize + 1];
            for mask in 0..(1usize << a.len()) {
                let s: u64 = (0..a.len()).filter(|k| mask >> k & 1 == 1).map(|k| a[k]).sum();
                reachable[s as usize] = true;
            }
            assert!(reachable.iter().all(|r| *r));
        }
    }

    #[test]
    fn invalid_instances_are_rejected() {
        assert!(Knapsack::new(vec![], 5.0).is_err());
        assert!(Knapsack::new(make_items(), 5.5).is_err());
        assert!(Knapsack::new(vec![Item { cost: 1.0, weight: 1.5 }], 5.0).is_err());
        assert!(Knapsack::new(make_items(), 10.0).unwrap().with_lagrange(0.0).is_err());
    }

    #[test]
    fn values_beyond_exact_integers_are_rejected() {
        assert!(Knapsack::new(make_items(), 1E20).is_err());
        assert!(Knapsack::new(make_items(), f64::INFINITY).is_err());
        assert!(Knapsack::new(vec![Item { cost: 1.0, weight: 1E17 }], 5.0).is_err());
        assert!(Knapsack::new(make_items(), 9_007_199_254_740_992.0).is_ok());
    }

    #[test]
    fn slack_of_largest_capacity_does_not_overflow() {
        let a = Knapsack::slack_coefficients(u64::MAX);

        assert_eq!(a.len(), 64);
        assert_eq!(a[63], 1u64 << 63);
        assert_eq!(a.iter().fold(0u64, |acc, c| acc.checked_add(*c).unwrap()), u64::MAX);
    }

    #[test]
    fn feasible_selection_has_negative_cost_energy() {
        let problem = Knapsack::new(make_items(), 10.0).unwrap();
        let bqm = problem.build_bqm().unwrap();

        // items 1 and 3 weigh 7, slack has to make up the remaining 3 with coefficients [1, 2, 4, 3]
        let mut x = Array1::zeros(bqm.num_variables());
        x[bqm.index_of("x_1").unwrap()] = 1;
        x[bqm.index_of("x_3").unwrap()] = 1;
        x[bqm.index_of("s_3").unwrap()] = 1;

        assert!((bqm.energy(&x) + 90.0).abs() < 1E-9);
    }

    #[test]
    fn ground_state_is_optimal_selection() {
        let problem = Knapsack::new(make_items(), 10.0).unwrap();
        let bqm = problem.build_bqm().unwrap();
        let (energy, x) = enumerate_solve(&bqm.to_qubo());

        let solution = problem.decode(&bqm, &x);
        let constraints = problem.constraints(&bqm).unwrap();

        assert_eq!(solution.selected, vec![1, 3]);
        assert_eq!(solution.total_cost, 90.0);
        assert!((energy + 90.0).abs() < 1E-9);
        assert!(check_all(&constraints, &x).is_feasible());
    }

    #[test]
    fn overweight_selection_is_infeasible() {
        let problem = Knapsack::new(make_items(), 10.0).unwrap();
        let bqm = problem.build_bqm().unwrap();
        let constraints = problem.constraints(&bqm).unwrap();

        let mut x = Array1::zeros(bqm.num_variables());
        x[0] = 1;
        x[2] = 1;

        assert!(!check_all(&constraints, &x).is_feasible());
        assert_eq!(problem.decode(&bqm, &x).total_weight, 11.0);
    }
}
