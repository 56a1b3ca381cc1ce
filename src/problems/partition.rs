//! Balanced two-way graph partitioning as a QUBO.
//!
//! Variable `x_{v}` puts node v into the second part. An edge is cut when its endpoints differ, which
//! is `x_u + x_v - 2 x_u x_v`, and the balance penalty `gamma (sum x - n / 2)^2` keeps the parts even.

use crate::bqm::BinaryQuadraticModel;
use crate::constraint::Constraint;
use crate::dataset::Edge;
use crate::error::{HermesError, Result};
use crate::problems::{value_of, variable_index, Problem};
use ndarray::Array1;
use tracing::debug;

#[derive(Clone, Debug)]
pub struct GraphPartition {
    num_nodes: usize,
    edges: Vec<Edge>,
    balance_strength: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PartitionSolution {
    pub part_a: Vec<usize>,
    pub part_b: Vec<usize>,
    pub cut_weight: f64,
}

impl GraphPartition {
    /// Creates an instance, the node count defaults to one past the largest endpoint
    pub fn new(edges: Vec<Edge>, num_nodes: Option<usize>) -> Result<Self> {
        if let Some(edge) = edges.iter().find(|e| e.u == e.v) {
            return Err(HermesError::InvalidProblem(format!("self loop on node {}", edge.u)));
        }

        if edges.iter().any(|e| !e.weight.is_finite()) {
            return Err(HermesError::InvalidProblem("edge weights must be finite".into()));
        }

        let implied = edges.iter().map(|e| e.u.max(e.v) + 1).max().unwrap_or(0);
        let num_nodes = match num_nodes {
            Some(n) if n < implied => {
                return Err(HermesError::InvalidProblem(format!(
                    "edges reference node {} but only {n} nodes were given",
                    implied - 1
                )))
            }
            Some(n) => n,
            None => implied,
        };

        if num_nodes < 2 {
            return Err(HermesError::InvalidProblem(
                "partitioning needs at least 2 nodes".into(),
            ));
        }

        let mut problem = Self {
            num_nodes,
            edges,
            balance_strength: 0.0,
        };
        problem.balance_strength = problem.max_weighted_degree() + 1.0;

        Ok(problem)
    }

    /// Overrides the weight of the balance penalty
    pub fn with_balance_strength(mut self, strength: f64) -> Result<Self> {
        if !strength.is_finite() || strength <= 0.0 {
            return Err(HermesError::InvalidProblem(format!(
                "balance strength must be positive, got {strength}"
            )));
        }

        self.balance_strength = strength;
        Ok(self)
    }

    pub const fn num_nodes(&self) -> usize {
        self.num_nodes
    }

    pub const fn balance_strength(&self) -> f64 {
        self.balance_strength
    }

    /// Largest sum of absolute incident edge weights over all nodes
    pub fn max_weighted_degree(&self) -> f64 {
        let mut degree = vec![0.0; self.num_nodes];
        for e in &self.edges {
            degree[e.u] += e.weight.abs();
            degree[e.v] += e.weight.abs();
        }
        degree.into_iter().fold(0.0, f64::max)
    }

    /// Total weight of the edges whose endpoints are on different sides
    pub fn cut_weight(&self, side: &[usize]) -> f64 {
        self.edges
            .iter()
            .filter(|e| side[e.u] != side[e.v])
            .map(|e| e.weight)
            .sum()
    }

    fn label(v: usize) -> String {
        format!("x_{v}")
    }
}

impl Problem for GraphPartition {
    type Solution = PartitionSolution;

    fn name(&self) -> &'static str {
        "partition"
    }

    fn build_bqm(&self) -> Result<BinaryQuadraticModel> {
        let n = self.num_nodes;
        let gamma = self.balance_strength;
        let mut bqm = BinaryQuadraticModel::new();

        for v in 0..n {
            bqm.add_variable(&Self::label(v));
        }

        // cut weight
        for e in &self.edges {
            let (u, v) = (Self::label(e.u), Self::label(e.v));
            bqm.add_linear(&u, e.weight);
            bqm.add_linear(&v, e.weight);
            bqm.add_quadratic(&u, &v, -2.0 * e.weight);
        }

        // gamma (S - n/2)^2 = gamma ((1 - n) sum x + 2 sum_{i<j} x_i x_j + n^2 / 4)
        let half = n as f64 / 2.0;
        for i in 0..n {
            bqm.add_linear(&Self::label(i), gamma * (1.0 - n as f64));
            for j in (i + 1)..n {
                bqm.add_quadratic(&Self::label(i), &Self::label(j), 2.0 * gamma);
            }
        }
        bqm.add_offset(gamma * half * half);

        debug!(
            nodes = n,
            edges = self.edges.len(),
            interactions = bqm.num_interactions(),
            "built partition model"
        );

        Ok(bqm)
    }

    fn constraints(&self, bqm: &BinaryQuadraticModel) -> Result<Vec<Constraint>> {
        let terms = (0..self.num_nodes)
            .map(|v| Ok((variable_index(bqm, &Self::label(v))?, 1.0)))
            .collect::<Result<Vec<_>>>()?;

        let lower = (self.num_nodes / 2) as f64;
        let upper = self.num_nodes.div_ceil(2) as f64;

        Ok(vec![Constraint::between("balance", terms, lower, upper)])
    }

    fn decode(&self, bqm: &BinaryQuadraticModel, x: &Array1<usize>) -> PartitionSolution {
        let side = (0..self.num_nodes)
            .map(|v| value_of(bqm, x, &Self::label(v)))
            .collect::<Vec<_>>();

        let (part_b, part_a): (Vec<usize>, Vec<usize>) =
            (0..self.num_nodes).partition(|&v| side[v] == 1);

        PartitionSolution {
            part_a,
            part_b,
            cut_weight: self.cut_weight(&side),
        }
    }

    fn describe(&self, solution: &PartitionSolution) -> String {
        format!(
            "Part A ({} nodes): {:?}\nPart B ({} nodes): {:?}\nCut weight: {}",
            solution.part_a.len(),
            solution.part_a,
            solution.part_b.len(),
            solution.part_b,
            solution.cut_weight
        )
    }
}

#[cfg(test)]
mod tests {
    use crate::constraint::check_all;
    use crate::dataset::Edge;
    use crate::problems::partition::GraphPartition;
    use crate::problems::Problem;
    use crate::sampler::exact::enumerate_solve;
    use ndarray::Array1;

    fn edge(u: usize, v: usize) -> Edge {
        Edge { u, v, weight: 1.0 }
    }

    /// two triangles joined by a single bridge
    fn two_triangles() -> Vec<Edge> {
        vec![
            edge(0, 1),
            edge(1, 2),
            edge(0, 2),
            edge(3, 4),
            edge(4, 5),
            edge(3, 5),
            edge(2, 3),
        ]
    }

    #[test]
    fn invalid_graphs_are_rejected() {
        assert!(GraphPartition::new(vec![edge(1, 1)], None).is_err());
        assert!(GraphPartition::new(vec![edge(0, 4)], Some(3)).is_err());
        assert!(GraphPartition::new(vec![], None).is_err());
    }

    #[test]
    fn balanced_energy_is_cut_weight() {
        let problem = GraphPartition::new(two_triangles(), None).unwrap();
        let bqm = problem.build_bqm().unwrap();
        let x = Array1::from_vec(vec![0, 0, 0, 1, 1, 1]);

        assert!((bqm.energy(&x) - 1.0).abs() < 1E-9);
    }

    #[test]
    fn ground_state_cuts_the_bridge() {
        let problem = GraphPartition::new(two_triangles(), None).unwrap();
        let bqm = problem.build_bqm().unwrap();
        let (_, x) = enumerate_solve(&bqm.to_qubo());

        let mut solution = problem.decode(&bqm, &x);
        solution.part_a.sort_unstable();

        assert_eq!(solution.cut_weight, 1.0);
        assert!(solution.part_a == vec![0, 1, 2] || solution.part_a == vec![3, 4, 5]);
        assert!(check_all(&problem.constraints(&bqm).unwrap(), &x).is_feasible());
    }

    #[test]
    fn odd_node_count_allows_off_by_one() {
        let problem = GraphPartition::new(vec![edge(0, 1), edge(1, 2)], None).unwrap();
        let bqm = problem.build_bqm().unwrap();
        let constraints = problem.constraints(&bqm).unwrap();

        assert!(check_all(&constraints, &Array1::from_vec(vec![1, 0, 0])).is_feasible());
        assert!(check_all(&constraints, &Array1::from_vec(vec![1, 1, 0])).is_feasible());
        assert!(!check_all(&constraints, &Array1::from_vec(vec![1, 1, 1])).is_feasible());
    }

    #[test]
    fn isolated_nodes_get_variables() {
        let problem = GraphPartition::new(vec![edge(0, 1)], Some(4)).unwrap();
        let bqm = problem.build_bqm().unwrap();

        assert_eq!(bqm.num_variables(), 4);
        assert_eq!(problem.max_weighted_degree(), 1.0);
    }
}
