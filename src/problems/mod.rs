//! Problem families that can be formulated as a binary quadratic model.
//!
//! Each family knows how to build its model, which linear constraints a sample has to satisfy to be
//! usable, and how to turn a sample back into a human readable answer.

use crate::bqm::BinaryQuadraticModel;
use crate::constraint::Constraint;
use crate::error::{HermesError, Result};
use ndarray::Array1;

pub mod knapsack;
pub mod partition;
pub mod tsp;

pub use knapsack::{Knapsack, KnapsackSolution};
pub use partition::{GraphPartition, PartitionSolution};
pub use tsp::{Tsp, TspSolution};

pub trait Problem {
    type Solution: std::fmt::Debug + Clone;

    fn name(&self) -> &'static str;

    /// Formulates the problem as an unconstrained model
    fn build_bqm(&self) -> Result<BinaryQuadraticModel>;

    /// Constraints a sample of `bqm` has to satisfy to be a valid answer
    fn constraints(&self, bqm: &BinaryQuadraticModel) -> Result<Vec<Constraint>>;

    /// Turns a sample of `bqm` into an answer, infeasible samples are decoded as they are
    fn decode(&self, bqm: &BinaryQuadraticModel, x: &Array1<usize>) -> Self::Solution;

    /// One or more lines summarising an answer
    fn describe(&self, solution: &Self::Solution) -> String;
}

/// Looks up the index of a variable the problem itself put into the model
pub(crate) fn variable_index(bqm: &BinaryQuadraticModel, label: &str) -> Result<usize> {
    bqm.index_of(label).ok_or_else(|| {
        HermesError::InvalidProblem(format!("variable {label} is missing from the model"))
    })
}

/// Value of a labeled variable in a sample, absent variables read as 0
pub(crate) fn value_of(bqm: &BinaryQuadraticModel, x: &Array1<usize>, label: &str) -> usize {
    bqm.index_of(label).map_or(0, |i| x[i])
}
