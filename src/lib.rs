//! # Hermes
//!
//! Formulates combinatorial problems (knapsack, traveling salesperson, graph partitioning) as binary
//! quadratic models, hands them to a sampler, and decodes and checks what comes back.
//!
//! Samplers can be an exact enumeration, a local search heuristic, or a remote solver service
//! reached over HTTP.

pub mod bqm;
pub mod config;
pub mod constraint;
pub mod dataset;
pub mod error;
pub mod initial_points;
pub mod job;
pub mod local_search;
pub mod local_search_utils;
pub mod logger;
pub mod problems;
pub mod qubo;
pub mod sampler;
pub mod utils;

pub use bqm::BinaryQuadraticModel;
pub use config::RunOptions;
pub use error::{HermesError, Result};
pub use job::{JobReport, JobRunner};
pub use qubo::Qubo;
