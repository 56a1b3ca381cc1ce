//! Error type shared by every stage of a run, from reading the dataset to talking to a remote solver.

use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum HermesError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Config file could not be parsed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Dataset error on line {line}: {message}")]
    Dataset { line: usize, message: String },

    #[error("Invalid problem: {0}")]
    InvalidProblem(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Remote solver error: {0}")]
    Remote(String),

    #[error("Remote job did not finish within {0:?}")]
    Timeout(Duration),

    #[error("Job budget exhausted after {jobs} submitted jobs without any usable sample")]
    BudgetExhausted { jobs: usize },
}

impl HermesError {
    /// Whether the sampler gave up before a job reached the solver, so nothing was billed
    pub const fn is_before_submit(&self) -> bool {
        matches!(self, Self::Auth(_) | Self::InvalidProblem(_) | Self::Config(_))
    }
}

pub type Result<T> = std::result::Result<T, HermesError>;

#[cfg(test)]
mod tests {
    use crate::error::HermesError;
    use std::time::Duration;

    #[test]
    fn only_rejected_calls_are_before_submit() {
        assert!(HermesError::Auth("no token".into()).is_before_submit());
        assert!(HermesError::InvalidProblem("too large".into()).is_before_submit());
        assert!(!HermesError::Timeout(Duration::from_secs(1)).is_before_submit());
        assert!(!HermesError::Remote("failed".into()).is_before_submit());
    }
}
