use crate::error::{HermesError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Which sampler a run submits its model to
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SamplerKind {
    Exact,
    Local,
    Remote,
}

/// Connection settings of the remote solver service
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    pub endpoint: String,
    pub solver: String,
    pub token_env: String,
    pub poll_interval_ms: u64,
    pub timeout_secs: u64,
    pub request_timeout_secs: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            solver: "qpu".to_string(),
            token_env: "HERMES_API_TOKEN".to_string(),
            poll_interval_ms: 1000,
            timeout_secs: 600,
            request_timeout_secs: 60,
        }
    }
}

/// Penalty weights that replace the per problem defaults when set
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PenaltyOverrides {
    pub knapsack_lagrange: Option<f64>,
    pub tsp_constraint_strength: Option<f64>,
    pub partition_balance_strength: Option<f64>,
}

/// Options for a run, read from a TOML file and then overridden from the command line
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunOptions {
    pub sampler: SamplerKind,
    pub num_reads: usize,
    pub seed: u64,
    pub max_retries: usize,
    pub max_jobs: usize,
    pub verbose: usize,
    pub threads: usize,
    pub swarm_particles: usize,
    pub swarm_steps: usize,
    pub penalties: PenaltyOverrides,
    pub remote: RemoteConfig,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl RunOptions {
    pub fn new() -> Self {
        Self {
            sampler: SamplerKind::Local,
            num_reads: 100,
            seed: 12_345_679,
            max_retries: 2,
            max_jobs: 3,
            verbose: 1,
            threads: 1,
            swarm_particles: 0,
            swarm_steps: 100,
            penalties: PenaltyOverrides::default(),
            remote: RemoteConfig::default(),
        }
    }

    /// Reads options from a TOML file, missing keys keep their defaults
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Checks the options are usable before anything is built or submitted
    pub fn validate(&self) -> Result<()> {
        if self.num_reads == 0 {
            return Err(HermesError::Config("num_reads must be at least 1".into()));
        }

        if self.max_jobs == 0 {
            return Err(HermesError::Config("max_jobs must be at least 1".into()));
        }

        if self.threads == 0 {
            return Err(HermesError::Config("threads must be at least 1".into()));
        }

        let penalties = [
            ("knapsack_lagrange", self.penalties.knapsack_lagrange),
            ("tsp_constraint_strength", self.penalties.tsp_constraint_strength),
            ("partition_balance_strength", self.penalties.partition_balance_strength),
        ];
        for (name, value) in penalties {
            if let Some(v) = value {
                if !v.is_finite() || v <= 0.0 {
                    return Err(HermesError::Config(format!("{name} must be positive, got {v}")));
                }
            }
        }

        if self.sampler == SamplerKind::Remote {
            let endpoint = self.remote.endpoint.trim();
            if endpoint.is_empty() {
                return Err(HermesError::Config(
                    "the remote sampler needs remote.endpoint to be set".into(),
                ));
            }

            if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
                return Err(HermesError::Config(format!(
                    "remote.endpoint must be an http(s) URL, got {endpoint}"
                )));
            }

            if self.remote.poll_interval_ms == 0 {
                return Err(HermesError::Config(
                    "remote.poll_interval_ms must be at least 1".into(),
                ));
            }

            if self.remote.request_timeout_secs == 0 {
                return Err(HermesError::Config(
                    "remote.request_timeout_secs must be at least 1".into(),
                ));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::config::{RunOptions, SamplerKind};
    use clap::ValueEnum;

    #[test]
    fn defaults_are_valid() {
        let options = RunOptions::new();
        assert!(options.validate().is_ok());
        assert_eq!(options.sampler, SamplerKind::Local);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let options = RunOptions::from_toml_str(
            r#"
            sampler = "remote"
            num_reads = 250

            [penalties]
            knapsack_lagrange = 60.0

            [remote]
            endpoint = "https://solver.example.com/v1"
            "#,
        )
        .unwrap();

        assert_eq!(options.sampler, SamplerKind::Remote);
        assert_eq!(options.num_reads, 250);
        assert_eq!(options.max_retries, 2);
        assert_eq!(options.penalties.knapsack_lagrange, Some(60.0));
        assert_eq!(options.remote.token_env, "HERMES_API_TOKEN");
        assert!(options.validate().is_ok());
    }

    #[test]
    fn bad_toml_is_an_error() {
        assert!(RunOptions::from_toml_str("sampler = \"quantum\"").is_err());
        assert!(RunOptions::from_toml_str("num_reads = \"many\"").is_err());
    }

    #[test]
    fn invalid_options_are_rejected() {
        let mut options = RunOptions::new();
        options.num_reads = 0;
        assert!(options.validate().is_err());

        let mut options = RunOptions::new();
        options.sampler = SamplerKind::Remote;
        assert!(options.validate().is_err());

        options.remote.endpoint = "ftp://solver".into();
        assert!(options.validate().is_err());

        let mut options = RunOptions::new();
        options.penalties.tsp_constraint_strength = Some(-1.0);
        assert!(options.validate().is_err());
    }

    #[test]
    fn remote_timings_must_be_positive() {
        let mut options = RunOptions::new();
        options.sampler = SamplerKind::Remote;
        options.remote.endpoint = "https://solver.example.com/v1".into();
        assert!(options.validate().is_ok());

        options.remote.poll_interval_ms = 0;
        assert!(options.validate().is_err());

        options.remote.poll_interval_ms = 500;
        options.remote.request_timeout_secs = 0;
        assert!(options.validate().is_err());

        // only checked when the remote sampler is used
        options.sampler = SamplerKind::Local;
        assert!(options.validate().is_ok());
    }

    #[test]
    fn sampler_names_are_parsed() {
        assert_eq!(SamplerKind::from_str("exact", true), Ok(SamplerKind::Exact));
        assert_eq!(SamplerKind::from_str("Remote", true), Ok(SamplerKind::Remote));
        assert!(SamplerKind::from_str("annealer", true).is_err());

        let names = SamplerKind::value_variants()
            .iter()
            .filter_map(|kind| kind.to_possible_value())
            .map(|value| value.get_name().to_string())
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["exact", "local", "remote"]);
    }
}
