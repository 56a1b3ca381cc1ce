//! Blocking client for a remote QUBO solver service.
//!
//! A problem is submitted with `POST {endpoint}/problems` and its status is polled with
//! `GET {endpoint}/problems/{id}` until it completes, fails, or the configured timeout runs out.
//! Each call to [`RemoteSampler::sample`] is one remotely billed job.

use crate::bqm::BinaryQuadraticModel;
use crate::config::RemoteConfig;
use crate::error::{HermesError, Result};
use crate::sampler::sample_set::{Sample, SampleSet};
use crate::sampler::Sampler;
use ndarray::Array1;
use reqwest::blocking::{Client, Response};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

const AUTH_HEADER: &str = "X-Auth-Token";

#[derive(Serialize, Debug)]
struct SubmitRequest<'a> {
    solver: &'a str,
    #[serde(rename = "type")]
    kind: &'static str,
    data: ProblemData,
    params: SubmitParams,
}

#[derive(Serialize, Debug)]
struct ProblemData {
    num_variables: usize,
    linear: Vec<(usize, f64)>,
    quadratic: Vec<(usize, usize, f64)>,
    offset: f64,
}

#[derive(Serialize, Debug)]
struct SubmitParams {
    num_reads: usize,
}

#[derive(Deserialize, Debug)]
struct JobStatus {
    id: String,
    status: String,
    #[serde(default)]
    answer: Option<Answer>,
    #[serde(default)]
    error_message: Option<String>,
}

#[derive(Deserialize, Debug)]
struct Answer {
    solutions: Vec<Vec<u8>>,
    energies: Vec<f64>,
    #[serde(default)]
    num_occurrences: Vec<usize>,
    #[serde(default)]
    timing: BTreeMap<String, f64>,
}

pub struct RemoteSampler {
    client: Client,
    config: RemoteConfig,
    token: Option<String>,
}

impl RemoteSampler {
    pub fn new(config: RemoteConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            config,
            token: None,
        })
    }

    /// Uses the given token instead of reading it from the environment
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    fn resolve_token(&self) -> Result<String> {
        if let Some(token) = &self.token {
            return Ok(token.clone());
        }

        std::env::var(&self.config.token_env)
            .ok()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                HermesError::Auth(format!(
                    "no API token found, set the {} environment variable",
                    self.config.token_env
                ))
            })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.endpoint.trim_end_matches('/'), path)
    }

    fn submit(
        &self,
        token: &str,
        bqm: &BinaryQuadraticModel,
        num_reads: usize,
    ) -> Result<JobStatus> {
        let request = SubmitRequest {
            solver: &self.config.solver,
            kind: "qubo",
            data: ProblemData {
                num_variables: bqm.num_variables(),
                linear: bqm.iter_linear().filter(|(_, b)| *b != 0.0).collect(),
                quadratic: bqm.iter_quadratic().filter(|(_, _, b)| *b != 0.0).collect(),
                offset: bqm.offset(),
            },
            params: SubmitParams { num_reads },
        };

        let response = self
            .client
            .post(self.url("problems"))
            .header(AUTH_HEADER, token)
            .json(&request)
            .send()?;

        Self::parse_status(response)
    }

    fn poll(&self, token: &str, id: &str) -> Result<JobStatus> {
        let response = self
            .client
            .get(self.url(&format!("problems/{id}")))
            .header(AUTH_HEADER, token)
            .send()?;

        Self::parse_status(response)
    }

    fn parse_status(response: Response) -> Result<JobStatus> {
        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(HermesError::Auth(format!(
                "solver service rejected the token ({})",
                response.status()
            ))),
            _ => Ok(response.error_for_status()?.json::<JobStatus>()?),
        }
    }

    /// Polls until the job reaches a final state and returns its answer
    fn wait_for_answer(&self, token: &str, mut status: JobStatus) -> Result<Answer> {
        let start = Instant::now();
        let timeout = Duration::from_secs(self.config.timeout_secs);
        let interval = Duration::from_millis(self.config.poll_interval_ms);

        loop {
            match status.status.as_str() {
                "COMPLETED" => {
                    return status.answer.ok_or_else(|| {
                        HermesError::Remote(format!(
                            "job {} completed without an answer",
                            status.id
                        ))
                    })
                }
                "FAILED" | "CANCELLED" => {
                    return Err(HermesError::Remote(format!(
                        "job {} {}: {}",
                        status.id,
                        status.status.to_lowercase(),
                        status.error_message.unwrap_or_else(|| "no reason given".into())
                    )))
                }
                other => debug!(job = %status.id, status = other, "job not finished"),
            }

            if start.elapsed() >= timeout {
                return Err(HermesError::Timeout(timeout));
            }

            std::thread::sleep(interval);
            status = self.poll(token, &status.id)?;
        }
    }

    /// Checks the shape of an answer and turns it into samples, energies are recomputed from the model
    fn answer_to_samples(bqm: &BinaryQuadraticModel, answer: Answer) -> Result<Vec<Sample>> {
        let num_x = bqm.num_variables();

        if answer.energies.len() != answer.solutions.len() {
            return Err(HermesError::Remote(format!(
                "answer has {} solutions but {} energies",
                answer.solutions.len(),
                answer.energies.len()
            )));
        }

        let mut samples = Vec::with_capacity(answer.solutions.len());

        let answers = answer.solutions.into_iter().zip(answer.energies);
        for (k, (solution, reported)) in answers.enumerate() {
            if solution.len() != num_x || solution.iter().any(|v| *v > 1) {
                return Err(HermesError::Remote(format!(
                    "solution {k} is not a binary vector of length {num_x}"
                )));
            }

            let x = solution.into_iter().map(usize::from).collect::<Array1<usize>>();
            let energy = bqm.energy(&x);

            if (energy - reported).abs() > 1E-6 * energy.abs().max(1.0) {
                warn!(
                    solution = k,
                    reported,
                    local = energy,
                    "reported energy differs from the model"
                );
            }

            samples.push(Sample {
                x,
                energy,
                num_occurrences: answer.num_occurrences.get(k).copied().unwrap_or(1),
            });
        }

        Ok(samples)
    }
}

impl Sampler for RemoteSampler {
    fn name(&self) -> &str {
        &self.config.solver
    }

    fn sample(&mut self, bqm: &BinaryQuadraticModel, num_reads: usize) -> Result<SampleSet> {
        let token = self.resolve_token()?;

        let status = self.submit(&token, bqm, num_reads)?;
        info!(job = %status.id, solver = %self.config.solver, num_reads, "submitted remote job");

        let answer = self.wait_for_answer(&token, status)?;
        let timing = answer.timing.clone();
        let samples = Self::answer_to_samples(bqm, answer)?;

        if samples.is_empty() {
            return Err(HermesError::Remote("answer contains no solutions".into()));
        }

        Ok(SampleSet::from_samples(bqm.labels().to_vec(), samples).with_timing(timing))
    }
}

#[cfg(test)]
mod tests {
    use crate::bqm::BinaryQuadraticModel;
    use crate::sampler::remote::{Answer, RemoteSampler};
    use std::collections::BTreeMap;

    fn make_bqm() -> BinaryQuadraticModel {
        let mut bqm = BinaryQuadraticModel::new();
        bqm.add_linear("a", -1.0);
        bqm.add_linear("b", 1.0);
        bqm
    }

    #[test]
    fn answer_energies_are_recomputed() {
        let answer = Answer {
            solutions: vec![vec![1, 0], vec![1, 1]],
            energies: vec![-5.0, 0.0],
            num_occurrences: vec![3],
            timing: BTreeMap::new(),
        };

        let samples = RemoteSampler::answer_to_samples(&make_bqm(), answer).unwrap();
        assert_eq!(samples[0].energy, -1.0);
        assert_eq!(samples[0].num_occurrences, 3);
        assert_eq!(samples[1].num_occurrences, 1);
    }

    #[test]
    fn malformed_answers_are_rejected() {
        let short = Answer {
            solutions: vec![vec![1]],
            energies: vec![0.0],
            num_occurrences: vec![],
            timing: BTreeMap::new(),
        };
        assert!(RemoteSampler::answer_to_samples(&make_bqm(), short).is_err());

        let non_binary = Answer {
            solutions: vec![vec![1, 2]],
            energies: vec![0.0],
            num_occurrences: vec![],
            timing: BTreeMap::new(),
        };
        assert!(RemoteSampler::answer_to_samples(&make_bqm(), non_binary).is_err());

        let mismatched = Answer {
            solutions: vec![vec![1, 0]],
            energies: vec![],
            num_occurrences: vec![],
            timing: BTreeMap::new(),
        };
        assert!(RemoteSampler::answer_to_samples(&make_bqm(), mismatched).is_err());
    }
}
