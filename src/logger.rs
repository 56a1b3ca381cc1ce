use crate::bqm::BinaryQuadraticModel;
use crate::job::JobReport;
use crate::sampler::SampleSet;
use std::time::Duration;

/// This is the main logic behind the run output
///
/// It has varying levels of output, where 0 means nothing is displayed to the screen, and each
/// additional level includes everything previous
///
/// 0 - Nothing
/// 1 - Header and Summary
/// 2 - Each Sampler Call
///
pub struct SolverOutputLogger {
    pub output_level: usize,
}

impl SolverOutputLogger {
    pub const fn new(level: usize) -> Self {
        Self {
            output_level: level,
        }
    }

    pub fn output_header(&self, problem: &str, sampler: &str, bqm: &BinaryQuadraticModel) {
        if self.output_level < 1 {
            return;
        }

        let version_number = env!("CARGO_PKG_VERSION");
        let num_variables = bqm.num_variables();
        let num_interactions = bqm.num_interactions();

        println!("Hermes: QUBO formulations for remote and local samplers");
        println!("Version number {version_number}");
        println!("Problem: {problem}");
        println!("Sampler: {sampler}");
        println!("Variables: {num_variables}");
        println!("Interactions: {num_interactions}");

        if self.output_level >= 2 {
            println!("------------------------------------------------------");
            println!("Attempt | Distinct Samples | Lowest Energy | Time (s)");
        }
    }

    pub fn output_attempt_line(&self, attempt: usize, samples: &SampleSet, elapsed: Duration) {
        if self.output_level < 2 {
            return;
        }

        let distinct = samples.len();
        let lowest = samples.lowest().map_or(f64::NAN, |s| s.energy);
        let seconds = elapsed.as_secs_f64();
        println!("{attempt} | {distinct} | {lowest} | {seconds:.3}");
    }

    pub fn output_summary<S>(&self, report: &JobReport<S>, description: &str) {
        if self.output_level < 1 {
            return;
        }

        println!("------------------------------------------------------");
        println!("{description}");
        println!("Feasibility: {}", report.feasibility);
        if !report.feasibility.is_feasible() {
            println!("Warning: the returned solution violates the problem constraints");
        }
        println!("Energy: {}", report.energy);
        println!("Sample: {}", report.bit_string);
        println!("Attempts: {}", report.attempts);
        println!("Jobs submitted: {}", report.jobs_submitted);
        println!("Model build time: {:.6} s", report.build_time.as_secs_f64());
        println!("Sampling time: {:.6} s", report.sample_time.as_secs_f64());
        println!("Total time: {:.6} s", report.total_time.as_secs_f64());
        println!("------------------------------------------------------");
    }
}

/// Installs the global tracing subscriber, `RUST_LOG` takes precedence over the verbosity flag
pub fn init_logger(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let default = if verbose { "hermes=debug" } else { "hermes=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    // a second call, e.g. from tests, keeps the first subscriber
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .compact()
        .try_init();
}
