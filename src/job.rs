//! Runs a problem end to end: build the model, sample it, decode and check the answer.
//!
//! When no returned sample satisfies the constraints the model is sampled again, up to
//! `max_retries` extra times. Every sampler call is recorded in a [`JobLedger`], which refuses new
//! calls once `max_jobs` have been submitted, since each remote call is a separately billed job.

use crate::bqm::BinaryQuadraticModel;
use crate::config::RunOptions;
use crate::constraint::{check_all, Feasibility};
use crate::error::{HermesError, Result};
use crate::logger::SolverOutputLogger;
use crate::problems::Problem;
use crate::sampler::{Sample, Sampler};
use crate::utils::bit_string;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Running account of the sampler calls made by a runner
#[derive(Clone, Debug, PartialEq)]
pub struct JobLedger {
    pub jobs_submitted: usize,
    pub reads_requested: usize,
    pub sampler_time: Duration,
    max_jobs: usize,
}

impl JobLedger {
    pub const fn new(max_jobs: usize) -> Self {
        Self {
            jobs_submitted: 0,
            reads_requested: 0,
            sampler_time: Duration::ZERO,
            max_jobs,
        }
    }

    pub const fn can_submit(&self) -> bool {
        self.jobs_submitted < self.max_jobs
    }

    pub const fn remaining(&self) -> usize {
        self.max_jobs.saturating_sub(self.jobs_submitted)
    }

    pub fn record(&mut self, reads: usize, elapsed: Duration) {
        self.jobs_submitted += 1;
        self.reads_requested += reads;
        self.sampler_time += elapsed;
    }
}

/// Everything a run produced, including how long each stage took
#[derive(Clone, Debug)]
pub struct JobReport<S> {
    pub problem: &'static str,
    pub sampler: String,
    pub solution: S,
    pub feasibility: Feasibility,
    pub energy: f64,
    pub bit_string: String,
    pub attempts: usize,
    pub jobs_submitted: usize,
    pub num_variables: usize,
    pub num_interactions: usize,
    pub build_time: Duration,
    pub sample_time: Duration,
    pub total_time: Duration,
}

pub struct JobRunner {
    sampler: Box<dyn Sampler>,
    options: RunOptions,
    ledger: JobLedger,
    logger: SolverOutputLogger,
}

impl JobRunner {
    pub fn new(sampler: Box<dyn Sampler>, options: RunOptions) -> Self {
        let ledger = JobLedger::new(options.max_jobs);
        let logger = SolverOutputLogger::new(options.verbose);

        Self {
            sampler,
            options,
            ledger,
            logger,
        }
    }

    pub const fn ledger(&self) -> &JobLedger {
        &self.ledger
    }

    /// Runs the problem, returning the first feasible sample in energy order, or the lowest energy
    /// sample marked infeasible once the retries or the job budget are used up.
    ///
    /// A failed sampler call still counts against the job budget, unless it failed before
    /// anything was submitted. When a retry fails after an earlier attempt returned samples, the
    /// best of those is returned instead of the error.
    ///
    /// # Errors
    ///
    /// Fails if the model cannot be built, the first sampler call fails, or the budget is spent
    /// before any sample came back.
    pub fn run<P: Problem>(&mut self, problem: &P) -> Result<JobReport<P::Solution>> {
        let total_start = Instant::now();

        let build_start = Instant::now();
        let bqm = problem.build_bqm()?;
        let constraints = problem.constraints(&bqm)?;
        let build_time = build_start.elapsed();

        self.logger.output_header(problem.name(), self.sampler.name(), &bqm);

        let mut best_infeasible: Option<(Sample, Feasibility)> = None;
        let mut sample_time = Duration::ZERO;
        let mut attempts = 0;

        loop {
            if !self.ledger.can_submit() {
                warn!(
                    jobs = self.ledger.jobs_submitted,
                    "job budget exhausted, not submitting again"
                );
                break;
            }

            attempts += 1;
            let start = Instant::now();
            let result = self.sampler.sample(&bqm, self.options.num_reads);
            let elapsed = start.elapsed();
            sample_time += elapsed;

            if !matches!(result, Err(ref e) if e.is_before_submit()) {
                self.ledger.record(self.options.num_reads, elapsed);
            }

            let samples = match result {
                Ok(samples) => samples,
                Err(e) if best_infeasible.is_some() => {
                    warn!(
                        problem = problem.name(),
                        attempt = attempts,
                        error = %e,
                        "sampler failed on a retry, keeping the earlier samples"
                    );
                    break;
                }
                Err(e) => return Err(e),
            };
            self.logger.output_attempt_line(attempts, &samples, elapsed);

            info!(
                problem = problem.name(),
                attempt = attempts,
                distinct = samples.len(),
                elapsed_ms = elapsed.as_millis() as u64,
                "sampler returned"
            );

            let mut first_infeasible = None;
            for sample in samples.iter() {
                match check_all(&constraints, &sample.x) {
                    Feasibility::Feasible => {
                        let report = self.make_report(
                            problem,
                            &bqm,
                            sample,
                            Feasibility::Feasible,
                            attempts,
                            (build_time, sample_time, total_start),
                        );
                        return Ok(report);
                    }
                    infeasible => {
                        if first_infeasible.is_none() {
                            first_infeasible = Some((sample.clone(), infeasible));
                        }
                    }
                }
            }

            // keep the lowest energy infeasible sample over all attempts
            if let Some((sample, feasibility)) = first_infeasible {
                let better = best_infeasible
                    .as_ref()
                    .map_or(true, |(best, _)| sample.energy < best.energy);
                if better {
                    best_infeasible = Some((sample, feasibility));
                }
            }

            if attempts > self.options.max_retries {
                break;
            }

            warn!(
                problem = problem.name(),
                attempt = attempts,
                remaining_jobs = self.ledger.remaining(),
                "no feasible sample returned, sampling again"
            );
        }

        match best_infeasible {
            Some((sample, feasibility)) => {
                warn!(problem = problem.name(), attempts, "returning an infeasible solution");
                Ok(self.make_report(
                    problem,
                    &bqm,
                    &sample,
                    feasibility,
                    attempts,
                    (build_time, sample_time, total_start),
                ))
            }
            None => Err(HermesError::BudgetExhausted {
                jobs: self.ledger.jobs_submitted,
            }),
        }
    }

    fn make_report<P: Problem>(
        &self,
        problem: &P,
        bqm: &BinaryQuadraticModel,
        sample: &Sample,
        feasibility: Feasibility,
        attempts: usize,
        (build_time, sample_time, total_start): (Duration, Duration, Instant),
    ) -> JobReport<P::Solution> {
        let solution = problem.decode(bqm, &sample.x);

        let report = JobReport {
            problem: problem.name(),
            sampler: self.sampler.name().to_string(),
            solution,
            feasibility,
            energy: sample.energy,
            bit_string: bit_string(&sample.x),
            attempts,
            jobs_submitted: self.ledger.jobs_submitted,
            num_variables: bqm.num_variables(),
            num_interactions: bqm.num_interactions(),
            build_time,
            sample_time,
            total_time: total_start.elapsed(),
        };

        self.logger.output_summary(&report, &problem.describe(&report.solution));
        report
    }
}

#[cfg(test)]
mod tests {
    use crate::bqm::BinaryQuadraticModel;
    use crate::config::RunOptions;
    use crate::constraint::Constraint;
    use crate::error::{HermesError, Result};
    use crate::job::{JobLedger, JobRunner};
    use crate::problems::Problem;
    use crate::sampler::{SampleSet, Sampler};
    use ndarray::Array1;
    use std::cell::Cell;
    use std::rc::Rc;
    use std::time::Duration;

    /// Pick exactly one of two variables, the model itself prefers both
    struct PickOne;

    impl Problem for PickOne {
        type Solution = Vec<usize>;

        fn name(&self) -> &'static str {
            "pick-one"
        }

        fn build_bqm(&self) -> Result<BinaryQuadraticModel> {
            let mut bqm = BinaryQuadraticModel::new();
            bqm.add_linear("a", -1.0);
            bqm.add_linear("b", -1.0);
            Ok(bqm)
        }

        fn constraints(&self, _bqm: &BinaryQuadraticModel) -> Result<Vec<Constraint>> {
            Ok(vec![Constraint::exactly_one("one", &[0, 1])])
        }

        fn decode(&self, _bqm: &BinaryQuadraticModel, x: &Array1<usize>) -> Vec<usize> {
            x.to_vec()
        }

        fn describe(&self, solution: &Vec<usize>) -> String {
            format!("{solution:?}")
        }
    }

    /// What a scripted sampler call does
    #[derive(Clone)]
    enum Step {
        Points(Vec<Array1<usize>>),
        Fail(fn() -> HermesError),
    }

    /// Plays back a fixed list of steps, repeating the last one, and counts the calls
    struct ScriptedSampler {
        steps: Vec<Step>,
        calls: Rc<Cell<usize>>,
    }

    impl Sampler for ScriptedSampler {
        fn name(&self) -> &str {
            "scripted"
        }

        fn sample(&mut self, bqm: &BinaryQuadraticModel, _num_reads: usize) -> Result<SampleSet> {
            let call = self.calls.get();
            self.calls.set(call + 1);

            match &self.steps[call.min(self.steps.len() - 1)] {
                Step::Points(xs) => Ok(SampleSet::from_points(bqm, xs.clone())),
                Step::Fail(make_error) => Err(make_error()),
            }
        }
    }

    fn points(xs: &[[usize; 2]]) -> Step {
        Step::Points(xs.iter().map(|x| Array1::from_vec(x.to_vec())).collect())
    }

    fn timeout() -> HermesError {
        HermesError::Timeout(Duration::from_secs(1))
    }

    fn unauthorized() -> HermesError {
        HermesError::Auth("no token".into())
    }

    fn make_runner(
        steps: Vec<Step>,
        max_retries: usize,
        max_jobs: usize,
    ) -> (JobRunner, Rc<Cell<usize>>) {
        let calls = Rc::new(Cell::new(0));
        let sampler = ScriptedSampler {
            steps,
            calls: Rc::clone(&calls),
        };

        let mut options = RunOptions::new();
        options.verbose = 0;
        options.max_retries = max_retries;
        options.max_jobs = max_jobs;

        (JobRunner::new(Box::new(sampler), options), calls)
    }

    #[test]
    fn feasible_sample_below_lowest_energy_is_used() {
        let (mut runner, calls) = make_runner(vec![points(&[[1, 1], [0, 1]])], 2, 3);

        let report = runner.run(&PickOne).unwrap();

        assert!(report.feasibility.is_feasible());
        assert_eq!(report.solution, vec![0, 1]);
        assert_eq!(report.energy, -1.0);
        assert_eq!(report.bit_string, "01");
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn infeasible_answers_are_retried_a_bounded_number_of_times() {
        let (mut runner, calls) = make_runner(vec![points(&[[1, 1]])], 2, 10);

        let report = runner.run(&PickOne).unwrap();

        assert!(!report.feasibility.is_feasible());
        assert_eq!(report.attempts, 3);
        assert_eq!(calls.get(), 3);
        assert_eq!(runner.ledger().jobs_submitted, 3);
    }

    #[test]
    fn retry_can_recover() {
        let (mut runner, calls) = make_runner(vec![points(&[[1, 1]]), points(&[[1, 0]])], 2, 10);

        let report = runner.run(&PickOne).unwrap();

        assert!(report.feasibility.is_feasible());
        assert_eq!(report.attempts, 2);
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn job_budget_caps_retries() {
        let (mut runner, calls) = make_runner(vec![points(&[[0, 0]])], 100, 2);

        let report = runner.run(&PickOne).unwrap();
        assert_eq!(report.attempts, 2);
        assert_eq!(calls.get(), 2);

        // the ledger is shared across runs, nothing is left for a second one
        match runner.run(&PickOne) {
            Err(HermesError::BudgetExhausted { jobs }) => assert_eq!(jobs, 2),
            other => panic!("expected an exhausted budget, got {other:?}"),
        }
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn failed_jobs_count_against_the_budget() {
        let (mut runner, calls) = make_runner(vec![Step::Fail(timeout)], 2, 2);

        for _ in 0..2 {
            assert!(matches!(runner.run(&PickOne), Err(HermesError::Timeout(_))));
        }

        for _ in 0..3 {
            match runner.run(&PickOne) {
                Err(HermesError::BudgetExhausted { jobs }) => assert_eq!(jobs, 2),
                other => panic!("expected an exhausted budget, got {other:?}"),
            }
        }

        assert_eq!(calls.get(), 2);
        assert_eq!(runner.ledger().jobs_submitted, 2);
    }

    #[test]
    fn calls_rejected_before_submitting_are_not_counted() {
        let (mut runner, calls) = make_runner(vec![Step::Fail(unauthorized)], 2, 2);

        assert!(matches!(runner.run(&PickOne), Err(HermesError::Auth(_))));
        assert_eq!(calls.get(), 1);
        assert_eq!(runner.ledger().jobs_submitted, 0);
    }

    #[test]
    fn failed_retry_keeps_earlier_sample() {
        let steps = vec![points(&[[1, 1]]), Step::Fail(timeout)];
        let (mut runner, calls) = make_runner(steps, 3, 10);

        let report = runner.run(&PickOne).unwrap();

        assert!(!report.feasibility.is_feasible());
        assert_eq!(report.solution, vec![1, 1]);
        assert_eq!(report.attempts, 2);
        assert_eq!(calls.get(), 2);
        assert_eq!(runner.ledger().jobs_submitted, 2);
    }

    #[test]
    fn ledger_accounting() {
        let mut ledger = JobLedger::new(2);
        assert!(ledger.can_submit());

        ledger.record(100, Duration::from_millis(10));
        ledger.record(50, Duration::from_millis(5));

        assert!(!ledger.can_submit());
        assert_eq!(ledger.remaining(), 0);
        assert_eq!(ledger.reads_requested, 150);
        assert_eq!(ledger.sampler_time, Duration::from_millis(15));
    }
}
