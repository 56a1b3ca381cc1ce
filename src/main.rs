use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use hermes::config::{RunOptions, SamplerKind};
use hermes::dataset;
use hermes::job::JobRunner;
use hermes::problems::{GraphPartition, Knapsack, Problem, Tsp};
use hermes::sampler::make_sampler;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "hermes")]
#[command(about = "Formulate combinatorial problems as QUBOs and solve them with a sampler")]
#[command(version)]
struct Cli {
    /// TOML file with run options, command line flags take precedence
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[arg(short, long, help = "Enable verbose output")]
    verbose: bool,

    #[command(flatten)]
    overrides: Overrides,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct Overrides {
    #[arg(long, global = true, value_enum)]
    sampler: Option<SamplerKind>,

    #[arg(long, global = true)]
    reads: Option<usize>,

    #[arg(long, global = true)]
    seed: Option<u64>,

    #[arg(long, global = true)]
    max_retries: Option<usize>,

    #[arg(long, global = true)]
    max_jobs: Option<usize>,

    #[arg(long, global = true)]
    threads: Option<usize>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// 0-1 knapsack from a cost,weight CSV
    Knapsack {
        #[arg(long)]
        data: PathBuf,

        #[arg(long)]
        capacity: f64,
    },
    /// Traveling salesperson tour from an x,y CSV of cities
    Tsp {
        #[arg(long)]
        data: PathBuf,
    },
    /// Balanced two way partition from a u,v,weight CSV of edges
    Partition {
        #[arg(long)]
        data: PathBuf,

        /// number of nodes, defaults to the largest node id plus one
        #[arg(long)]
        nodes: Option<usize>,
    },
}

fn load_options(cli: &Cli) -> anyhow::Result<RunOptions> {
    let mut options = match &cli.config {
        Some(path) => RunOptions::from_toml_file(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?,
        None => RunOptions::new(),
    };

    let o = &cli.overrides;
    if let Some(kind) = o.sampler {
        options.sampler = kind;
    }
    options.num_reads = o.reads.unwrap_or(options.num_reads);
    options.seed = o.seed.unwrap_or(options.seed);
    options.max_retries = o.max_retries.unwrap_or(options.max_retries);
    options.max_jobs = o.max_jobs.unwrap_or(options.max_jobs);
    options.threads = o.threads.unwrap_or(options.threads);
    if cli.verbose {
        options.verbose = options.verbose.max(2);
    }

    options.validate()?;
    Ok(options)
}

fn solve<P: Problem>(problem: &P, options: RunOptions) -> anyhow::Result<()> {
    let sampler = make_sampler(&options)?;
    let mut runner = JobRunner::new(sampler, options);
    let report = runner.run(problem)?;

    tracing::info!(
        problem = report.problem,
        sampler = %report.sampler,
        feasible = report.feasibility.is_feasible(),
        energy = report.energy,
        attempts = report.attempts,
        total_ms = report.total_time.as_millis() as u64,
        "run finished"
    );

    Ok(())
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let options = load_options(&cli)?;

    rayon::ThreadPoolBuilder::new()
        .num_threads(options.threads)
        .build_global()
        .context("failed to build the thread pool")?;

    let penalties = options.penalties.clone();

    match &cli.command {
        Command::Knapsack { data, capacity } => {
            let items = dataset::read_items(data)
                .with_context(|| format!("failed to load items from {}", data.display()))?;
            let mut problem = Knapsack::new(items, *capacity)?;
            if let Some(lagrange) = penalties.knapsack_lagrange {
                problem = problem.with_lagrange(lagrange)?;
            }
            solve(&problem, options)
        }
        Command::Tsp { data } => {
            let cities = dataset::read_cities(data)
                .with_context(|| format!("failed to load cities from {}", data.display()))?;
            let mut problem = Tsp::new(cities)?;
            if let Some(strength) = penalties.tsp_constraint_strength {
                problem = problem.with_constraint_strength(strength)?;
            }
            solve(&problem, options)
        }
        Command::Partition { data, nodes } => {
            let edges = dataset::read_edges(data)
                .with_context(|| format!("failed to load edges from {}", data.display()))?;
            let mut problem = GraphPartition::new(edges, *nodes)?;
            if let Some(strength) = penalties.partition_balance_strength {
                problem = problem.with_balance_strength(strength)?;
            }
            solve(&problem, options)
        }
    }
}

fn main() {
    let cli = Cli::parse();
    hermes::logger::init_logger(cli.verbose);

    if let Err(e) = run(cli) {
        tracing::error!("run failed: {e:#}");
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
