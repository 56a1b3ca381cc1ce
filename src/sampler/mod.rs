//! Samplers take a binary quadratic model and return low energy assignments of its variables.

use crate::bqm::BinaryQuadraticModel;
use crate::config::{RunOptions, SamplerKind};
use crate::error::Result;

pub mod exact;
pub mod local;
pub mod remote;
pub mod sample_set;

pub use exact::ExactSampler;
pub use local::LocalSearchSampler;
pub use remote::RemoteSampler;
pub use sample_set::{Sample, SampleSet};

pub trait Sampler {
    fn name(&self) -> &str;

    /// Blocks until the sampler returns up to num_reads assignments of the model
    fn sample(&mut self, bqm: &BinaryQuadraticModel, num_reads: usize) -> Result<SampleSet>;
}

/// Creates the sampler selected by the run options
pub fn make_sampler(options: &RunOptions) -> Result<Box<dyn Sampler>> {
    let sampler: Box<dyn Sampler> = match options.sampler {
        SamplerKind::Exact => Box::new(ExactSampler::new()),
        SamplerKind::Local => Box::new(
            LocalSearchSampler::new(options.seed)
                .with_swarm(options.swarm_particles, options.swarm_steps),
        ),
        SamplerKind::Remote => Box::new(RemoteSampler::new(options.remote.clone())?),
    };

    Ok(sampler)
}
