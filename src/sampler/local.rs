//! Classical multi-start local search sampler, runs in-process and needs no credentials.

use crate::bqm::BinaryQuadraticModel;
use crate::error::Result;
use crate::initial_points;
use crate::local_search;
use crate::sampler::sample_set::SampleSet;
use crate::sampler::Sampler;
use rayon::prelude::*;
use smolprng::{JsfLarge, PRNG};
use std::time::Instant;
use tracing::debug;

pub struct LocalSearchSampler {
    seed: u64,
    calls: u64,
    pub max_steps: usize,
    pub swarm_particles: usize,
    pub swarm_steps: usize,
}

impl LocalSearchSampler {
    pub const fn new(seed: u64) -> Self {
        Self {
            seed,
            calls: 0,
            max_steps: 10_000,
            swarm_particles: 0,
            swarm_steps: 100,
        }
    }

    /// Replaces the last read with the result of a particle swarm search
    #[must_use]
    pub const fn with_swarm(mut self, particles: usize, steps: usize) -> Self {
        self.swarm_particles = particles;
        self.swarm_steps = steps;
        self
    }
}

impl Sampler for LocalSearchSampler {
    fn name(&self) -> &str {
        "local"
    }

    /// The first two reads start from the alpha and rho points of the QUBO, the rest from random points.
    /// Every call draws from a fresh stream, so a retry does not repeat the previous answer.
    fn sample(&mut self, bqm: &BinaryQuadraticModel, num_reads: usize) -> Result<SampleSet> {
        let start = Instant::now();
        let qubo = bqm.to_qubo();
        let num_reads = num_reads.max(1);

        let mut prng = PRNG {
            generator: JsfLarge::from(self.seed.wrapping_add(self.calls)),
        };
        self.calls += 1;

        let mut fractional_starts = vec![initial_points::generate_alpha_starting_point(&qubo)];
        if num_reads > 1 {
            fractional_starts.push(initial_points::generate_rho_starting_point(&qubo));
        }

        let mut xs: Vec<_> = fractional_starts
            .par_iter()
            .map(|x| local_search::simple_mixed_search(&qubo, x, self.max_steps))
            .collect();

        let random_starts = initial_points::generate_random_binary_points(
            qubo.num_x(),
            num_reads - xs.len(),
            &mut prng,
        );
        xs.extend(local_search::multi_simple_local_search(
            &qubo,
            &random_starts,
            self.max_steps,
        ));

        if self.swarm_particles > 0 {
            xs.pop();
            xs.push(local_search::particle_swarm_search(
                &qubo,
                self.swarm_particles,
                self.swarm_steps,
                &mut prng,
            ));
        }

        let set = SampleSet::from_points(bqm, xs);
        debug!(
            reads = num_reads,
            distinct = set.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "local search sampling finished"
        );

        Ok(set)
    }
}
