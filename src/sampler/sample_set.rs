use crate::bqm::BinaryQuadraticModel;
use ndarray::Array1;
use std::collections::{BTreeMap, HashMap};

/// One distinct assignment returned by a sampler
#[derive(Clone, Debug, PartialEq)]
pub struct Sample {
    pub x: Array1<usize>,
    pub energy: f64,
    pub num_occurrences: usize,
}

/// The result of one sampler call, distinct samples ordered by ascending energy
#[derive(Clone, Debug, Default)]
pub struct SampleSet {
    samples: Vec<Sample>,
    labels: Vec<String>,
    /// durations reported by the sampler itself, in microseconds
    pub timing: BTreeMap<String, f64>,
}

impl SampleSet {
    /// Builds a sample set, merging duplicated assignments into occurrence counts
    pub fn from_samples(labels: Vec<String>, samples: Vec<Sample>) -> Self {
        let mut merged: Vec<Sample> = Vec::with_capacity(samples.len());
        let mut position: HashMap<Vec<usize>, usize> = HashMap::new();

        for sample in samples {
            let key = sample.x.to_vec();
            match position.get(&key) {
                Some(&i) => merged[i].num_occurrences += sample.num_occurrences,
                None => {
                    position.insert(key, merged.len());
                    merged.push(sample);
                }
            }
        }

        merged.sort_by(|a, b| a.energy.total_cmp(&b.energy));

        Self {
            samples: merged,
            labels,
            timing: BTreeMap::new(),
        }
    }

    /// Builds a sample set from raw points, one occurrence each, with energies taken from the model
    pub fn from_points(bqm: &BinaryQuadraticModel, xs: Vec<Array1<usize>>) -> Self {
        let samples = xs
            .into_iter()
            .map(|x| Sample {
                energy: bqm.energy(&x),
                x,
                num_occurrences: 1,
            })
            .collect();

        Self::from_samples(bqm.labels().to_vec(), samples)
    }

    #[must_use]
    pub fn with_timing(mut self, timing: BTreeMap<String, f64>) -> Self {
        self.timing = timing;
        self
    }

    pub fn lowest(&self) -> Option<&Sample> {
        self.samples.first()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Sample> {
        self.samples.iter()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Total number of reads, counting repeated assignments
    pub fn total_reads(&self) -> usize {
        self.samples.iter().map(|s| s.num_occurrences).sum()
    }

    /// The i-th sample as a variable name to value mapping
    pub fn sample_map(&self, i: usize) -> Option<BTreeMap<String, u8>> {
        let sample = self.samples.get(i)?;

        Some(
            self.labels
                .iter()
                .zip(sample.x.iter())
                .map(|(label, &v)| (label.clone(), u8::from(v == 1)))
                .collect(),
        )
    }
}
