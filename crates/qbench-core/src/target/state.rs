//! Random target states for state-preparation pipelines.

use num_complex::Complex64;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};

use qbench_ir::StateVector;
use qbench_ir::sim::DEFAULT_MAX_QUBITS;

use super::{Quota, Target, TargetGenerator};
use crate::artifact::Artifact;
use crate::error::{BenchError, BenchResult};

/// Configuration of [`RandomStateTarget`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RandomStateConfig {
    pub num_qubits: usize,
    #[serde(default)]
    pub number: Option<i64>,
    #[serde(default)]
    pub seed: Option<u64>,
}

/// Samples normalised amplitude vectors, uniformly over the unit sphere.
pub struct RandomStateTarget {
    name: String,
    num_qubits: usize,
    quota: Quota,
    next_id: u64,
    rng: StdRng,
}

impl RandomStateTarget {
    pub fn new(name: impl Into<String>, config: RandomStateConfig) -> BenchResult<Self> {
        if config.num_qubits == 0 || config.num_qubits > DEFAULT_MAX_QUBITS {
            return Err(BenchError::Config(format!(
                "num_qubits must be between 1 and {DEFAULT_MAX_QUBITS}, got {}",
                config.num_qubits
            )));
        }
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Ok(Self {
            name: name.into(),
            num_qubits: config.num_qubits,
            quota: Quota::new(config.number),
            next_id: 0,
            rng,
        })
    }

    /// Sample one state.
    pub fn sample(&mut self) -> BenchResult<StateVector> {
        let dim = 1usize << self.num_qubits;
        let mut amps: Vec<Complex64> = (0..dim)
            .map(|_| {
                let re: f64 = self.rng.sample(StandardNormal);
                let im: f64 = self.rng.sample(StandardNormal);
                Complex64::new(re, im)
            })
            .collect();
        let norm = amps.iter().map(|a| a.norm_sqr()).sum::<f64>().sqrt();
        if norm == 0.0 {
            return Err(BenchError::Generation("sampled a zero vector".into()));
        }
        for a in &mut amps {
            *a /= norm;
        }
        Ok(StateVector::from_amplitudes(amps)?)
    }
}

impl Iterator for RandomStateTarget {
    type Item = BenchResult<Target>;

    fn next(&mut self) -> Option<Self::Item> {
        if !self.quota.take() {
            return None;
        }
        self.next_id += 1;
        let id = self.next_id.to_string();
        Some(self.sample().map(|state| (Artifact::State(state), id)))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match self.quota.remaining() {
            Some(n) => (n, Some(n)),
            None => (usize::MAX, None),
        }
    }
}

impl TargetGenerator for RandomStateTarget {
    fn name(&self) -> &str {
        &self.name
    }

    fn reseed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
        self.quota.reset();
        self.next_id = 0;
    }
}
