//! Target generators: lazy sequences of `(artifact, id)` pairs.
//!
//! Exhaustion is the iterator ending. Errors are yielded as `Some(Err(_))`
//! and the caller decides whether to continue.

mod dataset;
mod random;
mod state;

pub use dataset::{QasmPaths, QasmTarget, QasmTargetConfig};
pub use random::{GateDistribution, RandomChainConfig, RandomChainTarget};
pub use state::{RandomStateConfig, RandomStateTarget};

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::artifact::Artifact;
use crate::config::TargetSpec;
use crate::error::{BenchError, BenchResult};

/// One generated target and its identifier.
pub type Target = (Artifact, String);

/// A re-seedable source of targets.
pub trait TargetGenerator: Iterator<Item = BenchResult<Target>> + Send {
    /// Generator name used in reports.
    fn name(&self) -> &str;

    /// Install a fresh random generator seeded with `seed` and restart the
    /// sequence from the beginning.
    fn reseed(&mut self, seed: u64);
}

/// Build the generator selected by `spec.task` and `spec.algo`.
pub fn from_spec(spec: &TargetSpec) -> BenchResult<Box<dyn TargetGenerator>> {
    let name = spec.display_name().to_string();
    match (spec.task.as_str(), spec.algo.as_str()) {
        ("circuit_transformation", "random_chain") => {
            Ok(Box::new(RandomChainTarget::new(name, parse_fields(spec)?)?))
        }
        ("circuit_transformation", "qasm") => Ok(Box::new(QasmTarget::new(name, parse_fields(spec)?)?)),
        ("state_preparation", "random_state") => {
            Ok(Box::new(RandomStateTarget::new(name, parse_fields(spec)?)?))
        }
        (task, algo) => Err(BenchError::UnknownTarget { task: task.to_string(), algo: algo.to_string() }),
    }
}

fn parse_fields<T: DeserializeOwned>(spec: &TargetSpec) -> BenchResult<T> {
    serde_json::from_value(Value::Object(spec.fields.clone())).map_err(|e| {
        BenchError::Config(format!("target '{}/{}': {e}", spec.task, spec.algo))
    })
}

/// Remaining-count bookkeeping shared by the generators.
///
/// `None` or a negative limit means unbounded.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Quota {
    limit: Option<u64>,
    produced: u64,
}

impl Quota {
    pub(crate) fn new(limit: Option<i64>) -> Self {
        Self { limit: limit.and_then(|n| u64::try_from(n).ok()), produced: 0 }
    }

    /// Consume one unit, or report exhaustion.
    pub(crate) fn take(&mut self) -> bool {
        if self.limit.is_some_and(|limit| self.produced >= limit) {
            return false;
        }
        self.produced += 1;
        true
    }

    pub(crate) fn reset(&mut self) {
        self.produced = 0;
    }

    /// Units left, or `None` when unbounded.
    pub(crate) fn remaining(&self) -> Option<usize> {
        self.limit
            .map(|limit| usize::try_from(limit.saturating_sub(self.produced)).unwrap_or(usize::MAX))
    }
}
