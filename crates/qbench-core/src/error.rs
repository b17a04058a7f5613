//! Benchmark error types.

use std::fmt;

use qbench_ir::IrError;
use thiserror::Error;

/// Result type for benchmark operations.
pub type BenchResult<T> = Result<T, BenchError>;

/// Errors raised by pipelines, strategies, analysers and target generators.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BenchError {
    /// No strategy is registered under this name.
    #[error("Unknown strategy '{name}' (available: {available})")]
    UnknownStrategy {
        /// Requested name.
        name: String,
        /// Comma-separated registered names.
        available: String,
    },

    /// No metric function is registered under this name.
    #[error("Unknown metric '{0}'")]
    UnknownMetric(String),

    /// No target generator handles this task/algorithm pair.
    #[error("Unknown target generator: task '{task}', algo '{algo}'")]
    UnknownTarget {
        /// Task name.
        task: String,
        /// Algorithm name.
        algo: String,
    },

    /// Two options that cannot be honoured together.
    #[error("Conflicting constraints: {0}")]
    ConflictingConstraints(String),

    /// Declared gate probabilities are invalid.
    #[error("Invalid gate distribution: {0}")]
    ProbabilityMass(String),

    /// Identifying tuple length differs from the number of id columns.
    #[error("Identifier has {got} values but the sink has {expected} id columns")]
    IdArity {
        /// Number of id columns.
        expected: usize,
        /// Number of values supplied.
        got: usize,
    },

    /// Strategy arguments failed to deserialize.
    #[error("Invalid arguments for strategy '{strategy}': {message}")]
    InvalidArgs {
        /// Strategy name.
        strategy: String,
        /// Deserializer message.
        message: String,
    },

    /// Any other configuration problem.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A target generator failed to produce an artifact.
    #[error("Target generation failed: {0}")]
    Generation(String),

    /// A strategy's engine failed.
    #[error("Strategy '{strategy}' failed: {message}")]
    Transformation {
        /// Strategy name.
        strategy: String,
        /// Engine message.
        message: String,
    },

    /// Circuit-level error.
    #[error("IR error: {0}")]
    Ir(#[from] IrError),

    /// Pipeline accessor index past the completed stages.
    #[error("Stage index {index} out of range ({len} stages recorded)")]
    StageIndex {
        /// Requested index.
        index: usize,
        /// Recorded stage count.
        len: usize,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON or YAML (de)serialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl BenchError {
    /// Wrap an engine failure for `strategy`.
    pub fn transformation(strategy: impl Into<String>, err: impl fmt::Display) -> Self {
        BenchError::Transformation { strategy: strategy.into(), message: err.to_string() }
    }

    /// Whether this is a fatal configuration error that retrying cannot fix.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            BenchError::UnknownStrategy { .. }
                | BenchError::UnknownMetric(_)
                | BenchError::UnknownTarget { .. }
                | BenchError::ConflictingConstraints(_)
                | BenchError::ProbabilityMass(_)
                | BenchError::IdArity { .. }
                | BenchError::InvalidArgs { .. }
                | BenchError::Config(_)
        )
    }
}

impl From<serde_json::Error> for BenchError {
    fn from(e: serde_json::Error) -> Self {
        BenchError::Serialization(e.to_string())
    }
}

impl From<serde_yaml_ng::Error> for BenchError {
    fn from(e: serde_yaml_ng::Error) -> Self {
        BenchError::Serialization(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_classification() {
        assert!(BenchError::UnknownMetric("Depth".into()).is_config_error());
        assert!(BenchError::IdArity { expected: 2, got: 1 }.is_config_error());
        assert!(!BenchError::Generation("bad file".into()).is_config_error());
        assert!(!BenchError::transformation("greedy_routing", "unroutable").is_config_error());
    }

    #[test]
    fn test_messages() {
        let err = BenchError::UnknownStrategy { name: "zx".into(), available: "a, b".into() };
        assert_eq!(err.to_string(), "Unknown strategy 'zx' (available: a, b)");
        let err = BenchError::transformation("cancel_redundancies", "boom");
        assert_eq!(err.to_string(), "Strategy 'cancel_redundancies' failed: boom");
    }
}
