//! qbench Benchmark Core
//!
//! Runs quantum circuit compilation strategies as multi-stage pipelines over
//! generated or sampled target circuits and collects per-stage metrics into
//! a single table.
//!
//! # Overview
//!
//! - [`target`]: lazy `(artifact, id)` sequences: random chains sampled from
//!   a hardware's placeable actions, QASM datasets, random states
//! - [`strategy`]: named engines bound to hardware and an analyser, resolved
//!   through a [`StrategyRegistry`]
//! - [`pipeline`]: ordered strategies threaded over one target, with per-stage
//!   history, cumulative timing and `Full Check`
//! - [`metrics`]: metric registries and the analysers built on them
//! - [`results`]: the CSV results table
//! - [`engine`]: the driver tying a [`BenchmarkConfig`] to a report on disk
//!
//! # Example
//!
//! ```rust
//! use qbench_core::{Pipeline, StrategyRegistry};
//! use qbench_core::config::PipelineSpec;
//! use qbench_core::target;
//!
//! let spec: PipelineSpec = serde_json::from_value(serde_json::json!({
//!     "id": "route_and_rebase",
//!     "target": {
//!         "task": "circuit_transformation",
//!         "algo": "random_chain",
//!         "number": 2,
//!         "seed": 10,
//!         "chain_length": 20,
//!         "hardware": { "preset": "ionq", "qubit_connectivity": { "num_qubits": 4 } }
//!     },
//!     "stages": [
//!         { "id": "route", "strategy": "greedy_routing",
//!           "args": { "hardware": { "preset": "ibm", "qubit_connectivity": { "class": "linear", "num_qubits": 4 } } } },
//!         { "id": "rebase", "strategy": "gate_set_rebase",
//!           "args": { "hardware": { "preset": "ibm", "qubit_connectivity": { "class": "linear", "num_qubits": 4 } } } }
//!     ]
//! })).unwrap();
//!
//! let registry = StrategyRegistry::with_builtins();
//! let mut pipeline = Pipeline::from_spec(&spec, &registry).unwrap();
//! for item in target::from_spec(&spec.target).unwrap() {
//!     let (artifact, _id) = item.unwrap();
//!     pipeline.run(&artifact).unwrap();
//!     let last = &pipeline.analyser_report_history()[1];
//!     assert_eq!(last.get("Full Check").and_then(|v| v.as_bool()), Some(true));
//! }
//! ```

pub mod artifact;
pub mod config;
pub mod engine;
pub mod error;
pub mod metrics;
pub mod pipeline;
pub mod results;
pub mod strategy;
pub mod target;

pub use artifact::Artifact;
pub use config::{BenchmarkConfig, PipelineSpec, StageSpec, TargetSpec};
pub use engine::{BenchmarkEngine, EngineObserver, EngineOptions, EngineSummary, NoopObserver};
pub use error::{BenchError, BenchResult};
pub use metrics::{Analyser, AnalyserKind, AnalyserOptions, MetricReport, MetricValue};
pub use pipeline::{Pipeline, Stage};
pub use results::ResultsSink;
pub use strategy::{Strategy, StrategyRegistry, StrategyRole, Transform};
pub use target::TargetGenerator;
