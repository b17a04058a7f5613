//! Strategies: named transformation engines bound to hardware and an analyser.

mod builtin;
mod registry;

pub use builtin::{PassEngine, TargetAnalysis, register_builtins};
pub use registry::{EngineFactory, StrategyArgs, StrategyRegistry};

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::debug;

use qbench_ir::Hardware;

use crate::artifact::Artifact;
use crate::error::BenchResult;
use crate::metrics::{Analyser, AnalyserKind, AnalyserOptions, MetricReport, names};

/// A transformation engine behind a strategy.
///
/// Engines read their input and return a fresh artifact; the input must
/// stay untouched so earlier stage results remain inspectable.
pub trait Transform: Send + Sync {
    /// Engine name for diagnostics.
    fn name(&self) -> &str;

    /// Transform `input` for `hardware`.
    fn apply(&self, input: &Artifact, hardware: &Arc<Hardware>) -> BenchResult<Artifact>;

    /// Execution time measured by the engine itself, in seconds.
    ///
    /// When `Some`, it replaces the wall-clock time taken around `apply`.
    fn reported_time(&self) -> Option<f64> {
        None
    }
}

/// What a strategy does, which decides the analyser it binds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyRole {
    /// Circuit pre- or post-processing.
    Processing,
    /// Qubit mapping and routing.
    Mapping,
    /// Translation to the hardware gate set.
    Rebase,
    /// Gate count reduction.
    Compression,
    /// State preparation.
    Synthesis,
}

impl StrategyRole {
    /// Analyser variant bound by strategies of this role.
    pub fn analyser_kind(self) -> AnalyserKind {
        match self {
            StrategyRole::Processing => AnalyserKind::Basic,
            StrategyRole::Mapping | StrategyRole::Rebase | StrategyRole::Compression => AnalyserKind::Transform,
            StrategyRole::Synthesis => AnalyserKind::Synthesis,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            StrategyRole::Processing => "processing",
            StrategyRole::Mapping => "mapping",
            StrategyRole::Rebase => "rebase",
            StrategyRole::Compression => "compression",
            StrategyRole::Synthesis => "synthesis",
        }
    }
}

impl fmt::Display for StrategyRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-instance state written by [`Strategy::run`].
#[derive(Debug, Clone)]
pub struct StrategyState {
    /// Elapsed seconds of the last run.
    pub execution_time: f64,
    /// Hardware every output is bound to.
    pub hardware: Arc<Hardware>,
    /// Report of the last run, including `Execution Time`.
    pub report: MetricReport,
}

/// A named engine plus the analyser that scores its output.
pub struct Strategy {
    name: String,
    role: StrategyRole,
    engine: Box<dyn Transform>,
    analyser: Analyser,
    state: StrategyState,
}

impl Strategy {
    pub fn new(
        name: impl Into<String>,
        role: StrategyRole,
        hardware: Arc<Hardware>,
        engine: Box<dyn Transform>,
        analyser_options: AnalyserOptions,
    ) -> Self {
        Self {
            name: name.into(),
            role,
            engine,
            analyser: Analyser::new(role.analyser_kind(), analyser_options),
            state: StrategyState { execution_time: 0.0, hardware, report: MetricReport::new() },
        }
    }

    /// Run the engine on `input`.
    ///
    /// The output is bound to this strategy's hardware. Elapsed time is
    /// recorded before the analyser runs; engine errors are returned as is.
    pub fn run(&mut self, input: &Artifact, run_analyser: bool) -> BenchResult<Artifact> {
        let start = Instant::now();
        let mut output = self.engine.apply(input, &self.state.hardware)?;
        let elapsed = start.elapsed().as_secs_f64();
        self.state.execution_time = self.engine.reported_time().unwrap_or(elapsed);
        output.bind_hardware(Arc::clone(&self.state.hardware));

        let mut report = if run_analyser {
            self.analyser.run_all(input, &output)?
        } else {
            MetricReport::new()
        };
        report.insert(names::EXECUTION_TIME, self.state.execution_time);
        debug!(
            strategy = %self.name,
            engine = self.engine.name(),
            seconds = self.state.execution_time,
            metrics = report.len(),
            "strategy finished"
        );
        self.state.report = report;
        Ok(output)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn role(&self) -> StrategyRole {
        self.role
    }

    pub fn hardware(&self) -> &Arc<Hardware> {
        &self.state.hardware
    }

    pub fn execution_time(&self) -> f64 {
        self.state.execution_time
    }

    pub fn report(&self) -> &MetricReport {
        &self.state.report
    }

    pub fn state(&self) -> &StrategyState {
        &self.state
    }

    pub fn analyser_mut(&mut self) -> &mut Analyser {
        &mut self.analyser
    }
}

impl fmt::Debug for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Strategy")
            .field("name", &self.name)
            .field("role", &self.role)
            .field("engine", &self.engine.name())
            .field("hardware", &self.state.hardware.name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BenchError;
    use crate::metrics::MetricValue;
    use qbench_ir::qubit::qubits;
    use qbench_ir::{Gate, GateChain, GateKind};

    struct AppendX;

    impl Transform for AppendX {
        fn name(&self) -> &str {
            "append_x"
        }

        fn apply(&self, input: &Artifact, _hardware: &Arc<Hardware>) -> BenchResult<Artifact> {
            let mut chain = input.as_chain().cloned().ok_or_else(|| BenchError::transformation("append_x", "no chain"))?;
            chain.add_gate(Gate::from(GateKind::X), qubits([0]))?;
            Ok(Artifact::Chain(chain))
        }

        fn reported_time(&self) -> Option<f64> {
            Some(0.25)
        }
    }

    struct Failing;

    impl Transform for Failing {
        fn name(&self) -> &str {
            "failing"
        }

        fn apply(&self, _input: &Artifact, _hardware: &Arc<Hardware>) -> BenchResult<Artifact> {
            Err(BenchError::transformation("failing", "engine crashed"))
        }
    }

    fn empty_chain() -> Artifact {
        Artifact::Chain(GateChain::new(Arc::new(Hardware::unconstrained(2))))
    }

    fn strategy(engine: Box<dyn Transform>) -> Strategy {
        let hw = Arc::new(Hardware::new("Target", qbench_ir::GateSet::ibm(), qbench_ir::Connectivity::linear(2)));
        Strategy::new("test", StrategyRole::Compression, hw, engine, AnalyserOptions::default())
    }

    #[test]
    fn test_run_records_time_and_report() {
        let mut s = strategy(Box::new(AppendX));
        let input = empty_chain();
        let out = s.run(&input, true).unwrap();
        assert_eq!(s.execution_time(), 0.25);
        assert_eq!(s.report().get(names::EXECUTION_TIME), Some(&MetricValue::Float(0.25)));
        assert_eq!(s.report().get(names::TOTAL_GATE_COUNT), Some(&MetricValue::Int(1)));
        assert_eq!(out.hardware().unwrap().name(), "Target");
        // Input is never touched.
        assert_eq!(input.as_chain().unwrap().len(), 0);
    }

    #[test]
    fn test_run_without_analyser() {
        let mut s = strategy(Box::new(AppendX));
        s.run(&empty_chain(), false).unwrap();
        assert_eq!(s.report().len(), 1);
        assert!(s.report().contains_key(names::EXECUTION_TIME));
    }

    #[test]
    fn test_engine_error_propagates() {
        let mut s = strategy(Box::new(Failing));
        let err = s.run(&empty_chain(), true).unwrap_err();
        assert!(matches!(err, BenchError::Transformation { .. }));
    }

    #[test]
    fn test_role_binds_analyser() {
        assert_eq!(StrategyRole::Processing.analyser_kind(), AnalyserKind::Basic);
        assert_eq!(StrategyRole::Mapping.analyser_kind(), AnalyserKind::Transform);
        assert_eq!(StrategyRole::Synthesis.analyser_kind(), AnalyserKind::Synthesis);
    }
}
