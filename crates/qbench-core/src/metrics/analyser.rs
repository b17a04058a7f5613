//! Analyser variants and the metric functions they register.

use serde::{Deserialize, Serialize};
use tracing::debug;

use qbench_ir::sim::{self, DEFAULT_MAX_QUBITS};
use qbench_ir::{GateChain, GateKind, IrError};

use super::registry::{MetricInput, MetricRegistry};
use super::{MetricReport, names};
use crate::artifact::Artifact;
use crate::error::BenchResult;

/// Options shared by every metric function of an analyser.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalyserOptions {
    /// Compute `Fidelity` between target and result chains.
    pub compute_fidelity: bool,
    /// Compute `Equivalent` between target and result chains.
    pub check_equivalence: bool,
    /// Cost of one two-qubit gate relative to a single-qubit gate.
    pub two_qubit_weight: f64,
    /// Widest chain the dense simulator is asked to handle.
    pub max_simulated_qubits: usize,
}

impl Default for AnalyserOptions {
    fn default() -> Self {
        Self {
            compute_fidelity: false,
            check_equivalence: false,
            two_qubit_weight: 10.0,
            max_simulated_qubits: DEFAULT_MAX_QUBITS,
        }
    }
}

/// Which metric set an analyser registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalyserKind {
    /// Structural metrics and checks.
    Basic,
    /// Basic plus hardware identity, cost and optional fidelity/equivalence.
    Transform,
    /// Basic plus fidelity against a target state.
    Synthesis,
}

/// Runs a metric registry against one stage's (input, output) pair.
///
/// Analysers only read the artifacts they are given.
#[derive(Debug, Clone)]
pub struct Analyser {
    kind: AnalyserKind,
    options: AnalyserOptions,
    registry: MetricRegistry,
}

impl Analyser {
    pub fn new(kind: AnalyserKind, options: AnalyserOptions) -> Self {
        let mut registry = MetricRegistry::new();
        register_basic(&mut registry);
        match kind {
            AnalyserKind::Basic => {}
            AnalyserKind::Transform => register_transform(&mut registry),
            AnalyserKind::Synthesis => register_synthesis(&mut registry),
        }
        Self { kind, options, registry }
    }

    pub fn basic(options: AnalyserOptions) -> Self {
        Self::new(AnalyserKind::Basic, options)
    }

    pub fn transform(options: AnalyserOptions) -> Self {
        Self::new(AnalyserKind::Transform, options)
    }

    pub fn synthesis(options: AnalyserOptions) -> Self {
        Self::new(AnalyserKind::Synthesis, options)
    }

    /// Add or override a metric function.
    pub fn register<F>(&mut self, name: impl Into<String>, func: F)
    where
        F: Fn(&MetricInput<'_>) -> BenchResult<MetricReport> + Send + Sync + 'static,
    {
        self.registry.register(name, func);
    }

    /// Run every registered metric.
    pub fn run_all(&mut self, target: &Artifact, result: &Artifact) -> BenchResult<MetricReport> {
        let input = MetricInput { target, result, options: &self.options };
        self.registry.run_all(&input).cloned()
    }

    /// Run the named metrics only.
    pub fn run_selected<S: AsRef<str>>(
        &mut self,
        names: &[S],
        target: &Artifact,
        result: &Artifact,
    ) -> BenchResult<MetricReport> {
        let input = MetricInput { target, result, options: &self.options };
        self.registry.run_selected(names, &input).cloned()
    }

    pub fn kind(&self) -> AnalyserKind {
        self.kind
    }

    pub fn options(&self) -> &AnalyserOptions {
        &self.options
    }

    pub fn registry(&self) -> &MetricRegistry {
        &self.registry
    }
}

/// Result chain of a stage, if it produced one.
fn result_chain<'a>(input: &MetricInput<'a>) -> Option<&'a GateChain> {
    input.result.as_chain()
}

fn register_basic(reg: &mut MetricRegistry) {
    reg.register("depth", |input| {
        Ok(result_chain(input)
            .map(|c| [(names::DEPTH, c.depth())].into_iter().collect())
            .unwrap_or_default())
    });

    reg.register("gate_count", |input| {
        Ok(result_chain(input)
            .map(|c| [(names::TOTAL_GATE_COUNT, c.num_gates())].into_iter().collect())
            .unwrap_or_default())
    });

    reg.register("arity_counts", |input| {
        let mut report = MetricReport::new();
        if let Some(chain) = result_chain(input) {
            report.insert(names::SINGLE_QUBIT_GATE_COUNT, chain.count_arity(1));
            report.insert(names::TWO_QUBIT_GATE_COUNT, chain.count_arity(2));
            let widest = chain.hardware().gate_set().max_arity() as usize;
            for n in 3..=widest {
                report.insert(names::arity_count(n), chain.count_arity(n));
            }
        }
        Ok(report)
    });

    reg.register("gate_type_counts", |input| {
        let mut report = MetricReport::new();
        if let Some(chain) = result_chain(input) {
            let counts = chain.gate_counts();
            for kind in GateKind::ALL.into_iter().filter(|k| *k != GateKind::Barrier) {
                let n = counts.get(&kind).copied().unwrap_or(0);
                report.insert(names::kind_count(kind.label()), n);
            }
        }
        Ok(report)
    });

    reg.register("populated_qubits", |input| {
        Ok(result_chain(input)
            .map(|c| [(names::POPULATED_QUBITS, c.num_populated_qubits())].into_iter().collect())
            .unwrap_or_default())
    });

    reg.register("structural_checks", |input| {
        let mut report = MetricReport::new();
        if let Some(chain) = result_chain(input) {
            report.insert(names::CONNECTIVITY_SATISFIED, chain.check_connectivity());
            report.insert(names::GATE_SET_SATISFIED, chain.check_gate_set());
            report.insert(names::QUBIT_NUMBER_SATISFIED, chain.check_qubit_number());
        }
        Ok(report)
    });
}

fn register_transform(reg: &mut MetricRegistry) {
    reg.register("hardware", |input| {
        let mut report = MetricReport::new();
        if let Some(chain) = result_chain(input) {
            let hw = chain.hardware();
            report.insert(names::GATE_CHAIN_HARDWARE, hw.label());
            report.insert(names::GATE_SET, hw.gate_set().to_string());
            report.insert(names::GATE_CHAIN_NUM_QUBITS, chain.num_qubits());
        }
        Ok(report)
    });

    reg.register("cost", |input| {
        Ok(result_chain(input)
            .map(|c| [(names::COST, chain_cost(c, input.options.two_qubit_weight))].into_iter().collect())
            .unwrap_or_default())
    });

    reg.register("fidelity", |input| {
        let mut report = MetricReport::new();
        if !input.options.compute_fidelity {
            return Ok(report);
        }
        if let (Some(target), Some(result)) = (input.target.as_chain(), result_chain(input)) {
            let limit = input.options.max_simulated_qubits;
            if let Some(f) = skip_too_large(sim::process_fidelity(target, result, limit))? {
                report.insert(names::FIDELITY, f);
            }
        }
        Ok(report)
    });

    reg.register("equivalence", |input| {
        let mut report = MetricReport::new();
        if !input.options.check_equivalence {
            return Ok(report);
        }
        if let (Some(target), Some(result)) = (input.target.as_chain(), result_chain(input)) {
            let limit = input.options.max_simulated_qubits;
            if let Some(eq) = skip_too_large(sim::equivalent(target, result, limit))? {
                report.insert(names::EQUIVALENT, eq);
            }
        }
        Ok(report)
    });
}

fn register_synthesis(reg: &mut MetricRegistry) {
    reg.register("state_fidelity", |input| {
        let mut report = MetricReport::new();
        if let (Some(state), Some(result)) = (input.target.as_state(), result_chain(input)) {
            let limit = input.options.max_simulated_qubits;
            if let Some(f) = skip_too_large(sim::state_fidelity(state, result, limit))? {
                report.insert(names::STATE_FIDELITY, f);
            }
        }
        Ok(report)
    });
}

/// Weighted gate count: one per single-qubit gate, `two_qubit_weight` per
/// additional qubit of wider gates. Measurements and barriers are free.
pub(crate) fn chain_cost(chain: &GateChain, two_qubit_weight: f64) -> f64 {
    chain
        .ops()
        .iter()
        .filter(|op| op.kind().is_unitary())
        .map(|op| match op.arity() {
            0 | 1 => 1.0,
            n => two_qubit_weight * (n - 1) as f64,
        })
        .sum()
}

/// Chains wider than the simulation cap simply have no fidelity column.
fn skip_too_large<T>(result: Result<T, IrError>) -> BenchResult<Option<T>> {
    match result {
        Ok(v) => Ok(Some(v)),
        Err(IrError::SimulationTooLarge { num_qubits, limit }) => {
            debug!(num_qubits, limit, "skipping simulation metric");
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::MetricValue;
    use qbench_ir::qubit::qubits;
    use qbench_ir::{Connectivity, Gate, GateSet, Hardware, StateVector};
    use std::sync::Arc;

    fn linear_ibm(n: u32) -> Arc<Hardware> {
        Arc::new(Hardware::new("Ibm", GateSet::ibm(), Connectivity::linear(n)))
    }

    fn bell(hw: Arc<Hardware>) -> GateChain {
        let mut c = GateChain::new(hw);
        c.add_gate(Gate::from(GateKind::H), qubits([0])).unwrap();
        c.add_gate(Gate::from(GateKind::CX), qubits([0, 1])).unwrap();
        c
    }

    #[test]
    fn test_basic_metrics() {
        let chain = Artifact::Chain(bell(Arc::new(Hardware::unconstrained(3))));
        let report = Analyser::basic(AnalyserOptions::default()).run_all(&chain, &chain).unwrap();
        assert_eq!(report.get(names::DEPTH), Some(&MetricValue::Int(2)));
        assert_eq!(report.get(names::TOTAL_GATE_COUNT), Some(&MetricValue::Int(2)));
        assert_eq!(report.get(names::TWO_QUBIT_GATE_COUNT), Some(&MetricValue::Int(1)));
        assert_eq!(report.get("3-Qubit Gate Count"), Some(&MetricValue::Int(0)));
        assert_eq!(report.get("Count of Cnot Gates"), Some(&MetricValue::Int(1)));
        assert_eq!(report.get("Count of H Gates"), Some(&MetricValue::Int(1)));
        assert_eq!(report.get(names::POPULATED_QUBITS), Some(&MetricValue::Int(2)));
        assert_eq!(report.get(names::GATE_SET_SATISFIED), Some(&MetricValue::Bool(true)));
        assert!(!report.contains_key(names::COST));
    }

    #[test]
    fn test_structural_checks_fail() {
        // H is not in the IBM set and qubits 0 and 2 are not adjacent.
        let mut c = GateChain::new(linear_ibm(3));
        c.add_gate(Gate::from(GateKind::H), qubits([0])).unwrap();
        c.add_gate(Gate::from(GateKind::CX), qubits([0, 2])).unwrap();
        let a = Artifact::Chain(c);
        let report = Analyser::basic(AnalyserOptions::default()).run_all(&a, &a).unwrap();
        assert_eq!(report.get(names::CONNECTIVITY_SATISFIED), Some(&MetricValue::Bool(false)));
        assert_eq!(report.get(names::GATE_SET_SATISFIED), Some(&MetricValue::Bool(false)));
        assert_eq!(report.get(names::QUBIT_NUMBER_SATISFIED), Some(&MetricValue::Bool(true)));
    }

    #[test]
    fn test_transform_metrics() {
        let target = Artifact::Chain(bell(Arc::new(Hardware::unconstrained(2))));
        let result = Artifact::Chain(bell(linear_ibm(2)));
        let opts = AnalyserOptions { compute_fidelity: true, check_equivalence: true, ..Default::default() };
        let report = Analyser::transform(opts).run_all(&target, &result).unwrap();
        assert_eq!(report.get(names::GATE_CHAIN_HARDWARE), Some(&MetricValue::from("Ibm2Q")));
        assert_eq!(report.get(names::GATE_SET), Some(&MetricValue::from("U3, Cnot")));
        assert_eq!(report.get(names::COST), Some(&MetricValue::Float(11.0)));
        let fidelity = report.get(names::FIDELITY).and_then(MetricValue::as_f64).unwrap();
        assert!((fidelity - 1.0).abs() < 1e-9);
        assert_eq!(report.get(names::EQUIVALENT), Some(&MetricValue::Bool(true)));
    }

    #[test]
    fn test_fidelity_toggled_off() {
        let a = Artifact::Chain(bell(linear_ibm(2)));
        let report = Analyser::transform(AnalyserOptions::default()).run_all(&a, &a).unwrap();
        assert!(!report.contains_key(names::FIDELITY));
        assert!(!report.contains_key(names::EQUIVALENT));
    }

    #[test]
    fn test_fidelity_skipped_above_cap() {
        let a = Artifact::Chain(bell(Arc::new(Hardware::unconstrained(6))));
        let opts = AnalyserOptions { compute_fidelity: true, max_simulated_qubits: 4, ..Default::default() };
        let report = Analyser::transform(opts).run_all(&a, &a).unwrap();
        assert!(!report.contains_key(names::FIDELITY));
        assert!(report.contains_key(names::DEPTH));
    }

    #[test]
    fn test_synthesis_state_fidelity() {
        let h = std::f64::consts::FRAC_1_SQRT_2;
        let amps = [h, 0.0, 0.0, h].map(|x| num_complex::Complex64::new(x, 0.0)).to_vec();
        let target = Artifact::State(StateVector::from_amplitudes(amps).unwrap());
        let result = Artifact::Chain(bell(Arc::new(Hardware::unconstrained(2))));
        let report = Analyser::synthesis(AnalyserOptions::default()).run_all(&target, &result).unwrap();
        let f = report.get(names::STATE_FIDELITY).and_then(MetricValue::as_f64).unwrap();
        assert!((f - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_analyser_does_not_mutate() {
        let target = Artifact::Chain(bell(Arc::new(Hardware::unconstrained(2))));
        let result = Artifact::Chain(bell(linear_ibm(2)));
        let (t0, r0) = (target.clone(), result.clone());
        Analyser::transform(AnalyserOptions::default()).run_all(&target, &result).unwrap();
        assert_eq!(target, t0);
        assert_eq!(result, r0);
    }

    #[test]
    fn test_override_base_metric() {
        let mut analyser = Analyser::basic(AnalyserOptions::default());
        analyser.register("depth", |_| Ok([(names::DEPTH, -1i64)].into_iter().collect()));
        let a = Artifact::Chain(bell(Arc::new(Hardware::unconstrained(2))));
        let report = analyser.run_all(&a, &a).unwrap();
        assert_eq!(report.get(names::DEPTH), Some(&MetricValue::Int(-1)));
        assert_eq!(report.keys().next(), Some(names::DEPTH));
    }

    #[test]
    fn test_options_deserialize() {
        let opts: AnalyserOptions = serde_json::from_str(r#"{"compute_fidelity": true}"#).unwrap();
        assert!(opts.compute_fidelity);
        assert_eq!(opts.two_qubit_weight, 10.0);
        assert!(serde_json::from_str::<AnalyserOptions>(r#"{"bogus": 1}"#).is_err());
    }
}
