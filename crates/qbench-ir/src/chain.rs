//! Gate chains: ordered lists of operations bound to a hardware.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::{IrError, IrResult};
use crate::gate::{Gate, GateKind};
use crate::hardware::Hardware;
use crate::qubit::{ClbitId, QubitId};

/// A gate applied to specific qubits.
#[derive(Debug, Clone, PartialEq)]
pub struct Operation {
    /// The gate.
    pub gate: Gate,
    /// Qubits in gate order (control first).
    pub qubits: Vec<QubitId>,
    /// Classical targets; only measurements have one.
    pub clbits: Vec<ClbitId>,
}

impl Operation {
    #[inline]
    pub fn kind(&self) -> GateKind {
        self.gate.kind()
    }

    /// Number of qubits the operation touches.
    #[inline]
    pub fn arity(&self) -> usize {
        self.qubits.len()
    }

    /// Whether this is a barrier.
    #[inline]
    pub fn is_barrier(&self) -> bool {
        self.kind() == GateKind::Barrier
    }

    /// Whether this operation acts on `q`.
    #[inline]
    pub fn acts_on(&self, q: QubitId) -> bool {
        self.qubits.contains(&q)
    }
}

/// An ordered sequence of gate applications bound to a [`Hardware`].
///
/// Construction checks gate arity and duplicate qubits only. Whether a chain
/// fits its hardware is asked separately via the `check_*` methods.
#[derive(Debug, Clone)]
pub struct GateChain {
    hardware: Arc<Hardware>,
    ops: Vec<Operation>,
    num_clbits: u32,
}

impl PartialEq for GateChain {
    fn eq(&self, other: &Self) -> bool {
        self.ops == other.ops && self.num_clbits == other.num_clbits
    }
}

impl GateChain {
    /// Empty chain bound to `hardware`.
    pub fn new(hardware: Arc<Hardware>) -> Self {
        Self { hardware, ops: Vec::new(), num_clbits: 0 }
    }

    /// Append `gate` on `qubits`.
    pub fn add_gate(&mut self, gate: Gate, qubits: Vec<QubitId>) -> IrResult<&mut Self> {
        let kind = gate.kind();
        match kind.num_qubits() {
            Some(expected) if expected as usize != qubits.len() => {
                return Err(IrError::QubitCountMismatch {
                    gate_name: kind.name().into(),
                    expected,
                    got: qubits.len() as u32,
                });
            }
            None if qubits.is_empty() => {
                return Err(IrError::QubitCountMismatch {
                    gate_name: kind.name().into(),
                    expected: 1,
                    got: 0,
                });
            }
            _ => {}
        }
        for (i, q) in qubits.iter().enumerate() {
            if qubits[..i].contains(q) {
                return Err(IrError::DuplicateQubit { qubit: *q, gate_name: kind.name().into() });
            }
        }
        if kind == GateKind::Measure {
            return Err(IrError::QubitCountMismatch {
                gate_name: "measure (use GateChain::measure)".into(),
                expected: 1,
                got: qubits.len() as u32,
            });
        }
        self.ops.push(Operation { gate, qubits, clbits: Vec::new() });
        Ok(self)
    }

    /// Append a measurement of `qubit` into `clbit`.
    pub fn measure(&mut self, qubit: QubitId, clbit: ClbitId) -> &mut Self {
        self.num_clbits = self.num_clbits.max(clbit.0 + 1);
        self.ops.push(Operation {
            gate: Gate::from(GateKind::Measure),
            qubits: vec![qubit],
            clbits: vec![clbit],
        });
        self
    }

    /// Append an already validated operation.
    pub fn push_op(&mut self, op: Operation) -> IrResult<&mut Self> {
        if op.kind() == GateKind::Measure {
            match (op.qubits.as_slice(), op.clbits.as_slice()) {
                ([q], [c]) => Ok(self.measure(*q, *c)),
                _ => Err(IrError::QubitCountMismatch {
                    gate_name: "measure".into(),
                    expected: 1,
                    got: op.qubits.len() as u32,
                }),
            }
        } else {
            self.add_gate(op.gate, op.qubits)
        }
    }

    /// The hardware this chain is bound to.
    #[inline]
    pub fn hardware(&self) -> &Arc<Hardware> {
        &self.hardware
    }

    /// Rebind to a different hardware. Operations are unchanged.
    pub fn set_hardware(&mut self, hardware: Arc<Hardware>) {
        self.hardware = hardware;
    }

    /// Copy of the operations with no hardware change, rebound to `hardware`.
    pub fn with_hardware(&self, hardware: Arc<Hardware>) -> Self {
        Self { hardware, ops: self.ops.clone(), num_clbits: self.num_clbits }
    }

    /// Empty chain sharing this chain's hardware and classical register width.
    pub fn empty_like(&self) -> Self {
        Self { hardware: Arc::clone(&self.hardware), ops: Vec::new(), num_clbits: self.num_clbits }
    }

    #[inline]
    pub fn ops(&self) -> &[Operation] {
        &self.ops
    }

    /// Consume into the operation list.
    pub fn into_ops(self) -> Vec<Operation> {
        self.ops
    }

    /// Number of operations including barriers.
    #[inline]
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    #[inline]
    pub fn num_clbits(&self) -> u32 {
        self.num_clbits
    }

    /// Width of the chain: the hardware width, widened to cover every qubit used.
    pub fn num_qubits(&self) -> u32 {
        let used = self
            .ops
            .iter()
            .flat_map(|op| op.qubits.iter())
            .map(|q| q.0 + 1)
            .max()
            .unwrap_or(0);
        used.max(self.hardware.num_qubits())
    }

    /// Circuit depth. Barriers synchronise their qubits without adding a layer.
    pub fn depth(&self) -> usize {
        let mut layers = vec![0usize; self.num_qubits() as usize];
        for op in &self.ops {
            let level = op.qubits.iter().map(|q| layers[q.index()]).max().unwrap_or(0);
            let next = if op.is_barrier() { level } else { level + 1 };
            for q in &op.qubits {
                layers[q.index()] = next;
            }
        }
        layers.into_iter().max().unwrap_or(0)
    }

    /// Number of gates, barriers excluded.
    pub fn num_gates(&self) -> usize {
        self.ops.iter().filter(|op| !op.is_barrier()).count()
    }

    /// Gate counts by kind, barriers excluded.
    pub fn gate_counts(&self) -> BTreeMap<GateKind, usize> {
        let mut counts = BTreeMap::new();
        for op in self.ops.iter().filter(|op| !op.is_barrier()) {
            *counts.entry(op.kind()).or_insert(0) += 1;
        }
        counts
    }

    /// Count of gates of one kind.
    pub fn count_kind(&self, kind: GateKind) -> usize {
        self.ops.iter().filter(|op| op.kind() == kind).count()
    }

    /// Count of gates acting on exactly `arity` qubits, barriers excluded.
    pub fn count_arity(&self, arity: usize) -> usize {
        self.ops
            .iter()
            .filter(|op| !op.is_barrier() && op.arity() == arity)
            .count()
    }

    /// Count of gates touching `q`, barriers excluded.
    pub fn num_gates_on_qubit(&self, q: QubitId) -> usize {
        self.ops
            .iter()
            .filter(|op| !op.is_barrier() && op.acts_on(q))
            .count()
    }

    /// Number of distinct qubits touched by at least one gate.
    pub fn num_populated_qubits(&self) -> usize {
        let mut used: Vec<QubitId> = self
            .ops
            .iter()
            .filter(|op| !op.is_barrier())
            .flat_map(|op| op.qubits.iter().copied())
            .collect();
        used.sort_unstable();
        used.dedup();
        used.len()
    }

    /// Every multi-qubit gate sits on connected qubits of the current hardware.
    pub fn check_connectivity(&self) -> bool {
        let conn = self.hardware.connectivity();
        self.ops
            .iter()
            .filter(|op| !op.is_barrier() && op.arity() > 1)
            .all(|op| conn.check_connection(&op.qubits))
    }

    /// Every gate is admitted by the current hardware's gate set.
    /// Measurements and barriers are always admitted.
    pub fn check_gate_set(&self) -> bool {
        let gate_set = self.hardware.gate_set();
        self.ops
            .iter()
            .filter(|op| op.kind().is_unitary())
            .all(|op| gate_set.contains(&op.gate))
    }

    /// No qubit index exceeds the current hardware's width.
    pub fn check_qubit_number(&self) -> bool {
        let n = self.hardware.num_qubits();
        self.ops.iter().flat_map(|op| op.qubits.iter()).all(|q| q.0 < n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hardware::{Connectivity, GateSet};
    use crate::qubit::qubits;

    fn linear_ibm(n: u32) -> Arc<Hardware> {
        Arc::new(Hardware::new("Ibm", GateSet::ibm(), Connectivity::linear(n)))
    }

    fn bell(hw: Arc<Hardware>) -> GateChain {
        let mut chain = GateChain::new(hw);
        chain.add_gate(Gate::from(GateKind::H), qubits([0])).unwrap();
        chain.add_gate(Gate::from(GateKind::CX), qubits([0, 1])).unwrap();
        chain.measure(QubitId(0), ClbitId(0));
        chain.measure(QubitId(1), ClbitId(1));
        chain
    }

    #[test]
    fn test_bell_metrics() {
        let chain = bell(Arc::new(Hardware::unconstrained(2)));
        assert_eq!(chain.depth(), 3);
        assert_eq!(chain.num_gates(), 4);
        assert_eq!(chain.count_arity(1), 3);
        assert_eq!(chain.count_arity(2), 1);
        assert_eq!(chain.num_clbits(), 2);
        assert_eq!(chain.num_populated_qubits(), 2);
    }

    #[test]
    fn test_arity_checked() {
        let mut chain = GateChain::new(Arc::new(Hardware::unconstrained(2)));
        let err = chain.add_gate(Gate::from(GateKind::CX), qubits([0])).unwrap_err();
        assert!(matches!(err, IrError::QubitCountMismatch { expected: 2, got: 1, .. }));
    }

    #[test]
    fn test_duplicate_qubit_rejected() {
        let mut chain = GateChain::new(Arc::new(Hardware::unconstrained(2)));
        let err = chain.add_gate(Gate::from(GateKind::CX), qubits([1, 1])).unwrap_err();
        assert!(matches!(err, IrError::DuplicateQubit { .. }));
    }

    #[test]
    fn test_barrier_not_counted() {
        let mut chain = GateChain::new(Arc::new(Hardware::unconstrained(3)));
        chain.add_gate(Gate::from(GateKind::X), qubits([0])).unwrap();
        chain.add_gate(Gate::from(GateKind::Barrier), qubits([0, 1, 2])).unwrap();
        chain.add_gate(Gate::from(GateKind::X), qubits([2])).unwrap();
        assert_eq!(chain.num_gates(), 2);
        // The barrier lifts qubit 2 to layer 1 before the second X.
        assert_eq!(chain.depth(), 2);
    }

    #[test]
    fn test_checks_against_hardware() {
        let mut chain = GateChain::new(linear_ibm(3));
        chain.add_gate(Gate::u3(0.1, 0.2, 0.3), qubits([0])).unwrap();
        chain.add_gate(Gate::from(GateKind::CX), qubits([0, 1])).unwrap();
        assert!(chain.check_connectivity());
        assert!(chain.check_gate_set());
        assert!(chain.check_qubit_number());

        chain.add_gate(Gate::from(GateKind::CX), qubits([0, 2])).unwrap();
        assert!(!chain.check_connectivity());

        chain.add_gate(Gate::from(GateKind::H), qubits([1])).unwrap();
        assert!(!chain.check_gate_set());

        chain.add_gate(Gate::from(GateKind::X), qubits([5])).unwrap();
        assert!(!chain.check_qubit_number());
        assert_eq!(chain.num_qubits(), 6);
    }

    #[test]
    fn test_measure_admitted_by_gate_set_check() {
        let chain = bell(linear_ibm(2));
        // H is not native but measure never fails the check.
        assert!(!chain.check_gate_set());
        let mut only_measure = GateChain::new(linear_ibm(2));
        only_measure.measure(QubitId(0), ClbitId(0));
        assert!(only_measure.check_gate_set());
    }

    #[test]
    fn test_with_hardware_keeps_ops() {
        let chain = bell(Arc::new(Hardware::unconstrained(2)));
        let rebound = chain.with_hardware(linear_ibm(2));
        assert_eq!(rebound, chain);
        assert_eq!(rebound.hardware().name(), "Ibm");
    }

    #[test]
    fn test_gate_counts_by_kind() {
        let chain = bell(Arc::new(Hardware::unconstrained(2)));
        let counts = chain.gate_counts();
        assert_eq!(counts[&GateKind::Measure], 2);
        assert_eq!(counts[&GateKind::H], 1);
        assert_eq!(chain.num_gates_on_qubit(QubitId(1)), 2);
    }
}
