//! Peephole cancellation of redundant gates.

use std::sync::Arc;

use qbench_ir::unitary::is_zero_angle;
use qbench_ir::{Gate, GateChain, GateKind, Hardware, Operation};
use tracing::debug;

use crate::error::PassResult;
use crate::pass::Pass;

/// Removes adjacent inverse pairs and merges adjacent same-axis rotations.
///
/// Two gates are adjacent when no other operation touches any of their
/// qubits in between. Sweeps repeat until nothing changes or
/// `max_iterations` is reached.
#[derive(Debug, Clone, Copy)]
pub struct CancelRedundancies {
    /// Upper bound on sweeps over the chain.
    pub max_iterations: usize,
}

impl Default for CancelRedundancies {
    fn default() -> Self {
        Self { max_iterations: 10 }
    }
}

impl CancelRedundancies {
    pub fn new(max_iterations: usize) -> Self {
        Self { max_iterations }
    }
}

fn symmetric(kind: GateKind) -> bool {
    matches!(kind, GateKind::CZ | GateKind::Swap)
}

fn same_operands(a: &Operation, b: &Operation) -> bool {
    if a.qubits == b.qubits {
        return true;
    }
    symmetric(a.kind()) && a.qubits.len() == 2 && a.qubits[0] == b.qubits[1] && a.qubits[1] == b.qubits[0]
}

fn inverse_pair(a: GateKind, b: GateKind) -> bool {
    use GateKind::*;
    matches!(
        (a, b),
        (S, Sdg) | (Sdg, S) | (T, Tdg) | (Tdg, T) | (SX, SXdg) | (SXdg, SX)
    )
}

fn cancels(a: &Operation, b: &Operation) -> bool {
    if !same_operands(a, b) {
        return false;
    }
    (a.kind() == b.kind() && a.kind().is_self_inverse()) || inverse_pair(a.kind(), b.kind())
}

/// Merge two same-axis rotations. `Some(None)` means the result is the identity.
fn merge(a: &Operation, b: &Operation) -> Option<Option<Operation>> {
    let kind = a.kind();
    if kind != b.kind() || a.qubits != b.qubits {
        return None;
    }
    if !matches!(kind, GateKind::Rx | GateKind::Ry | GateKind::Rz | GateKind::CRz) {
        return None;
    }
    let angle = a.gate.params()[0] + b.gate.params()[0];
    // A controlled rotation by 2π is not the identity.
    let vanishes = if kind == GateKind::CRz { is_zero_angle(angle / 2.0) } else { is_zero_angle(angle) };
    if vanishes {
        return Some(None);
    }
    let gate = Gate::new(kind, vec![angle]).ok()?;
    Some(Some(Operation { gate, qubits: a.qubits.clone(), clbits: Vec::new() }))
}

/// Index of the next live operation after `i` if it is the first to touch
/// every qubit of `ops[i]` and acts on no other qubit.
fn next_adjacent(ops: &[Operation], removed: &[bool], i: usize) -> Option<usize> {
    let mut found: Option<usize> = None;
    for q in &ops[i].qubits {
        let k = (i + 1..ops.len()).find(|&k| !removed[k] && ops[k].acts_on(*q))?;
        match found {
            Some(prev) if prev != k => return None,
            _ => found = Some(k),
        }
    }
    found.filter(|&k| ops[k].arity() == ops[i].arity())
}

fn sweep(mut ops: Vec<Operation>) -> (Vec<Operation>, usize) {
    let mut removed = vec![false; ops.len()];
    let mut changes = 0;
    for i in 0..ops.len() {
        if removed[i] || !ops[i].kind().is_unitary() {
            continue;
        }
        let Some(j) = next_adjacent(&ops, &removed, i) else {
            continue;
        };
        if cancels(&ops[i], &ops[j]) {
            removed[i] = true;
            removed[j] = true;
            changes += 1;
        } else if let Some(merged) = merge(&ops[i], &ops[j]) {
            removed[i] = true;
            match merged {
                Some(op) => ops[j] = op,
                None => removed[j] = true,
            }
            changes += 1;
        }
    }
    let kept = ops
        .into_iter()
        .zip(removed)
        .filter_map(|(op, gone)| (!gone).then_some(op))
        .collect();
    (kept, changes)
}

impl Pass for CancelRedundancies {
    fn name(&self) -> &str {
        "CancelRedundancies"
    }

    fn run(&self, chain: &GateChain, hardware: &Arc<Hardware>) -> PassResult<GateChain> {
        let mut ops = chain.ops().to_vec();
        for iteration in 0..self.max_iterations {
            let (next, changes) = sweep(ops);
            ops = next;
            debug!(iteration, changes, remaining = ops.len(), "cancellation sweep");
            if changes == 0 {
                break;
            }
        }
        let mut out = chain.empty_like();
        out.set_hardware(Arc::clone(hardware));
        for op in ops {
            out.push_op(op)?;
        }
        Ok(out)
    }
}
