//! Greedy SWAP routing.

use std::sync::Arc;

use qbench_ir::{Connectivity, Gate, GateChain, GateKind, Hardware, Operation, QubitId};
use tracing::debug;

use crate::error::{PassError, PassResult};
use crate::pass::Pass;
use crate::rebase::decompose;
use crate::used_width;

/// Bidirectional logical/physical qubit mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    to_physical: Vec<u32>,
    to_logical: Vec<u32>,
}

impl Layout {
    /// Logical qubit `i` on physical qubit `i`.
    pub fn trivial(num_qubits: u32) -> Self {
        let ids: Vec<u32> = (0..num_qubits).collect();
        Self { to_physical: ids.clone(), to_logical: ids }
    }

    /// Physical location of a logical qubit.
    pub fn physical(&self, logical: QubitId) -> Option<u32> {
        self.to_physical.get(logical.index()).copied()
    }

    /// Logical qubit currently held by a physical qubit.
    pub fn logical(&self, physical: u32) -> Option<QubitId> {
        self.to_logical.get(physical as usize).copied().map(QubitId)
    }

    /// Exchange the contents of two physical qubits.
    pub fn swap_physical(&mut self, p1: u32, p2: u32) {
        let (l1, l2) = (self.to_logical[p1 as usize], self.to_logical[p2 as usize]);
        self.to_logical.swap(p1 as usize, p2 as usize);
        self.to_physical[l1 as usize] = p2;
        self.to_physical[l2 as usize] = p1;
    }
}

/// Greedy routing on a trivial initial layout.
///
/// For each two-qubit gate on non-adjacent physical qubits, SWAPs move the
/// first operand along a shortest path until it neighbours the second. Gates
/// on a one-way edge are flipped (CZ, SWAP) or conjugated by Hadamards (CX).
/// Gates on three or more qubits are decomposed first unless the hardware
/// already connects all their operands.
#[derive(Debug, Clone, Copy, Default)]
pub struct GreedyRouting {
    /// Emit each SWAP as three CX gates.
    pub decompose_swaps: bool,
}

impl GreedyRouting {
    pub fn new(decompose_swaps: bool) -> Self {
        Self { decompose_swaps }
    }

    fn route(
        &self,
        op: Operation,
        layout: &mut Layout,
        conn: &Connectivity,
        out: &mut GateChain,
        swaps: &mut usize,
    ) -> PassResult<()> {
        let phys = map_qubits(&op.qubits, layout)?;

        if op.is_barrier() || op.arity() == 1 {
            out.push_op(Operation { gate: op.gate, qubits: phys, clbits: op.clbits })?;
            return Ok(());
        }

        if op.arity() > 2 {
            if conn.check_connection(&phys) {
                out.add_gate(op.gate, phys)?;
                return Ok(());
            }
            let parts = decompose(&op).ok_or(PassError::Unroutable { qubit1: phys[0].0, qubit2: phys[1].0 })?;
            for part in parts {
                self.route(part, layout, conn, out, swaps)?;
            }
            return Ok(());
        }

        let (a, b) = (phys[0].0, phys[1].0);
        if conn.distance(a, b) != Some(1) {
            let path = conn
                .shortest_path(a, b)
                .ok_or(PassError::Unroutable { qubit1: a, qubit2: b })?;
            for hop in path.windows(2).take(path.len().saturating_sub(2)) {
                self.emit_swap(hop[0], hop[1], conn, out)?;
                layout.swap_physical(hop[0], hop[1]);
                *swaps += 1;
            }
        }
        let phys = map_qubits(&op.qubits, layout)?;
        emit_2q(op.gate, phys[0].0, phys[1].0, conn, out)
    }

    fn emit_swap(&self, a: u32, b: u32, conn: &Connectivity, out: &mut GateChain) -> PassResult<()> {
        if self.decompose_swaps {
            for (x, y) in [(a, b), (b, a), (a, b)] {
                emit_2q(Gate::from(GateKind::CX), x, y, conn, out)?;
            }
            Ok(())
        } else {
            emit_2q(Gate::from(GateKind::Swap), a, b, conn, out)
        }
    }
}

fn map_qubits(qubits: &[QubitId], layout: &Layout) -> PassResult<Vec<QubitId>> {
    qubits
        .iter()
        .map(|q| {
            layout
                .physical(*q)
                .map(QubitId)
                .ok_or(PassError::Unroutable { qubit1: q.0, qubit2: q.0 })
        })
        .collect()
}

/// Emit a two-qubit gate on adjacent physical qubits, honouring edge direction.
fn emit_2q(gate: Gate, a: u32, b: u32, conn: &Connectivity, out: &mut GateChain) -> PassResult<()> {
    if conn.is_connected(a, b) {
        out.add_gate(gate, vec![QubitId(a), QubitId(b)])?;
        return Ok(());
    }
    match gate.kind() {
        GateKind::CZ | GateKind::Swap => {
            out.add_gate(gate, vec![QubitId(b), QubitId(a)])?;
        }
        GateKind::CX => {
            let h = || Gate::from(GateKind::H);
            out.add_gate(h(), vec![QubitId(a)])?;
            out.add_gate(h(), vec![QubitId(b)])?;
            out.add_gate(gate, vec![QubitId(b), QubitId(a)])?;
            out.add_gate(h(), vec![QubitId(a)])?;
            out.add_gate(h(), vec![QubitId(b)])?;
        }
        _ => {
            let op = Operation { gate, qubits: vec![QubitId(a), QubitId(b)], clbits: Vec::new() };
            let parts = decompose(&op).ok_or(PassError::Unroutable { qubit1: a, qubit2: b })?;
            for part in parts {
                if part.arity() == 2 {
                    emit_2q(part.gate, part.qubits[0].0, part.qubits[1].0, conn, out)?;
                } else {
                    out.push_op(part)?;
                }
            }
        }
    }
    Ok(())
}

impl Pass for GreedyRouting {
    fn name(&self) -> &str {
        "GreedyRouting"
    }

    fn run(&self, chain: &GateChain, hardware: &Arc<Hardware>) -> PassResult<GateChain> {
        let needed = used_width(chain);
        if needed > hardware.num_qubits() {
            return Err(PassError::TooWide {
                needed,
                available: hardware.num_qubits(),
                hardware: hardware.name().to_string(),
            });
        }
        let conn = hardware.connectivity();
        let mut layout = Layout::trivial(hardware.num_qubits());
        let mut out = chain.empty_like();
        out.set_hardware(Arc::clone(hardware));
        let mut swaps = 0usize;
        for op in chain.ops() {
            self.route(op.clone(), &mut layout, conn, &mut out, &mut swaps)?;
        }
        debug!(swaps, hardware = hardware.name(), "routing complete");
        Ok(out)
    }
}
