//! Gate-set rebasing.
//!
//! Multi-qubit gates the target lacks are decomposed into CX plus
//! single-qubit gates; runs of single-qubit gates are fused into one matrix
//! and re-synthesised in the target's single-qubit basis.

use std::f64::consts::FRAC_PI_2;
use std::sync::Arc;

use qbench_ir::unitary::is_zero_angle;
use qbench_ir::{Gate, GateChain, GateKind, GateSet, Hardware, Operation, QubitId, Unitary2x2};
use rustc_hash::FxHashMap;
use tracing::debug;

use crate::error::{PassError, PassResult};
use crate::pass::Pass;
use crate::used_width;

fn op(gate: Gate, qubits: &[QubitId]) -> Operation {
    Operation { gate, qubits: qubits.to_vec(), clbits: Vec::new() }
}

fn fixed(kind: GateKind, qubits: &[QubitId]) -> Operation {
    op(Gate::from(kind), qubits)
}

/// Decompose a multi-qubit gate into CX and single-qubit gates, in time order.
///
/// Returns `None` for gates that are already elementary (single-qubit, CX,
/// measure, barrier).
pub fn decompose(operation: &Operation) -> Option<Vec<Operation>> {
    use GateKind::*;
    let q = &operation.qubits;
    let ops = match operation.kind() {
        CZ => vec![fixed(H, &q[1..2]), fixed(CX, q), fixed(H, &q[1..2])],
        CY => vec![fixed(Sdg, &q[1..2]), fixed(CX, q), fixed(S, &q[1..2])],
        Swap => {
            let rev = [q[1], q[0]];
            vec![fixed(CX, q), fixed(CX, &rev), fixed(CX, q)]
        }
        CRz => {
            let theta = operation.gate.params()[0];
            vec![
                op(Gate::rz(theta / 2.0), &q[1..2]),
                fixed(CX, q),
                op(Gate::rz(-theta / 2.0), &q[1..2]),
                fixed(CX, q),
            ]
        }
        CCX => {
            let (a, b, c) = (q[0], q[1], q[2]);
            vec![
                fixed(H, &[c]),
                fixed(CX, &[b, c]),
                fixed(Tdg, &[c]),
                fixed(CX, &[a, c]),
                fixed(T, &[c]),
                fixed(CX, &[b, c]),
                fixed(Tdg, &[c]),
                fixed(CX, &[a, c]),
                fixed(T, &[b]),
                fixed(T, &[c]),
                fixed(H, &[c]),
                fixed(CX, &[a, b]),
                fixed(T, &[a]),
                fixed(Tdg, &[b]),
                fixed(CX, &[a, b]),
            ]
        }
        _ => return None,
    };
    Some(ops)
}

/// How single-qubit unitaries are expressed on the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OneQubitBasis {
    /// One `u3` per fused run.
    U3,
    /// `rz · ry · rz`.
    ZY,
    /// `rz · rx · rz`.
    ZX,
    /// No free-angle basis: gates must already be native.
    Native,
}

impl OneQubitBasis {
    fn for_gate_set(gs: &GateSet) -> Self {
        if gs.contains_free(GateKind::U3) {
            OneQubitBasis::U3
        } else if gs.contains_free(GateKind::Rz) && gs.contains_free(GateKind::Ry) {
            OneQubitBasis::ZY
        } else if gs.contains_free(GateKind::Rz) && gs.contains_free(GateKind::Rx) {
            OneQubitBasis::ZX
        } else {
            OneQubitBasis::Native
        }
    }
}

/// Translate every gate into the target hardware's gate set.
///
/// Supported targets have CX or CZ as entangler and a single-qubit basis of
/// `u3`, `{rz, ry}` or `{rz, rx}`. Gates the target already admits are kept.
#[derive(Debug, Clone, Copy, Default)]
pub struct GateSetRebase;

impl Pass for GateSetRebase {
    fn name(&self) -> &str {
        "GateSetRebase"
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
        let gate_set = hardware.gate_set();
        let mut rebaser = Rebaser {
            gate_set,
            basis: OneQubitBasis::for_gate_set(gate_set),
            pending: FxHashMap::default(),
            out: chain.empty_like(),
        };
        rebaser.out.set_hardware(Arc::clone(hardware));
        debug!(basis = ?rebaser.basis, gates = chain.len(), "rebasing");
        for operation in chain.ops() {
            rebaser.process(operation.clone())?;
        }
        rebaser.flush_all()?;
        Ok(rebaser.out)
    }
}

struct Rebaser<'a> {
    gate_set: &'a GateSet,
    basis: OneQubitBasis,
    pending: FxHashMap<QubitId, Unitary2x2>,
    out: GateChain,
}

impl Rebaser<'_> {
    fn unsupported(&self, gate: &Gate) -> PassError {
        PassError::UnsupportedBasis { gate: gate.to_string(), gate_set: self.gate_set.to_string() }
    }

    fn process(&mut self, operation: Operation) -> PassResult<()> {
        let kind = operation.kind();
        if !kind.is_unitary() {
            self.flush(&operation.qubits)?;
            self.out.push_op(operation)?;
            return Ok(());
        }

        if operation.arity() == 1 {
            if self.basis == OneQubitBasis::Native {
                if !self.gate_set.contains(&operation.gate) {
                    return Err(self.unsupported(&operation.gate));
                }
                self.out.push_op(operation)?;
                return Ok(());
            }
            let u = operation
                .gate
                .unitary_1q()
                .ok_or_else(|| self.unsupported(&operation.gate))?;
            let q = operation.qubits[0];
            let acc = self.pending.entry(q).or_insert_with(Unitary2x2::identity);
            *acc = u.mul(acc);
            return Ok(());
        }

        if self.gate_set.contains(&operation.gate) {
            self.flush(&operation.qubits)?;
            self.out.push_op(operation)?;
            return Ok(());
        }

        if kind == GateKind::CX && self.gate_set.contains_free(GateKind::CZ) {
            let q = &operation.qubits;
            for part in [fixed(GateKind::H, &q[1..2]), fixed(GateKind::CZ, q), fixed(GateKind::H, &q[1..2])] {
                self.process(part)?;
            }
            return Ok(());
        }

        match decompose(&operation) {
            Some(parts) => parts.into_iter().try_for_each(|p| self.process(p)),
            None => Err(self.unsupported(&operation.gate)),
        }
    }

    fn flush(&mut self, qubits: &[QubitId]) -> PassResult<()> {
        for q in qubits {
            if let Some(u) = self.pending.remove(q) {
                self.emit_1q(&u, *q)?;
            }
        }
        Ok(())
    }

    fn flush_all(&mut self) -> PassResult<()> {
        let mut qubits: Vec<QubitId> = self.pending.keys().copied().collect();
        qubits.sort_unstable();
        self.flush(&qubits)
    }

    fn push_rotation(&mut self, gate: Gate, q: QubitId) -> PassResult<()> {
        if !is_zero_angle(gate.params()[0]) {
            self.out.add_gate(gate, vec![q])?;
        }
        Ok(())
    }

    fn emit_1q(&mut self, u: &Unitary2x2, q: QubitId) -> PassResult<()> {
        if u.is_identity() {
            return Ok(());
        }
        let (theta, phi, lambda) = u.u3_angles();
        match self.basis {
            OneQubitBasis::U3 => {
                self.out.add_gate(Gate::u3(theta, phi, lambda), vec![q])?;
            }
            OneQubitBasis::ZY if is_zero_angle(theta) => {
                self.push_rotation(Gate::rz(phi + lambda), q)?;
            }
            OneQubitBasis::ZY => {
                self.push_rotation(Gate::rz(lambda), q)?;
                self.out.add_gate(Gate::ry(theta), vec![q])?;
                self.push_rotation(Gate::rz(phi), q)?;
            }
            OneQubitBasis::ZX if is_zero_angle(theta) => {
                self.push_rotation(Gate::rz(phi + lambda), q)?;
            }
            OneQubitBasis::ZX => {
                self.push_rotation(Gate::rz(lambda - FRAC_PI_2), q)?;
                self.out.add_gate(Gate::rx(theta), vec![q])?;
                self.push_rotation(Gate::rz(phi + FRAC_PI_2), q)?;
            }
            OneQubitBasis::Native => return Err(self.unsupported(&Gate::u3(theta, phi, lambda))),
        }
        Ok(())
    }
}
