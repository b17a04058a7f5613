//! Measurement and barrier pre/post-processing.

use std::sync::Arc;

use qbench_ir::{ClbitId, Gate, GateChain, GateKind, Hardware, QubitId};

use crate::error::PassResult;
use crate::pass::Pass;

/// Appends a barrier and/or a measurement of every qubit.
///
/// With `add_measure`, a barrier over all qubits is followed by
/// `measure q[i] -> c[i]` for each qubit, whether or not `add_barrier` is set.
#[derive(Debug, Clone, Copy, Default)]
pub struct PreProcessing {
    pub add_measure: bool,
    pub add_barrier: bool,
}

impl Pass for PreProcessing {
    fn name(&self) -> &str {
        "PreProcessing"
    }

    fn run(&self, chain: &GateChain, hardware: &Arc<Hardware>) -> PassResult<GateChain> {
        let mut out = chain.with_hardware(Arc::clone(hardware));
        let n = chain.num_qubits();
        if n == 0 {
            return Ok(out);
        }
        if self.add_barrier || self.add_measure {
            out.add_gate(Gate::from(GateKind::Barrier), (0..n).map(QubitId).collect())?;
        }
        if self.add_measure {
            for q in 0..n {
                out.measure(QubitId(q), ClbitId(q));
            }
        }
        Ok(out)
    }
}

/// Strips measurements and/or barriers.
#[derive(Debug, Clone, Copy, Default)]
pub struct PostProcessing {
    pub remove_measure: bool,
    pub remove_barrier: bool,
}

impl Pass for PostProcessing {
    fn name(&self) -> &str {
        "PostProcessing"
    }

    fn run(&self, chain: &GateChain, hardware: &Arc<Hardware>) -> PassResult<GateChain> {
        let mut out = if self.remove_measure {
            GateChain::new(Arc::clone(hardware))
        } else {
            let mut c = chain.empty_like();
            c.set_hardware(Arc::clone(hardware));
            c
        };
        for op in chain.ops() {
            let drop = match op.kind() {
                GateKind::Measure => self.remove_measure,
                GateKind::Barrier => self.remove_barrier,
                _ => false,
            };
            if !drop {
                out.push_op(op.clone())?;
            }
        }
        Ok(out)
    }
}
