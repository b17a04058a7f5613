//! Artifacts flowing through a pipeline.

use std::sync::Arc;

use qbench_ir::{GateChain, Hardware, StateVector};

/// What a target generator produces and a strategy consumes.
///
/// Circuit transformation pipelines carry gate chains from start to end.
/// Synthesis pipelines start from a target state and produce a chain.
#[derive(Debug, Clone, PartialEq)]
pub enum Artifact {
    /// A gate chain bound to some hardware.
    Chain(GateChain),
    /// A target state to prepare from `|0..0>`.
    State(StateVector),
}

impl Artifact {
    /// The gate chain, if this artifact is one.
    pub fn as_chain(&self) -> Option<&GateChain> {
        match self {
            Artifact::Chain(chain) => Some(chain),
            Artifact::State(_) => None,
        }
    }

    /// The target state, if this artifact is one.
    pub fn as_state(&self) -> Option<&StateVector> {
        match self {
            Artifact::State(state) => Some(state),
            Artifact::Chain(_) => None,
        }
    }

    /// Hardware the chain is bound to; states have none.
    pub fn hardware(&self) -> Option<&Arc<Hardware>> {
        self.as_chain().map(GateChain::hardware)
    }

    /// Rebind a chain to `hardware`. States are left as they are.
    pub fn bind_hardware(&mut self, hardware: Arc<Hardware>) {
        if let Artifact::Chain(chain) = self {
            chain.set_hardware(hardware);
        }
    }

    /// Qubit width of the artifact.
    pub fn num_qubits(&self) -> u32 {
        match self {
            Artifact::Chain(chain) => chain.num_qubits(),
            Artifact::State(state) => state.num_qubits() as u32,
        }
    }

    /// Short kind name for log messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Artifact::Chain(_) => "chain",
            Artifact::State(_) => "state",
        }
    }
}

impl From<GateChain> for Artifact {
    fn from(chain: GateChain) -> Self {
        Artifact::Chain(chain)
    }
}

impl From<StateVector> for Artifact {
    fn from(state: StateVector) -> Self {
        Artifact::State(state)
    }
}
