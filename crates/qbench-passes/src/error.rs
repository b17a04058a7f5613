//! Error types for the transformation engines.

use qbench_ir::IrError;
use thiserror::Error;

/// Errors raised by a transformation pass.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PassError {
    /// Error building the output chain.
    #[error("IR error: {0}")]
    Ir(#[from] IrError),

    /// No path between two physical qubits.
    #[error("Routing failed: no path between qubits {qubit1} and {qubit2}")]
    Unroutable {
        /// First physical qubit.
        qubit1: u32,
        /// Second physical qubit.
        qubit2: u32,
    },

    /// Circuit is wider than the target hardware.
    #[error("Circuit needs {needed} qubits but hardware '{hardware}' has {available}")]
    TooWide {
        /// Qubits used by the circuit.
        needed: u32,
        /// Qubits on the hardware.
        available: u32,
        /// Hardware name.
        hardware: String,
    },

    /// The target gate set cannot express a gate.
    #[error("Gate set [{gate_set}] cannot express '{gate}'")]
    UnsupportedBasis {
        /// Gate that could not be translated.
        gate: String,
        /// Target gate set.
        gate_set: String,
    },
}

/// Result type for pass operations.
pub type PassResult<T> = Result<T, PassError>;
