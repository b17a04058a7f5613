//! Error types for the IR crate.

use crate::qubit::QubitId;
use thiserror::Error;

/// Errors that can occur while building, checking or simulating gate chains.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum IrError {
    /// Gate applied to the wrong number of qubits.
    #[error("Gate '{gate_name}' requires {expected} qubits, got {got}")]
    QubitCountMismatch {
        /// Name of the gate.
        gate_name: String,
        /// Expected number of qubits.
        expected: u32,
        /// Actual number of qubits provided.
        got: u32,
    },

    /// Gate constructed with the wrong number of angles.
    #[error("Gate '{gate_name}' takes {expected} parameters, got {got}")]
    ParameterCountMismatch {
        /// Name of the gate.
        gate_name: String,
        /// Expected number of parameters.
        expected: usize,
        /// Actual number of parameters provided.
        got: usize,
    },

    /// The same qubit appears twice in one operation.
    #[error("Duplicate qubit {qubit} in operation (gate: {gate_name})")]
    DuplicateQubit {
        /// The duplicate qubit.
        qubit: QubitId,
        /// Gate name for context.
        gate_name: String,
    },

    /// Gate name not known to the IR.
    #[error("Unknown gate: {0}")]
    UnknownGate(String),

    /// Angle expression could not be evaluated.
    #[error("Invalid angle expression '{0}'")]
    InvalidAngle(String),

    /// Connectivity description is malformed.
    #[error("Invalid connectivity: {0}")]
    InvalidConnectivity(String),

    /// Hardware description is malformed or names an unknown preset.
    #[error("Invalid hardware: {0}")]
    InvalidHardware(String),

    /// Dense simulation requested for too many qubits.
    #[error("Simulation of {num_qubits} qubits exceeds the limit of {limit}")]
    SimulationTooLarge {
        /// Requested width.
        num_qubits: usize,
        /// Configured limit.
        limit: usize,
    },

    /// Amplitude vector is not a normalised power-of-two state.
    #[error("Invalid state vector: {0}")]
    InvalidState(String),

    /// OpenQASM source could not be parsed.
    #[error("QASM error at line {line}: {message}")]
    Qasm {
        /// 1-based source line.
        line: usize,
        /// Description of the problem.
        message: String,
    },

    /// I/O failure reading or writing QASM files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for IR operations.
pub type IrResult<T> = Result<T, IrError>;
