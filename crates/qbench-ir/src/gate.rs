//! Quantum gate types.

use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{IrError, IrResult};
use crate::unitary::Unitary2x2;

/// Gate families with known semantics.
///
/// A kind identifies the operation independent of its rotation angles, which
/// live on [`Gate`]. Kinds are what gate sets, counters and registries key on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GateKind {
    /// Identity gate.
    I,
    /// Pauli-X gate.
    X,
    /// Pauli-Y gate.
    Y,
    /// Pauli-Z gate.
    Z,
    /// Hadamard gate.
    H,
    /// S gate (sqrt(Z)).
    S,
    /// S-dagger gate.
    Sdg,
    /// T gate (fourth root of Z).
    T,
    /// T-dagger gate.
    Tdg,
    /// sqrt(X) gate.
    SX,
    /// sqrt(X)-dagger gate.
    SXdg,
    /// Rotation around X.
    Rx,
    /// Rotation around Y.
    Ry,
    /// Rotation around Z.
    Rz,
    /// Universal single-qubit gate U3(θ, φ, λ).
    U3,
    /// Controlled-X (CNOT).
    CX,
    /// Controlled-Y.
    CY,
    /// Controlled-Z.
    CZ,
    /// SWAP.
    Swap,
    /// Controlled rotation around Z.
    CRz,
    /// Toffoli.
    CCX,
    /// Computational basis measurement.
    Measure,
    /// Scheduling barrier across any number of qubits.
    Barrier,
}

impl GateKind {
    /// Every kind, in declaration order.
    pub const ALL: [GateKind; 23] = [
        GateKind::I,
        GateKind::X,
        GateKind::Y,
        GateKind::Z,
        GateKind::H,
        GateKind::S,
        GateKind::Sdg,
        GateKind::T,
        GateKind::Tdg,
        GateKind::SX,
        GateKind::SXdg,
        GateKind::Rx,
        GateKind::Ry,
        GateKind::Rz,
        GateKind::U3,
        GateKind::CX,
        GateKind::CY,
        GateKind::CZ,
        GateKind::Swap,
        GateKind::CRz,
        GateKind::CCX,
        GateKind::Measure,
        GateKind::Barrier,
    ];

    /// OpenQASM name of the gate.
    #[inline]
    pub fn name(self) -> &'static str {
        match self {
            GateKind::I => "id",
            GateKind::X => "x",
            GateKind::Y => "y",
            GateKind::Z => "z",
            GateKind::H => "h",
            GateKind::S => "s",
            GateKind::Sdg => "sdg",
            GateKind::T => "t",
            GateKind::Tdg => "tdg",
            GateKind::SX => "sx",
            GateKind::SXdg => "sxdg",
            GateKind::Rx => "rx",
            GateKind::Ry => "ry",
            GateKind::Rz => "rz",
            GateKind::U3 => "u3",
            GateKind::CX => "cx",
            GateKind::CY => "cy",
            GateKind::CZ => "cz",
            GateKind::Swap => "swap",
            GateKind::CRz => "crz",
            GateKind::CCX => "ccx",
            GateKind::Measure => "measure",
            GateKind::Barrier => "barrier",
        }
    }

    /// Human-readable label used in metric names, e.g. `Cnot` or `Rx`.
    pub fn label(self) -> &'static str {
        match self {
            GateKind::I => "Id",
            GateKind::X => "X",
            GateKind::Y => "Y",
            GateKind::Z => "Z",
            GateKind::H => "H",
            GateKind::S => "S",
            GateKind::Sdg => "Sdg",
            GateKind::T => "T",
            GateKind::Tdg => "Tdg",
            GateKind::SX => "SX",
            GateKind::SXdg => "SXdg",
            GateKind::Rx => "Rx",
            GateKind::Ry => "Ry",
            GateKind::Rz => "Rz",
            GateKind::U3 => "U3",
            GateKind::CX => "Cnot",
            GateKind::CY => "Cy",
            GateKind::CZ => "Cz",
            GateKind::Swap => "Swap",
            GateKind::CRz => "CRz",
            GateKind::CCX => "Toffoli",
            GateKind::Measure => "Measure",
            GateKind::Barrier => "Barrier",
        }
    }

    /// Look a kind up by OpenQASM name or common alias, case-insensitively.
    pub fn from_name(name: &str) -> Option<GateKind> {
        let lower = name.trim().to_ascii_lowercase();
        let kind = match lower.as_str() {
            "id" | "i" => GateKind::I,
            "x" => GateKind::X,
            "y" => GateKind::Y,
            "z" => GateKind::Z,
            "h" => GateKind::H,
            "s" => GateKind::S,
            "sdg" => GateKind::Sdg,
            "t" => GateKind::T,
            "tdg" => GateKind::Tdg,
            "sx" => GateKind::SX,
            "sxdg" => GateKind::SXdg,
            "rx" => GateKind::Rx,
            "ry" => GateKind::Ry,
            "rz" => GateKind::Rz,
            "u3" | "u" => GateKind::U3,
            "cx" | "cnot" => GateKind::CX,
            "cy" => GateKind::CY,
            "cz" => GateKind::CZ,
            "swap" => GateKind::Swap,
            "crz" => GateKind::CRz,
            "ccx" | "toffoli" => GateKind::CCX,
            "measure" => GateKind::Measure,
            "barrier" => GateKind::Barrier,
            _ => return None,
        };
        Some(kind)
    }

    /// Number of qubits the gate acts on. `None` for barriers.
    #[inline]
    pub fn num_qubits(self) -> Option<u32> {
        match self {
            GateKind::Barrier => None,
            GateKind::CX | GateKind::CY | GateKind::CZ | GateKind::Swap | GateKind::CRz => Some(2),
            GateKind::CCX => Some(3),
            _ => Some(1),
        }
    }

    /// Number of rotation angles the gate takes.
    #[inline]
    pub fn num_params(self) -> usize {
        match self {
            GateKind::Rx | GateKind::Ry | GateKind::Rz | GateKind::CRz => 1,
            GateKind::U3 => 3,
            _ => 0,
        }
    }

    /// Whether the gate has a unitary matrix (everything except measure and barrier).
    #[inline]
    pub fn is_unitary(self) -> bool {
        !matches!(self, GateKind::Measure | GateKind::Barrier)
    }

    /// Whether the gate is its own inverse.
    pub fn is_self_inverse(self) -> bool {
        matches!(
            self,
            GateKind::I
                | GateKind::X
                | GateKind::Y
                | GateKind::Z
                | GateKind::H
                | GateKind::CX
                | GateKind::CY
                | GateKind::CZ
                | GateKind::Swap
                | GateKind::CCX
        )
    }
}

impl fmt::Display for GateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A gate: a kind plus its concrete rotation angles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gate {
    kind: GateKind,
    params: Vec<f64>,
}

impl Gate {
    /// Create a gate, checking the number of angles against the kind.
    pub fn new(kind: GateKind, params: Vec<f64>) -> IrResult<Self> {
        if params.len() != kind.num_params() {
            return Err(IrError::ParameterCountMismatch {
                gate_name: kind.name().into(),
                expected: kind.num_params(),
                got: params.len(),
            });
        }
        Ok(Self { kind, params })
    }

    /// Rotation around X.
    pub fn rx(theta: f64) -> Self {
        Self { kind: GateKind::Rx, params: vec![theta] }
    }

    /// Rotation around Y.
    pub fn ry(theta: f64) -> Self {
        Self { kind: GateKind::Ry, params: vec![theta] }
    }

    /// Rotation around Z.
    pub fn rz(theta: f64) -> Self {
        Self { kind: GateKind::Rz, params: vec![theta] }
    }

    /// Universal single-qubit gate.
    pub fn u3(theta: f64, phi: f64, lambda: f64) -> Self {
        Self { kind: GateKind::U3, params: vec![theta, phi, lambda] }
    }

    /// Controlled Z rotation.
    pub fn crz(theta: f64) -> Self {
        Self { kind: GateKind::CRz, params: vec![theta] }
    }

    /// The gate kind.
    #[inline]
    pub fn kind(&self) -> GateKind {
        self.kind
    }

    /// Rotation angles.
    #[inline]
    pub fn params(&self) -> &[f64] {
        &self.params
    }

    /// OpenQASM name.
    #[inline]
    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    /// Single-qubit matrix, if the gate is a one-qubit unitary.
    pub fn unitary_1q(&self) -> Option<Unitary2x2> {
        let p = &self.params;
        let u = match self.kind {
            GateKind::I => Unitary2x2::identity(),
            GateKind::X => Unitary2x2::x(),
            GateKind::Y => Unitary2x2::y(),
            GateKind::Z => Unitary2x2::z(),
            GateKind::H => Unitary2x2::h(),
            GateKind::S => Unitary2x2::s(),
            GateKind::Sdg => Unitary2x2::sdg(),
            GateKind::T => Unitary2x2::t(),
            GateKind::Tdg => Unitary2x2::tdg(),
            GateKind::SX => Unitary2x2::sx(),
            GateKind::SXdg => Unitary2x2::sxdg(),
            GateKind::Rx => Unitary2x2::rx(p[0]),
            GateKind::Ry => Unitary2x2::ry(p[0]),
            GateKind::Rz => Unitary2x2::rz(p[0]),
            GateKind::U3 => Unitary2x2::u3(p[0], p[1], p[2]),
            _ => return None,
        };
        Some(u)
    }

    /// Dense row-major matrix of size `2^k x 2^k`.
    ///
    /// The first qubit of an operation is the most significant bit of the
    /// matrix index, so `cx` is `diag(I, X)` with the control first.
    /// Returns `None` for measure and barrier.
    pub fn matrix(&self) -> Option<Vec<Complex64>> {
        if let Some(u) = self.unitary_1q() {
            return Some(u.data.to_vec());
        }
        let m = match self.kind {
            GateKind::CX => controlled(&Unitary2x2::x().data, 2),
            GateKind::CY => controlled(&Unitary2x2::y().data, 2),
            GateKind::CZ => controlled(&Unitary2x2::z().data, 2),
            GateKind::CRz => controlled(&Unitary2x2::rz(self.params[0]).data, 2),
            GateKind::CCX => controlled(&controlled(&Unitary2x2::x().data, 2), 4),
            GateKind::Swap => {
                let mut m = vec![Complex64::new(0.0, 0.0); 16];
                for (row, col) in [(0, 0), (1, 2), (2, 1), (3, 3)] {
                    m[row * 4 + col] = Complex64::new(1.0, 0.0);
                }
                m
            }
            _ => return None,
        };
        Some(m)
    }
}

/// Builds `diag(I, U)` for a `dim x dim` matrix `u`.
fn controlled(u: &[Complex64], dim: usize) -> Vec<Complex64> {
    let size = dim * 2;
    let mut m = vec![Complex64::new(0.0, 0.0); size * size];
    for i in 0..dim {
        m[i * size + i] = Complex64::new(1.0, 0.0);
    }
    for r in 0..dim {
        for c in 0..dim {
            m[(dim + r) * size + dim + c] = u[r * dim + c];
        }
    }
    m
}

impl From<GateKind> for Gate {
    /// Gate of the given kind with every angle set to zero.
    fn from(kind: GateKind) -> Self {
        Self { kind, params: vec![0.0; kind.num_params()] }
    }
}

impl fmt::Display for Gate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind.name())?;
        if !self.params.is_empty() {
            let angles: Vec<String> = self.params.iter().map(|p| p.to_string()).collect();
            write!(f, "({})", angles.join(","))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_round_trip() {
        for kind in GateKind::ALL {
            assert_eq!(GateKind::from_name(kind.name()), Some(kind));
        }
        assert_eq!(GateKind::from_name("CNOT"), Some(GateKind::CX));
        assert_eq!(GateKind::from_name("U"), Some(GateKind::U3));
        assert_eq!(GateKind::from_name("frobnicate"), None);
    }

    #[test]
    fn test_param_count_checked() {
        assert!(Gate::new(GateKind::Rx, vec![0.1]).is_ok());
        let err = Gate::new(GateKind::U3, vec![0.1]).unwrap_err();
        assert!(matches!(err, IrError::ParameterCountMismatch { expected: 3, got: 1, .. }));
    }

    #[test]
    fn test_display() {
        assert_eq!(Gate::from(GateKind::CX).to_string(), "cx");
        assert_eq!(Gate::rz(0.5).to_string(), "rz(0.5)");
    }

    #[test]
    fn test_arity() {
        assert_eq!(GateKind::H.num_qubits(), Some(1));
        assert_eq!(GateKind::Swap.num_qubits(), Some(2));
        assert_eq!(GateKind::CCX.num_qubits(), Some(3));
        assert_eq!(GateKind::Barrier.num_qubits(), None);
    }

    #[test]
    fn test_matrix_shapes() {
        assert_eq!(Gate::from(GateKind::H).matrix().unwrap().len(), 4);
        assert_eq!(Gate::from(GateKind::CX).matrix().unwrap().len(), 16);
        assert_eq!(Gate::from(GateKind::CCX).matrix().unwrap().len(), 64);
        assert!(Gate::from(GateKind::Measure).matrix().is_none());
    }

    #[test]
    fn test_cx_matrix() {
        let m = Gate::from(GateKind::CX).matrix().unwrap();
        // |10> -> |11>
        assert!((m[3 * 4 + 2].re - 1.0).abs() < 1e-12);
        assert!((m[2 * 4 + 2].re).abs() < 1e-12);
    }
}
