//! Dense state-vector simulation for fidelity and equivalence checks.
//!
//! Qubit `k` is bit `k` of the amplitude index (little-endian). Only small
//! widths are supported; callers pass an explicit qubit limit.

use num_complex::Complex64;

use crate::chain::GateChain;
use crate::error::{IrError, IrResult};
use crate::qubit::QubitId;

/// Default upper bound on simulated width.
pub const DEFAULT_MAX_QUBITS: usize = 10;

const NORM_TOLERANCE: f64 = 1e-6;

/// A pure state on `num_qubits` qubits.
#[derive(Debug, Clone, PartialEq)]
pub struct StateVector {
    num_qubits: usize,
    amps: Vec<Complex64>,
}

impl StateVector {
    /// `|0...0>` on `num_qubits` qubits.
    pub fn zero(num_qubits: usize, limit: usize) -> IrResult<Self> {
        check_width(num_qubits, limit)?;
        let mut amps = vec![Complex64::new(0.0, 0.0); 1 << num_qubits];
        amps[0] = Complex64::new(1.0, 0.0);
        Ok(Self { num_qubits, amps })
    }

    /// Computational basis state `|index>`.
    pub fn basis(num_qubits: usize, index: usize, limit: usize) -> IrResult<Self> {
        let mut s = Self::zero(num_qubits, limit)?;
        if index >= s.amps.len() {
            return Err(IrError::InvalidState(format!("basis index {index} out of range")));
        }
        s.amps[0] = Complex64::new(0.0, 0.0);
        s.amps[index] = Complex64::new(1.0, 0.0);
        Ok(s)
    }

    /// Wrap amplitudes; the length must be a power of two and the norm one.
    pub fn from_amplitudes(amps: Vec<Complex64>) -> IrResult<Self> {
        let len = amps.len();
        if len == 0 || !len.is_power_of_two() {
            return Err(IrError::InvalidState(format!("length {len} is not a power of two")));
        }
        let norm: f64 = amps.iter().map(|a| a.norm_sqr()).sum();
        if (norm - 1.0).abs() > NORM_TOLERANCE {
            return Err(IrError::InvalidState(format!("norm {norm:.6} != 1")));
        }
        Ok(Self { num_qubits: len.trailing_zeros() as usize, amps })
    }

    #[inline]
    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    #[inline]
    pub fn amplitudes(&self) -> &[Complex64] {
        &self.amps
    }

    /// Pad with `|0>` on new high qubits.
    pub fn widen(&self, num_qubits: usize) -> Self {
        if num_qubits <= self.num_qubits {
            return self.clone();
        }
        let mut amps = self.amps.clone();
        amps.resize(1 << num_qubits, Complex64::new(0.0, 0.0));
        Self { num_qubits, amps }
    }

    /// Apply a `2^k x 2^k` row-major matrix to `qubits`, first qubit most significant.
    pub fn apply_matrix(&mut self, matrix: &[Complex64], qubits: &[QubitId]) {
        let k = qubits.len();
        let dim = 1usize << k;
        let mask: usize = qubits.iter().map(|q| 1usize << q.index()).sum();
        let offsets: Vec<usize> = (0..dim)
            .map(|m| {
                qubits
                    .iter()
                    .enumerate()
                    .filter(|(j, _)| m & (1 << (k - 1 - j)) != 0)
                    .map(|(_, q)| 1usize << q.index())
                    .sum()
            })
            .collect();
        let mut local = vec![Complex64::new(0.0, 0.0); dim];
        for base in 0..self.amps.len() {
            if base & mask != 0 {
                continue;
            }
            for (m, off) in offsets.iter().enumerate() {
                local[m] = self.amps[base | off];
            }
            for (r, off) in offsets.iter().enumerate() {
                let row = &matrix[r * dim..(r + 1) * dim];
                self.amps[base | off] = row.iter().zip(&local).map(|(a, b)| a * b).sum();
            }
        }
    }

    /// Apply every unitary gate of `chain`; measurements and barriers are skipped.
    pub fn apply_chain(&mut self, chain: &GateChain) -> IrResult<()> {
        for op in chain.ops() {
            if let Some(matrix) = op.gate.matrix() {
                if op.qubits.iter().any(|q| q.index() >= self.num_qubits) {
                    return Err(IrError::InvalidState(format!(
                        "gate {} touches a qubit outside a {}-qubit state",
                        op.gate, self.num_qubits
                    )));
                }
                self.apply_matrix(&matrix, &op.qubits);
            }
        }
        Ok(())
    }

    /// `<self|other>`.
    pub fn inner(&self, other: &Self) -> Complex64 {
        self.amps.iter().zip(&other.amps).map(|(a, b)| a.conj() * b).sum()
    }

    /// `|<self|other>|^2`.
    pub fn fidelity(&self, other: &Self) -> f64 {
        self.inner(other).norm_sqr()
    }
}

fn check_width(num_qubits: usize, limit: usize) -> IrResult<()> {
    if num_qubits > limit {
        return Err(IrError::SimulationTooLarge { num_qubits, limit });
    }
    Ok(())
}

/// Normalised process overlap `|Tr(U_a^† U_b)| / 2^n` of two chains'
/// unitaries, ignoring measurements. 1.0 means equal up to global phase.
pub fn process_fidelity(a: &GateChain, b: &GateChain, limit: usize) -> IrResult<f64> {
    let n = a.num_qubits().max(b.num_qubits()) as usize;
    check_width(n, limit)?;
    let dim = 1usize << n;
    let mut trace = Complex64::new(0.0, 0.0);
    for k in 0..dim {
        let mut sa = StateVector::basis(n, k, limit)?;
        let mut sb = sa.clone();
        sa.apply_chain(a)?;
        sb.apply_chain(b)?;
        trace += sa.inner(&sb);
    }
    Ok(trace.norm() / dim as f64)
}

/// Whether two chains implement the same unitary up to global phase.
pub fn equivalent(a: &GateChain, b: &GateChain, limit: usize) -> IrResult<bool> {
    Ok((process_fidelity(a, b, limit)? - 1.0).abs() < 1e-6)
}

/// `|<target|chain|0>|^2`, widening the target with `|0>` when the chain is wider.
pub fn state_fidelity(target: &StateVector, chain: &GateChain, limit: usize) -> IrResult<f64> {
    let n = target.num_qubits().max(chain.num_qubits() as usize);
    let mut produced = StateVector::zero(n, limit)?;
    produced.apply_chain(chain)?;
    Ok(target.widen(n).fidelity(&produced))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gate::{Gate, GateKind};
    use crate::hardware::Hardware;
    use crate::qubit::qubits;
    use std::f64::consts::FRAC_1_SQRT_2;
    use std::sync::Arc;

    fn chain(n: u32) -> GateChain {
        GateChain::new(Arc::new(Hardware::unconstrained(n)))
    }

    #[test]
    fn test_bell_state() {
        let mut c = chain(2);
        c.add_gate(Gate::from(GateKind::H), qubits([0])).unwrap();
        c.add_gate(Gate::from(GateKind::CX), qubits([0, 1])).unwrap();
        let mut s = StateVector::zero(2, 4).unwrap();
        s.apply_chain(&c).unwrap();
        let a = s.amplitudes();
        assert!((a[0].re - FRAC_1_SQRT_2).abs() < 1e-12);
        assert!((a[3].re - FRAC_1_SQRT_2).abs() < 1e-12);
        assert!(a[1].norm() < 1e-12 && a[2].norm() < 1e-12);
    }

    #[test]
    fn test_cx_direction() {
        // Control is the first qubit: X on q1 then CX(1, 0) flips q0.
        let mut c = chain(2);
        c.add_gate(Gate::from(GateKind::X), qubits([1])).unwrap();
        c.add_gate(Gate::from(GateKind::CX), qubits([1, 0])).unwrap();
        let mut s = StateVector::zero(2, 4).unwrap();
        s.apply_chain(&c).unwrap();
        assert!((s.amplitudes()[3].re - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_swap_equals_three_cx() {
        let mut a = chain(2);
        a.add_gate(Gate::from(GateKind::Swap), qubits([0, 1])).unwrap();
        let mut b = chain(2);
        for qs in [[0, 1], [1, 0], [0, 1]] {
            b.add_gate(Gate::from(GateKind::CX), qubits(qs)).unwrap();
        }
        assert!(equivalent(&a, &b, 4).unwrap());
    }

    #[test]
    fn test_different_unitaries() {
        let mut a = chain(1);
        a.add_gate(Gate::from(GateKind::X), qubits([0])).unwrap();
        let b = chain(1);
        assert!(process_fidelity(&a, &b, 4).unwrap() < 1e-9);
        assert!(!equivalent(&a, &b, 4).unwrap());
    }

    #[test]
    fn test_width_limit() {
        let c = chain(5);
        let err = process_fidelity(&c, &c, 4).unwrap_err();
        assert!(matches!(err, IrError::SimulationTooLarge { num_qubits: 5, limit: 4 }));
    }

    #[test]
    fn test_state_fidelity_widens_target() {
        let target = StateVector::from_amplitudes(vec![
            Complex64::new(FRAC_1_SQRT_2, 0.0),
            Complex64::new(FRAC_1_SQRT_2, 0.0),
        ])
        .unwrap();
        let mut c = chain(2);
        c.add_gate(Gate::from(GateKind::H), qubits([0])).unwrap();
        assert!((state_fidelity(&target, &c, 4).unwrap() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_rejects_unnormalised() {
        assert!(StateVector::from_amplitudes(vec![Complex64::new(1.0, 0.0); 2]).is_err());
        assert!(StateVector::from_amplitudes(vec![Complex64::new(1.0, 0.0); 3]).is_err());
    }
}
