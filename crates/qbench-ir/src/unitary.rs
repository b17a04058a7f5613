//! 2x2 unitary matrices for single-qubit gates.
//!
//! Used by the simulator, by gate-set rebasing (via [`Unitary2x2::u3_angles`])
//! and by the redundancy-cancellation pass.

use num_complex::Complex64;
use std::f64::consts::{FRAC_1_SQRT_2, FRAC_PI_2, FRAC_PI_4, PI};

/// Tolerance for floating point comparisons.
pub const EPSILON: f64 = 1e-10;

#[inline]
fn c(re: f64, im: f64) -> Complex64 {
    Complex64::new(re, im)
}

/// A 2x2 matrix in row-major order: `[[a, b], [c, d]]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Unitary2x2 {
    /// Matrix elements, row-major.
    pub data: [Complex64; 4],
}

impl Unitary2x2 {
    /// Build from row-major elements.
    pub fn new(a: Complex64, b: Complex64, c: Complex64, d: Complex64) -> Self {
        Self { data: [a, b, c, d] }
    }

    fn diag(a: Complex64, d: Complex64) -> Self {
        Self::new(a, c(0.0, 0.0), c(0.0, 0.0), d)
    }

    pub fn identity() -> Self {
        Self::diag(c(1.0, 0.0), c(1.0, 0.0))
    }

    pub fn x() -> Self {
        Self::new(c(0.0, 0.0), c(1.0, 0.0), c(1.0, 0.0), c(0.0, 0.0))
    }

    pub fn y() -> Self {
        Self::new(c(0.0, 0.0), c(0.0, -1.0), c(0.0, 1.0), c(0.0, 0.0))
    }

    pub fn z() -> Self {
        Self::diag(c(1.0, 0.0), c(-1.0, 0.0))
    }

    pub fn h() -> Self {
        let s = FRAC_1_SQRT_2;
        Self::new(c(s, 0.0), c(s, 0.0), c(s, 0.0), c(-s, 0.0))
    }

    /// Phase gate `diag(1, e^{iλ})`.
    pub fn phase(lambda: f64) -> Self {
        Self::diag(c(1.0, 0.0), Complex64::from_polar(1.0, lambda))
    }

    pub fn s() -> Self {
        Self::phase(FRAC_PI_2)
    }

    pub fn sdg() -> Self {
        Self::phase(-FRAC_PI_2)
    }

    pub fn t() -> Self {
        Self::phase(FRAC_PI_4)
    }

    pub fn tdg() -> Self {
        Self::phase(-FRAC_PI_4)
    }

    pub fn sx() -> Self {
        Self::new(c(0.5, 0.5), c(0.5, -0.5), c(0.5, -0.5), c(0.5, 0.5))
    }

    pub fn sxdg() -> Self {
        Self::sx().dagger()
    }

    /// `exp(-iθX/2)`.
    pub fn rx(theta: f64) -> Self {
        let (s, co) = (theta / 2.0).sin_cos();
        Self::new(c(co, 0.0), c(0.0, -s), c(0.0, -s), c(co, 0.0))
    }

    /// `exp(-iθY/2)`.
    pub fn ry(theta: f64) -> Self {
        let (s, co) = (theta / 2.0).sin_cos();
        Self::new(c(co, 0.0), c(-s, 0.0), c(s, 0.0), c(co, 0.0))
    }

    /// `exp(-iθZ/2)`.
    pub fn rz(theta: f64) -> Self {
        Self::diag(
            Complex64::from_polar(1.0, -theta / 2.0),
            Complex64::from_polar(1.0, theta / 2.0),
        )
    }

    /// OpenQASM `u3(θ, φ, λ)`.
    pub fn u3(theta: f64, phi: f64, lambda: f64) -> Self {
        let (s, co) = (theta / 2.0).sin_cos();
        Self::new(
            c(co, 0.0),
            -Complex64::from_polar(s, lambda),
            Complex64::from_polar(s, phi),
            Complex64::from_polar(co, phi + lambda),
        )
    }

    /// Matrix product `self * other`, i.e. `other` applied first.
    pub fn mul(&self, other: &Self) -> Self {
        let [a, b, cc, d] = self.data;
        let [e, f, g, h] = other.data;
        Self::new(a * e + b * g, a * f + b * h, cc * e + d * g, cc * f + d * h)
    }

    /// Conjugate transpose.
    pub fn dagger(&self) -> Self {
        let [a, b, cc, d] = self.data;
        Self::new(a.conj(), cc.conj(), b.conj(), d.conj())
    }

    /// Whether the matrix is the identity up to a global phase.
    pub fn is_identity(&self) -> bool {
        let [a, b, cc, d] = self.data;
        b.norm() < EPSILON && cc.norm() < EPSILON && (a - d).norm() < EPSILON
    }

    /// Angles `(θ, φ, λ)` such that `u3(θ, φ, λ)` equals `self` up to a global phase.
    pub fn u3_angles(&self) -> (f64, f64, f64) {
        let [a, b, cc, d] = self.data;
        let theta = 2.0 * cc.norm().atan2(a.norm());
        if cc.norm() < EPSILON {
            // Diagonal: only φ + λ is defined.
            (0.0, 0.0, normalize_angle(d.arg() - a.arg()))
        } else if a.norm() < EPSILON {
            // Anti-diagonal: pick λ = 0.
            let gamma = (-b).arg();
            (theta, normalize_angle(cc.arg() - gamma), 0.0)
        } else {
            let phi = cc.arg() - a.arg();
            let lambda = (-b).arg() - a.arg();
            (theta, normalize_angle(phi), normalize_angle(lambda))
        }
    }

    /// ZYZ Euler angles `(α, β, γ)` with `self ≅ Rz(α)·Ry(β)·Rz(γ)` up to global phase.
    pub fn zyz_angles(&self) -> (f64, f64, f64) {
        let (theta, phi, lambda) = self.u3_angles();
        (phi, theta, lambda)
    }

    /// Whether `self` and `other` agree up to a global phase.
    pub fn equiv(&self, other: &Self) -> bool {
        self.dagger().mul(other).is_identity()
    }
}

/// Map an angle into `(-π, π]`.
pub fn normalize_angle(angle: f64) -> f64 {
    let mut a = angle % (2.0 * PI);
    if a > PI {
        a -= 2.0 * PI;
    } else if a <= -PI {
        a += 2.0 * PI;
    }
    a
}

/// Whether an angle is a multiple of 2π within tolerance.
pub fn is_zero_angle(angle: f64) -> bool {
    normalize_angle(angle).abs() < EPSILON
}
