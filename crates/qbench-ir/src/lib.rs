//! qbench Gate Chain Representation
//!
//! Core data structures shared by every qbench crate: gates, hardware
//! descriptions and the [`GateChain`] that strategies transform.
//!
//! # Core Components
//!
//! - **Gates**: [`GateKind`] names a gate family, [`Gate`] adds concrete angles
//! - **Hardware**: [`Hardware`] bundles a [`GateSet`] with a [`Connectivity`] graph;
//!   [`HardwareConfig`] is its serializable form
//! - **Chains**: [`GateChain`] is an ordered list of [`Operation`]s bound to a hardware
//! - **Simulation**: [`sim`] offers small dense simulations for fidelity checks
//! - **OpenQASM**: [`qasm`] reads and writes OpenQASM 2.0
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use qbench_ir::{Gate, GateChain, GateKind, Hardware, QubitId};
//!
//! let mut chain = GateChain::new(Arc::new(Hardware::unconstrained(2)));
//! chain.add_gate(Gate::from(GateKind::H), vec![QubitId(0)]).unwrap();
//! chain.add_gate(Gate::from(GateKind::CX), vec![QubitId(0), QubitId(1)]).unwrap();
//!
//! assert_eq!(chain.depth(), 2);
//! assert!(chain.check_connectivity());
//! ```

pub mod chain;
pub mod error;
pub mod gate;
pub mod hardware;
pub mod qasm;
pub mod qubit;
pub mod sim;
pub mod unitary;

pub use chain::{GateChain, Operation};
pub use error::{IrError, IrResult};
pub use gate::{Gate, GateKind};
pub use hardware::{Connectivity, ConnectivityConfig, GateSet, GateSpec, Hardware, HardwareConfig};
pub use qubit::{ClbitId, QubitId};
pub use sim::StateVector;
pub use unitary::Unitary2x2;
