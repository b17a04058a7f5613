//! qbench Transformation Engines
//!
//! Native engines that built-in strategies delegate to. Each engine
//! implements [`Pass`]: it reads a [`GateChain`](qbench_ir::GateChain) and
//! returns a new chain bound to the requested hardware.
//!
//! - [`GreedyRouting`]: trivial layout plus shortest-path SWAP insertion
//! - [`GateSetRebase`]: translation into the hardware's native gate set
//! - [`CancelRedundancies`]: adjacent inverse cancellation and rotation merging
//! - [`PreProcessing`] / [`PostProcessing`]: measurement and barrier handling
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use qbench_ir::{Connectivity, Gate, GateChain, GateKind, GateSet, Hardware, QubitId};
//! use qbench_passes::{GateSetRebase, GreedyRouting, Pass};
//!
//! let mut chain = GateChain::new(Arc::new(Hardware::unconstrained(3)));
//! chain.add_gate(Gate::from(GateKind::H), vec![QubitId(0)]).unwrap();
//! chain.add_gate(Gate::from(GateKind::CX), vec![QubitId(0), QubitId(2)]).unwrap();
//!
//! let device = Arc::new(Hardware::new("Line", GateSet::ibm(), Connectivity::linear(3)));
//! let routed = GreedyRouting::new(true).run(&chain, &device).unwrap();
//! let native = GateSetRebase.run(&routed, &device).unwrap();
//!
//! assert!(native.check_connectivity());
//! assert!(native.check_gate_set());
//! ```

pub mod cancel;
pub mod error;
pub mod pass;
pub mod processing;
pub mod rebase;
pub mod routing;

pub use cancel::CancelRedundancies;
pub use error::{PassError, PassResult};
pub use pass::Pass;
pub use processing::{PostProcessing, PreProcessing};
pub use rebase::GateSetRebase;
pub use routing::{GreedyRouting, Layout};

use qbench_ir::GateChain;

/// Number of qubits a chain actually touches (highest index + 1).
pub(crate) fn used_width(chain: &GateChain) -> u32 {
    chain
        .ops()
        .iter()
        .flat_map(|op| op.qubits.iter())
        .map(|q| q.0 + 1)
        .max()
        .unwrap_or(0)
}
