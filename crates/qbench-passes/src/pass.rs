//! The transformation pass trait.

use std::sync::Arc;

use qbench_ir::{GateChain, Hardware};

use crate::error::PassResult;

/// A transformation engine.
///
/// A pass reads its input and returns a freshly built chain bound to
/// `hardware`; the input is never modified.
pub trait Pass: Send + Sync {
    /// Name of this pass.
    fn name(&self) -> &str;

    /// Transform `chain` for `hardware`.
    fn run(&self, chain: &GateChain, hardware: &Arc<Hardware>) -> PassResult<GateChain>;
}
