//! Built-in strategies backed by the native passes.

use std::sync::Arc;

use serde::Deserialize;

use qbench_ir::Hardware;
use qbench_passes::{CancelRedundancies, GateSetRebase, GreedyRouting, Pass, PostProcessing, PreProcessing};

use super::registry::StrategyRegistry;
use super::{StrategyRole, Transform};
use crate::artifact::Artifact;
use crate::error::{BenchError, BenchResult};

/// Returns its input unchanged so the analyser can score the raw target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TargetAnalysis;

impl Transform for TargetAnalysis {
    fn name(&self) -> &str {
        "target_analysis"
    }

    fn apply(&self, input: &Artifact, _hardware: &Arc<Hardware>) -> BenchResult<Artifact> {
        Ok(input.clone())
    }

    fn reported_time(&self) -> Option<f64> {
        Some(0.0)
    }
}

/// Adapts a chain-to-chain [`Pass`] into a strategy engine.
#[derive(Debug, Clone)]
pub struct PassEngine<P> {
    strategy: String,
    pass: P,
}

impl<P: Pass> PassEngine<P> {
    pub fn new(strategy: impl Into<String>, pass: P) -> Self {
        Self { strategy: strategy.into(), pass }
    }
}

impl<P: Pass> Transform for PassEngine<P> {
    fn name(&self) -> &str {
        self.pass.name()
    }

    fn apply(&self, input: &Artifact, hardware: &Arc<Hardware>) -> BenchResult<Artifact> {
        let chain = input.as_chain().ok_or_else(|| {
            BenchError::transformation(&self.strategy, format!("expected a gate chain, got a {}", input.kind_name()))
        })?;
        self.pass
            .run(chain, hardware)
            .map(Artifact::Chain)
            .map_err(|e| BenchError::transformation(&self.strategy, e))
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct PreProcessingArgs {
    add_measure: bool,
    add_barrier: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct PostProcessingArgs {
    remove_measure: bool,
    remove_barrier: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RoutingArgs {
    decompose_swaps: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct NoArgs {}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct CancelArgs {
    max_iterations: usize,
}

impl Default for CancelArgs {
    fn default() -> Self {
        Self { max_iterations: CancelRedundancies::default().max_iterations }
    }
}

/// Register every built-in strategy.
pub fn register_builtins(registry: &mut StrategyRegistry) {
    registry.register("target_analysis", StrategyRole::Processing, |args| {
        args.parse_extra::<NoArgs>("target_analysis")?;
        Ok(Box::new(TargetAnalysis))
    });

    registry.register("pre_processing", StrategyRole::Processing, |args| {
        let a: PreProcessingArgs = args.parse_extra("pre_processing")?;
        let pass = PreProcessing { add_measure: a.add_measure, add_barrier: a.add_barrier };
        Ok(Box::new(PassEngine::new("pre_processing", pass)))
    });

    registry.register("post_processing", StrategyRole::Processing, |args| {
        let a: PostProcessingArgs = args.parse_extra("post_processing")?;
        let pass = PostProcessing { remove_measure: a.remove_measure, remove_barrier: a.remove_barrier };
        Ok(Box::new(PassEngine::new("post_processing", pass)))
    });

    registry.register("greedy_routing", StrategyRole::Mapping, |args| {
        let a: RoutingArgs = args.parse_extra("greedy_routing")?;
        Ok(Box::new(PassEngine::new("greedy_routing", GreedyRouting::new(a.decompose_swaps))))
    });

    registry.register("gate_set_rebase", StrategyRole::Rebase, |args| {
        args.parse_extra::<NoArgs>("gate_set_rebase")?;
        Ok(Box::new(PassEngine::new("gate_set_rebase", GateSetRebase)))
    });

    registry.register("cancel_redundancies", StrategyRole::Compression, |args| {
        let a: CancelArgs = args.parse_extra("cancel_redundancies")?;
        if a.max_iterations == 0 {
            return Err(BenchError::InvalidArgs {
                strategy: "cancel_redundancies".into(),
                message: "max_iterations must be positive".into(),
            });
        }
        Ok(Box::new(PassEngine::new("cancel_redundancies", CancelRedundancies::new(a.max_iterations))))
    });
}
