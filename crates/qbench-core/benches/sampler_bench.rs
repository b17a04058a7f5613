//! Benchmarks for the random chain sampler and a full pipeline run
//!
//! Run with: cargo bench -p qbench-core

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use qbench_core::target::{RandomChainConfig, RandomChainTarget};
use qbench_core::{Artifact, Pipeline, StrategyRegistry};
use qbench_ir::HardwareConfig;
use serde_json::json;

fn bench_sampler(c: &mut Criterion) {
    let mut group = c.benchmark_group("random_chain");
    for &n in &[5u32, 20] {
        let mut config = RandomChainConfig::new(HardwareConfig::preset("ibm", n), 500);
        config.seed = Some(10);
        let mut generator = RandomChainTarget::new("bench", config).unwrap();
        group.bench_function(BenchmarkId::new("uniform", n), |b| {
            b.iter(|| generator.sample().unwrap());
        });
    }
    group.finish();
}

fn bench_pipeline(c: &mut Criterion) {
    let hw = json!({ "preset": "ibm", "qubit_connectivity": { "class": "linear", "num_qubits": 8 } });
    let registry = StrategyRegistry::with_builtins();
    let stages = ["greedy_routing", "gate_set_rebase", "cancel_redundancies"]
        .into_iter()
        .map(|name| {
            Ok(qbench_core::Stage { id: name.to_string(), strategy: registry.create(name, &json!({ "hardware": hw }))? })
        })
        .collect::<qbench_core::BenchResult<Vec<_>>>()
        .unwrap();
    let mut pipeline = Pipeline::new("bench", stages);

    let mut config = RandomChainConfig::new(HardwareConfig::preset("ionq", 8), 200);
    config.seed = Some(10);
    let target = Artifact::Chain(RandomChainTarget::new("bench", config).unwrap().sample().unwrap());

    c.bench_function("pipeline_route_rebase_cancel", |b| {
        b.iter(|| pipeline.run(&target).unwrap());
    });
}

criterion_group!(benches, bench_sampler, bench_pipeline);
criterion_main!(benches);
