//! The benchmark driver: pipelines over targets into one report.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use qbench_ir::qasm;

use crate::artifact::Artifact;
use crate::config::BenchmarkConfig;
use crate::error::{BenchError, BenchResult};
use crate::metrics::MetricValue;
use crate::pipeline::Pipeline;
use crate::results::ResultsSink;
use crate::strategy::StrategyRegistry;
use crate::target::{self, Target};

/// Id columns of the report, in order.
pub const ID_COLUMNS: [&str; 10] = [
    "Run ID",
    "Pipeline ID",
    "Stage ID",
    "Strategy ID",
    "Test Target Generator Name",
    "Test Target ID",
    "Pipeline Output Hardware Name",
    "Pipeline Output Number of Qubits",
    "QASM Path",
    "Plot Group",
];

/// Report file name inside the output directory.
pub const REPORT_FILE: &str = "gate_chain_report.csv";
/// Stage outputs directory inside the output directory.
pub const QASM_DIR: &str = "output_qasm";
/// Resolved configuration dump inside the output directory.
pub const CONFIG_FILE: &str = "config.json";

/// Progress callbacks. Every method defaults to doing nothing.
pub trait EngineObserver {
    /// A pipeline is about to run its targets.
    fn on_pipeline_start(&mut self, _pipeline: &str, _index: usize, _total: usize) {}

    /// A target finished; `ok` is false if it was skipped.
    fn on_target_done(&mut self, _pipeline: &str, _target_id: &str, _ok: bool) {}

    /// Every target of a pipeline has been processed.
    fn on_pipeline_done(&mut self, _pipeline: &str) {}
}

/// Observer that ignores every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl EngineObserver for NoopObserver {}

/// Driver options.
#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// Directory receiving the report, config dump and stage outputs.
    pub output_dir: PathBuf,
    /// Run the analysers of every stage.
    pub run_analyser: bool,
    /// Write every stage's output chain as QASM.
    pub save_qasm: bool,
    /// Run identifier; a timestamp when absent.
    pub run_id: Option<String>,
    /// Cap on targets taken from each generator. Required when a generator
    /// has no `number`.
    pub max_targets: Option<usize>,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("output"),
            run_analyser: true,
            save_qasm: true,
            run_id: None,
            max_targets: None,
        }
    }
}

/// Outcome of a benchmark run.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineSummary {
    pub run_id: String,
    /// Rows written to the report.
    pub rows: usize,
    /// Targets the generators failed to produce.
    pub failed_targets: usize,
    /// Pipeline runs that raised.
    pub failed_runs: usize,
    pub report_path: PathBuf,
}

/// Runs every configured pipeline over its targets.
///
/// Configuration errors abort the run. A target that fails to generate, or a
/// pipeline run that fails, is logged and skipped.
pub struct BenchmarkEngine {
    config: BenchmarkConfig,
    registry: StrategyRegistry,
    options: EngineOptions,
}

impl BenchmarkEngine {
    /// Engine with the built-in strategies.
    pub fn new(config: BenchmarkConfig, options: EngineOptions) -> Self {
        Self { config, registry: StrategyRegistry::with_builtins(), options }
    }

    /// Replace the strategy registry.
    pub fn with_registry(mut self, registry: StrategyRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Registry for adding external strategies.
    pub fn registry_mut(&mut self) -> &mut StrategyRegistry {
        &mut self.registry
    }

    pub fn config(&self) -> &BenchmarkConfig {
        &self.config
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Run everything and write the report.
    pub fn run(&self, observer: &mut dyn EngineObserver) -> BenchResult<EngineSummary> {
        let run_id = self
            .options
            .run_id
            .clone()
            .unwrap_or_else(|| chrono::Local::now().format("%Y%m%d_%H%M%S").to_string());
        let qasm_dir = self.prepare_output()?;
        info!(run_id = %run_id, pipelines = self.config.pipelines.len(), "starting benchmark");

        let mut sink = ResultsSink::new(ID_COLUMNS, []);
        let mut summary = EngineSummary {
            run_id: run_id.clone(),
            rows: 0,
            failed_targets: 0,
            failed_runs: 0,
            report_path: self.options.output_dir.join(REPORT_FILE),
        };

        let total = self.config.pipelines.len();
        for (index, spec) in self.config.pipelines.iter().enumerate() {
            observer.on_pipeline_start(&spec.id, index, total);
            info!(pipeline = %spec.id, stages = spec.stages.len(), "running pipeline");

            let mut pipeline = Pipeline::from_spec(spec, &self.registry)?.with_analysis(self.options.run_analyser);
            let generator = target::from_spec(&spec.target)?;
            let target_name = generator.name().to_string();
            let limit = match (self.options.max_targets, generator.size_hint().1) {
                (Some(cap), _) => cap,
                (None, Some(n)) => n,
                (None, None) => {
                    return Err(BenchError::Config(format!(
                        "pipeline '{}': target generator '{}' is unbounded; set `number` or a target cap",
                        spec.id, target_name
                    )));
                }
            };

            let mut targets: Vec<Target> = Vec::new();
            for item in generator.take(limit) {
                match item {
                    Ok(t) => targets.push(t),
                    Err(e) => {
                        warn!(pipeline = %spec.id, error = %e, "skipping target that failed to generate");
                        summary.failed_targets += 1;
                    }
                }
            }

            for (artifact, target_id) in &targets {
                if let Err(e) = pipeline.run(artifact) {
                    warn!(pipeline = %spec.id, target = %target_id, error = %e, "skipping failed pipeline run");
                    summary.failed_runs += 1;
                    observer.on_target_done(&spec.id, target_id, false);
                    continue;
                }
                let ctx = RowContext {
                    run_id: &run_id,
                    pipeline: &pipeline,
                    target_name: &target_name,
                    target_id,
                    plot_group: spec.plot_group.as_deref().unwrap_or(""),
                    qasm_dir: qasm_dir.as_deref(),
                };
                summary.rows += add_rows(&mut sink, &ctx)?;
                observer.on_target_done(&spec.id, target_id, true);
            }
            observer.on_pipeline_done(&spec.id);
        }

        sink.flush(&summary.report_path)?;
        info!(rows = summary.rows, failed_runs = summary.failed_runs, "benchmark finished");
        Ok(summary)
    }

    /// Create the output tree and dump the configuration.
    ///
    /// The QASM directory is recreated empty on every run.
    fn prepare_output(&self) -> BenchResult<Option<PathBuf>> {
        let out = &self.options.output_dir;
        std::fs::create_dir_all(out)?;
        std::fs::write(out.join(CONFIG_FILE), serde_json::to_string_pretty(&self.config)?)?;
        if !self.options.save_qasm {
            return Ok(None);
        }
        let qasm_dir = out.join(QASM_DIR);
        if qasm_dir.exists() {
            std::fs::remove_dir_all(&qasm_dir)?;
        }
        std::fs::create_dir_all(&qasm_dir)?;
        Ok(Some(qasm_dir))
    }
}

struct RowContext<'a> {
    run_id: &'a str,
    pipeline: &'a Pipeline,
    target_name: &'a str,
    target_id: &'a str,
    plot_group: &'a str,
    qasm_dir: Option<&'a Path>,
}

/// One row per stage of the last pipeline run.
///
/// Output hardware columns describe the last stage's hardware on every row.
fn add_rows(sink: &mut ResultsSink, ctx: &RowContext<'_>) -> BenchResult<usize> {
    let pipeline = ctx.pipeline;
    let Some(last) = pipeline.stages().last() else {
        return Ok(0);
    };
    let output_hardware = last.strategy.hardware();
    let hardware_label = output_hardware.label();
    for (i, stage) in pipeline.stages().iter().enumerate() {
        let output = pipeline.get_gate_chain_by_stage(i)?;
        let report = &pipeline.analyser_report_history()[i];
        let qasm_path = match (ctx.qasm_dir, output) {
            (Some(dir), Artifact::Chain(chain)) => {
                let file = format!(
                    "{}_output_{}_{}_{}_{}.qasm",
                    ctx.run_id,
                    pipeline.id(),
                    ctx.target_name,
                    ctx.target_id,
                    stage.id
                );
                let path = dir.join(file);
                qasm::write_file(chain, &path)?;
                path.display().to_string()
            }
            _ => String::new(),
        };
        let ids: Vec<MetricValue> = vec![
            ctx.run_id.into(),
            pipeline.id().into(),
            stage.id.as_str().into(),
            stage.strategy.name().into(),
            ctx.target_name.into(),
            ctx.target_id.into(),
            hardware_label.as_str().into(),
            output_hardware.num_qubits().into(),
            qasm_path.into(),
            ctx.plot_group.into(),
        ];
        sink.add(ids, report)?;
    }
    Ok(pipeline.len())
}
