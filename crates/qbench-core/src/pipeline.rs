//! Pipelines: ordered strategies threaded over one target at a time.

use tracing::{debug, instrument};

use crate::artifact::Artifact;
use crate::config::PipelineSpec;
use crate::error::{BenchError, BenchResult};
use crate::metrics::{MetricReport, MetricValue, names};
use crate::strategy::{Strategy, StrategyRegistry};

/// A stage id paired with its strategy.
#[derive(Debug)]
pub struct Stage {
    pub id: String,
    pub strategy: Strategy,
}

/// Ordered strategies plus the history of the last run.
///
/// `stage_results[i]` is the artifact stage `i` produced and stage `i + 1`
/// consumed; `analyser_report_history[i]` is stage `i`'s report.
#[derive(Debug)]
pub struct Pipeline {
    id: String,
    stages: Vec<Stage>,
    run_analyser: bool,
    stage_results: Vec<Artifact>,
    analyser_report_history: Vec<MetricReport>,
}

impl Pipeline {
    /// Pipeline from already built stages, with analysis enabled.
    pub fn new(id: impl Into<String>, stages: Vec<Stage>) -> Self {
        Self {
            id: id.into(),
            stages,
            run_analyser: true,
            stage_results: Vec::new(),
            analyser_report_history: Vec::new(),
        }
    }

    /// Resolve every stage of `spec` through `registry`, in order.
    pub fn from_spec(spec: &PipelineSpec, registry: &StrategyRegistry) -> BenchResult<Self> {
        let stages = spec
            .stages
            .iter()
            .map(|stage| {
                Ok(Stage { id: stage.id.clone(), strategy: registry.create(&stage.strategy, &stage.args)? })
            })
            .collect::<BenchResult<Vec<_>>>()?;
        Ok(Self::new(spec.id.clone(), stages))
    }

    /// Enable or disable the analysers.
    pub fn with_analysis(mut self, run_analyser: bool) -> Self {
        self.run_analyser = run_analyser;
        self
    }

    /// Run every stage on `target` and return the last stage's output.
    ///
    /// History from any earlier run is discarded first. If a stage fails,
    /// the history keeps the stages that completed.
    #[instrument(skip(self, target), fields(pipeline = %self.id, target = target.kind_name()))]
    pub fn run(&mut self, target: &Artifact) -> BenchResult<Artifact> {
        self.stage_results.clear();
        self.analyser_report_history.clear();

        let mut total_time = 0.0;
        for (i, stage) in self.stages.iter_mut().enumerate() {
            let input = match i {
                0 => target,
                _ => &self.stage_results[i - 1],
            };
            let output = stage.strategy.run(input, self.run_analyser)?;
            let mut report = stage.strategy.report().clone();
            total_time += stage.strategy.execution_time();
            if self.run_analyser {
                report.insert(names::TOTAL_EXECUTION_TIME, total_time);
                report.insert(names::FULL_CHECK, full_check(&report));
            }
            debug!(stage = %stage.id, strategy = stage.strategy.name(), total_time, "stage complete");
            self.stage_results.push(output);
            self.analyser_report_history.push(report);
        }

        match self.stage_results.last() {
            Some(last) => Ok(last.clone()),
            None => Ok(target.clone()),
        }
    }

    /// Artifact produced by stage `index` in the last run.
    pub fn get_gate_chain_by_stage(&self, index: usize) -> BenchResult<&Artifact> {
        self.stage_results
            .get(index)
            .ok_or(BenchError::StageIndex { index, len: self.stage_results.len() })
    }

    /// `Execution Time` of stage `index` in the last run.
    pub fn get_execution_time_by_stage(&self, index: usize) -> BenchResult<f64> {
        let report = self
            .analyser_report_history
            .get(index)
            .ok_or(BenchError::StageIndex { index, len: self.analyser_report_history.len() })?;
        Ok(report.get(names::EXECUTION_TIME).and_then(MetricValue::as_f64).unwrap_or(0.0))
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn stage_results(&self) -> &[Artifact] {
        &self.stage_results
    }

    pub fn analyser_report_history(&self) -> &[MetricReport] {
        &self.analyser_report_history
    }
}

/// All three structural checks present and true.
fn full_check(report: &MetricReport) -> bool {
    names::STRUCTURAL_CHECKS
        .iter()
        .all(|key| report.get(key).and_then(MetricValue::as_bool).unwrap_or(false))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_check() {
        let mut r: MetricReport = names::STRUCTURAL_CHECKS.iter().map(|k| (*k, true)).collect();
        assert!(full_check(&r));
        r.insert(names::GATE_SET_SATISFIED, false);
        assert!(!full_check(&r));
        assert!(!full_check(&MetricReport::new()));
    }
}
