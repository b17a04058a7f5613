//! Ordered registry of named metric functions.

use std::sync::Arc;

use tracing::debug;

use super::{AnalyserOptions, MetricReport};
use crate::artifact::Artifact;
use crate::error::{BenchError, BenchResult};

/// Arguments handed to every metric function.
#[derive(Debug, Clone, Copy)]
pub struct MetricInput<'a> {
    /// Artifact the stage consumed.
    pub target: &'a Artifact,
    /// Artifact the stage produced.
    pub result: &'a Artifact,
    pub options: &'a AnalyserOptions,
}

/// A metric computation returning a report fragment.
pub type MetricFn = Arc<dyn Fn(&MetricInput<'_>) -> BenchResult<MetricReport> + Send + Sync>;

/// Metric functions in registration order.
///
/// Registering a name that already exists replaces that function in place,
/// so a derived analyser can override a base metric without reordering.
#[derive(Clone, Default)]
pub struct MetricRegistry {
    entries: Vec<(String, MetricFn)>,
    report: MetricReport,
}

impl MetricRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `func` under `name`.
    pub fn register<F>(&mut self, name: impl Into<String>, func: F)
    where
        F: Fn(&MetricInput<'_>) -> BenchResult<MetricReport> + Send + Sync + 'static,
    {
        let name = name.into();
        let func: MetricFn = Arc::new(func);
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => {
                debug!(metric = %name, "replacing metric function");
                slot.1 = func;
            }
            None => {
                debug!(metric = %name, "registering metric function");
                self.entries.push((name, func));
            }
        }
    }

    /// Reset the aggregate report and run every function in order.
    pub fn run_all(&mut self, input: &MetricInput<'_>) -> BenchResult<&MetricReport> {
        self.report.clear();
        for (name, func) in &self.entries {
            debug!(metric = %name, "computing");
            let fragment = func(input)?;
            self.report.update(fragment);
        }
        Ok(&self.report)
    }

    /// Reset the aggregate report and run only `names`, in the given order.
    ///
    /// Every name is resolved before anything runs.
    pub fn run_selected<S: AsRef<str>>(&mut self, names: &[S], input: &MetricInput<'_>) -> BenchResult<&MetricReport> {
        let selected = names
            .iter()
            .map(|name| {
                let name = name.as_ref();
                self.entries
                    .iter()
                    .find(|(n, _)| n == name)
                    .map(|(_, f)| Arc::clone(f))
                    .ok_or_else(|| BenchError::UnknownMetric(name.to_string()))
            })
            .collect::<BenchResult<Vec<_>>>()?;
        self.report.clear();
        for func in selected {
            let fragment = func(input)?;
            self.report.update(fragment);
        }
        Ok(&self.report)
    }

    /// Aggregate report of the last run.
    pub fn report(&self) -> &MetricReport {
        &self.report
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(n, _)| n == name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::fmt::Debug for MetricRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricRegistry")
            .field("metrics", &self.names().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::MetricValue;
    use qbench_ir::{GateChain, Hardware};

    fn artifact() -> Artifact {
        Artifact::Chain(GateChain::new(Arc::new(Hardware::unconstrained(1))))
    }

    fn constant(key: &'static str, value: i64) -> impl Fn(&MetricInput<'_>) -> BenchResult<MetricReport> {
        move |_| Ok([(key, value)].into_iter().collect())
    }

    #[test]
    fn test_run_all_in_order() {
        let mut reg = MetricRegistry::new();
        reg.register("b", constant("B", 2));
        reg.register("a", constant("A", 1));
        let (a, opts) = (artifact(), AnalyserOptions::default());
        let input = MetricInput { target: &a, result: &a, options: &opts };
        let report = reg.run_all(&input).unwrap();
        assert_eq!(report.keys().collect::<Vec<_>>(), vec!["B", "A"]);
    }

    #[test]
    fn test_reregister_overrides_in_place() {
        let mut reg = MetricRegistry::new();
        reg.register("depth", constant("Depth", 1));
        reg.register("count", constant("Count", 5));
        reg.register("depth", constant("Depth", 9));
        assert_eq!(reg.len(), 2);
        let (a, opts) = (artifact(), AnalyserOptions::default());
        let input = MetricInput { target: &a, result: &a, options: &opts };
        let report = reg.run_all(&input).unwrap();
        assert_eq!(report.get("Depth"), Some(&MetricValue::Int(9)));
        assert_eq!(report.keys().next(), Some("Depth"));
    }

    #[test]
    fn test_later_fragment_wins() {
        let mut reg = MetricRegistry::new();
        reg.register("first", constant("X", 1));
        reg.register("second", constant("X", 2));
        let (a, opts) = (artifact(), AnalyserOptions::default());
        let input = MetricInput { target: &a, result: &a, options: &opts };
        assert_eq!(reg.run_all(&input).unwrap().get("X"), Some(&MetricValue::Int(2)));
    }

    #[test]
    fn test_run_selected() {
        let mut reg = MetricRegistry::new();
        reg.register("a", constant("A", 1));
        reg.register("b", constant("B", 2));
        let (a, opts) = (artifact(), AnalyserOptions::default());
        let input = MetricInput { target: &a, result: &a, options: &opts };
        let report = reg.run_selected(&["b"], &input).unwrap();
        assert_eq!(report.len(), 1);
        assert!(report.contains_key("B"));
    }

    #[test]
    fn test_run_selected_unknown() {
        let mut reg = MetricRegistry::new();
        reg.register("a", constant("A", 1));
        let (a, opts) = (artifact(), AnalyserOptions::default());
        let input = MetricInput { target: &a, result: &a, options: &opts };
        reg.run_all(&input).unwrap();
        let err = reg.run_selected(&["a", "missing"], &input).unwrap_err();
        assert!(matches!(err, BenchError::UnknownMetric(ref n) if n == "missing"));
        // The previous report is untouched when resolution fails.
        assert!(reg.report().contains_key("A"));
    }
}
