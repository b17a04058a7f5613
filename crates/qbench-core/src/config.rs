//! Benchmark configuration documents.

use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{BenchError, BenchResult};

/// A whole benchmark run: one or more pipelines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BenchmarkConfig {
    pub pipelines: Vec<PipelineSpec>,
}

impl BenchmarkConfig {
    /// Load from a `.json`, `.yaml` or `.yml` file.
    pub fn load(path: impl AsRef<Path>) -> BenchResult<Self> {
        let config: Self = load_document(path.as_ref())?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a JSON document.
    pub fn from_json(text: &str) -> BenchResult<Self> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a YAML document.
    pub fn from_yaml(text: &str) -> BenchResult<Self> {
        let config: Self = serde_yaml_ng::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Pipeline ids are unique and every pipeline has at least one stage.
    pub fn validate(&self) -> BenchResult<()> {
        if self.pipelines.is_empty() {
            return Err(BenchError::Config("no pipelines configured".into()));
        }
        let mut seen = std::collections::BTreeSet::new();
        for p in &self.pipelines {
            if !seen.insert(p.id.as_str()) {
                return Err(BenchError::Config(format!("duplicate pipeline id '{}'", p.id)));
            }
            if p.stages.is_empty() {
                return Err(BenchError::Config(format!("pipeline '{}' has no stages", p.id)));
            }
        }
        Ok(())
    }
}

fn extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default()
}

/// One pipeline: ordered stages applied to every target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineSpec {
    pub id: String,
    pub stages: Vec<StageSpec>,
    pub target: TargetSpec,
    /// Group label carried into the report for plotting.
    #[serde(default)]
    pub plot_group: Option<String>,
}

/// One stage of a pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StageSpec {
    pub id: String,
    /// Registered strategy name.
    pub strategy: String,
    /// Strategy arguments, including `hardware`.
    #[serde(default)]
    pub args: Value,
}

/// Target generator selection plus variant-specific fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetSpec {
    pub task: String,
    pub algo: String,
    /// Display name; defaults to `algo`.
    #[serde(default)]
    pub name: Option<String>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl TargetSpec {
    /// Name shown in reports.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.algo)
    }

    /// Load a standalone target description from a `.json`, `.yaml` or `.yml` file.
    pub fn load(path: impl AsRef<Path>) -> BenchResult<Self> {
        load_document(path.as_ref())
    }
}

fn load_document<T: DeserializeOwned>(path: &Path) -> BenchResult<T> {
    let text = std::fs::read_to_string(path)?;
    match extension(path).as_str() {
        "json" => Ok(serde_json::from_str(&text)?),
        "yaml" | "yml" => Ok(serde_yaml_ng::from_str(&text)?),
        other => Err(BenchError::Config(format!(
            "unsupported config format '{other}' for {}",
            path.display()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const YAML: &str = r#"
pipelines:
  - id: ibm_line
    plot_group: routing
    target:
      task: circuit_transformation
      algo: random_chain
      number: 2
      seed: 10
      chain_length: 20
      hardware:
        preset: universal
        qubit_connectivity: { class: all2all, num_qubits: 3 }
    stages:
      - id: route
        strategy: greedy_routing
        args:
          hardware:
            preset: ibm
            qubit_connectivity: { class: linear, num_qubits: 3 }
"#;

    #[test]
    fn test_yaml_round() {
        let cfg = BenchmarkConfig::from_yaml(YAML).unwrap();
        let p = &cfg.pipelines[0];
        assert_eq!(p.plot_group.as_deref(), Some("routing"));
        assert_eq!(p.target.display_name(), "random_chain");
        assert_eq!(p.target.fields["chain_length"], serde_json::json!(20));
        assert_eq!(p.stages[0].strategy, "greedy_routing");
        let json = serde_json::to_string(&cfg).unwrap();
        assert_eq!(BenchmarkConfig::from_json(&json).unwrap(), cfg);
    }

    #[test]
    fn test_duplicate_pipeline_ids() {
        let mut cfg = BenchmarkConfig::from_yaml(YAML).unwrap();
        cfg.pipelines.push(cfg.pipelines[0].clone());
        assert!(matches!(cfg.validate(), Err(BenchError::Config(_))));
    }

    #[test]
    fn test_unknown_stage_field() {
        let bad = YAML.replace("strategy: greedy_routing", "strategy: greedy_routing\n        retries: 3");
        assert!(matches!(BenchmarkConfig::from_yaml(&bad), Err(BenchError::Serialization(_))));
    }

    #[test]
    fn test_load_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let yaml = dir.path().join("bench.yaml");
        std::fs::write(&yaml, YAML).unwrap();
        assert_eq!(BenchmarkConfig::load(&yaml).unwrap().pipelines.len(), 1);
        let toml = dir.path().join("bench.toml");
        std::fs::write(&toml, "").unwrap();
        assert!(matches!(BenchmarkConfig::load(&toml), Err(BenchError::Config(_))));
    }

    #[test]
    fn test_target_spec_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("target.json");
        std::fs::write(&path, r#"{"task": "state_preparation", "algo": "random_state", "num_qubits": 2}"#).unwrap();
        let spec = TargetSpec::load(&path).unwrap();
        assert_eq!(spec.display_name(), "random_state");
        assert_eq!(spec.fields["num_qubits"], serde_json::json!(2));
    }
}
