//! Name to engine-factory registry.

use std::sync::Arc;

use rustc_hash::FxHashMap;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::debug;

use qbench_ir::{Hardware, HardwareConfig};

use super::{Strategy, StrategyRole, Transform, builtin};
use crate::error::{BenchError, BenchResult};
use crate::metrics::AnalyserOptions;

/// Strategy arguments after the common keys have been split off.
#[derive(Debug, Clone)]
pub struct StrategyArgs {
    /// Hardware the strategy binds.
    pub hardware: Arc<Hardware>,
    /// Analyser configuration.
    pub analyser_options: AnalyserOptions,
    /// Engine-specific keywords.
    pub extra: Map<String, Value>,
}

impl StrategyArgs {
    /// Split a stage's `args` object into common keys and engine keywords.
    ///
    /// `hardware` is required; `analyser_options` defaults.
    pub fn from_value(strategy: &str, args: &Value) -> BenchResult<Self> {
        let invalid = |message: String| BenchError::InvalidArgs { strategy: strategy.to_string(), message };
        let mut extra = match args {
            Value::Object(map) => map.clone(),
            Value::Null => Map::new(),
            other => return Err(invalid(format!("expected an object, found {other}"))),
        };
        let hardware_value = extra
            .remove("hardware")
            .ok_or_else(|| invalid("missing `hardware`".to_string()))?;
        let hardware_config: HardwareConfig =
            serde_json::from_value(hardware_value).map_err(|e| invalid(format!("hardware: {e}")))?;
        let hardware = Arc::new(Hardware::from_config(&hardware_config)?);
        let analyser_options = match extra.remove("analyser_options") {
            Some(v) => serde_json::from_value(v).map_err(|e| invalid(format!("analyser_options: {e}")))?,
            None => AnalyserOptions::default(),
        };
        Ok(Self { hardware, analyser_options, extra })
    }

    /// Args for an already built hardware, with no engine keywords.
    pub fn for_hardware(hardware: Arc<Hardware>) -> Self {
        Self { hardware, analyser_options: AnalyserOptions::default(), extra: Map::new() }
    }

    /// Deserialize the engine keywords into `T`.
    ///
    /// `T` is expected to deny unknown fields, which makes stray keywords fatal.
    pub fn parse_extra<T: DeserializeOwned>(&self, strategy: &str) -> BenchResult<T> {
        serde_json::from_value(Value::Object(self.extra.clone())).map_err(|e| BenchError::InvalidArgs {
            strategy: strategy.to_string(),
            message: e.to_string(),
        })
    }
}

/// Builds an engine from parsed arguments.
pub type EngineFactory = Box<dyn Fn(&StrategyArgs) -> BenchResult<Box<dyn Transform>> + Send + Sync>;

struct Entry {
    role: StrategyRole,
    factory: EngineFactory,
}

/// Registry of strategies available to pipelines.
///
/// Pipelines are data, so every strategy they name is looked up here.
/// External engines plug in through [`StrategyRegistry::register`].
pub struct StrategyRegistry {
    entries: FxHashMap<String, Entry>,
}

impl StrategyRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self { entries: FxHashMap::default() }
    }

    /// Registry holding every built-in strategy.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        builtin::register_builtins(&mut registry);
        registry
    }

    /// Register an engine factory under `name`, replacing any previous entry.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        role: StrategyRole,
        factory: impl Fn(&StrategyArgs) -> BenchResult<Box<dyn Transform>> + Send + Sync + 'static,
    ) {
        let name = name.into();
        debug!("Registering strategy: {} ({})", name, role);
        self.entries.insert(name, Entry { role, factory: Box::new(factory) });
    }

    /// Resolve `name` and build a strategy from its `args` object.
    pub fn create(&self, name: &str, args: &Value) -> BenchResult<Strategy> {
        let entry = self.entries.get(name).ok_or_else(|| BenchError::UnknownStrategy {
            name: name.to_string(),
            available: self.available_strategies().into_iter().map(|(n, _)| n).collect::<Vec<_>>().join(", "),
        })?;
        let args = StrategyArgs::from_value(name, args)?;
        let engine = (entry.factory)(&args)?;
        Ok(Strategy::new(name, entry.role, args.hardware, engine, args.analyser_options))
    }

    /// Role of a registered strategy.
    pub fn role(&self, name: &str) -> Option<StrategyRole> {
        self.entries.get(name).map(|e| e.role)
    }

    /// Check whether a strategy is registered.
    pub fn has_strategy(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Registered names with their roles, sorted by name.
    pub fn available_strategies(&self) -> Vec<(String, StrategyRole)> {
        let mut list: Vec<_> = self.entries.iter().map(|(n, e)| (n.clone(), e.role)).collect();
        list.sort_by(|a, b| a.0.cmp(&b.0));
        list
    }
}

impl Default for StrategyRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}
