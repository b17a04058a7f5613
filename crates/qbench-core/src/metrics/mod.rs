//! Metric values, reports and the analysers that compute them.

mod analyser;
mod registry;

pub use analyser::{Analyser, AnalyserKind, AnalyserOptions};
pub use registry::{MetricFn, MetricInput, MetricRegistry};

use std::fmt;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use tracing::debug;

/// Column names shared by analysers, the pipeline and the engine.
pub mod names {
    pub const DEPTH: &str = "Depth";
    pub const TOTAL_GATE_COUNT: &str = "Total Gate Count";
    pub const SINGLE_QUBIT_GATE_COUNT: &str = "Single-Qubit Gate Count";
    pub const TWO_QUBIT_GATE_COUNT: &str = "Two-Qubit Gate Count";
    pub const POPULATED_QUBITS: &str = "Number of Populated Qubits";
    pub const CONNECTIVITY_SATISFIED: &str = "Connectivity Satisfied";
    pub const GATE_SET_SATISFIED: &str = "Gate Set Satisfied";
    pub const QUBIT_NUMBER_SATISFIED: &str = "Qubit Number Satisfied";
    pub const GATE_CHAIN_HARDWARE: &str = "Gate Chain Hardware";
    pub const GATE_SET: &str = "Gate Set";
    pub const GATE_CHAIN_NUM_QUBITS: &str = "Gate Chain Number of Qubits";
    pub const COST: &str = "Cost";
    pub const FIDELITY: &str = "Fidelity";
    pub const EQUIVALENT: &str = "Equivalent";
    pub const STATE_FIDELITY: &str = "State Fidelity";
    pub const EXECUTION_TIME: &str = "Execution Time";
    pub const TOTAL_EXECUTION_TIME: &str = "Total Execution Time";
    pub const FULL_CHECK: &str = "Full Check";

    /// The three structural checks combined into `Full Check`.
    pub const STRUCTURAL_CHECKS: [&str; 3] =
        [CONNECTIVITY_SATISFIED, GATE_SET_SATISFIED, QUBIT_NUMBER_SATISFIED];

    /// `{n}-Qubit Gate Count` for gates wider than two qubits.
    pub fn arity_count(n: usize) -> String {
        format!("{n}-Qubit Gate Count")
    }

    /// `Count of {label} Gates`.
    pub fn kind_count(label: &str) -> String {
        format!("Count of {label} Gates")
    }
}

/// A scalar metric value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MetricValue {
    Int(i64),
    Float(f64),
    Bool(bool),
    Text(String),
}

impl MetricValue {
    /// Numeric view; booleans and text have none.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            MetricValue::Int(v) => Some(*v as f64),
            MetricValue::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            MetricValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            MetricValue::Text(v) => Some(v),
            _ => None,
        }
    }
}

impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricValue::Int(v) => write!(f, "{v}"),
            MetricValue::Float(v) => write!(f, "{v}"),
            MetricValue::Bool(true) => f.write_str("True"),
            MetricValue::Bool(false) => f.write_str("False"),
            MetricValue::Text(v) => f.write_str(v),
        }
    }
}

impl From<i64> for MetricValue {
    fn from(v: i64) -> Self {
        MetricValue::Int(v)
    }
}

impl From<usize> for MetricValue {
    fn from(v: usize) -> Self {
        MetricValue::Int(v as i64)
    }
}

impl From<u32> for MetricValue {
    fn from(v: u32) -> Self {
        MetricValue::Int(i64::from(v))
    }
}

impl From<f64> for MetricValue {
    fn from(v: f64) -> Self {
        MetricValue::Float(v)
    }
}

impl From<bool> for MetricValue {
    fn from(v: bool) -> Self {
        MetricValue::Bool(v)
    }
}

impl From<String> for MetricValue {
    fn from(v: String) -> Self {
        MetricValue::Text(v)
    }
}

impl From<&str> for MetricValue {
    fn from(v: &str) -> Self {
        MetricValue::Text(v.to_string())
    }
}

/// Ordered metric name to value mapping.
///
/// Keys keep their first insertion position; inserting an existing key
/// replaces its value in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricReport {
    entries: Vec<(String, MetricValue)>,
}

impl MetricReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite `key`, returning the previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<MetricValue>) -> Option<MetricValue> {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    /// Merge `other` into `self`; values from `other` win on collision.
    pub fn update(&mut self, other: MetricReport) {
        for (key, value) in other.entries {
            match self.get(&key) {
                Some(old) if *old != value => {
                    debug!(metric = %key, old = %old, new = %value, "metric overwritten");
                }
                _ => {}
            }
            self.insert(key, value);
        }
    }

    pub fn get(&self, key: &str) -> Option<&MetricValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &MetricValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl<K: Into<String>, V: Into<MetricValue>> FromIterator<(K, V)> for MetricReport {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut report = MetricReport::new();
        for (k, v) in iter {
            report.insert(k, v);
        }
        report
    }
}

impl Serialize for MetricReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_keeps_position() {
        let mut r = MetricReport::new();
        r.insert("Depth", 3usize);
        r.insert("Cost", 12.0);
        assert_eq!(r.insert("Depth", 5usize), Some(MetricValue::Int(3)));
        assert_eq!(r.keys().collect::<Vec<_>>(), vec!["Depth", "Cost"]);
        assert_eq!(r.get("Depth"), Some(&MetricValue::Int(5)));
    }

    #[test]
    fn test_update_last_write_wins() {
        let mut a: MetricReport = [("A", 1i64), ("B", 2)].into_iter().collect();
        let b: MetricReport = [("B", 20i64), ("C", 30)].into_iter().collect();
        a.update(b);
        assert_eq!(a.keys().collect::<Vec<_>>(), vec!["A", "B", "C"]);
        assert_eq!(a.get("B"), Some(&MetricValue::Int(20)));
    }

    #[test]
    fn test_display() {
        assert_eq!(MetricValue::Bool(true).to_string(), "True");
        assert_eq!(MetricValue::Float(0.5).to_string(), "0.5");
        assert_eq!(MetricValue::from("Ibm5Q").to_string(), "Ibm5Q");
    }

    #[test]
    fn test_serialize_ordered_map() {
        let mut r = MetricReport::new();
        r.insert("Z", true);
        r.insert("A", 1usize);
        assert_eq!(serde_json::to_string(&r).unwrap(), r#"{"Z":true,"A":1}"#);
    }
}
