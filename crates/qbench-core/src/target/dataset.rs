//! Targets read from OpenQASM files.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use qbench_ir::{Hardware, HardwareConfig, qasm};

use super::{Quota, Target, TargetGenerator};
use crate::artifact::Artifact;
use crate::error::{BenchError, BenchResult};

/// Where the dataset lives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QasmPaths {
    /// Every `*.qasm` file in a directory, sorted by name.
    Directory(PathBuf),
    /// Explicit files, in order.
    Files(Vec<PathBuf>),
}

/// Configuration of [`QasmTarget`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct QasmTargetConfig {
    pub qasm_path: QasmPaths,
    /// Stop after this many files; absent or negative reads them all.
    #[serde(default)]
    pub number: Option<i64>,
    /// Accepted for symmetry with random targets; file order is fixed.
    #[serde(default)]
    pub seed: Option<u64>,
    /// Hardware to bind parsed chains to; unconstrained when absent.
    #[serde(default)]
    pub hardware: Option<HardwareConfig>,
}

/// Enumerates a fixed list of QASM files, yielding each with its file stem.
#[derive(Debug)]
pub struct QasmTarget {
    name: String,
    files: Vec<PathBuf>,
    hardware: Option<Arc<Hardware>>,
    cursor: usize,
    quota: Quota,
}

impl QasmTarget {
    /// Resolve the file list. A missing directory is an error; an empty one is not.
    pub fn new(name: impl Into<String>, config: QasmTargetConfig) -> BenchResult<Self> {
        let files = match &config.qasm_path {
            QasmPaths::Directory(dir) => list_qasm(dir)?,
            QasmPaths::Files(files) => files.clone(),
        };
        let hardware = config
            .hardware
            .as_ref()
            .map(Hardware::from_config)
            .transpose()?
            .map(Arc::new);
        Ok(Self { name: name.into(), files, hardware, cursor: 0, quota: Quota::new(config.number) })
    }

    /// Files in enumeration order.
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }
}

fn list_qasm(dir: &Path) -> BenchResult<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(BenchError::Config(format!("'{}' is not a directory", dir.display())));
    }
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "qasm"))
        .collect();
    files.sort();
    Ok(files)
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

impl Iterator for QasmTarget {
    type Item = BenchResult<Target>;

    fn next(&mut self) -> Option<Self::Item> {
        let path = self.files.get(self.cursor)?.clone();
        if !self.quota.take() {
            return None;
        }
        self.cursor += 1;
        let parsed = qasm::parse_file(&path, self.hardware.clone())
            .map_err(|e| BenchError::Generation(format!("{}: {e}", path.display())));
        Some(parsed.map(|chain| (Artifact::Chain(chain), file_stem(&path))))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.files.len().saturating_sub(self.cursor);
        let n = self.quota.remaining().map_or(left, |q| q.min(left));
        (n, Some(n))
    }
}

impl TargetGenerator for QasmTarget {
    fn name(&self) -> &str {
        &self.name
    }

    fn reseed(&mut self, _seed: u64) {
        self.cursor = 0;
        self.quota.reset();
    }
}
