//! Generate command implementation.

use std::path::Path;

use anyhow::{Context, Result};
use console::style;
use tracing::warn;

use qbench_core::{Artifact, TargetSpec, target};
use qbench_ir::qasm;

/// Execute the generate command.
pub fn execute(config_path: &str, output: &str, seed: Option<u64>, limit: usize) -> Result<()> {
    let spec = TargetSpec::load(config_path)
        .with_context(|| format!("Failed to load target description '{config_path}'"))?;
    let mut generator = target::from_spec(&spec)?;
    if let Some(seed) = seed {
        generator.reseed(seed);
    }

    println!(
        "{} Generating {} targets into {}",
        style("→").cyan().bold(),
        style(generator.name()).bold(),
        style(output).green()
    );

    let out_dir = Path::new(output);
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("Failed to create '{}'", out_dir.display()))?;

    let mut written = 0usize;
    for item in generator.by_ref().take(limit) {
        let (artifact, id) = match item {
            Ok(target) => target,
            Err(e) => {
                warn!("Skipping target: {}", e);
                continue;
            }
        };
        let stem = format!("{}_{}", spec.display_name(), id);
        match &artifact {
            Artifact::Chain(chain) => {
                qasm::write_file(chain, out_dir.join(format!("{stem}.qasm")))?;
            }
            Artifact::State(state) => {
                let amplitudes: Vec<[f64; 2]> =
                    state.amplitudes().iter().map(|a| [a.re, a.im]).collect();
                let doc = serde_json::json!({
                    "num_qubits": state.num_qubits(),
                    "amplitudes": amplitudes,
                });
                std::fs::write(out_dir.join(format!("{stem}.json")), serde_json::to_string_pretty(&doc)?)?;
            }
        }
        written += 1;
    }

    println!("{} Wrote {} target(s)", style("✓").green().bold(), written);
    Ok(())
}
