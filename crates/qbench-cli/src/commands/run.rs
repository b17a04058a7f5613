//! Run command implementation.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use qbench_core::{BenchmarkConfig, BenchmarkEngine, EngineObserver, EngineOptions};

/// Spinner driven by engine progress events.
struct SpinnerObserver {
    spinner: ProgressBar,
    done: usize,
    skipped: usize,
}

impl EngineObserver for SpinnerObserver {
    fn on_pipeline_start(&mut self, pipeline: &str, index: usize, total: usize) {
        self.done = 0;
        self.skipped = 0;
        self.spinner.set_message(format!("Pipeline {}/{}: {}", index + 1, total, pipeline));
    }

    fn on_target_done(&mut self, pipeline: &str, target_id: &str, ok: bool) {
        if ok {
            self.done += 1;
        } else {
            self.skipped += 1;
        }
        self.spinner.set_message(format!(
            "{pipeline}: target {target_id} ({} done, {} skipped)",
            self.done, self.skipped
        ));
    }

    fn on_pipeline_done(&mut self, pipeline: &str) {
        let mark = if self.skipped == 0 { style("✓").green() } else { style("!").yellow() };
        self.spinner.println(format!(
            "  {} {} ({} targets, {} skipped)",
            mark,
            style(pipeline).bold(),
            self.done,
            self.skipped
        ));
    }
}

/// Execute the run command.
pub fn execute(
    config_path: &str,
    output: &str,
    run_id: Option<&str>,
    run_analyser: bool,
    save_qasm: bool,
    max_targets: Option<usize>,
) -> Result<()> {
    let config = BenchmarkConfig::load(config_path)
        .with_context(|| format!("Failed to load benchmark config '{config_path}'"))?;

    println!(
        "{} Running {} pipeline(s) from {}",
        style("→").cyan().bold(),
        config.pipelines.len(),
        style(config_path).green()
    );

    let options = EngineOptions {
        output_dir: PathBuf::from(output),
        run_analyser,
        save_qasm,
        run_id: run_id.map(str::to_string),
        max_targets,
    };
    let engine = BenchmarkEngine::new(config, options);

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}")?);
    spinner.enable_steady_tick(Duration::from_millis(100));
    let mut observer = SpinnerObserver { spinner, done: 0, skipped: 0 };

    let result = engine.run(&mut observer);
    observer.spinner.finish_and_clear();
    let summary = result?;

    println!("{} Benchmark complete", style("✓").green().bold());
    println!("  Run ID:  {}", style(&summary.run_id).yellow());
    println!("  Rows:    {}", summary.rows);
    if summary.failed_targets + summary.failed_runs > 0 {
        println!(
            "  Skipped: {} target(s) failed to generate, {} run(s) failed",
            style(summary.failed_targets).red(),
            style(summary.failed_runs).red()
        );
    }
    println!("  Report:  {}", style(summary.report_path.display()).green());

    Ok(())
}
