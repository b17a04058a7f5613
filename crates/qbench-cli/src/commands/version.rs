//! Version command implementation.

use console::style;

/// Execute the version command.
pub fn execute() {
    let version = env!("CARGO_PKG_VERSION");

    println!(
        "{} {} - quantum circuit compilation benchmarks",
        style("qbench").cyan().bold(),
        style(format!("v{version}")).yellow()
    );
    println!();
    println!("Components:");
    println!("  qbench-ir      Gate chains, hardware model, QASM and simulation");
    println!("  qbench-passes  Routing, rebase and compression passes");
    println!("  qbench-core    Metrics, strategies, pipelines, targets and reports");
    println!("  qbench-cli     Command-line interface");
    println!();
    println!(
        "Repository: {}",
        style(env!("CARGO_PKG_REPOSITORY")).underlined()
    );
    println!("License:    {}", style(env!("CARGO_PKG_LICENSE")).dim());
}
