//! Strategies command implementation.

use console::style;

use qbench_core::StrategyRegistry;

/// Execute the strategies command.
pub fn execute() {
    let registry = StrategyRegistry::with_builtins();

    println!("{}", style("Registered strategies:").bold());
    println!();
    for (name, role) in registry.available_strategies() {
        println!(
            "  {:<22} {:<12} {}",
            style(&name).cyan(),
            role,
            style(format!("analyser: {:?}", role.analyser_kind())).dim()
        );
    }
    println!();
    println!(
        "Use a name as the {} of a stage; pass options under {}.",
        style("strategy").green(),
        style("args").green()
    );
}
