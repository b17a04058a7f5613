//! qbench Command-Line Interface
//!
//! Runs compilation benchmarks described by a configuration file and writes
//! a CSV report plus the QASM output of every stage.

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use clap::{Parser, Subcommand};
use console::style;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::{generate, run, strategies, version};

/// qbench - benchmark quantum circuit compilation pipelines
#[derive(Parser)]
#[command(name = "qbench")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run every pipeline of a benchmark configuration
    Run {
        /// Benchmark configuration (JSON or YAML)
        #[arg(short, long)]
        config: String,

        /// Output directory
        #[arg(short, long, default_value = "output")]
        output: String,

        /// Run identifier (defaults to a timestamp)
        #[arg(long)]
        run_id: Option<String>,

        /// Skip the metric analysers
        #[arg(long)]
        no_analysis: bool,

        /// Do not write stage outputs as QASM
        #[arg(long)]
        no_qasm: bool,

        /// Cap on targets taken from each generator (required for generators without `number`)
        #[arg(long)]
        max_targets: Option<usize>,
    },

    /// Generate targets from a target description and write them to disk
    Generate {
        /// Target description (JSON or YAML)
        #[arg(short, long)]
        config: String,

        /// Output directory
        #[arg(short, long, default_value = "targets")]
        output: String,

        /// Reseed the generator before drawing
        #[arg(long)]
        seed: Option<u64>,

        /// Maximum number of targets to write
        #[arg(long, default_value = "1000")]
        limit: usize,
    },

    /// List registered strategies
    Strategies,

    /// Show version information
    Version,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .init();

    let result = match cli.command {
        Commands::Run {
            config,
            output,
            run_id,
            no_analysis,
            no_qasm,
            max_targets,
        } => run::execute(&config, &output, run_id.as_deref(), !no_analysis, !no_qasm, max_targets),

        Commands::Generate {
            config,
            output,
            seed,
            limit,
        } => generate::execute(&config, &output, seed, limit),

        Commands::Strategies => {
            strategies::execute();
            Ok(())
        }

        Commands::Version => {
            version::execute();
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{} {}", style("Error:").red().bold(), e);
        std::process::exit(1);
    }

    Ok(())
}
