// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # nn-bench
//!
//! Command-line interface for the nn-bench harness.
//!
//! ## Usage
//! ```bash
//! # Generate a synthetic model and dataset with golden outputs
//! nn-bench synth --out ./work --hidden 32 --sequences 2 --steps 4
//!
//! # Benchmark on the simulated accelerator for 5 seconds
//! nn-bench run --model ./work/synth.nnb --dataset ./work/dataset.toml --accelerator simulated --timeout 5
//!
//! # Compare backends and write a JSON report
//! nn-bench compare --model ./work/synth.nnb --dataset ./work/dataset.toml --report report.json
//!
//! # Dump every tensor after every step
//! nn-bench dump --model ./work/synth.nnb --dataset ./work/dataset.toml --out ./dumps
//!
//! # Inspect model structure and delegate partitions
//! nn-bench inspect --model ./work/synth.nnb
//! ```

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "nn-bench",
    about = "Latency and accuracy benchmarking for neural network models",
    version,
    author
)]
struct Cli {
    /// Path to a TOML benchmark configuration (overrides CLI arguments).
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging (repeat for more: -v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Model, dataset and budget arguments shared by `run` and `compare`.
#[derive(clap::Args, Debug, Clone)]
pub struct RunArgs {
    /// Path to the model file.
    #[arg(short, long)]
    model: Option<PathBuf>,

    /// Path to the dataset manifest.
    #[arg(short, long)]
    dataset: Option<PathBuf>,

    /// Maximum number of sequence runs.
    #[arg(long, default_value_t = benchmark::UNBOUNDED_RUNS)]
    max_runs: usize,

    /// Time budget in seconds of summed invoke time.
    #[arg(short, long, default_value_t = 10.0)]
    timeout: f64,

    /// Skip golden comparison.
    #[arg(long)]
    ignore_golden: bool,

    /// Resize the primary input, e.g. "1,16".
    #[arg(long)]
    input_shape: Option<String>,

    /// Write results as JSON.
    #[arg(short, long)]
    report: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Benchmark a model on one backend.
    Run {
        #[command(flatten)]
        args: RunArgs,

        /// Accelerator to attach (e.g. "simulated"); host execution if omitted.
        #[arg(short, long)]
        accelerator: Option<String>,
    },

    /// Benchmark the same model and dataset on several backends in parallel.
    Compare {
        #[command(flatten)]
        args: RunArgs,

        /// Comma-separated backends; "host" means no accelerator.
        #[arg(long, default_value = "host,simulated")]
        backends: String,
    },

    /// Dump every tensor after every step into a directory.
    Dump {
        /// Path to the model file.
        #[arg(short, long)]
        model: Option<PathBuf>,

        /// Path to the dataset manifest.
        #[arg(short, long)]
        dataset: Option<PathBuf>,

        /// Output directory (must exist).
        #[arg(short, long)]
        out: PathBuf,

        /// Accelerator to attach; host execution if omitted.
        #[arg(short, long)]
        accelerator: Option<String>,
    },

    /// Inspect a model: tensors, nodes and delegate partitions.
    Inspect {
        /// Path to the model file.
        #[arg(short, long)]
        model: PathBuf,
    },

    /// Write a synthetic model and a dataset with golden outputs.
    Synth {
        /// Output directory (created if missing).
        #[arg(short, long)]
        out: PathBuf,

        /// Hidden width of the model.
        #[arg(long, default_value_t = 32)]
        hidden: usize,

        /// Number of sequences.
        #[arg(long, default_value_t = 2)]
        sequences: usize,

        /// Steps per sequence.
        #[arg(long, default_value_t = 4)]
        steps: usize,

        /// Seed for weights and inputs.
        #[arg(long, default_value_t = 42)]
        seed: u64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    commands::init_tracing(cli.verbose);

    match cli.command {
        Commands::Run { args, accelerator } => {
            commands::run::execute(cli.config, args, accelerator).await
        }
        Commands::Compare { args, backends } => {
            commands::compare::execute(cli.config, args, backends).await
        }
        Commands::Dump {
            model,
            dataset,
            out,
            accelerator,
        } => commands::dump::execute(cli.config, model, dataset, out, accelerator).await,
        Commands::Inspect { model } => commands::inspect::execute(model).await,
        Commands::Synth {
            out,
            hidden,
            sequences,
            steps,
            seed,
        } => commands::synth::execute(out, hidden, sequences, steps, seed).await,
    }
}
