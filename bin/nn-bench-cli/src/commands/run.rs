// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `nn-bench run` command: benchmark one model on one backend.
//!
//! The session runs on a blocking task; the core loop is synchronous and
//! must not stall the async runtime.

use super::{backend_options, resolve_config};
use crate::RunArgs;
use benchmark::{write_report, BenchmarkSession};
use std::path::PathBuf;

pub async fn execute(
    config: Option<PathBuf>,
    args: RunArgs,
    accelerator: Option<String>,
) -> anyhow::Result<()> {
    println!("╔══════════════════════════════════════════════════════╗");
    println!("║              nn-bench · Benchmark Run               ║");
    println!("╚══════════════════════════════════════════════════════╝");
    println!();

    let mut cfg = resolve_config(config.as_deref(), &args)?;
    if config.is_none() {
        if let Some(name) = &accelerator {
            cfg.runtime = backend_options(name);
        }
    }

    println!("  Config:");
    println!("   Model:    {}", cfg.model_path.display());
    if let Some(dataset) = &cfg.dataset_path {
        println!("   Dataset:  {}", dataset.display());
    }
    println!("   Backend:  {}", cfg.runtime.backend_label());
    println!("   Timeout:  {}s", cfg.timeout_sec);
    println!();

    let (result, outcome) = tokio::task::spawn_blocking(move || -> anyhow::Result<_> {
        let mut session = BenchmarkSession::open(cfg)?;
        Ok(session.run()?)
    })
    .await??;

    println!("  Result ({:?}):", outcome.state);
    println!("   Iterations:     {}", result.iterations);
    println!("   Mean latency:   {:.3} ms", result.mean_time_sec() * 1000.0);
    println!("   Std deviation:  {:.3} ms", result.time_std_deviation_sec * 1000.0);
    println!("   Total time:     {:.3} s", result.total_time_sec);
    println!("   MSE sum:        {:.6e}", result.sum_of_mses);
    println!("   Max error:      {:.6}", result.max_single_error);
    println!();

    if let Some(path) = &args.report {
        write_report(path, std::slice::from_ref(&result))?;
        println!("  Report written to {}", path.display());
    }
    Ok(())
}
