// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `nn-bench compare` command: one session per backend, run concurrently.
//!
//! Every backend gets its own runtime on its own blocking task. Results are
//! printed as a comparison table against the first successful backend.

use super::{backend_options, resolve_config};
use crate::RunArgs;
use benchmark::{write_report, BenchmarkResult, BenchmarkSession};
use std::path::PathBuf;

pub async fn execute(config: Option<PathBuf>, args: RunArgs, backends: String) -> anyhow::Result<()> {
    println!("╔══════════════════════════════════════════════════════╗");
    println!("║             nn-bench · Backend Comparison           ║");
    println!("╚══════════════════════════════════════════════════════╝");
    println!();

    let base = resolve_config(config.as_deref(), &args)?;
    let names: Vec<String> = backends
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    anyhow::ensure!(!names.is_empty(), "no backends given");

    let tasks: Vec<_> = names
        .iter()
        .map(|name| {
            let mut cfg = base.clone();
            cfg.runtime = backend_options(name);
            tokio::task::spawn_blocking(move || -> anyhow::Result<BenchmarkResult> {
                let mut session = BenchmarkSession::open(cfg)?;
                Ok(session.run()?.0)
            })
        })
        .collect();

    println!(
        "  {:<12} {:>10} {:>12} {:>12} {:>14} {:>12}",
        "Backend", "Iter.", "Mean (ms)", "Std (ms)", "MSE sum", "Max error",
    );
    println!("  {}", "-".repeat(78));

    let mut results = Vec::new();
    for (name, task) in names.iter().zip(tasks) {
        match task.await? {
            Ok(r) => {
                println!(
                    "  {:<12} {:>10} {:>12.3} {:>12.3} {:>14.6e} {:>12.6}",
                    name,
                    r.iterations,
                    r.mean_time_sec() * 1000.0,
                    r.time_std_deviation_sec * 1000.0,
                    r.sum_of_mses,
                    r.max_single_error,
                );
                results.push(r);
            }
            Err(e) => {
                tracing::warn!("backend '{name}' failed: {e:#}");
                println!("  {:<12}     FAILED: {e:#}", name);
            }
        }
    }
    println!();

    let Some(baseline) = results.first() else {
        println!("  No successful benchmark runs.");
        return Ok(());
    };
    println!("  Speed-up vs {}:", baseline.label);
    for r in &results[1..] {
        println!(
            "   {:<30} {:.2}x",
            r.label,
            baseline.mean_time_sec() / r.mean_time_sec()
        );
    }
    println!();

    if let Some(path) = &args.report {
        write_report(path, &results)?;
        println!("  Report written to {}", path.display());
    }
    Ok(())
}
