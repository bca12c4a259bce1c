// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `nn-bench dump` command: write every tensor after every step.

use super::{backend_options, require};
use benchmark::{BenchmarkConfig, BenchmarkSession};
use std::path::PathBuf;

pub async fn execute(
    config: Option<PathBuf>,
    model: Option<PathBuf>,
    dataset: Option<PathBuf>,
    out: PathBuf,
    accelerator: Option<String>,
) -> anyhow::Result<()> {
    let mut cfg = match &config {
        Some(path) => BenchmarkConfig::from_file(path)?,
        None => BenchmarkConfig {
            model_path: require(model, "--model")?,
            dataset_path: Some(require(dataset, "--dataset")?),
            runtime: accelerator.as_deref().map(backend_options).unwrap_or_default(),
            ..Default::default()
        },
    };
    cfg.runtime.expose_all_layers = true;

    let dir = out.clone();
    let steps = tokio::task::spawn_blocking(move || -> anyhow::Result<usize> {
        let mut session = BenchmarkSession::open(cfg)?;
        session.dump(&dir)?;
        Ok(session.dataset().total_steps())
    })
    .await??;

    println!("  Dumped {steps} steps to {}", out.display());
    Ok(())
}
