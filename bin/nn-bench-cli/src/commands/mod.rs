// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Subcommand implementations and the helpers they share.

pub mod compare;
pub mod dump;
pub mod inspect;
pub mod run;
pub mod synth;

use crate::RunArgs;
use anyhow::Context;
use benchmark::BenchmarkConfig;
use runtime::LoadOptions;
use std::path::{Path, PathBuf};

/// Installs the fmt subscriber. `RUST_LOG` wins over `-v`.
pub fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Load options for a backend name; `"host"` and `"none"` mean no
/// accelerator.
pub fn backend_options(name: &str) -> LoadOptions {
    match name.trim().to_lowercase().as_str() {
        "host" | "none" | "" => LoadOptions::host(),
        other => LoadOptions {
            accelerator: other.to_string(),
            ..LoadOptions::accelerated()
        },
    }
}

/// Builds the session config from `--config` or, failing that, the
/// command-line arguments.
pub fn resolve_config(config: Option<&Path>, args: &RunArgs) -> anyhow::Result<BenchmarkConfig> {
    if let Some(path) = config {
        return BenchmarkConfig::from_file(path)
            .with_context(|| format!("loading config '{}'", path.display()));
    }
    let input_shape = args
        .input_shape
        .as_deref()
        .map(parse_shape)
        .transpose()?;
    Ok(BenchmarkConfig {
        model_path: require(args.model.clone(), "--model")?,
        dataset_path: Some(require(args.dataset.clone(), "--dataset")?),
        max_runs: args.max_runs,
        timeout_sec: args.timeout,
        ignore_golden: args.ignore_golden,
        input_shape,
        ..Default::default()
    })
}

pub fn require(value: Option<PathBuf>, flag: &str) -> anyhow::Result<PathBuf> {
    value.with_context(|| format!("{flag} is required when no --config is given"))
}

/// Parses `"1,16"` into dimensions.
fn parse_shape(s: &str) -> anyhow::Result<Vec<usize>> {
    s.split(',')
        .map(|d| {
            d.trim()
                .parse::<usize>()
                .with_context(|| format!("invalid dimension '{d}' in input shape '{s}'"))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_options() {
        assert!(!backend_options("host").use_accelerator);
        assert!(!backend_options("None").use_accelerator);
        let sim = backend_options("simulated");
        assert!(sim.use_accelerator);
        assert_eq!(sim.accelerator, "simulated");
    }

    #[test]
    fn test_parse_shape() {
        assert_eq!(parse_shape("1, 16").unwrap(), vec![1, 16]);
        assert!(parse_shape("1,x").is_err());
    }
}
