// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! A configured model plus dataset, ready to benchmark.

use crate::{
    BenchError, BenchmarkConfig, BenchmarkResult, Dataset, RunOutcome, SequenceRunner, SpanTracer,
};
use runtime::{Interpreter, ModelRuntime};
use std::path::Path;

/// Owns one runtime and the dataset it is benchmarked on.
pub struct BenchmarkSession {
    config: BenchmarkConfig,
    runtime: Box<dyn ModelRuntime>,
    dataset: Dataset,
}

impl BenchmarkSession {
    /// Loads the model and dataset named by `config`.
    ///
    /// Steps:
    /// 1. Memory-map and load the model with `config.runtime`.
    /// 2. Resize the primary input if `input_shape` is set.
    /// 3. Load the dataset manifest.
    pub fn open(config: BenchmarkConfig) -> Result<Self, BenchError> {
        let interpreter = Interpreter::load_file(&config.model_path, &config.runtime)?;
        let dataset_path = config
            .dataset_path
            .clone()
            .ok_or_else(|| BenchError::ConfigError("no dataset_path configured".into()))?;
        let dataset = Dataset::load(&dataset_path)?;
        Self::new(config, Box::new(interpreter), dataset)
    }

    /// Wraps an already loaded runtime.
    pub fn new(
        config: BenchmarkConfig,
        mut runtime: Box<dyn ModelRuntime>,
        dataset: Dataset,
    ) -> Result<Self, BenchError> {
        if let Some(shape) = config.input_shape() {
            runtime.resize_input(&shape)?;
        }
        tracing::info!(
            "session '{}' on {}: input {} {}, output {} {}",
            config.resolve_label(),
            runtime.name(),
            runtime.input_info().dtype,
            runtime.input_info().shape,
            runtime.output_info().dtype,
            runtime.output_info().shape,
        );
        Ok(Self {
            config,
            runtime,
            dataset,
        })
    }

    /// `label/backend`.
    pub fn label(&self) -> String {
        format!("{}/{}", self.config.resolve_label(), self.runtime.name())
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn runtime(&self) -> &dyn ModelRuntime {
        self.runtime.as_ref()
    }

    /// Runs the configured budget and aggregates the results.
    pub fn run(&mut self) -> Result<(BenchmarkResult, RunOutcome), BenchError> {
        let label = self.label();
        let flags = self.config.run_flags(self.dataset.has_golden_output());
        let mut runner =
            SequenceRunner::new(self.runtime.as_mut()).with_tracer(Box::new(SpanTracer::new()));
        let outcome = runner.run(
            self.dataset.sequences(),
            self.config.max_runs,
            self.config.timeout_sec,
            flags,
        )?;
        let result = BenchmarkResult::from_inference_results(label, &outcome.results)?;
        tracing::info!("{} ({:?})", result.summary(), outcome.state);
        Ok((result, outcome))
    }

    /// Dumps every tensor after every step of every sequence into `dir`.
    pub fn dump(&mut self, dir: &Path) -> Result<(), BenchError> {
        SequenceRunner::new(self.runtime.as_mut()).dump_all_layers(dir, self.dataset.sequences())
    }
}

impl std::fmt::Debug for BenchmarkSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BenchmarkSession")
            .field("label", &self.label())
            .field("sequences", &self.dataset.sequences().len())
            .field("max_runs", &self.config.max_runs)
            .field("timeout_sec", &self.config.timeout_sec)
            .finish()
    }
}
