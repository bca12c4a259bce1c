// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Summary statistics over a benchmark run.
//!
//! [`BenchmarkResult`] folds the per-step records of one run into latency
//! and accuracy figures. It is what the CLI prints and what the JSON report
//! contains.

use crate::{BenchError, InferenceResult};
use std::fmt;
use std::path::Path;

/// Aggregate of one run.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct BenchmarkResult {
    /// Free-text label, usually `model/backend`.
    pub label: String,
    pub iterations: usize,
    pub total_time_sec: f64,
    /// Population standard deviation of per-step compute time.
    pub time_std_deviation_sec: f64,
    pub sum_of_mses: f64,
    /// Largest per-step (signed) max error, floor 0.
    pub max_single_error: f64,
}

impl BenchmarkResult {
    /// Aggregates `results` in one pass for the sums and a second for the
    /// deviation.
    ///
    /// # Errors
    /// [`BenchError::NoResults`] if `results` is empty.
    pub fn from_inference_results(
        label: impl Into<String>,
        results: &[InferenceResult],
    ) -> Result<Self, BenchError> {
        if results.is_empty() {
            return Err(BenchError::NoResults);
        }
        let iterations = results.len();
        let mut total_time_sec = 0.0;
        let mut sum_of_mses = 0.0;
        let mut max_single_error = 0.0f64;
        for r in results {
            total_time_sec += r.compute_time.as_secs_f64();
            sum_of_mses += r.mean_squared_error;
            max_single_error = max_single_error.max(r.max_error);
        }

        let mean = total_time_sec / iterations as f64;
        let variance = results
            .iter()
            .map(|r| {
                let d = r.compute_time.as_secs_f64() - mean;
                d * d
            })
            .sum::<f64>()
            / iterations as f64;

        Ok(Self {
            label: label.into(),
            iterations,
            total_time_sec,
            time_std_deviation_sec: variance.sqrt(),
            sum_of_mses,
            max_single_error,
        })
    }

    pub fn mean_time_sec(&self) -> f64 {
        self.total_time_sec / self.iterations as f64
    }

    /// One-line summary for CLI output and logs.
    pub fn summary(&self) -> String {
        format!(
            "{}: {} iterations, mean {:.3}ms (std {:.3}ms), total {:.3}s, MSE sum {:.6e}, max error {:.6}",
            self.label,
            self.iterations,
            self.mean_time_sec() * 1000.0,
            self.time_std_deviation_sec * 1000.0,
            self.total_time_sec,
            self.sum_of_mses,
            self.max_single_error,
        )
    }
}

impl fmt::Display for BenchmarkResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.summary())
    }
}

/// Writes `results` as a pretty-printed JSON array.
pub fn write_report(path: &Path, results: &[BenchmarkResult]) -> Result<(), BenchError> {
    let json = serde_json::to_string_pretty(results)?;
    std::fs::write(path, json)?;
    tracing::info!("wrote report with {} entries to {}", results.len(), path.display());
    Ok(())
}
